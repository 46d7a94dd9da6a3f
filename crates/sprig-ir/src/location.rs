//! Source location types for tracking positions in IR text.

use serde::{Deserialize, Serialize};

/// A span of input text, represented as byte offsets.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Interned URI string identifying where a piece of IR came from.
///
/// Typically a `file://` URI, but any scheme works (e.g. `ir:///parsed`
/// for IR reconstructed from its textual form).
#[salsa::interned(debug)]
pub struct PathId<'db> {
    #[returns(deref)]
    pub uri: String,
}

/// A location combining source identity and span information.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Location<'db> {
    pub path: PathId<'db>,
    pub span: Span,
}

impl<'db> Location<'db> {
    pub const fn new(path: PathId<'db>, span: Span) -> Self {
        Self { path, span }
    }
}
