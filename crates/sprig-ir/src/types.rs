//! IR type and attribute definitions.

use std::collections::BTreeMap;

use crate::{IdVec, Symbol};

/// Trait for dialect-specific type wrappers.
///
/// Similar to `DialectOp` for operations, this trait provides a common interface
/// for type wrappers that wrap the generic `Type` with dialect-specific semantics.
pub trait DialectType<'db>: Sized {
    /// Get the underlying `Type`.
    fn as_type(&self) -> Type<'db>;

    /// Try to convert a `Type` to this dialect type wrapper.
    /// Returns `None` if the type doesn't match this dialect type.
    fn from_type(db: &'db dyn salsa::Database, ty: Type<'db>) -> Option<Self>;
}

/// Attribute map type alias.
pub type Attrs<'db> = BTreeMap<Symbol, Attribute<'db>>;

/// IR type representation.
///
/// All types are dialect-defined with a `dialect.name` naming convention.
#[salsa::interned(debug)]
pub struct Type<'db> {
    pub dialect: Symbol,
    pub name: Symbol,
    #[returns(deref)]
    pub params: IdVec<Type<'db>>,
    #[returns(ref)]
    pub attrs: Attrs<'db>,
}

impl<'db> Type<'db> {
    /// Check if this type matches the given dialect and name.
    pub fn is_dialect(&self, db: &'db dyn salsa::Database, dialect: Symbol, name: Symbol) -> bool {
        self.dialect(db) == dialect && self.name(db) == name
    }

    /// Get an attribute by key.
    pub fn get_attr(&self, db: &'db dyn salsa::Database, key: Symbol) -> Option<&Attribute<'db>> {
        self.attrs(db).get(&key)
    }
}

/// IR attribute values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum Attribute<'db> {
    /// Unit/nil value (placeholder for absent or void attributes).
    Unit,
    Bool(bool),
    /// Integer constant stored as raw bits (signless).
    IntBits(u64),
    /// Float constant stored as raw bits.
    FloatBits(u64),
    String(String),
    Type(Type<'db>),
    /// Single interned symbol (e.g., "add").
    Symbol(Symbol),
    /// List of attributes (for arrays of values like coordinates).
    List(Vec<Attribute<'db>>),
}

impl<'db> Attribute<'db> {
    /// Read an integer attribute back as a signed value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::IntBits(bits) => Some(i64::from_ne_bytes(bits.to_ne_bytes())),
            _ => None,
        }
    }

    /// Read a float attribute back as an `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Attribute::FloatBits(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

impl From<i64> for Attribute<'_> {
    fn from(value: i64) -> Self {
        Attribute::IntBits(u64::from_ne_bytes(value.to_ne_bytes()))
    }
}

impl From<u64> for Attribute<'_> {
    fn from(value: u64) -> Self {
        Attribute::IntBits(value)
    }
}

impl From<f64> for Attribute<'_> {
    fn from(value: f64) -> Self {
        Attribute::FloatBits(value.to_bits())
    }
}

impl From<bool> for Attribute<'_> {
    fn from(value: bool) -> Self {
        Attribute::Bool(value)
    }
}

impl From<Symbol> for Attribute<'_> {
    fn from(value: Symbol) -> Self {
        Attribute::Symbol(value)
    }
}

impl<'db> From<Vec<Attribute<'db>>> for Attribute<'db> {
    fn from(value: Vec<Attribute<'db>>) -> Self {
        Attribute::List(value)
    }
}
