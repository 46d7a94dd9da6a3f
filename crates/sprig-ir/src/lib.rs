//! SprigIR: a compact multi-dialect IR with data-driven operation schemas.
//!
//! Operations are generic records (`dialect.name`, operands, results,
//! attributes, regions); their structural rules live in a runtime
//! [`schema::SchemaRegistry`] built from declarations registered at the
//! dialect definition site. Verification, printing, and parsing are all
//! interpreted over that data rather than generated per operation.

#![recursion_limit = "256"]

// === Dialect modules ===
pub mod dialect;

// === IR infrastructure ===
pub mod constraint;
pub mod enum_attr;
pub mod ir;
pub mod location;
pub mod op_interface;
pub mod ops;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod types;

// Re-export paste for use in the dialect! macro
#[doc(hidden)]
pub use paste;

// Re-export smallvec for use in macros and external crates
pub use smallvec;

pub use constraint::{AttrConstraint, ConstraintError, TypeConstraint};
pub use enum_attr::EnumAttrError;
pub use ir::{Block, BlockBuilder, Operation, OperationBuilder, Region, Symbol, Value, ValueDef};
pub use location::{Location, PathId, Span};
pub use op_interface::{Effect, InferError, InferResults, MemoryEffects};
#[doc(hidden)]
pub use ops::strip_raw_prefix;
pub use ops::{ConversionError, DialectOp};
pub use parser::{ParseError, ParseOptions, parse_module, parse_module_with};
pub use printer::{print_op, type_to_string};
pub use schema::{OpSchema, OpTrait, VerifyError, VerifyReport, registry, verify_all};
pub use types::{Attribute, Attrs, DialectType, Type};

/// Small vector for values tracked by the Salsa framework.
pub type IdVec<T> = smallvec::SmallVec<[T; 2]>;
pub use smallvec::smallvec as idvec;
