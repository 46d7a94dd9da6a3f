//! Declarative constraints over types and attributes.
//!
//! Operation schemas describe their operand, result, and attribute
//! requirements with the constraint values in this module instead of
//! hand-written verifier code. A constraint either accepts a candidate or
//! produces a [`ConstraintError`] naming the specific predicate that failed,
//! so verifier diagnostics stay uniform across dialects.

use derive_more::{Display, Error};

use crate::printer::type_to_string;
use crate::types::{Attribute, Type};

/// Predicate over a type. Named so failures can report which check rejected
/// the candidate.
pub type TypePredFn = for<'db> fn(&'db dyn salsa::Database, Type<'db>) -> bool;

/// Predicate over an attribute value.
pub type AttrPredFn = for<'db> fn(&'db dyn salsa::Database, &Attribute<'db>) -> bool;

/// A constraint failure, carried inside verifier errors.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{reason}")]
pub struct ConstraintError {
    pub reason: String,
}

impl ConstraintError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Constraint over IR types.
///
/// Combinators evaluate their children left to right and stop at the first
/// decisive answer: `AllOf` at the first failure, `AnyOf` at the first
/// success.
#[derive(Debug, Clone, Copy)]
pub enum TypeConstraint {
    /// A single named predicate.
    Pred {
        name: &'static str,
        check: TypePredFn,
    },
    /// All child constraints must hold. Empty list always holds.
    AllOf(&'static [TypeConstraint]),
    /// At least one child constraint must hold. Empty list never holds.
    AnyOf(&'static [TypeConstraint]),
}

impl TypeConstraint {
    /// Check a type against this constraint.
    pub fn check<'db>(
        &self,
        db: &'db dyn salsa::Database,
        ty: Type<'db>,
    ) -> Result<(), ConstraintError> {
        match self {
            TypeConstraint::Pred { name, check } => {
                if check(db, ty) {
                    Ok(())
                } else {
                    Err(ConstraintError::new(format!(
                        "type '{}' does not satisfy '{}'",
                        type_to_string(db, ty),
                        name
                    )))
                }
            }
            TypeConstraint::AllOf(children) => {
                for child in *children {
                    child.check(db, ty)?;
                }
                Ok(())
            }
            TypeConstraint::AnyOf(children) => {
                for child in *children {
                    if child.check(db, ty).is_ok() {
                        return Ok(());
                    }
                }
                Err(ConstraintError::new(format!(
                    "type '{}' does not satisfy any of [{}]",
                    type_to_string(db, ty),
                    describe_type_alternatives(children)
                )))
            }
        }
    }

    /// Short description used in `AnyOf` failure messages.
    fn describe(&self) -> String {
        match self {
            TypeConstraint::Pred { name, .. } => (*name).to_string(),
            TypeConstraint::AllOf(children) => {
                format!("all of [{}]", describe_type_alternatives(children))
            }
            TypeConstraint::AnyOf(children) => {
                format!("any of [{}]", describe_type_alternatives(children))
            }
        }
    }
}

fn describe_type_alternatives(children: &[TypeConstraint]) -> String {
    children
        .iter()
        .map(TypeConstraint::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Constraint over attribute values.
#[derive(Debug, Clone, Copy)]
pub enum AttrConstraint {
    /// A single named predicate.
    Pred {
        name: &'static str,
        check: AttrPredFn,
    },
    /// All child constraints must hold. Empty list always holds.
    AllOf(&'static [AttrConstraint]),
    /// At least one child constraint must hold. Empty list never holds.
    AnyOf(&'static [AttrConstraint]),
    /// A list attribute whose elements all satisfy `elem`, optionally of a
    /// fixed length.
    ArrayOf {
        elem: &'static AttrConstraint,
        len: Option<usize>,
    },
    /// A symbol attribute drawn from a closed set of mnemonics.
    OneOfSymbols(&'static [&'static str]),
}

impl AttrConstraint {
    /// Check an attribute value against this constraint.
    pub fn check<'db>(
        &self,
        db: &'db dyn salsa::Database,
        attr: &Attribute<'db>,
    ) -> Result<(), ConstraintError> {
        match self {
            AttrConstraint::Pred { name, check } => {
                if check(db, attr) {
                    Ok(())
                } else {
                    Err(ConstraintError::new(format!(
                        "attribute does not satisfy '{}'",
                        name
                    )))
                }
            }
            AttrConstraint::AllOf(children) => {
                for child in *children {
                    child.check(db, attr)?;
                }
                Ok(())
            }
            AttrConstraint::AnyOf(children) => {
                for child in *children {
                    if child.check(db, attr).is_ok() {
                        return Ok(());
                    }
                }
                Err(ConstraintError::new(format!(
                    "attribute does not satisfy any of [{}]",
                    describe_attr_alternatives(children)
                )))
            }
            AttrConstraint::ArrayOf { elem, len } => {
                let Attribute::List(items) = attr else {
                    return Err(ConstraintError::new("attribute is not a list"));
                };
                if let Some(expected) = len
                    && items.len() != *expected
                {
                    return Err(ConstraintError::new(format!(
                        "list has {} elements, expected {}",
                        items.len(),
                        expected
                    )));
                }
                for (index, item) in items.iter().enumerate() {
                    elem.check(db, item).map_err(|err| {
                        ConstraintError::new(format!("element {}: {}", index, err.reason))
                    })?;
                }
                Ok(())
            }
            AttrConstraint::OneOfSymbols(allowed) => {
                let Attribute::Symbol(sym) = attr else {
                    return Err(ConstraintError::new("attribute is not a symbol"));
                };
                if sym.with_str(|s| allowed.contains(&s)) {
                    Ok(())
                } else {
                    Err(ConstraintError::new(format!(
                        "symbol '{}' is not one of [{}]",
                        sym,
                        allowed.join(", ")
                    )))
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            AttrConstraint::Pred { name, .. } => (*name).to_string(),
            AttrConstraint::AllOf(children) => {
                format!("all of [{}]", describe_attr_alternatives(children))
            }
            AttrConstraint::AnyOf(children) => {
                format!("any of [{}]", describe_attr_alternatives(children))
            }
            AttrConstraint::ArrayOf { elem, len } => match len {
                Some(len) => format!("array of {} x {}", len, elem.describe()),
                None => format!("array of {}", elem.describe()),
            },
            AttrConstraint::OneOfSymbols(allowed) => {
                format!("one of [{}]", allowed.join(", "))
            }
        }
    }
}

fn describe_attr_alternatives(children: &[AttrConstraint]) -> String {
    children
        .iter()
        .map(AttrConstraint::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

// Named predicate functions. Kept as free functions so the constants below
// coerce cleanly to the higher-ranked fn pointer type.

fn is_any_type(_db: &dyn salsa::Database, _ty: Type<'_>) -> bool {
    true
}

fn is_integer_type(db: &dyn salsa::Database, ty: Type<'_>) -> bool {
    ty.dialect(db) == "core" && ty.name(db).with_str(|name| is_int_name(name))
}

fn is_float_type(db: &dyn salsa::Database, ty: Type<'_>) -> bool {
    ty.dialect(db) == "core" && ty.name(db).with_str(|name| is_float_name(name))
}

fn is_memref_type(db: &dyn salsa::Database, ty: Type<'_>) -> bool {
    ty.dialect(db) == "core" && ty.name(db) == "memref"
}

fn is_int_name(name: &str) -> bool {
    let Some(bits) = name.strip_prefix('i') else {
        return false;
    };
    !bits.is_empty() && bits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_name(name: &str) -> bool {
    let Some(bits) = name.strip_prefix('f') else {
        return false;
    };
    !bits.is_empty() && bits.bytes().all(|b| b.is_ascii_digit())
}

fn is_any_attr(_db: &dyn salsa::Database, _attr: &Attribute<'_>) -> bool {
    true
}

fn is_int_attr(_db: &dyn salsa::Database, attr: &Attribute<'_>) -> bool {
    matches!(attr, Attribute::IntBits(_))
}

fn is_float_attr(_db: &dyn salsa::Database, attr: &Attribute<'_>) -> bool {
    matches!(attr, Attribute::FloatBits(_))
}

fn is_string_attr(_db: &dyn salsa::Database, attr: &Attribute<'_>) -> bool {
    matches!(attr, Attribute::String(_))
}

fn is_symbol_attr(_db: &dyn salsa::Database, attr: &Attribute<'_>) -> bool {
    matches!(attr, Attribute::Symbol(_))
}

fn is_type_attr(_db: &dyn salsa::Database, attr: &Attribute<'_>) -> bool {
    matches!(attr, Attribute::Type(_))
}

/// Accepts every type.
pub const ANY_TYPE: TypeConstraint = TypeConstraint::Pred {
    name: "any type",
    check: is_any_type,
};

/// Accepts `core.iN` integer types.
pub const ANY_INTEGER: TypeConstraint = TypeConstraint::Pred {
    name: "integer type",
    check: is_integer_type,
};

/// Accepts `core.fN` floating-point types.
pub const ANY_FLOAT: TypeConstraint = TypeConstraint::Pred {
    name: "float type",
    check: is_float_type,
};

/// Accepts integer or floating-point types.
pub const INT_OR_FLOAT: TypeConstraint = TypeConstraint::AnyOf(&[ANY_INTEGER, ANY_FLOAT]);

/// Accepts `core.memref` types.
pub const ANY_MEMREF: TypeConstraint = TypeConstraint::Pred {
    name: "memref type",
    check: is_memref_type,
};

/// Accepts every attribute value.
pub const ANY_ATTR: AttrConstraint = AttrConstraint::Pred {
    name: "any attribute",
    check: is_any_attr,
};

/// Accepts integer attributes.
pub const INT_ATTR: AttrConstraint = AttrConstraint::Pred {
    name: "integer attribute",
    check: is_int_attr,
};

/// Accepts floating-point attributes.
pub const FLOAT_ATTR: AttrConstraint = AttrConstraint::Pred {
    name: "float attribute",
    check: is_float_attr,
};

/// Accepts string attributes.
pub const STRING_ATTR: AttrConstraint = AttrConstraint::Pred {
    name: "string attribute",
    check: is_string_attr,
};

/// Accepts symbol attributes.
pub const SYMBOL_ATTR: AttrConstraint = AttrConstraint::Pred {
    name: "symbol attribute",
    check: is_symbol_attr,
};

/// Accepts type attributes.
pub const TYPE_ATTR: AttrConstraint = AttrConstraint::Pred {
    name: "type attribute",
    check: is_type_attr,
};

/// Accepts integer or floating-point attributes.
pub const NUMERIC_ATTR: AttrConstraint = AttrConstraint::AnyOf(&[INT_ATTR, FLOAT_ATTR]);
