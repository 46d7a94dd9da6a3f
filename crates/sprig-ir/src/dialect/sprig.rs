//! Sprig dialect operations.
//!
//! The demonstration dialect exercised throughout the crate:
//! - `sprig.constant` - materialize a constant from its `value` attribute
//! - `sprig.print` - print a value (side-effecting)
//! - `sprig.binary` - elementwise binary arithmetic, `kind` selects add/sub
//! - `sprig.sample` - read one element of a memref at constant coordinates

use crate::constraint::{ANY_ATTR, ANY_MEMREF, ANY_TYPE, INT_ATTR, INT_OR_FLOAT};
use crate::op_interface::{Effect, InferError, InferResults, MemoryEffects};
use crate::printer::type_to_string;
use crate::schema::{
    AttrSchema, OpSchema, OpTrait, OperandSchema, ResultSchema, SchemaRegistration,
};
use crate::types::Attrs;
use crate::{Attribute, DialectType, EnumAttrError, IdVec, Location, Symbol, Type, Value};
use crate::{dialect, enum_attr, idvec};

use super::core;

dialect! {
    mod sprig {
        /// `sprig.constant` operation: materialize the `value` attribute.
        #[attr(value: any)]
        fn constant() -> result;

        /// `sprig.print` operation: print a value.
        fn print(value);

        /// `sprig.binary` operation: binary arithmetic selected by `kind`.
        #[attr(kind: Symbol)]
        fn binary(lhs, rhs) -> result;

        /// `sprig.sample` operation: read one memref element at the constant
        /// `coords` index.
        #[attr(coords: any)]
        fn sample(source) -> result;
    }
}

enum_attr! {
    /// The arithmetic performed by `sprig.binary`.
    pub enum BinaryKind {
        Add = 0 => "add",
        Sub = 1 => "sub",
    }
}

crate::symbols! {
    /// Key of the `kind` attribute on `sprig.binary`.
    ATTR_KIND => "kind",
}

impl<'db> Constant<'db> {
    /// Create an integer constant.
    pub fn int(
        db: &'db dyn salsa::Database,
        location: Location<'db>,
        ty: Type<'db>,
        value: i64,
    ) -> Self {
        constant(db, location, ty, Attribute::from(value))
    }

    /// Create a floating-point constant.
    pub fn float(
        db: &'db dyn salsa::Database,
        location: Location<'db>,
        ty: Type<'db>,
        value: f64,
    ) -> Self {
        constant(db, location, ty, Attribute::from(value))
    }
}

impl<'db> Binary<'db> {
    /// Create a binary operation from a decoded kind.
    pub fn of_kind(
        db: &'db dyn salsa::Database,
        location: Location<'db>,
        kind: BinaryKind,
        lhs: Value<'db>,
        rhs: Value<'db>,
        result: Type<'db>,
    ) -> Self {
        binary(db, location, lhs, rhs, result, Symbol::new(kind.mnemonic()))
    }

    /// Decode the `kind` attribute. Fails on missing or malformed encodings
    /// instead of panicking.
    pub fn kind_value(&self, db: &'db dyn salsa::Database) -> Result<BinaryKind, EnumAttrError> {
        match self.get_attr(db, ATTR_KIND()) {
            Some(attr) => BinaryKind::from_attr(attr),
            None => Err(EnumAttrError::WrongAttributeKind {
                enum_name: "BinaryKind",
            }),
        }
    }
}

impl std::fmt::Debug for Sample<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample").field("op", &self.operation()).finish()
    }
}

// === Schemas ===

inventory::submit! {
    SchemaRegistration {
        schema: OpSchema {
            dialect: "sprig",
            name: "constant",
            operands: &[],
            variadic: false,
            results: &[ResultSchema {
                name: "result",
                constraint: ANY_TYPE,
            }],
            attrs: &[AttrSchema {
                name: "value",
                constraint: ANY_ATTR,
                required: true,
            }],
            traits: &[OpTrait::ZeroRegions],
        },
    }
}

inventory::submit! {
    SchemaRegistration {
        schema: OpSchema {
            dialect: "sprig",
            name: "print",
            operands: &[OperandSchema {
                name: "value",
                constraint: ANY_TYPE,
            }],
            variadic: false,
            results: &[],
            attrs: &[],
            traits: &[OpTrait::ZeroRegions],
        },
    }
}

inventory::submit! {
    SchemaRegistration {
        schema: OpSchema {
            dialect: "sprig",
            name: "binary",
            operands: &[
                OperandSchema {
                    name: "lhs",
                    constraint: INT_OR_FLOAT,
                },
                OperandSchema {
                    name: "rhs",
                    constraint: INT_OR_FLOAT,
                },
            ],
            variadic: false,
            results: &[ResultSchema {
                name: "result",
                constraint: INT_OR_FLOAT,
            }],
            attrs: &[AttrSchema {
                name: "kind",
                constraint: crate::constraint::AttrConstraint::OneOfSymbols(BinaryKind::MNEMONICS),
                required: true,
            }],
            traits: &[
                OpTrait::SameOperandAndResultType,
                OpTrait::Commutative,
                OpTrait::ZeroRegions,
            ],
        },
    }
}

inventory::submit! {
    SchemaRegistration {
        schema: OpSchema {
            dialect: "sprig",
            name: "sample",
            operands: &[OperandSchema {
                name: "source",
                constraint: ANY_MEMREF,
            }],
            variadic: false,
            results: &[ResultSchema {
                name: "result",
                constraint: ANY_TYPE,
            }],
            attrs: &[AttrSchema {
                name: "coords",
                constraint: crate::constraint::AttrConstraint::ArrayOf {
                    elem: &INT_ATTR,
                    len: Some(2),
                },
                required: true,
            }],
            traits: &[OpTrait::ZeroRegions],
        },
    }
}

// === Memory effects ===

inventory::submit! { MemoryEffects::register("sprig", "constant", &[]) }
inventory::submit! { MemoryEffects::register("sprig", "binary", &[]) }
inventory::submit! { MemoryEffects::register("sprig", "print", &[Effect::Write]) }
inventory::submit! { MemoryEffects::register("sprig", "sample", &[Effect::Read]) }

// === Result type inference ===

inventory::submit! { InferResults::register("sprig", "binary", infer_binary) }
inventory::submit! { InferResults::register("sprig", "sample", infer_sample) }

fn infer_binary<'db>(
    db: &'db dyn salsa::Database,
    operand_types: &[Type<'db>],
    _attrs: &Attrs<'db>,
) -> Result<IdVec<Type<'db>>, InferError> {
    match operand_types {
        [lhs, rhs] if lhs == rhs => Ok(idvec![*lhs]),
        [lhs, rhs] => Err(InferError::Failed {
            op: "sprig.binary".to_string(),
            reason: format!(
                "operand types '{}' and '{}' differ",
                type_to_string(db, *lhs),
                type_to_string(db, *rhs)
            ),
        }),
        _ => Err(InferError::Failed {
            op: "sprig.binary".to_string(),
            reason: format!("expected 2 operands, found {}", operand_types.len()),
        }),
    }
}

fn infer_sample<'db>(
    db: &'db dyn salsa::Database,
    operand_types: &[Type<'db>],
    _attrs: &Attrs<'db>,
) -> Result<IdVec<Type<'db>>, InferError> {
    match operand_types {
        [source] => match core::Memref::from_type(db, *source) {
            Some(memref) => Ok(idvec![memref.element(db)]),
            None => Err(InferError::Failed {
                op: "sprig.sample".to_string(),
                reason: format!(
                    "operand type '{}' is not a memref",
                    type_to_string(db, *source)
                ),
            }),
        },
        _ => Err(InferError::Failed {
            op: "sprig.sample".to_string(),
            reason: format!("expected 1 operand, found {}", operand_types.len()),
        }),
    }
}
