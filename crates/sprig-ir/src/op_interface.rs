//! Operation interfaces.
//!
//! Interfaces are capability markers attached to operations by lookup table
//! rather than by trait objects on the IR itself. An operation is registered
//! against an interface with [`inventory`] at link time, and clients query
//! the interface registry by the operation's `dialect.name` key.

use std::collections::HashMap;
use std::sync::LazyLock;

use derive_more::{Display, Error};

use crate::ir::{Operation, Symbol};
use crate::types::{Attrs, Type};
use crate::IdVec;

/// Type inference failure.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum InferError {
    /// The operation is not registered with the inference interface.
    #[display("no result type inference registered for '{op}'")]
    NotRegistered { op: String },
    /// The registered inference function rejected the inputs.
    #[display("cannot infer result types for '{op}': {reason}")]
    Failed { op: String, reason: String },
}

/// Infer the result types of an operation from its operand types and
/// attributes.
pub type InferFn = for<'db> fn(
    &'db dyn salsa::Database,
    &[Type<'db>],
    &Attrs<'db>,
) -> Result<IdVec<Type<'db>>, InferError>;

/// Link-time registration of an inference function for one operation.
pub struct InferRegistration {
    pub dialect: &'static str,
    pub op_name: &'static str,
    pub infer: InferFn,
}

inventory::collect!(InferRegistration);

static INFER_REGISTRY: LazyLock<HashMap<(Symbol, Symbol), InferFn>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for reg in inventory::iter::<InferRegistration> {
        let key = (Symbol::new(reg.dialect), Symbol::new(reg.op_name));
        if map.insert(key, reg.infer).is_some() {
            panic!(
                "duplicate type inference registration for {}.{}",
                reg.dialect, reg.op_name
            );
        }
    }
    map
});

/// Interface for operations whose result types follow from their operands.
pub struct InferResults;

impl InferResults {
    /// Register an operation with this interface. For use in
    /// `inventory::submit!`.
    pub const fn register(
        dialect: &'static str,
        op_name: &'static str,
        infer: InferFn,
    ) -> InferRegistration {
        InferRegistration {
            dialect,
            op_name,
            infer,
        }
    }

    /// Whether an operation implements this interface.
    pub fn is_registered(dialect: Symbol, op_name: Symbol) -> bool {
        INFER_REGISTRY.contains_key(&(dialect, op_name))
    }

    /// Infer result types for the named operation.
    pub fn infer<'db>(
        db: &'db dyn salsa::Database,
        dialect: Symbol,
        op_name: Symbol,
        operand_types: &[Type<'db>],
        attrs: &Attrs<'db>,
    ) -> Result<IdVec<Type<'db>>, InferError> {
        match INFER_REGISTRY.get(&(dialect, op_name)) {
            Some(infer) => infer(db, operand_types, attrs),
            None => Err(InferError::NotRegistered {
                op: format!("{}.{}", dialect, op_name),
            }),
        }
    }
}

/// Kinds of memory effect an operation can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    Read,
    Write,
}

/// Link-time registration of an operation's memory effects.
pub struct EffectRegistration {
    pub dialect: &'static str,
    pub op_name: &'static str,
    pub effects: &'static [Effect],
}

inventory::collect!(EffectRegistration);

static EFFECT_REGISTRY: LazyLock<HashMap<(Symbol, Symbol), &'static [Effect]>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        for reg in inventory::iter::<EffectRegistration> {
            let key = (Symbol::new(reg.dialect), Symbol::new(reg.op_name));
            if map.insert(key, reg.effects).is_some() {
                panic!(
                    "duplicate memory effect registration for {}.{}",
                    reg.dialect, reg.op_name
                );
            }
        }
        map
    });

/// Interface describing the memory effects of an operation.
pub struct MemoryEffects;

impl MemoryEffects {
    /// Register an operation with this interface. For use in
    /// `inventory::submit!`. An empty effect list declares the operation
    /// pure.
    pub const fn register(
        dialect: &'static str,
        op_name: &'static str,
        effects: &'static [Effect],
    ) -> EffectRegistration {
        EffectRegistration {
            dialect,
            op_name,
            effects,
        }
    }

    /// Declared effects of an operation, or `None` when unregistered.
    pub fn effects(db: &dyn salsa::Database, op: Operation<'_>) -> Option<&'static [Effect]> {
        EFFECT_REGISTRY
            .get(&(op.dialect(db), op.name(db)))
            .copied()
    }

    /// An operation is pure only when it is registered with an empty effect
    /// list. Unregistered operations are conservatively not pure.
    pub fn is_pure(db: &dyn salsa::Database, op: Operation<'_>) -> bool {
        matches!(Self::effects(db, op), Some(effects) if effects.is_empty())
    }
}
