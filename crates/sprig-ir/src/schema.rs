//! Operation schemas and the verifier.
//!
//! Every operation a dialect defines is described by a static [`OpSchema`]
//! collected through [`inventory`] into a process-wide [`SchemaRegistry`].
//! The registry is built once on first use and never mutated afterwards, so
//! verification is pure and safe to run from any thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use derive_more::{Display, Error};

use crate::constraint::{AttrConstraint, TypeConstraint};
use crate::ir::{Operation, Symbol};

/// Schema for one operand slot.
pub struct OperandSchema {
    pub name: &'static str,
    pub constraint: TypeConstraint,
}

/// Schema for one result slot.
pub struct ResultSchema {
    pub name: &'static str,
    pub constraint: TypeConstraint,
}

/// Schema for one attribute.
pub struct AttrSchema {
    pub name: &'static str,
    pub constraint: AttrConstraint,
    pub required: bool,
}

/// Structural traits an operation can declare.
///
/// Traits are checked after arity, type, and attribute constraints, in the
/// order they appear in the schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpTrait {
    /// All operand and result types are identical.
    SameOperandAndResultType,
    /// Operands commute. Carries no check of its own; folds and rewrites may
    /// consult it.
    Commutative,
    /// The operation may only appear last in a block.
    Terminator,
    /// The operation has no regions.
    ZeroRegions,
}

impl OpTrait {
    pub fn name(self) -> &'static str {
        match self {
            OpTrait::SameOperandAndResultType => "SameOperandAndResultType",
            OpTrait::Commutative => "Commutative",
            OpTrait::Terminator => "Terminator",
            OpTrait::ZeroRegions => "ZeroRegions",
        }
    }
}

/// Full schema for one operation.
///
/// `variadic` marks the trailing operand slot as repeatable: the operation
/// accepts at least `operands.len() - 1` operands, and every extra operand is
/// checked against the last slot's constraint.
pub struct OpSchema {
    pub dialect: &'static str,
    pub name: &'static str,
    pub operands: &'static [OperandSchema],
    pub variadic: bool,
    pub results: &'static [ResultSchema],
    pub attrs: &'static [AttrSchema],
    pub traits: &'static [OpTrait],
}

impl OpSchema {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.dialect, self.name)
    }

    pub fn has_trait(&self, t: OpTrait) -> bool {
        self.traits.contains(&t)
    }
}

/// Link-time registration of a schema.
pub struct SchemaRegistration {
    pub schema: OpSchema,
}

inventory::collect!(SchemaRegistration);

/// Which slot of an operation a type constraint failed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Operand,
    Result,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Operand => f.write_str("operand"),
            ValueKind::Result => f.write_str("result"),
        }
    }
}

/// Verification failure for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum VerifyError {
    /// No schema is registered under the operation's name.
    #[display("unknown operation '{dialect}.{name}'")]
    UnknownOperation { dialect: String, name: String },

    /// Operand count does not match the schema.
    #[display("'{op}' expects {expected} operands, found {actual}")]
    OperandArityMismatch {
        op: String,
        expected: String,
        actual: usize,
    },

    /// Result count does not match the schema.
    #[display("'{op}' expects {expected} results, found {actual}")]
    ResultArityMismatch {
        op: String,
        expected: usize,
        actual: usize,
    },

    /// An operand or result type was rejected by its constraint.
    #[display("'{op}' {kind} #{index} ('{name}'): {reason}")]
    TypeConstraintViolation {
        op: String,
        kind: ValueKind,
        index: usize,
        name: &'static str,
        reason: String,
    },

    /// A required attribute is absent.
    #[display("'{op}' is missing required attribute '{attr}'")]
    MissingAttribute { op: String, attr: &'static str },

    /// An attribute value was rejected by its constraint.
    #[display("'{op}' attribute '{attr}': {reason}")]
    AttributeConstraintViolation {
        op: String,
        attr: &'static str,
        reason: String,
    },

    /// An attribute the schema does not name is present.
    #[display("'{op}' has unexpected attribute '{attr}'")]
    UnexpectedAttribute { op: String, attr: String },

    /// A structural trait does not hold.
    #[display("'{op}' violates {trait_name}: {reason}")]
    TraitViolation {
        op: String,
        trait_name: &'static str,
        reason: String,
    },
}

/// Collected verification errors for an operation tree.
#[derive(Debug, Default)]
pub struct VerifyReport {
    pub errors: Vec<VerifyError>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("ok");
        }
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Registry of all operation schemas linked into the binary.
pub struct SchemaRegistry {
    schemas: HashMap<(Symbol, Symbol), &'static OpSchema>,
}

static REGISTRY: LazyLock<SchemaRegistry> = LazyLock::new(|| {
    let mut schemas = HashMap::new();
    for reg in inventory::iter::<SchemaRegistration> {
        let schema = &reg.schema;
        let key = (Symbol::new(schema.dialect), Symbol::new(schema.name));
        if schemas.insert(key, schema).is_some() {
            panic!(
                "duplicate operation schema registration for {}",
                schema.full_name()
            );
        }
    }
    SchemaRegistry { schemas }
});

/// The process-wide schema registry.
pub fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

impl SchemaRegistry {
    /// Look up the schema for `dialect.name`.
    pub fn lookup(&self, dialect: Symbol, name: Symbol) -> Result<&'static OpSchema, VerifyError> {
        self.schemas
            .get(&(dialect, name))
            .copied()
            .ok_or_else(|| VerifyError::UnknownOperation {
                dialect: dialect.to_string(),
                name: name.to_string(),
            })
    }

    /// Verify one operation against its schema.
    ///
    /// Checks run in a fixed order and stop at the first failure: operand
    /// arity, result arity, operand types, result types, attributes, then
    /// structural traits. The `Terminator` trait is positional and checked in
    /// [`verify_all`], not here.
    pub fn verify<'db>(
        &self,
        db: &'db dyn salsa::Database,
        op: Operation<'db>,
    ) -> Result<(), VerifyError> {
        let schema = self.lookup(op.dialect(db), op.name(db))?;
        let op_name = schema.full_name();

        let operands = op.operands(db);
        if schema.variadic {
            let min = schema.operands.len().saturating_sub(1);
            if operands.len() < min {
                return Err(VerifyError::OperandArityMismatch {
                    op: op_name,
                    expected: format!("at least {}", min),
                    actual: operands.len(),
                });
            }
        } else if operands.len() != schema.operands.len() {
            return Err(VerifyError::OperandArityMismatch {
                op: op_name,
                expected: schema.operands.len().to_string(),
                actual: operands.len(),
            });
        }

        let results = op.results(db);
        if results.len() != schema.results.len() {
            return Err(VerifyError::ResultArityMismatch {
                op: op_name,
                expected: schema.results.len(),
                actual: results.len(),
            });
        }

        for (index, value) in operands.iter().enumerate() {
            // Extra variadic operands reuse the last slot's schema. A variadic
            // schema with no declared slots constrains nothing.
            let Some(slot) = schema.operands.get(index).or_else(|| schema.operands.last())
            else {
                break;
            };
            slot.constraint.check(db, value.ty(db)).map_err(|err| {
                VerifyError::TypeConstraintViolation {
                    op: op_name.clone(),
                    kind: ValueKind::Operand,
                    index,
                    name: slot.name,
                    reason: err.reason,
                }
            })?;
        }

        for (index, ty) in results.iter().enumerate() {
            let slot = &schema.results[index];
            slot.constraint.check(db, *ty).map_err(|err| {
                VerifyError::TypeConstraintViolation {
                    op: op_name.clone(),
                    kind: ValueKind::Result,
                    index,
                    name: slot.name,
                    reason: err.reason,
                }
            })?;
        }

        let attrs = op.attributes(db);
        for attr_schema in schema.attrs {
            let key = Symbol::new(attr_schema.name);
            match attrs.get(&key) {
                Some(value) => {
                    attr_schema.constraint.check(db, value).map_err(|err| {
                        VerifyError::AttributeConstraintViolation {
                            op: op_name.clone(),
                            attr: attr_schema.name,
                            reason: err.reason,
                        }
                    })?;
                }
                None if attr_schema.required => {
                    return Err(VerifyError::MissingAttribute {
                        op: op_name,
                        attr: attr_schema.name,
                    });
                }
                None => {}
            }
        }

        // Attributes the schema does not name are rejected
        for key in attrs.keys() {
            if !schema.attrs.iter().any(|a| *key == a.name) {
                return Err(VerifyError::UnexpectedAttribute {
                    op: op_name,
                    attr: key.to_string(),
                });
            }
        }

        for t in schema.traits {
            match t {
                OpTrait::SameOperandAndResultType => {
                    let mut types = operands
                        .iter()
                        .map(|v| v.ty(db))
                        .chain(results.iter().copied());
                    if let Some(first) = types.next()
                        && types.any(|ty| ty != first)
                    {
                        return Err(VerifyError::TraitViolation {
                            op: op_name,
                            trait_name: t.name(),
                            reason: "operand and result types differ".to_string(),
                        });
                    }
                }
                OpTrait::ZeroRegions => {
                    let regions = op.regions(db).len();
                    if regions != 0 {
                        return Err(VerifyError::TraitViolation {
                            op: op_name,
                            trait_name: t.name(),
                            reason: format!("expected no regions, found {}", regions),
                        });
                    }
                }
                // Positional, checked during block walks
                OpTrait::Terminator => {}
                // Advisory, nothing to check
                OpTrait::Commutative => {}
            }
        }

        Ok(())
    }
}

/// Verify an operation and everything nested inside it, pre-order.
///
/// Unlike [`SchemaRegistry::verify`] this does not stop at the first error;
/// every operation in the tree contributes its failures to the report. A
/// `Terminator` operation anywhere but the last position of its block is
/// reported here.
pub fn verify_all<'db>(db: &'db dyn salsa::Database, op: Operation<'db>) -> VerifyReport {
    let mut report = VerifyReport::default();
    verify_into(db, op, &mut report);
    report
}

fn verify_into<'db>(db: &'db dyn salsa::Database, op: Operation<'db>, report: &mut VerifyReport) {
    if let Err(error) = registry().verify(db, op) {
        report.errors.push(error);
    }
    for region in op.regions(db) {
        for block in region.blocks(db) {
            let ops = block.operations(db);
            for (index, &nested) in ops.iter().enumerate() {
                if index + 1 < ops.len()
                    && let Ok(schema) = registry().lookup(nested.dialect(db), nested.name(db))
                    && schema.has_trait(OpTrait::Terminator)
                {
                    report.errors.push(VerifyError::TraitViolation {
                        op: schema.full_name(),
                        trait_name: OpTrait::Terminator.name(),
                        reason: "terminator is not the last operation in its block".to_string(),
                    });
                }
                verify_into(db, nested, report);
            }
        }
    }
}
