//! IR text format printer.
//!
//! Prints operations in a dialect-qualified textual format designed for
//! round-trip fidelity with the parser in [`super::parser`].
//!
//! # Example output
//!
//! ```text
//! core.module @main {
//!   %0 = sprig.constant {value = 40} : core.i32
//!   %1 = sprig.constant {value = 2} : core.i32
//!   %2 = sprig.binary %0, %1 {kind = @add} : core.i32
//!   sprig.print %2
//! }
//! ```

use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::{Attribute, Operation, Region, Symbol, Type, Value};

// ============================================================================
// Op printer registry (inventory-based)
// ============================================================================

/// Function signature for custom operation printers.
pub type OpPrintFn =
    for<'db> fn(&'db dyn salsa::Database, Operation<'db>, &mut PrintState<'db>) -> fmt::Result;

/// Registration entry for custom operation printers.
pub struct OpPrintRegistration {
    pub dialect: &'static str,
    pub op_name: &'static str,
    pub print: OpPrintFn,
}

inventory::collect!(OpPrintRegistration);

struct OpPrintRegistry {
    printers: HashMap<(Symbol, Symbol), OpPrintFn>,
}

impl OpPrintRegistry {
    fn lookup(&self, dialect: Symbol, op_name: Symbol) -> Option<OpPrintFn> {
        self.printers.get(&(dialect, op_name)).copied()
    }
}

static PRINT_REGISTRY: std::sync::LazyLock<OpPrintRegistry> = std::sync::LazyLock::new(|| {
    let mut printers = HashMap::new();
    for reg in inventory::iter::<OpPrintRegistration> {
        let dialect = Symbol::from_dynamic(reg.dialect);
        let op_name = Symbol::from_dynamic(reg.op_name);
        printers.insert((dialect, op_name), reg.print);
    }
    OpPrintRegistry { printers }
});

// ============================================================================
// Printer State
// ============================================================================

/// IR printer state, managing SSA value numbering.
///
/// Uses a single lifetime since all Salsa data shares the same DB lifetime.
pub struct PrintState<'db> {
    db: &'db dyn salsa::Database,
    /// Maps Value -> printed name (e.g., "%0", "%arg0")
    value_names: HashMap<Value<'db>, String>,
    /// Next sequential value number (within current scope)
    next_value_num: usize,
    /// Output buffer
    pub output: String,
    /// Current indentation level (in spaces, 2-space indent)
    pub indent: usize,
}

impl<'db> PrintState<'db> {
    /// Create a new printer.
    pub fn new(db: &'db dyn salsa::Database) -> Self {
        Self {
            db,
            value_names: HashMap::new(),
            next_value_num: 0,
            output: String::new(),
            indent: 0,
        }
    }

    /// Get the database reference.
    pub fn db(&self) -> &'db dyn salsa::Database {
        self.db
    }

    /// Get the accumulated output.
    pub fn finish(self) -> String {
        self.output
    }

    // ---- Value naming ----

    /// Assign a name to a value (operation result).
    pub fn assign_result_name(&mut self, value: Value<'db>) -> String {
        let name = format!("%{}", self.next_value_num);
        self.next_value_num += 1;
        self.value_names.insert(value, name.clone());
        name
    }

    /// Look up the name for a value (returns owned String to avoid borrow issues).
    pub fn get_value_name(&self, value: Value<'db>) -> String {
        self.value_names
            .get(&value)
            .cloned()
            .unwrap_or_else(|| "%?".to_string())
    }

    // ---- Indentation ----

    pub fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push(' ');
        }
    }

    /// Reset value numbering (for isolated regions).
    pub fn reset_numbering(&mut self) {
        self.next_value_num = 0;
    }

    /// Save current numbering state.
    pub fn save_numbering(&self) -> usize {
        self.next_value_num
    }

    /// Restore numbering state.
    pub fn restore_numbering(&mut self, saved: usize) {
        self.next_value_num = saved;
    }
}

// ============================================================================
// Printing functions
// ============================================================================

/// Print a top-level operation (module or standalone).
fn print_top_level<'db>(state: &mut PrintState<'db>, op: Operation<'db>) -> fmt::Result {
    print_operation(state, op)?;
    state.output.push('\n');
    Ok(())
}

/// Print a single operation (dispatches to custom or generic).
fn print_operation<'db>(state: &mut PrintState<'db>, op: Operation<'db>) -> fmt::Result {
    let db = state.db;
    let dialect = op.dialect(db);
    let op_name = op.name(db);

    if let Some(custom_print) = PRINT_REGISTRY.lookup(dialect, op_name) {
        return custom_print(db, op, state);
    }

    print_operation_generic(state, op)
}

/// Print an operation in generic format.
fn print_operation_generic<'db>(state: &mut PrintState<'db>, op: Operation<'db>) -> fmt::Result {
    let db = state.db;
    let results = op.results(db);
    let operands = op.operands(db);
    let attributes = op.attributes(db);
    let regions = op.regions(db);

    // Results: %0 = or %0, %1 =
    if !results.is_empty() {
        let names: Vec<String> = (0..results.len())
            .map(|i| {
                let value = op.result(db, i);
                state.assign_result_name(value)
            })
            .collect();
        write!(state.output, "{} = ", names.join(", "))?;
    }

    // dialect.op
    write!(state.output, "{}.{}", op.dialect(db), op.name(db))?;

    // Operands: %a, %b
    if !operands.is_empty() {
        state.output.push(' ');
        for (i, &operand) in operands.iter().enumerate() {
            if i > 0 {
                state.output.push_str(", ");
            }
            let name = state.get_value_name(operand);
            state.output.push_str(&name);
        }
    }

    // Attributes: {key = value, ...}
    if !attributes.is_empty() {
        state.output.push_str(" {");
        for (i, (key, value)) in attributes.iter().enumerate() {
            if i > 0 {
                state.output.push_str(", ");
            }
            write!(state.output, "{} = ", key)?;
            print_attribute(state, value)?;
        }
        state.output.push('}');
    }

    // Type annotation: : type1, type2
    if !results.is_empty() {
        state.output.push_str(" : ");
        for (i, result_ty) in results.iter().enumerate() {
            if i > 0 {
                state.output.push_str(", ");
            }
            print_type(state, *result_ty)?;
        }
    }

    // Regions
    for region in regions.iter() {
        state.output.push(' ');
        print_region(state, *region)?;
    }

    Ok(())
}

/// Print a region. Block boundaries are implicit; operations of every block
/// print in order.
fn print_region<'db>(state: &mut PrintState<'db>, region: Region<'db>) -> fmt::Result {
    let db = state.db;

    state.output.push_str("{\n");

    state.indent += 2;
    for block in region.blocks(db).iter() {
        for op in block.operations(db).iter() {
            state.write_indent();
            print_operation(state, *op)?;
            state.output.push('\n');
        }
    }
    state.indent -= 2;

    state.write_indent();
    state.output.push('}');

    Ok(())
}

/// Print a type in dialect-qualified format.
pub fn print_type<'db>(state: &mut PrintState<'db>, ty: Type<'db>) -> fmt::Result {
    let db = state.db;
    let dialect = ty.dialect(db);
    let name = ty.name(db);
    let params = ty.params(db);
    let attrs = ty.attrs(db);

    write!(state.output, "{}.{}", dialect, name)?;

    if !params.is_empty() {
        state.output.push('(');
        for (i, &p) in params.iter().enumerate() {
            if i > 0 {
                state.output.push_str(", ");
            }
            print_type(state, p)?;
        }
        state.output.push(')');
    }

    if !attrs.is_empty() {
        state.output.push_str(" {");
        for (i, (key, value)) in attrs.iter().enumerate() {
            if i > 0 {
                state.output.push_str(", ");
            }
            write!(state.output, "{} = ", key)?;
            print_attribute(state, value)?;
        }
        state.output.push('}');
    }

    Ok(())
}

/// Print an attribute value.
pub fn print_attribute<'db>(state: &mut PrintState<'db>, attr: &Attribute<'db>) -> fmt::Result {
    match attr {
        Attribute::Unit => state.output.push_str("unit"),
        Attribute::Bool(b) => write!(state.output, "{}", b)?,
        // Integer bits hold two's complement, printed signed
        Attribute::IntBits(n) => write!(state.output, "{}", *n as i64)?,
        Attribute::FloatBits(bits) => {
            let f = f64::from_bits(*bits);
            if f.fract() == 0.0 && f.is_finite() {
                write!(state.output, "{:.1}", f)?;
            } else {
                write!(state.output, "{}", f)?;
            }
        }
        Attribute::String(s) => {
            write!(
                state.output,
                "\"{}\"",
                s.replace('\\', "\\\\").replace('"', "\\\"")
            )?;
        }
        Attribute::Type(ty) => print_type(state, *ty)?,
        Attribute::Symbol(sym) => print_symbol(state, *sym)?,
        Attribute::List(items) => {
            state.output.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    state.output.push_str(", ");
                }
                print_attribute(state, item)?;
            }
            state.output.push(']');
        }
    }
    Ok(())
}

/// Print a symbol reference (@ prefix).
///
/// Symbols made of `[a-zA-Z0-9_]` print bare; anything else prints in quoted
/// form with string-literal escapes so the parser can read it back.
pub fn print_symbol(state: &mut PrintState<'_>, sym: Symbol) -> fmt::Result {
    sym.with_str(|s| {
        let bare = !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if bare {
            write!(state.output, "@{}", s)
        } else {
            write!(
                state.output,
                "@\"{}\"",
                s.replace('\\', "\\\\").replace('"', "\\\"")
            )
        }
    })
}

// ============================================================================
// Public API
// ============================================================================

/// Print an operation to a string in textual format.
pub fn print_op(db: &dyn salsa::Database, op: Operation<'_>) -> String {
    let mut state = PrintState::new(db);
    print_top_level(&mut state, op).expect("printing should not fail");
    state.finish()
}

/// Print a type to a string. Used by constraint diagnostics.
pub fn type_to_string(db: &dyn salsa::Database, ty: Type<'_>) -> String {
    let mut state = PrintState::new(db);
    print_type(&mut state, ty).expect("printing should not fail");
    state.finish()
}

// ============================================================================
// Custom printers for core operations
// ============================================================================

// core.module custom printer
inventory::submit! {
    OpPrintRegistration {
        dialect: "core",
        op_name: "module",
        print: print_core_module,
    }
}

fn print_core_module<'db>(
    db: &'db dyn salsa::Database,
    op: Operation<'db>,
    state: &mut PrintState<'db>,
) -> fmt::Result {
    let attrs = op.attributes(db);
    let name = attrs
        .get(&crate::dialect::core::ATTR_SYM_NAME())
        .and_then(|a| match a {
            Attribute::Symbol(s) => Some(*s),
            _ => None,
        });

    state.output.push_str("core.module");
    if let Some(sym) = name {
        state.output.push(' ');
        print_symbol(state, sym)?;
    }

    // Save and reset numbering for isolated region
    let saved = state.save_numbering();
    state.reset_numbering();

    let regions = op.regions(db);
    if let Some(region) = regions.first() {
        state.output.push(' ');
        print_region(state, *region)?;
    }

    state.restore_numbering(saved);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DialectOp, DialectType, Location, PathId, Span,
        dialect::{core, sprig},
    };

    fn attach<R>(f: impl FnOnce(&salsa::DatabaseImpl) -> R) -> R {
        salsa::Database::attach(&salsa::DatabaseImpl::default(), f)
    }

    #[salsa::tracked]
    fn build_simple_module(db: &dyn salsa::Database) -> Operation<'_> {
        let path = PathId::new(db, "file:///test.sg".to_owned());
        let location = Location::new(path, Span::new(0, 0));
        let i32_ty = core::I32::new(db).as_type();

        core::Module::build(db, location, "main".into(), |top| {
            let c0 = top.op(sprig::Constant::int(db, location, i32_ty, 40));
            let c1 = top.op(sprig::Constant::int(db, location, i32_ty, 2));
            let sum = top.op(sprig::Binary::of_kind(
                db,
                location,
                sprig::BinaryKind::Add,
                c0.result(db),
                c1.result(db),
                i32_ty,
            ));
            top.op(sprig::print(db, location, sum.result(db)));
        })
        .as_operation()
    }

    #[test]
    fn print_simple_module() {
        attach(|db| {
            let op = build_simple_module(db);
            let text = print_op(db, op);
            insta::assert_snapshot!(text, @r#"
            core.module @main {
              %0 = sprig.constant {value = 40} : core.i32
              %1 = sprig.constant {value = 2} : core.i32
              %2 = sprig.binary %0, %1 {kind = @add} : core.i32
              sprig.print %2
            }
            "#);
        });
    }

    #[salsa::tracked]
    fn build_sample_op(db: &dyn salsa::Database) -> Operation<'_> {
        let path = PathId::new(db, "file:///test.sg".to_owned());
        let location = Location::new(path, Span::new(0, 0));
        let f32_ty = core::F32::new(db).as_type();
        let memref_ty = core::Memref::new(
            db,
            f32_ty,
            Attribute::from(vec![2i64.into(), 3i64.into()]),
        );

        core::Module::build(db, location, "samples".into(), |top| {
            let source = top.raw_op(
                Operation::of(
                    db,
                    location,
                    Symbol::new("sprig"),
                    Symbol::new("constant"),
                )
                .attr("value", Attribute::Unit)
                .result(memref_ty.as_type())
                .build(),
            );
            top.op(sprig::sample(
                db,
                location,
                source.result(db, 0),
                f32_ty,
                Attribute::from(vec![0i64.into(), 1i64.into()]),
            ));
        })
        .as_operation()
    }

    #[test]
    fn print_parameterized_types_and_lists() {
        attach(|db| {
            let op = build_sample_op(db);
            let text = print_op(db, op);
            insta::assert_snapshot!(text, @r#"
            core.module @samples {
              %0 = sprig.constant {value = unit} : core.memref(core.f32) {shape = [2, 3]}
              %1 = sprig.sample %0 {coords = [0, 1]} : core.f32
            }
            "#);
        });
    }

    #[test]
    fn negative_integers_print_signed() {
        attach(|db| {
            let mut state = PrintState::new(db);
            print_attribute(&mut state, &Attribute::from(-7i64)).unwrap();
            assert_eq!(state.finish(), "-7");
        });
    }

    #[test]
    fn quoted_symbols() {
        attach(|db| {
            let mut state = PrintState::new(db);
            print_symbol(&mut state, Symbol::new("std::io")).unwrap();
            assert_eq!(state.finish(), "@\"std::io\"");
        });
    }

    #[test]
    fn symbols_outside_bare_set_print_quoted_and_escaped() {
        attach(|db| {
            let cases = [
                ("a,b", "@\"a,b\""),
                ("say\"hi\"", "@\"say\\\"hi\\\"\""),
                ("back\\slash", "@\"back\\\\slash\""),
                ("", "@\"\""),
            ];
            for (text, expected) in cases {
                let mut state = PrintState::new(db);
                print_symbol(&mut state, Symbol::from_dynamic(text)).unwrap();
                assert_eq!(state.finish(), expected, "failed for symbol: {:?}", text);
            }
        });
    }

    #[test]
    fn type_to_string_qualifies_dialect() {
        attach(|db| {
            let i32_ty = core::I32::new(db).as_type();
            assert_eq!(type_to_string(db, i32_ty), "core.i32");
        });
    }
}
