//! IR text format parser.
//!
//! Parses the textual IR format produced by [`super::printer`] back into
//! Salsa-tracked IR structures. Uses winnow for parsing.
//!
//! # Two-stage parsing
//!
//! 1. **Raw parse**: winnow combinators parse text into `Raw*` structures
//!    (strings, not Salsa-tracked).
//! 2. **IR build**: `Raw*` structures are converted to Salsa `Operation`,
//!    `Block`, `Region`, etc., resolving SSA value names.
//!
//! # Salsa context
//!
//! Building creates Salsa tracked structs, so [`parse_module`] **must** be
//! called from within a `#[salsa::tracked]` function context.

pub(crate) mod raw;

use std::collections::BTreeMap;

use winnow::prelude::*;

pub use raw::ParseError;
use raw::*;

use crate::constraint::AttrConstraint;
use crate::dialect::core::ATTR_SYM_NAME;
use crate::op_interface::InferResults;
use crate::{
    Attribute, Block, IdVec, Location, Operation, PathId, Region, Span, Symbol, Type, Value,
};

/// Options controlling how textual IR is resolved.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// When an operation declares result names but no `: type` annotation,
    /// infer the result types through the type inference interface instead of
    /// rejecting the input. Operations without a registered inference
    /// function are still rejected.
    pub infer_missing_result_types: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            infer_missing_result_types: true,
        }
    }
}

// ============================================================================
// IR Builder (Raw -> Salsa-tracked IR)
// ============================================================================

struct IrBuilder<'db, 'src> {
    db: &'db dyn salsa::Database,
    location: Location<'db>,
    /// The full source text, for computing error offsets.
    source: &'src str,
    /// Maps value name (without %) -> Value
    value_map: std::collections::HashMap<String, Value<'db>>,
    options: ParseOptions,
}

impl<'db, 'src> IrBuilder<'db, 'src> {
    fn new(db: &'db dyn salsa::Database, source: &'src str, options: ParseOptions) -> Self {
        let path = PathId::new(db, "textual-ir".to_owned());
        let location = Location::new(path, Span::new(0, 0));
        Self {
            db,
            location,
            source,
            value_map: std::collections::HashMap::new(),
            options,
        }
    }

    /// Byte offset of `token` in the source text. Tokens produced by the raw
    /// parser are subslices of the source, so pointer distance is the offset.
    fn offset_of(&self, token: &str) -> usize {
        (token.as_ptr() as usize).saturating_sub(self.source.as_ptr() as usize)
    }

    fn build_type(&self, raw: &RawType<'_>) -> Type<'db> {
        let dialect = Symbol::from_dynamic(raw.dialect);
        let name = Symbol::from_dynamic(raw.name);
        let params: IdVec<Type<'db>> = raw.params.iter().map(|p| self.build_type(p)).collect();
        let attrs: BTreeMap<Symbol, Attribute<'db>> = raw
            .attrs
            .iter()
            .map(|e| (Symbol::from_dynamic(e.key), self.build_attribute(&e.value)))
            .collect();
        Type::new(self.db, dialect, name, params, attrs)
    }

    fn build_attribute(&self, raw: &RawAttribute<'_>) -> Attribute<'db> {
        match raw {
            RawAttribute::Bool(b) => Attribute::Bool(*b),
            RawAttribute::Int(n) => Attribute::IntBits(*n),
            RawAttribute::Float(f) => Attribute::FloatBits(f.to_bits()),
            RawAttribute::String(s) => Attribute::String(s.clone()),
            RawAttribute::Symbol(s) => Attribute::Symbol(Symbol::from_dynamic(s.as_str())),
            RawAttribute::Type(t) => Attribute::Type(self.build_type(t)),
            RawAttribute::List(items) => {
                Attribute::List(items.iter().map(|a| self.build_attribute(a)).collect())
            }
            RawAttribute::Unit => Attribute::Unit,
        }
    }

    fn resolve_value(&self, name: &str) -> Option<Value<'db>> {
        self.value_map.get(name).copied()
    }

    /// Snapshot the `value_map` so it can be restored after leaving a region.
    /// Outer names stay visible inside the region, but names introduced
    /// inside are region-local and must not leak into the enclosing scope.
    fn save_value_map(&self) -> std::collections::HashMap<String, Value<'db>> {
        self.value_map.clone()
    }

    fn restore_value_map(&mut self, saved: std::collections::HashMap<String, Value<'db>>) {
        self.value_map = saved;
    }

    fn build_region(&mut self, raw: &RawRegion<'_>) -> Result<Region<'db>, ParseError> {
        let saved_values = self.save_value_map();
        let ops: IdVec<Operation<'db>> = raw
            .ops
            .iter()
            .map(|op| self.build_operation(op))
            .collect::<Result<_, _>>()?;
        let block = Block::new(self.db, self.location, IdVec::new(), ops);
        let region = Region::new(self.db, self.location, crate::idvec![block]);
        self.restore_value_map(saved_values);
        Ok(region)
    }

    fn build_operation(&mut self, raw: &RawOperation<'_>) -> Result<Operation<'db>, ParseError> {
        let dialect = Symbol::from_dynamic(raw.dialect);
        let op_name = Symbol::from_dynamic(raw.op_name);

        // Resolve operands
        let operands: IdVec<Value<'db>> = raw
            .operands
            .iter()
            .map(|name| {
                self.resolve_value(name).ok_or_else(|| ParseError {
                    message: format!(
                        "undefined value '%{}' in operation '{}.{}'",
                        name, raw.dialect, raw.op_name
                    ),
                    offset: self.offset_of(name),
                })
            })
            .collect::<Result<_, _>>()?;

        // Build attributes from explicit attr dict
        let mut attributes: BTreeMap<Symbol, Attribute<'db>> = raw
            .attributes
            .iter()
            .map(|e| (Symbol::from_dynamic(e.key), self.build_attribute(&e.value)))
            .collect();

        // Add sym_name attribute if present
        if let Some(ref name) = raw.sym_name {
            attributes.insert(
                ATTR_SYM_NAME(),
                Attribute::Symbol(Symbol::from_dynamic(name.as_str())),
            );
        }

        // Attributes drawn from a closed symbol set are checked here rather
        // than left to the verifier, so a bad mnemonic fails at parse time
        // with the token's position.
        if let Ok(schema) = crate::schema::registry().lookup(dialect, op_name) {
            for entry in &raw.attributes {
                let Some(attr_schema) = schema.attrs.iter().find(|a| a.name == entry.key) else {
                    continue;
                };
                if !matches!(attr_schema.constraint, AttrConstraint::OneOfSymbols(_)) {
                    continue;
                }
                let key = Symbol::from_dynamic(entry.key);
                if let Some(value) = attributes.get(&key)
                    && let Err(err) = attr_schema.constraint.check(self.db, value)
                {
                    return Err(ParseError {
                        message: format!(
                            "operation '{}.{}' attribute '{}': {}",
                            raw.dialect, raw.op_name, entry.key, err.reason
                        ),
                        offset: self.offset_of(entry.src),
                    });
                }
            }
        }

        // Build result types; absent annotations may be inferred
        let results: IdVec<Type<'db>> = if raw.result_types.is_empty() && !raw.results.is_empty() {
            if !self.options.infer_missing_result_types {
                return Err(ParseError {
                    message: format!(
                        "operation '{}.{}' declares {} result names but no result types",
                        raw.dialect,
                        raw.op_name,
                        raw.results.len()
                    ),
                    offset: self.offset_of(raw.dialect),
                });
            }
            let operand_types: Vec<Type<'db>> =
                operands.iter().map(|v| v.ty(self.db)).collect();
            InferResults::infer(self.db, dialect, op_name, &operand_types, &attributes).map_err(
                |err| ParseError {
                    message: err.to_string(),
                    offset: self.offset_of(raw.dialect),
                },
            )?
        } else {
            raw.result_types.iter().map(|t| self.build_type(t)).collect()
        };

        // Build regions
        let regions: IdVec<Region<'db>> = raw
            .regions
            .iter()
            .map(|r| self.build_region(r))
            .collect::<Result<_, _>>()?;

        // Validate result name count matches result types (declared or
        // inferred). This catches mismatches like 2 names vs 1 type.
        if !raw.results.is_empty() && raw.results.len() != results.len() {
            return Err(ParseError {
                message: format!(
                    "operation '{}.{}' declares {} result names but {} result types",
                    raw.dialect,
                    raw.op_name,
                    raw.results.len(),
                    results.len()
                ),
                offset: self.offset_of(raw.results[0]),
            });
        }

        let op = Operation::of(self.db, self.location, dialect, op_name)
            .operands(operands)
            .results(results)
            .attrs(attributes)
            .regions(regions)
            .build();

        // Register result values, rejecting duplicates within the region
        for (i, name) in raw.results.iter().enumerate() {
            if self.value_map.contains_key(*name) {
                return Err(ParseError {
                    message: format!(
                        "duplicate SSA name '{}' in operation '{}.{}' result index {}",
                        name, raw.dialect, raw.op_name, i
                    ),
                    offset: self.offset_of(name),
                });
            }
            let value = op.result(self.db, i);
            self.value_map.insert(name.to_string(), value);
        }

        Ok(op)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse an IR module from its textual representation with default options.
pub fn parse_module<'db>(
    db: &'db dyn salsa::Database,
    input: &str,
) -> Result<Operation<'db>, ParseError> {
    parse_module_with(db, input, ParseOptions::default())
}

/// Parse an IR module from its textual representation.
pub fn parse_module_with<'db>(
    db: &'db dyn salsa::Database,
    input: &str,
    options: ParseOptions,
) -> Result<Operation<'db>, ParseError> {
    let mut remaining = input;
    ws.parse_next(&mut remaining).map_err(|e| ParseError {
        message: format!("lexer error: {}", e),
        offset: input.len() - remaining.len(),
    })?;

    // Parse the top-level operation
    let raw_op = raw_operation
        .parse_next(&mut remaining)
        .map_err(|e| ParseError {
            message: format!("parse error: {}", e),
            offset: input.len() - remaining.len(),
        })?;

    // Reject trailing input
    ws.parse_next(&mut remaining).map_err(|e| ParseError {
        message: format!("lexer error: {}", e),
        offset: input.len() - remaining.len(),
    })?;
    if !remaining.is_empty() {
        return Err(ParseError {
            message: "trailing input after top-level operation".to_string(),
            offset: input.len() - remaining.len(),
        });
    }

    // Build IR
    let mut builder = IrBuilder::new(db, input, options);
    builder.build_operation(&raw_op)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DialectOp, dialect::core, printer::print_op};
    use salsa::Database;

    // Salsa input to hold text for tracked function parsing
    #[salsa::input]
    struct TextInput {
        #[returns(ref)]
        text: String,
    }

    // Tracked wrapper: Salsa requires tracked struct creation inside tracked functions
    #[salsa::tracked]
    fn do_parse(db: &dyn salsa::Database, input: TextInput) -> Operation<'_> {
        parse_module(db, input.text(db)).expect("should parse")
    }

    /// Tracked wrapper that preserves the error message and offset, for
    /// testing parse failures that occur after tracked structs have already
    /// been created.
    #[salsa::tracked]
    fn try_parse_err(db: &dyn salsa::Database, input: TextInput) -> Option<(String, usize)> {
        parse_module(db, input.text(db))
            .err()
            .map(|e| (e.message, e.offset))
    }

    /// Like [`try_parse_err`] but with inference disabled.
    #[salsa::tracked]
    fn try_parse_err_no_infer(
        db: &dyn salsa::Database,
        input: TextInput,
    ) -> Option<(String, usize)> {
        parse_module_with(
            db,
            input.text(db),
            ParseOptions {
                infer_missing_result_types: false,
            },
        )
        .err()
        .map(|e| (e.message, e.offset))
    }

    /// Parse and print, for round-trip checks.
    #[salsa::tracked]
    fn parse_and_print(db: &dyn salsa::Database, input: TextInput) -> String {
        let op = parse_module(db, input.text(db)).expect("should parse");
        print_op(db, op)
    }

    /// Helper: parse textual IR, print it, re-parse, re-print, and assert
    /// the two printed forms are identical. Returns the canonical printed
    /// form.
    fn assert_roundtrip(db: &salsa::DatabaseImpl, input: &str) -> String {
        let printed1 = parse_and_print(db, TextInput::new(db, input.to_string()));
        let printed2 = parse_and_print(db, TextInput::new(db, printed1.clone()));
        assert_eq!(printed1, printed2, "round-trip mismatch");
        printed1
    }

    #[test]
    fn test_parse_simple_module() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let input = TextInput::new(
                db,
                concat!(
                    "core.module @main {\n",
                    "  %0 = sprig.constant {value = 40} : core.i32\n",
                    "  %1 = sprig.constant {value = 2} : core.i32\n",
                    "  %2 = sprig.binary %0, %1 {kind = @add} : core.i32\n",
                    "  sprig.print %2\n",
                    "}",
                )
                .to_string(),
            );

            let op = do_parse(db, input);
            let module = core::Module::from_operation(db, op).expect("should be a module");
            assert_eq!(module.name(db).to_string(), "main");

            // Verify round-trip: print -> re-parse -> print -> compare
            let printed = parse_and_print(db, input);
            let printed2 = parse_and_print(db, TextInput::new(db, printed.clone()));
            assert_eq!(printed, printed2, "round-trip failed");
        });
    }

    #[test]
    fn test_roundtrip_memref_and_lists() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let printed = assert_roundtrip(
                db,
                concat!(
                    "core.module @samples {\n",
                    "  %0 = sprig.constant {value = unit} : core.memref(core.f32) {shape = [2, 3]}\n",
                    "  %1 = sprig.sample %0 {coords = [0, 1]} : core.f32\n",
                    "}",
                ),
            );
            assert!(printed.contains("core.memref(core.f32) {shape = [2, 3]}"));
        });
    }

    #[test]
    fn test_roundtrip_attribute_kinds() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            assert_roundtrip(
                db,
                concat!(
                    "core.module @attrs {\n",
                    "  %0 = sprig.constant {value = -7} : core.i64\n",
                    "  %1 = sprig.constant {value = 2.5} : core.f64\n",
                    "  %2 = sprig.constant {value = \"line1\\nline2\"} : core.string\n",
                    "  %3 = sprig.constant {value = true} : core.i1\n",
                    "}",
                ),
            );
        });
    }

    #[test]
    fn test_infer_missing_result_type() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            // %2 has no type annotation; sprig.binary infers from operands
            let input = TextInput::new(
                db,
                concat!(
                    "core.module @main {\n",
                    "  %0 = sprig.constant {value = 40} : core.i32\n",
                    "  %1 = sprig.constant {value = 2} : core.i32\n",
                    "  %2 = sprig.binary %0, %1 {kind = @add}\n",
                    "}",
                )
                .to_string(),
            );
            let printed = parse_and_print(db, input);
            // Inference filled in the type; printing makes it explicit
            assert!(
                printed.contains("%2 = sprig.binary %0, %1 {kind = @add} : core.i32"),
                "inferred type should print explicitly, got:\n{}",
                printed
            );
        });
    }

    #[test]
    fn test_infer_sample_result_from_memref_element() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let input = TextInput::new(
                db,
                concat!(
                    "core.module @main {\n",
                    "  %0 = sprig.constant {value = unit} : core.memref(core.f32) {shape = [4, 4]}\n",
                    "  %1 = sprig.sample %0 {coords = [1, 2]}\n",
                    "}",
                )
                .to_string(),
            );
            let printed = parse_and_print(db, input);
            assert!(
                printed.contains("%1 = sprig.sample %0 {coords = [1, 2]} : core.f32"),
                "sample result should infer element type, got:\n{}",
                printed
            );
        });
    }

    #[test]
    fn test_inference_disabled_rejects_missing_types() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let text = concat!(
                "core.module @main {\n",
                "  %0 = sprig.constant {value = 1} : core.i32\n",
                "  %1 = sprig.binary %0, %0 {kind = @add}\n",
                "}",
            );
            let input = TextInput::new(db, text.to_string());
            let (err, offset) = try_parse_err_no_infer(db, input)
                .expect("should fail without inference");
            assert!(
                err.contains("no result types"),
                "unexpected error: {}",
                err
            );
            assert_eq!(offset, text.find("sprig.binary").unwrap());
        });
    }

    #[test]
    fn test_uninferrable_op_rejected() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            // sprig.constant has no inference registration, so a missing type
            // annotation is an error even with inference enabled
            let text = concat!(
                "core.module @main {\n",
                "  %0 = sprig.constant {value = 1}\n",
                "}",
            );
            let input = TextInput::new(db, text.to_string());
            let (err, offset) = try_parse_err(db, input).expect("should fail");
            assert!(
                err.contains("no result type inference registered"),
                "unexpected error: {}",
                err
            );
            assert_eq!(offset, text.find("sprig.constant").unwrap());
        });
    }

    #[test]
    fn test_parse_trailing_input() {
        let db = salsa::DatabaseImpl::default();
        let result: Result<(), ParseError> = db.attach(|db| {
            parse_module(
                db,
                "core.module @main {\n  sprig.print %0\n} garbage",
            )
            .map(|_| ())
        });
        let err = result.expect_err("should fail on trailing input");
        assert!(
            err.message.contains("trailing input"),
            "unexpected error: {}",
            err.message
        );
        assert!(err.offset > 0, "offset should point past the module");
    }

    #[test]
    fn test_parse_undefined_operand() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let text = concat!(
                "core.module @main {\n",
                "  %0 = sprig.binary %x, %y {kind = @add} : core.i32\n",
                "}",
            );
            let input = TextInput::new(db, text.to_string());
            let (err, offset) = try_parse_err(db, input).expect("should fail on undefined operand");
            assert!(
                err.contains("%x"),
                "error should mention the undefined value: {}",
                err
            );
            assert!(
                err.contains("sprig.binary"),
                "error should mention the operation: {}",
                err
            );
            assert_eq!(offset, text.find("%x").unwrap() + 1);
        });
    }

    #[test]
    fn test_parse_result_count_mismatch() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let text = concat!(
                "core.module @main {\n",
                "  %0, %1 = sprig.constant {value = 1} : core.i32\n",
                "}",
            );
            let input = TextInput::new(db, text.to_string());
            let (err, offset) = try_parse_err(db, input).expect("should fail on result count mismatch");
            assert!(
                err.contains("result names") && err.contains("result types"),
                "unexpected error: {}",
                err
            );
            assert_eq!(offset, text.find("%0, %1").unwrap() + 1);
        });
    }

    #[test]
    fn test_parse_duplicate_result_name() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let text = concat!(
                "core.module @main {\n",
                "  %0 = sprig.constant {value = 1} : core.i32\n",
                "  %0 = sprig.constant {value = 2} : core.i32\n",
                "}",
            );
            let input = TextInput::new(db, text.to_string());
            let (err, offset) = try_parse_err(db, input).expect("should fail on duplicate SSA name");
            assert!(
                err.contains("duplicate SSA name"),
                "unexpected error: {}",
                err
            );
            assert_eq!(offset, text.rfind("%0").unwrap() + 1);
        });
    }

    #[test]
    fn test_sibling_regions_do_not_share_names() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            // Two sibling modules nested in an outer module, each with %0.
            assert_roundtrip(
                db,
                concat!(
                    "core.module @outer {\n",
                    "  core.module @a {\n",
                    "    %0 = sprig.constant {value = 1} : core.i32\n",
                    "  }\n",
                    "  core.module @b {\n",
                    "    %0 = sprig.constant {value = 2} : core.i32\n",
                    "  }\n",
                    "}",
                ),
            );
        });
    }

    #[test]
    fn test_quoted_symbol_roundtrip() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let printed = assert_roundtrip(
                db,
                concat!(
                    "core.module @\"my.module\" {\n",
                    "  %0 = sprig.constant {value = 1} : core.i32\n",
                    "}",
                ),
            );
            assert!(printed.contains("@\"my.module\""));
        });
    }

    #[test]
    fn test_quoted_symbol_with_comma_roundtrip() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let printed = assert_roundtrip(
                db,
                concat!(
                    "core.module @\"a,b\" {\n",
                    "  %0 = sprig.constant {value = 1} : core.i32\n",
                    "}",
                ),
            );
            assert!(printed.contains("@\"a,b\""));
        });
    }

    #[test]
    fn test_quoted_symbol_with_embedded_quote_roundtrip() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let printed = assert_roundtrip(
                db,
                concat!(
                    "core.module @\"say\\\"hi\\\"\" {\n",
                    "  %0 = sprig.constant {value = 1} : core.i32\n",
                    "}",
                ),
            );
            assert!(printed.contains("@\"say\\\"hi\\\"\""));
        });
    }

    #[test]
    fn test_unknown_enum_mnemonic_fails_at_parse() {
        let db = salsa::DatabaseImpl::default();
        db.attach(|db| {
            let text = concat!(
                "core.module @main {\n",
                "  %0 = sprig.constant {value = 1} : core.i32\n",
                "  %1 = sprig.binary %0, %0 {kind = @mul} : core.i32\n",
                "}",
            );
            let input = TextInput::new(db, text.to_string());
            let (err, offset) = try_parse_err(db, input).expect("should fail on unknown mnemonic");
            assert!(
                err.contains("symbol 'mul' is not one of [add, sub]"),
                "unexpected error: {}",
                err
            );
            assert_eq!(offset, text.find("@mul").unwrap());
        });
    }

    #[test]
    fn test_float_overflow_literal_rejected() {
        let db = salsa::DatabaseImpl::default();
        let result: Result<(), ParseError> = db.attach(|db| {
            parse_module(
                db,
                "core.module @main {\n  %0 = sprig.constant {value = 1.0e400} : core.f64\n}",
            )
            .map(|_| ())
        });
        assert!(result.is_err(), "overflowing float literal should not parse");
    }

    // ========================================================================
    // Property-based tests (proptest)
    // ========================================================================

    mod proptest_fuzz {
        use super::{TextInput, parse_module};
        use crate::parser::raw::{raw_attr_value, raw_type};
        use crate::printer::print_op;
        use proptest::prelude::*;
        use salsa::Database;
        use winnow::prelude::*;

        /// Tracked wrapper: attempts parse and returns whether it succeeded.
        #[salsa::tracked]
        fn try_parse<'db>(
            db: &'db dyn salsa::Database,
            input: TextInput,
        ) -> Option<crate::Operation<'db>> {
            parse_module(db, input.text(db)).ok()
        }

        /// Parse and print, returning the printed text (or None on parse failure).
        #[salsa::tracked]
        fn parse_and_print_opt(db: &dyn salsa::Database, input: TextInput) -> Option<String> {
            let op = parse_module(db, input.text(db)).ok()?;
            Some(print_op(db, op))
        }

        /// Valid IR texts used as seed corpus for mutation.
        fn seed_corpus() -> Vec<&'static str> {
            vec![
                concat!(
                    "core.module @main {\n",
                    "  %0 = sprig.constant {value = 40} : core.i32\n",
                    "  %1 = sprig.constant {value = 2} : core.i32\n",
                    "  %2 = sprig.binary %0, %1 {kind = @add} : core.i32\n",
                    "  sprig.print %2\n",
                    "}",
                ),
                concat!(
                    "core.module @samples {\n",
                    "  %0 = sprig.constant {value = unit} : core.memref(core.f32) {shape = [2, 3]}\n",
                    "  %1 = sprig.sample %0 {coords = [0, 1]} : core.f32\n",
                    "}",
                ),
                concat!(
                    "core.module @attrs {\n",
                    "  %0 = sprig.constant {a = true, b = 99, c = \"hello\", d = @sym, e = unit, value = 1} : core.i32\n",
                    "}",
                ),
            ]
        }

        /// Strategy: pick a seed and apply a random mutation.
        fn mutated_ir() -> impl Strategy<Value = String> {
            let seeds = seed_corpus();
            let n = seeds.len();
            (0..n, 0..1000usize, 0..5u8, proptest::num::u8::ANY).prop_map(
                move |(seed_idx, pos_raw, mutation_kind, random_byte)| {
                    let text = seeds[seed_idx];
                    let mut bytes = text.as_bytes().to_vec();
                    if bytes.is_empty() {
                        return String::new();
                    }
                    let pos = pos_raw % bytes.len();

                    match mutation_kind {
                        0 => {
                            // Replace byte
                            bytes[pos] = random_byte;
                        }
                        1 => {
                            // Delete byte
                            bytes.remove(pos);
                        }
                        2 => {
                            // Insert byte
                            bytes.insert(pos, random_byte);
                        }
                        3 => {
                            // Delete a chunk (up to 8 bytes)
                            let end = (pos + 8).min(bytes.len());
                            bytes.drain(pos..end);
                        }
                        _ => {
                            // Duplicate a chunk
                            let end = (pos + 8).min(bytes.len());
                            let chunk: Vec<u8> = bytes[pos..end].to_vec();
                            bytes.splice(pos..pos, chunk);
                        }
                    }

                    String::from_utf8(bytes).unwrap_or_default()
                },
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(2000))]

            /// Parser must never panic on arbitrary mutated input.
            #[test]
            fn parser_never_panics(input in mutated_ir()) {
                let db = salsa::DatabaseImpl::default();
                db.attach(|db| {
                    let ti = TextInput::new(db, input.clone());
                    let _ = try_parse(db, ti);
                });
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            /// Completely random strings must not panic the parser.
            #[test]
            fn parser_handles_random_strings(input in "\\PC{0,200}") {
                let db = salsa::DatabaseImpl::default();
                db.attach(|db| {
                    let ti = TextInput::new(db, input.clone());
                    let _ = try_parse(db, ti);
                });
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Valid seed texts must round-trip: print(parse(text)) → parse → print = same.
            #[test]
            fn seed_corpus_round_trips(seed_idx in 0..3usize) {
                let seeds = seed_corpus();
                let text = seeds[seed_idx].to_string();
                let db = salsa::DatabaseImpl::default();
                db.attach(|db| {
                    let ti = TextInput::new(db, text.clone());
                    if let Some(printed) = parse_and_print_opt(db, ti) {
                        let ti2 = TextInput::new(db, printed.clone());
                        if let Some(printed2) = parse_and_print_opt(db, ti2) {
                            prop_assert_eq!(printed, printed2, "round-trip mismatch");
                        }
                    }
                    Ok(())
                })?;
            }
        }

        // Individual combinator fuzzing: type parser.
        proptest! {
            #![proptest_config(ProptestConfig::with_cases(1000))]

            #[test]
            fn type_parser_never_panics(input in "[a-z_.()0-9, ]{0,80}") {
                let mut s = input.as_str();
                let _ = raw_type.parse_next(&mut s);
            }
        }

        // Individual combinator fuzzing: attribute value parser.
        proptest! {
            #![proptest_config(ProptestConfig::with_cases(1000))]

            #[test]
            fn attr_parser_never_panics(input in "[a-z0-9_.@\"\\[\\]{}, =truefalsnui]{0,60}") {
                let mut s = input.as_str();
                let _ = raw_attr_value.parse_next(&mut s);
            }
        }
    }
}
