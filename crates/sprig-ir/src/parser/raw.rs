//! Raw (unresolved) parse structures and winnow combinators for the IR text
//! format.
//!
//! This module is the "stage 1" parser: text → `Raw*` structs. Resolution of
//! value references and types happens in [`super`].

use winnow::ascii;
use winnow::combinator::{alt, delimited, opt, preceded, separated};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

// ============================================================================
// Error type
// ============================================================================

/// Parse error for IR text format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Raw (unresolved) AST structures
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct RawOperation<'a> {
    pub results: Vec<&'a str>,
    pub dialect: &'a str,
    pub op_name: &'a str,
    /// Optional symbol name parsed from `@name` after `dialect.op`.
    pub sym_name: Option<String>,
    pub operands: Vec<&'a str>,
    pub attributes: Vec<RawAttrEntry<'a>>,
    pub result_types: Vec<RawType<'a>>,
    pub regions: Vec<RawRegion<'a>>,
}

/// One `key = value` entry of an attribute dict. `src` is the value's source
/// text, kept so later resolution stages can report positions.
#[derive(Debug, Clone)]
pub(crate) struct RawAttrEntry<'a> {
    pub key: &'a str,
    pub value: RawAttribute<'a>,
    pub src: &'a str,
}

/// A region holds one implicit block of operations.
#[derive(Debug, Clone)]
pub(crate) struct RawRegion<'a> {
    pub ops: Vec<RawOperation<'a>>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawType<'a> {
    pub dialect: &'a str,
    pub name: &'a str,
    pub params: Vec<RawType<'a>>,
    pub attrs: Vec<RawAttrEntry<'a>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RawAttribute<'a> {
    Bool(bool),
    Int(u64),
    Float(f64),
    String(String),
    Symbol(String),
    Type(RawType<'a>),
    List(Vec<RawAttribute<'a>>),
    Unit,
}

// ============================================================================
// Winnow parsers
// ============================================================================

/// Skip whitespace.
pub(crate) fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

/// Parse an identifier: [a-zA-Z_][a-zA-Z0-9_]*
pub(crate) fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Parse a value reference: %name or %number
pub(crate) fn value_ref<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(
        '%',
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
    .parse_next(input)
}

/// Parse a symbol reference: @name or @"quoted name"
///
/// Quoted symbols use the same escape sequences as string literals
/// (`\\`, `\"`, `\n`, `\t`, `\r`, `\0`, `\xNN`).
pub(crate) fn symbol_ref(input: &mut &str) -> ModalResult<String> {
    '@'.parse_next(input)?;
    if input.starts_with('"') {
        // Quoted symbol, same escapes as string literals
        string_lit.parse_next(input)
    } else {
        // Bare symbol
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_')
            .map(|s: &str| s.to_owned())
            .parse_next(input)
    }
}

/// Parse a dialect-qualified name: dialect.name
pub(crate) fn qualified_name<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    (ident, '.', ident)
        .map(|(d, _, n)| (d, n))
        .parse_next(input)
}

/// Parse an integer literal (unsigned or negative via two's complement).
pub(crate) fn integer_lit(input: &mut &str) -> ModalResult<u64> {
    let negative = opt('-').parse_next(input)?.is_some();
    let value: u64 = ascii::dec_uint(input)?;
    if negative {
        // Two's complement: the magnitude must fit in i64 range.
        // i64::MIN magnitude (9223372036854775808) needs special handling.
        let i64_min_magnitude = i64::MAX as u64 + 1;
        if value > i64_min_magnitude {
            return Err(winnow::error::ErrMode::Backtrack(
                winnow::error::ContextError::new(),
            ));
        }
        if value == i64_min_magnitude {
            // Exactly i64::MIN
            Ok(u64::from_ne_bytes(i64::MIN.to_ne_bytes()))
        } else {
            let signed = -(value as i64);
            Ok(u64::from_ne_bytes(signed.to_ne_bytes()))
        }
    } else {
        Ok(value)
    }
}

/// Parse a float literal that MUST contain a decimal point.
/// Accepts optional exponent notation: `3.14`, `-1.0e10`, `2.5e-3`.
/// This prevents `42` from being parsed as a float.
pub(crate) fn float_with_dot(input: &mut &str) -> ModalResult<f64> {
    // Match: [-]digits.digits[e[+-]digits]
    let s = (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt((
            one_of(['e', 'E']),
            opt(one_of(['+', '-'])),
            take_while(1.., |c: char| c.is_ascii_digit()),
        )),
    )
        .take()
        .parse_next(input)?;
    let value = s
        .parse::<f64>()
        .map_err(|_| winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new()))?;
    // Overflowing literals like 1.0e400 land on infinity, which has no
    // printable literal form; reject them here.
    if !value.is_finite() {
        return Err(winnow::error::ErrMode::Backtrack(
            winnow::error::ContextError::new(),
        ));
    }
    Ok(value)
}

/// Parse a string literal: "content"
pub(crate) fn string_lit(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut result = String::new();
    loop {
        let c = any.parse_next(input)?;
        match c {
            '"' => break,
            '\\' => {
                let escaped = any.parse_next(input)?;
                match escaped {
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '0' => result.push('\0'),
                    'x' => {
                        // \xNN hex escape
                        let h1 = any.parse_next(input)?;
                        let h2 = any.parse_next(input)?;
                        let hex_str = format!("{}{}", h1, h2);
                        if let Ok(code) = u8::from_str_radix(&hex_str, 16) {
                            result.push(code as char);
                        } else {
                            // Invalid hex: pass through literally
                            result.push('\\');
                            result.push('x');
                            result.push(h1);
                            result.push(h2);
                        }
                    }
                    _ => {
                        result.push('\\');
                        result.push(escaped);
                    }
                }
            }
            _ => result.push(c),
        }
    }
    Ok(result)
}

/// Parse a type: `dialect.name`, `dialect.name(params)`, or
/// `dialect.name(params) {key = value, ...}`.
///
/// The optional `{...}` block carries type-level attributes (e.g., the
/// `shape` attribute on memref types). Type attributes are only parsed when
/// explicit parentheses `()` are present to avoid ambiguity with the opening
/// `{` of operation body regions.
pub(crate) fn raw_type<'a>(input: &mut &'a str) -> ModalResult<RawType<'a>> {
    let (dialect, name) = qualified_name.parse_next(input)?;

    // Optional type parameters
    let opt_params = opt(delimited(
        ('(', ws),
        separated(0.., (ws, raw_type, ws).map(|(_, t, _)| t), ','),
        (ws, ')'),
    ))
    .parse_next(input)?;
    let has_parens = opt_params.is_some();
    let params = opt_params.unwrap_or_default();

    // Optional type attributes: {key = value, ...}
    let attrs = if has_parens {
        opt(preceded(ws, raw_attr_dict))
            .parse_next(input)?
            .unwrap_or_default()
    } else {
        vec![]
    };

    Ok(RawType {
        dialect,
        name,
        params,
        attrs,
    })
}

/// Parse an attribute value.
pub(crate) fn raw_attr_value<'a>(input: &mut &'a str) -> ModalResult<RawAttribute<'a>> {
    alt((
        // Keywords
        "true".value(RawAttribute::Bool(true)),
        "false".value(RawAttribute::Bool(false)),
        "unit".value(RawAttribute::Unit),
        // String literal
        string_lit.map(RawAttribute::String),
        // Symbol reference
        symbol_ref.map(RawAttribute::Symbol),
        // List
        delimited(
            ('[', ws),
            separated(0.., (ws, raw_attr_value, ws).map(|(_, a, _)| a), ','),
            (ws, ']'),
        )
        .map(RawAttribute::List),
        // Float (requires dot: 3.14, -1.0)
        float_with_dot.map(RawAttribute::Float),
        // Integer (42, -1)
        integer_lit.map(RawAttribute::Int),
        // Type (dialect.name...)
        raw_type.map(RawAttribute::Type),
    ))
    .parse_next(input)
}

/// Parse an attribute dict: {key = value, ...}
pub(crate) fn raw_attr_dict<'a>(input: &mut &'a str) -> ModalResult<Vec<RawAttrEntry<'a>>> {
    delimited(
        ('{', ws),
        separated(
            0..,
            (ws, ident, ws, '=', ws, raw_attr_value.with_taken(), ws)
                .map(|(_, k, _, _, _, (v, src), _)| RawAttrEntry {
                    key: k,
                    value: v,
                    src,
                }),
            ',',
        ),
        (ws, '}'),
    )
    .parse_next(input)
}

/// Parse result list: %0 = or %0, %1 =
fn result_list<'a>(input: &mut &'a str) -> ModalResult<Vec<&'a str>> {
    let results: Vec<&str> =
        separated(1.., (ws, value_ref, ws).map(|(_, v, _)| v), ',').parse_next(input)?;
    ws.parse_next(input)?;
    '='.parse_next(input)?;
    Ok(results)
}

/// Parse operand list: %a, %b, ...
fn operand_list<'a>(input: &mut &'a str) -> ModalResult<Vec<&'a str>> {
    separated(1.., (ws, value_ref, ws).map(|(_, v, _)| v), ',').parse_next(input)
}

/// Parse type annotation: : type1, type2
fn type_annotation<'a>(input: &mut &'a str) -> ModalResult<Vec<RawType<'a>>> {
    preceded(
        (ws, ':', ws),
        separated(1.., (ws, raw_type, ws).map(|(_, t, _)| t), ','),
    )
    .parse_next(input)
}

/// Parse a single operation.
///
/// Grammar:
/// ```text
/// [results =] dialect.op [@symbol] [operands] [{attrs}] [: types] [regions]
/// ```
pub(crate) fn raw_operation<'a>(input: &mut &'a str) -> ModalResult<RawOperation<'a>> {
    ws.parse_next(input)?;

    // Try to parse results: %0 = or %0, %1 =
    let results = opt(result_list).parse_next(input)?.unwrap_or_default();
    ws.parse_next(input)?;

    // dialect.op
    let (dialect, op_name) = qualified_name.parse_next(input)?;

    // Optional @symbol (e.g., core.module @main)
    let sym_name = opt(preceded(ws, symbol_ref)).parse_next(input)?;

    // Operands (optional): %a, %b
    ws.parse_next(input)?;
    let operands = if input.starts_with('%') {
        opt(operand_list).parse_next(input)?.unwrap_or_default()
    } else {
        Vec::new()
    };

    // Attributes (optional)
    let attributes = opt(preceded(ws, raw_attr_dict))
        .parse_next(input)?
        .unwrap_or_default();

    // Type annotation (optional): : type1, type2
    let result_types = opt(type_annotation).parse_next(input)?.unwrap_or_default();

    // Regions (optional, zero or more)
    let mut regions = Vec::new();
    loop {
        ws.parse_next(input)?;
        if input.starts_with('{') {
            let region = raw_region.parse_next(input)?;
            regions.push(region);
        } else {
            break;
        }
    }

    Ok(RawOperation {
        results,
        dialect,
        op_name,
        sym_name,
        operands,
        attributes,
        result_types,
        regions,
    })
}

/// Parse a region: { ops... } (single implicit block)
pub(crate) fn raw_region<'a>(input: &mut &'a str) -> ModalResult<RawRegion<'a>> {
    '{'.parse_next(input)?;

    let mut ops = Vec::new();
    loop {
        ws.parse_next(input)?;
        if input.starts_with('}') || input.is_empty() {
            break;
        }
        let op = raw_operation.parse_next(input)?;
        ops.push(op);
    }

    ws.parse_next(input)?;
    '}'.parse_next(input)?;

    Ok(RawRegion { ops })
}

// ============================================================================
// Tests (pure combinator tests)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        let mut input = "core.i32";
        let raw = raw_type.parse_next(&mut input).expect("should parse type");
        assert_eq!(raw.dialect, "core");
        assert_eq!(raw.name, "i32");
        assert!(raw.params.is_empty());
    }

    #[test]
    fn test_parse_parameterized_type_with_attrs() {
        let mut input = "core.memref(core.f32) {shape = [2, 3]}";
        let raw = raw_type.parse_next(&mut input).expect("should parse type");
        assert_eq!(raw.dialect, "core");
        assert_eq!(raw.name, "memref");
        assert_eq!(raw.params.len(), 1);
        assert_eq!(raw.attrs.len(), 1);
        assert_eq!(raw.attrs[0].key, "shape");
        assert_eq!(raw.attrs[0].src, "[2, 3]");
    }

    #[test]
    fn test_parse_attribute_values() {
        // Integer
        let mut input = "42";
        let attr = raw_attr_value
            .parse_next(&mut input)
            .expect("should parse int");
        assert!(matches!(attr, RawAttribute::Int(42)));

        // Float
        let mut input = "3.25";
        let attr = raw_attr_value
            .parse_next(&mut input)
            .expect("should parse float");
        assert!(matches!(attr, RawAttribute::Float(f) if (f - 3.25).abs() < 1e-10));

        // Bool
        let mut input = "true";
        let attr = raw_attr_value
            .parse_next(&mut input)
            .expect("should parse bool");
        assert!(matches!(attr, RawAttribute::Bool(true)));

        // String
        let mut input = r#""hello""#;
        let attr = raw_attr_value
            .parse_next(&mut input)
            .expect("should parse string");
        assert!(matches!(attr, RawAttribute::String(ref s) if s == "hello"));

        // Symbol
        let mut input = "@add";
        let attr = raw_attr_value
            .parse_next(&mut input)
            .expect("should parse symbol");
        assert!(matches!(attr, RawAttribute::Symbol(ref s) if s == "add"));
    }

    #[test]
    fn test_parse_string_escapes() {
        let cases = [
            (r#""hello""#, "hello"),
            (r#""a\nb""#, "a\nb"),
            (r#""a\tb""#, "a\tb"),
            (r#""a\rb""#, "a\rb"),
            (r#""a\0b""#, "a\0b"),
            (r#""a\\b""#, "a\\b"),
            (r#""a\"b""#, "a\"b"),
            (r#""a\x01b""#, "a\x01b"),
            (r#""a\x7fb""#, "a\x7fb"),
        ];
        for (input_str, expected) in &cases {
            let mut input = *input_str;
            let result = string_lit.parse_next(&mut input).expect("should parse");
            assert_eq!(&result, *expected, "failed for input: {}", input_str);
        }
    }

    #[test]
    fn test_parse_symbol_ref_escapes() {
        // Bare symbol
        let mut input = "@foo";
        let result = symbol_ref.parse_next(&mut input).expect("should parse");
        assert_eq!(result, "foo");

        // Quoted symbol with colons
        let mut input = "@\"std::io\"";
        let result = symbol_ref.parse_next(&mut input).expect("should parse");
        assert_eq!(result, "std::io");

        // Quoted symbol with escaped quote
        let mut input = "@\"say\\\"hi\\\"\"";
        let result = symbol_ref.parse_next(&mut input).expect("should parse");
        assert_eq!(result, "say\"hi\"");

        // Empty quoted symbol
        let mut input = "@\"\"";
        let result = symbol_ref.parse_next(&mut input).expect("should parse");
        assert_eq!(result, "");
    }

    #[test]
    fn test_parse_integer_lit_overflow() {
        // i64::MIN magnitude is valid
        let mut input = "-9223372036854775808";
        let val = integer_lit
            .parse_next(&mut input)
            .expect("i64::MIN should parse");
        assert_eq!(val, u64::from_ne_bytes(i64::MIN.to_ne_bytes()));

        // One beyond i64::MIN magnitude should fail
        let mut input = "-9223372036854775809";
        let result = integer_lit.parse_next(&mut input);
        assert!(result.is_err(), "beyond i64::MIN should fail");

        // Positive i64::MAX should be fine
        let mut input = "9223372036854775807";
        let val = integer_lit
            .parse_next(&mut input)
            .expect("i64::MAX should parse");
        assert_eq!(val, i64::MAX as u64);
    }

    #[test]
    fn test_parse_float_exponent() {
        let mut input = "1.5e10";
        let val = float_with_dot.parse_next(&mut input).expect("should parse");
        assert_eq!(val, 1.5e10);

        let mut input = "2.0E-3";
        let val = float_with_dot.parse_next(&mut input).expect("should parse");
        assert_eq!(val, 2.0e-3);

        let mut input = "-3.14e+2";
        let val = float_with_dot.parse_next(&mut input).expect("should parse");
        assert_eq!(val, -3.14e2);
    }

    #[test]
    fn test_parse_float_overflow_rejected() {
        let mut input = "1.0e400";
        assert!(
            float_with_dot.parse_next(&mut input).is_err(),
            "overflowing literal should be rejected"
        );

        let mut input = "-1.0e400";
        assert!(float_with_dot.parse_next(&mut input).is_err());

        // The largest finite double still parses
        let mut input = "1.7976931348623157e308";
        let val = float_with_dot.parse_next(&mut input).expect("should parse");
        assert!(val.is_finite());
    }

    #[test]
    fn test_parse_operation() {
        let mut input = "%2 = sprig.binary %0, %1 {kind = @add} : core.i32";
        let op = raw_operation.parse_next(&mut input).expect("should parse");
        assert_eq!(op.results, vec!["2"]);
        assert_eq!(op.dialect, "sprig");
        assert_eq!(op.op_name, "binary");
        assert_eq!(op.operands, vec!["0", "1"]);
        assert_eq!(op.attributes.len(), 1);
        assert_eq!(op.result_types.len(), 1);
        assert!(op.regions.is_empty());
    }

    #[test]
    fn test_parse_operation_with_region() {
        let mut input = "core.module @main {\n  %0 = sprig.constant {value = 1} : core.i32\n}";
        let op = raw_operation.parse_next(&mut input).expect("should parse");
        assert_eq!(op.dialect, "core");
        assert_eq!(op.op_name, "module");
        assert_eq!(op.sym_name.as_deref(), Some("main"));
        assert_eq!(op.regions.len(), 1);
        assert_eq!(op.regions[0].ops.len(), 1);
    }
}
