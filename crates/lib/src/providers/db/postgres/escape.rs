//! # SQL Value and Identifier Escaping
//!
//! Statements in this provider are fully rendered before execution and run
//! without bind parameters, so every free-text value that flows into a
//! generated clause must pass through literal escaping here. Machine-typed
//! values (numbers, booleans) may be rendered directly.

use crate::types::ScalarValue;
use postgres_protocol::escape::{escape_identifier as pg_escape_identifier, escape_literal};

/// Quotes an identifier (table or column name) for safe interpolation.
pub fn escape_identifier(name: &str) -> String {
    pg_escape_identifier(name)
}

/// Renders free-text values as a parenthesized list of escaped literals,
/// e.g. `('a', 'b')`, suitable for membership and containment predicates.
pub fn prepare_string_array(values: &[ScalarValue]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|value| escape_literal(&value.to_text()))
        .collect();
    format!("({})", items.join(", "))
}

/// Renders machine-typed values as a parenthesized list, e.g. `(1, 2.5)`.
///
/// String values routed here by mistake are still escaped; the invariant
/// that no raw text reaches a statement holds on both paths.
pub fn prepare_scalar_array(values: &[ScalarValue]) -> String {
    let items: Vec<String> = values.iter().map(render_scalar).collect();
    format!("({})", items.join(", "))
}

/// Renders one scalar for direct inclusion in a statement.
pub fn render_scalar(value: &ScalarValue) -> String {
    match value {
        ScalarValue::String(s) => escape_literal(s),
        ScalarValue::Integer(i) => i.to_string(),
        ScalarValue::Float(f) => f.to_string(),
        ScalarValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
    }
}

/// Renders a float vector as a pgvector literal, e.g. `'[1,0.5,0]'`.
pub fn vector_literal(values: &[f32]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("'[{}]'", items.join(","))
}
