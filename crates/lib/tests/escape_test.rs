//! # Escaper Tests
//!
//! Verifies injection-safe rendering of identifiers, string arrays, and
//! scalar arrays. These are the only paths by which caller data enters a
//! rendered statement.

use anyvec::providers::db::postgres::escape::{
    escape_identifier, prepare_scalar_array, prepare_string_array, render_scalar, vector_literal,
};
use anyvec::types::ScalarValue;

/// Identifiers are quoted, and embedded quotes are doubled so a crafted
/// field name cannot break out of the identifier position.
#[test]
fn test_identifier_is_quoted() {
    assert_eq!(escape_identifier("topics"), "\"topics\"");
    assert_eq!(
        escape_identifier("weird\"name"),
        "\"weird\"\"name\""
    );
}

/// Free-text values are rendered as a parenthesized list of quoted
/// literals with embedded quotes doubled.
#[test]
fn test_string_array_escapes_quotes() {
    let values = vec![ScalarValue::from("plain"), ScalarValue::from("it's")];

    let rendered = prepare_string_array(&values);

    assert_eq!(rendered, "('plain', 'it''s')");
}

/// A classic injection payload stays inside its literal.
#[test]
fn test_string_array_neutralizes_injection_attempt() {
    let values = vec![ScalarValue::from("'; DROP TABLE docs; --")];

    let rendered = prepare_string_array(&values);

    assert_eq!(rendered, "('''; DROP TABLE docs; --')");
}

/// Machine-typed values render directly, without quoting.
#[test]
fn test_scalar_array_renders_machine_types() {
    let values = vec![
        ScalarValue::Integer(42),
        ScalarValue::Float(2.5),
        ScalarValue::Bool(true),
        ScalarValue::Bool(false),
    ];

    let rendered = prepare_scalar_array(&values);

    assert_eq!(rendered, "(42, 2.5, TRUE, FALSE)");
}

/// A string routed down the scalar path is still escaped: the no-raw-text
/// invariant holds on both paths.
#[test]
fn test_scalar_array_still_escapes_strings() {
    let values = vec![ScalarValue::from("it's")];

    let rendered = prepare_scalar_array(&values);

    assert_eq!(rendered, "('it''s')");
}

/// Non-textual values pass through the string path by their text form.
#[test]
fn test_string_array_renders_numbers_as_quoted_text() {
    let values = vec![ScalarValue::Integer(7)];

    let rendered = prepare_string_array(&values);

    assert_eq!(rendered, "('7')");
}

#[test]
fn test_render_scalar_single_values() {
    assert_eq!(render_scalar(&ScalarValue::Integer(-3)), "-3");
    assert_eq!(render_scalar(&ScalarValue::from("a")), "'a'");
}

/// Vectors render as a pgvector literal.
#[test]
fn test_vector_literal() {
    assert_eq!(vector_literal(&[1.0, 0.5, 0.0]), "'[1,0.5,0]'");
}
