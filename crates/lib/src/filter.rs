//! # Condition Tree to SQL Filter Compiler
//!
//! Translates an abstract, possibly-nested boolean query tree into a safe,
//! fully-rendered predicate plus the `LEFT JOIN`s needed for multi-valued
//! side tables. Compilation is a pure function: it touches no connection and
//! returns its warnings alongside the output instead of logging them, so the
//! lenient degradation policy is independently testable.
//!
//! Degradation policy: a leaf naming a field that is neither indexed nor
//! native is dropped with a warning; so is an unsupported operator on a
//! multi-valued field. The rest of the query still compiles — availability
//! over strictness.

use crate::errors::VdbWarning;
use crate::providers::db::postgres::escape::{
    escape_identifier, prepare_scalar_array, prepare_string_array,
};
use crate::providers::db::postgres::sql::side_table_name;
use crate::types::{
    is_native_field, Condition, ConditionGroup, ConditionNode, FieldInfo, FieldType, IndexSchema,
};

/// The compiled output of one condition tree.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    /// The rendered predicate, or `None` when every leaf was dropped.
    pub predicate: Option<String>,
    /// Deduplicated join fragments, in first-use order.
    pub joins: Vec<String>,
    /// Leaves dropped during compilation.
    pub warnings: Vec<VdbWarning>,
}

impl CompiledFilter {
    /// Assembles the fragment appended to a search statement: the join
    /// fragments followed by the `WHERE` clause. Empty when nothing
    /// compiled.
    pub fn clause(&self) -> String {
        match &self.predicate {
            Some(predicate) if self.joins.is_empty() => format!("WHERE {predicate}"),
            Some(predicate) => format!("{} WHERE {predicate}", self.joins.join(" ")),
            None => String::new(),
        }
    }
}

/// Compiles a condition tree against a collection and its index schema.
pub fn compile(
    schema: &dyn IndexSchema,
    collection: &str,
    group: &ConditionGroup,
) -> CompiledFilter {
    let mut compiled = CompiledFilter::default();
    compiled.predicate = compile_group(
        schema,
        collection,
        group,
        &mut compiled.joins,
        &mut compiled.warnings,
    );
    compiled
}

/// Depth-first group compilation.
///
/// Children are compiled recursively and joined with the group's own
/// conjunction; join fragments accumulate into the shared, deduplicated
/// list. A group whose children all dropped contributes nothing.
fn compile_group(
    schema: &dyn IndexSchema,
    collection: &str,
    group: &ConditionGroup,
    joins: &mut Vec<String>,
    warnings: &mut Vec<VdbWarning>,
) -> Option<String> {
    let mut parts = Vec::new();
    for node in &group.nodes {
        let part = match node {
            ConditionNode::Group(inner) => {
                compile_group(schema, collection, inner, joins, warnings)
            }
            ConditionNode::Condition(condition) => {
                compile_condition(schema, collection, condition, joins, warnings)
            }
        };
        if let Some(part) = part {
            parts.push(part);
        }
    }
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(format!(
            "({})",
            parts.join(&format!(" {} ", group.conjunction.as_sql()))
        )),
    }
}

fn compile_condition(
    schema: &dyn IndexSchema,
    collection: &str,
    condition: &Condition,
    joins: &mut Vec<String>,
    warnings: &mut Vec<VdbWarning>,
) -> Option<String> {
    let info = match schema.field(&condition.field) {
        Some(info) => info,
        // Reserved native fields are filterable even though the index does
        // not declare them; they are implicitly string-typed and single.
        None if is_native_field(&condition.field) => FieldInfo {
            identifier: condition.field.clone(),
            field_type: FieldType::String,
            is_multiple: false,
        },
        None => {
            warnings.push(VdbWarning::UnknownField {
                field: condition.field.clone(),
                index: schema.index_id().to_string(),
            });
            return None;
        }
    };

    let values = condition.value.to_vec();
    let rendered = if info.field_type.is_textual() {
        prepare_string_array(&values)
    } else {
        prepare_scalar_array(&values)
    };

    if info.is_multiple {
        let side = escape_identifier(&side_table_name(collection, &info.identifier));
        let predicate = match condition.operator.as_str() {
            "=" => format!("{side}.value @> {rendered}"),
            "!=" => format!("NOT {side}.value @> {rendered}"),
            "IN" => format!("{side}.value IN {rendered}"),
            "NOT IN" => format!("{side}.value NOT IN {rendered}"),
            _ => {
                warnings.push(VdbWarning::UnsupportedOperator {
                    operator: condition.operator.clone(),
                });
                return None;
            }
        };
        let join = format!(
            "LEFT JOIN {side} ON {}.id = {side}.chunk_id",
            escape_identifier(collection)
        );
        if !joins.contains(&join) {
            joins.push(join);
        }
        Some(format!("({predicate})"))
    } else {
        Some(format!(
            "({} {} {rendered})",
            escape_identifier(&info.identifier),
            condition.operator
        ))
    }
}
