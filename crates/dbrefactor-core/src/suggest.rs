//! Ordering suggestions from a language model.
//!
//! The model sees the schema and the planned operations and answers with the same
//! operations in a proposed order plus a rationale. A suggestion can only reorder the
//! plan: records are matched back to plan entries by fingerprint, anything the plan does
//! not contain is rejected, and entries the model left out keep their relative order at
//! the end.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::fingerprint::{Fingerprint, fingerprint, fingerprint_value};
use crate::operation::Operation;
use crate::plan::{Plan, PlanEntry};
use crate::schema::TableInfo;

/// What the model is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    #[serde(alias = "OrderedRenames", alias = "ordered_renames", default)]
    pub ordered_renames: Vec<Value>,
    #[serde(alias = "Rationale", default)]
    pub rationale: String,
}

pub const SYSTEM_PROMPT: &str = "You are an expert database refactoring assistant. \
Given a database schema and a list of planned schema operations, order the operations to \
minimize downtime and avoid naming conflicts. Reply with JSON only.";

/// User prompt listing the schema and the operations to order.
pub fn render_prompt<T: AsRef<Operation>>(tables: &[TableInfo], ops: &[T]) -> String {
    let mut out = String::from("Database schema:\n");
    for table in tables {
        let _ = writeln!(out, "  Table: {} (Schema: {})", table.name, table.schema);
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.sql_type))
            .collect();
        let _ = writeln!(out, "  Columns: {}", columns.join(", "));
        let fks: Vec<&str> = table.foreign_keys.iter().map(|f| f.name.as_str()).collect();
        let _ = writeln!(out, "  Foreign Keys: {}", fks.join(", "));
        let indexes: Vec<&str> = table.indexes.iter().map(|i| i.name.as_str()).collect();
        let _ = writeln!(out, "  Indexes: {}", indexes.join(", "));
    }

    out.push_str("\nPlanned operations (one JSON object per line):\n");
    for op in ops {
        let line = serde_json::to_string(op.as_ref()).unwrap_or_default();
        let _ = writeln!(out, "  {line}");
    }

    out.push_str(
        "\nReturn every operation exactly once, copied unchanged, in the order you recommend.\n\
         Output format:\n\
         { \"orderedRenames\": [ /* the operations */ ], \"rationale\": \"why this order\" }\n",
    );
    out
}

/// Reorders `plan` as suggested. The result is a permutation of the plan's entries.
pub fn apply_suggested_order(
    plan: &Plan,
    suggestion: &SuggestionResponse,
) -> Result<Vec<PlanEntry>> {
    let entries = plan.entries();
    let mut by_fingerprint: HashMap<Fingerprint, VecDeque<usize>> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        by_fingerprint
            .entry(fingerprint(&entry.operation))
            .or_default()
            .push_back(index);
    }

    let mut used = HashSet::new();
    let mut ordered = Vec::with_capacity(entries.len());
    for record in &suggestion.ordered_renames {
        let fp = fingerprint_value(record);
        match by_fingerprint.get_mut(&fp) {
            Some(queue) => match queue.pop_front() {
                Some(index) => {
                    used.insert(index);
                    ordered.push(entries[index].clone());
                }
                None => debug!(fingerprint = %fp, "ignoring repeated suggestion"),
            },
            None => return Err(CoreError::unknown_operation(describe(record))),
        }
    }

    for (index, entry) in entries.iter().enumerate() {
        if !used.contains(&index) {
            debug!(id = %entry.id, "suggestion omitted entry, keeping it at the end");
            ordered.push(entry.clone());
        }
    }
    Ok(ordered)
}

fn describe(record: &Value) -> String {
    match serde_json::from_value::<Operation>(record.clone()) {
        Ok(op) => format!("{} {}", op.kind(), op.summary()),
        Err(_) => record.to_string(),
    }
}
