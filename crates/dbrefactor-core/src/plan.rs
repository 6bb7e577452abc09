//! The ordered list of operations being edited.
//!
//! Order is the proposed execution order. Entry ids are transient client identifiers
//! for listing and editing; they are not part of an operation's identity.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::generate_id;
use crate::operation::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub id: String,
    #[serde(flatten)]
    pub operation: Operation,
}

impl PlanEntry {
    pub fn new(operation: Operation) -> Self {
        Self {
            id: generate_id(),
            operation,
        }
    }
}

impl AsRef<Operation> for PlanEntry {
    fn as_ref(&self) -> &Operation {
        &self.operation
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.entries.iter().map(|e| &e.operation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a validated operation and returns the new entry's id.
    pub fn add(&mut self, operation: Operation) -> Result<String> {
        operation.validate()?;
        let entry = PlanEntry::new(operation);
        let id = entry.id.clone();
        self.entries.push(entry);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Replaces the operation of an existing entry, keeping its id and position.
    pub fn update(&mut self, id: &str, operation: Operation) -> Result<()> {
        operation.validate()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CoreError::entry_not_found(id))?;
        entry.operation = operation;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<PlanEntry> {
        let index = self.index_of(id)?;
        Ok(self.entries.remove(index))
    }

    /// Moves the entry one position earlier. Returns `false` if it is already first.
    pub fn move_up(&mut self, id: &str) -> Result<bool> {
        let index = self.index_of(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.entries.swap(index, index - 1);
        Ok(true)
    }

    /// Moves the entry one position later. Returns `false` if it is already last.
    pub fn move_down(&mut self, id: &str) -> Result<bool> {
        let index = self.index_of(id)?;
        if index + 1 >= self.entries.len() {
            return Ok(false);
        }
        self.entries.swap(index, index + 1);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Installs a new ordering of the same entries.
    ///
    /// The new list must contain exactly the current entry ids.
    pub fn replace_order(&mut self, ordered: Vec<PlanEntry>) -> Result<()> {
        let mut current: Vec<&str> = self.entries.iter().map(|e| e.id.as_str()).collect();
        let mut proposed: Vec<&str> = ordered.iter().map(|e| e.id.as_str()).collect();
        current.sort_unstable();
        proposed.sort_unstable();
        if current != proposed {
            return Err(CoreError::validation(
                "plan",
                "reordering must keep exactly the same entries",
            ));
        }
        self.entries = ordered;
        Ok(())
    }

    /// Finds an entry by 1-based position or by a unique id prefix.
    pub fn resolve(&self, reference: &str) -> Result<&PlanEntry> {
        let reference = reference.trim();
        if let Ok(position) = reference.parse::<usize>()
            && position >= 1
            && position <= self.entries.len()
        {
            return Ok(&self.entries[position - 1]);
        }

        let matches: Vec<&PlanEntry> = self
            .entries
            .iter()
            .filter(|e| !reference.is_empty() && e.id.starts_with(reference))
            .collect();
        match matches.as_slice() {
            [one] => Ok(one),
            [] => Err(CoreError::entry_not_found(reference)),
            many => Err(CoreError::AmbiguousReference {
                reference: reference.to_string(),
                matches: many.len(),
            }),
        }
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::entry_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rename(from: &str, to: &str) -> Operation {
        Operation::TableRename {
            table_from: from.into(),
            table_to: to.into(),
            area: None,
            note: None,
        }
    }

    fn sample_plan() -> (Plan, Vec<String>) {
        let mut plan = Plan::new();
        let ids = vec![
            plan.add(rename("A", "A2")).unwrap(),
            plan.add(rename("B", "B2")).unwrap(),
            plan.add(rename("C", "C2")).unwrap(),
        ];
        (plan, ids)
    }

    fn tables(plan: &Plan) -> Vec<&str> {
        plan.operations().map(|op| op.table_from()).collect()
    }

    #[test]
    fn test_add_rejects_invalid_operation() {
        let mut plan = Plan::new();
        assert!(plan.add(rename("", "B")).is_err());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_move_up_and_down() {
        let (mut plan, ids) = sample_plan();
        assert!(plan.move_up(&ids[2]).unwrap());
        assert_eq!(tables(&plan), vec!["A", "C", "B"]);
        assert!(!plan.move_up(&ids[0]).unwrap());
        assert!(plan.move_down(&ids[0]).unwrap());
        assert_eq!(tables(&plan), vec!["C", "A", "B"]);
        assert!(!plan.move_down(&ids[1]).unwrap());
    }

    #[test]
    fn test_update_keeps_position_and_id() {
        let (mut plan, ids) = sample_plan();
        plan.update(&ids[1], rename("B", "Bee")).unwrap();
        let entry = &plan.entries()[1];
        assert_eq!(entry.id, ids[1]);
        assert_eq!(entry.operation, rename("B", "Bee"));
        assert!(plan.update("missing", rename("X", "Y")).is_err());
    }

    #[test]
    fn test_remove_and_clear() {
        let (mut plan, ids) = sample_plan();
        let removed = plan.remove(&ids[0]).unwrap();
        assert_eq!(removed.operation.table_from(), "A");
        assert_eq!(plan.len(), 2);
        plan.clear();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_resolve_by_position_and_prefix() {
        let (plan, ids) = sample_plan();
        assert_eq!(plan.resolve("2").unwrap().id, ids[1]);
        assert_eq!(plan.resolve(&ids[2][..12]).unwrap().id, ids[2]);
        assert!(plan.resolve("9").is_err());
        assert!(plan.resolve("").is_err());
    }

    #[test]
    fn test_replace_order_requires_same_entries() {
        let (mut plan, _) = sample_plan();
        let mut reversed = plan.entries().to_vec();
        reversed.reverse();
        plan.replace_order(reversed).unwrap();
        assert_eq!(tables(&plan), vec!["C", "B", "A"]);

        let mut shorter = plan.entries().to_vec();
        shorter.pop();
        assert!(plan.replace_order(shorter).is_err());
    }

    #[test]
    fn test_plan_file_format() {
        let mut plan = Plan::new();
        plan.add(rename("Brand", "Brands")).unwrap();
        let value = serde_json::to_value(&plan).unwrap();
        let entry = &value["entries"][0];
        assert_eq!(entry["scope"], json!("table-rename"));
        assert_eq!(entry["tableFrom"], json!("Brand"));
        assert!(entry["id"].is_string());

        let back: Plan = serde_json::from_value(value).unwrap();
        assert_eq!(back, plan);
    }
}
