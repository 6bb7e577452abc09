//! The plan document on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use dbrefactor_core::Plan;

/// Reads the plan. A missing file is an empty plan.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Plan::new()),
        Err(e) => return Err(e).with_context(|| format!("Cannot read plan {}", path.display())),
    };
    if content.trim().is_empty() {
        return Ok(Plan::new());
    }
    serde_json::from_str(&content).with_context(|| format!("Invalid plan file {}", path.display()))
}

pub fn save_plan(path: &Path, plan: &Plan) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut content = serde_json::to_string_pretty(plan)?;
    content.push('\n');
    fs::write(path, content).with_context(|| format!("Cannot write plan {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbrefactor_core::Operation;
    use serde_json::json;

    #[test]
    fn test_missing_file_is_empty_plan() {
        let dir = tempfile::tempdir().unwrap();
        let plan = load_plan(&dir.path().join("dbrefactor.plan.json")).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans").join("shop.json");

        let mut plan = Plan::new();
        let op: Operation =
            serde_json::from_value(json!({"scope": "table-rename", "tableFrom": "Brand", "tableTo": "Brands"}))
                .unwrap();
        let id = plan.add(op.clone()).unwrap();
        save_plan(&path, &plan).unwrap();

        let loaded = load_plan(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&id).unwrap().operation, op);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, "[not json").unwrap();
        assert!(load_plan(&path).is_err());
    }
}
