//! Applying a plan through a store, as a caller does around each backend call.

use dbrefactor_core::{
    AppliedSet, Fingerprint, Operation, Plan, fingerprint, has_destructive_ops, mark_applied,
    pending,
};
use dbrefactor_storage::{AppliedStore, FileStore, MemoryStore};

fn table_rename(from: &str, to: &str) -> Operation {
    Operation::TableRename {
        table_from: from.into(),
        table_to: to.into(),
        area: None,
        note: None,
    }
}

fn stores() -> (tempfile::TempDir, Vec<Box<dyn AppliedStore>>) {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Box<dyn AppliedStore>> = vec![
        Box::new(MemoryStore::new()),
        Box::new(FileStore::new(dir.path())),
    ];
    (dir, stores)
}

#[test]
fn apply_then_reload_leaves_nothing_pending() {
    let (_dir, stores) = stores();
    for store in stores {
        let mut plan = Plan::new();
        plan.add(table_rename("Brand", "Brands")).unwrap();

        let mut applied = store.load("SOLUTION");
        let todo = pending(plan.entries(), &applied);
        assert_eq!(todo.len(), 1, "{}", store.backend_name());

        // backend confirmed the apply
        mark_applied(todo, &mut applied);
        store.save("SOLUTION", &applied).unwrap();

        let reloaded = store.load("SOLUTION");
        assert!(pending(plan.entries(), &reloaded).is_empty());
    }
}

#[test]
fn previously_applied_entry_is_not_resent() {
    let (_dir, stores) = stores();
    for store in stores {
        let old = table_rename("Brand", "Brands");
        let seeded: AppliedSet = [fingerprint(&old)].into_iter().collect();
        store.save("SOLUTION", &seeded).unwrap();

        let mut plan = Plan::new();
        plan.add(table_rename("Category", "Categories")).unwrap();
        plan.add(old).unwrap();
        plan.add(table_rename("Order", "Orders")).unwrap();

        let applied = store.load("SOLUTION");
        let todo: Vec<&str> = pending(plan.entries(), &applied)
            .into_iter()
            .map(|e| e.operation.table_from())
            .collect();
        assert_eq!(todo, vec!["Category", "Order"]);
    }
}

#[test]
fn root_keys_are_isolated() {
    let (_dir, stores) = stores();
    for store in stores {
        let a: AppliedSet = ["1", "2"].into_iter().map(Fingerprint::from).collect();
        store.save("proj-a", &a).unwrap();
        assert!(store.load("proj-b").is_empty());
        assert_eq!(store.load("proj-a"), a);
    }
}

#[test]
fn later_save_wins() {
    let (_dir, stores) = stores();
    for store in stores {
        let first: AppliedSet = ["1"].into_iter().map(Fingerprint::from).collect();
        let second: AppliedSet = ["2"].into_iter().map(Fingerprint::from).collect();
        store.save("SOLUTION", &first).unwrap();
        store.save("SOLUTION", &second).unwrap();
        assert_eq!(store.load("SOLUTION"), second);
    }
}

#[test]
fn drop_column_marks_plan_destructive() {
    let with_drop: Vec<Operation> = serde_json::from_str(
        r#"[
            {"scope": "table-rename", "tableFrom": "Brand", "tableTo": "Brands"},
            {"scope": "drop-column", "tableFrom": "Brands", "columnFrom": "Legacy"}
        ]"#,
    )
    .unwrap();
    assert!(has_destructive_ops(&with_drop));

    let safe: Vec<Operation> = serde_json::from_str(
        r#"[
            {"scope": "table-rename", "tableFrom": "Brand", "tableTo": "Brands"},
            {"scope": "add-column", "tableFrom": "Brands", "columnTo": "Slug", "type": "nvarchar(100)"}
        ]"#,
    )
    .unwrap();
    assert!(!has_destructive_ops(&safe));
}
