//! Partitioning a plan into applied and pending operations.
//!
//! The functions here are pure. Callers load the applied set, compute what is pending,
//! run the backend call, and only after a confirmed success call [`mark_applied`] and
//! persist the result. A failed or timed-out call must leave the set untouched, so an
//! operation is applied at least once but possibly more than once.
//!
//! Cleanup (removing synonyms/views, executing drops) is not gated by the applied set
//! and runs over the whole plan.

use tracing::debug;

use crate::applied::AppliedSet;
use crate::fingerprint::fingerprint;
use crate::operation::Operation;

/// Observed state of one plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Applied,
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Applied => write!(f, "applied"),
        }
    }
}

/// Plan entries whose fingerprint is not in `applied`, in plan order.
pub fn pending<'a, T: AsRef<Operation>>(plan: &'a [T], applied: &AppliedSet) -> Vec<&'a T> {
    let out: Vec<&T> = plan
        .iter()
        .filter(|entry| !applied.contains(&fingerprint(entry.as_ref())))
        .collect();
    debug!(
        total = plan.len(),
        pending = out.len(),
        applied = applied.len(),
        "reconciled plan"
    );
    out
}

/// Adds the fingerprint of every operation to `applied`. Returns how many were new.
pub fn mark_applied<'a, T, I>(ops: I, applied: &mut AppliedSet) -> usize
where
    T: AsRef<Operation> + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let added = ops
        .into_iter()
        .filter(|op| applied.insert(fingerprint(op.as_ref())))
        .count();
    debug!(added, total = applied.len(), "marked operations applied");
    added
}

/// True if any operation is a drop kind or asks for destructive behavior.
pub fn has_destructive_ops<T: AsRef<Operation>>(plan: &[T]) -> bool {
    plan.iter().any(|entry| entry.as_ref().is_destructive())
}

/// Every entry with its status, in plan order.
pub fn status<'a, T: AsRef<Operation>>(
    plan: &'a [T],
    applied: &AppliedSet,
) -> Vec<(&'a T, OperationStatus)> {
    plan.iter()
        .map(|entry| {
            let state = if applied.contains(&fingerprint(entry.as_ref())) {
                OperationStatus::Applied
            } else {
                OperationStatus::Pending
            };
            (entry, state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{AddColumnExtra, ReorderExtra};

    fn table_rename(from: &str, to: &str) -> Operation {
        Operation::TableRename {
            table_from: from.into(),
            table_to: to.into(),
            area: None,
            note: None,
        }
    }

    fn add_column(table: &str, column: &str) -> Operation {
        Operation::AddColumn {
            table_from: table.into(),
            column_to: column.into(),
            sql_type: "int".into(),
            note: None,
            extra: AddColumnExtra::default(),
        }
    }

    fn drop_column(table: &str, column: &str) -> Operation {
        Operation::DropColumn {
            table_from: table.into(),
            column_from: column.into(),
            note: None,
        }
    }

    #[test]
    fn test_single_rename_is_pending_then_applied() {
        let plan = vec![table_rename("Brand", "Brands")];
        let mut applied = AppliedSet::new();

        let todo = pending(&plan, &applied);
        assert_eq!(todo, vec![&plan[0]]);

        // backend apply succeeded
        mark_applied(todo, &mut applied);
        assert!(pending(&plan, &applied).is_empty());
    }

    #[test]
    fn test_previously_applied_operation_is_skipped() {
        let old = table_rename("Brand", "Brands");
        let new = add_column("Brands", "Slug");
        let plan = vec![old.clone(), new.clone()];

        let applied: AppliedSet = [fingerprint(&old)].into_iter().collect();
        let todo = pending(&plan, &applied);
        assert_eq!(todo, vec![&new]);
    }

    #[test]
    fn test_pending_preserves_plan_order() {
        let plan = vec![
            table_rename("A", "A2"),
            table_rename("B", "B2"),
            table_rename("C", "C2"),
            table_rename("D", "D2"),
        ];
        let applied: AppliedSet = [fingerprint(&plan[1]), fingerprint(&plan[3])]
            .into_iter()
            .collect();

        let todo = pending(&plan, &applied);
        assert_eq!(todo, vec![&plan[0], &plan[2]]);
        for op in todo {
            assert!(!applied.contains(&fingerprint(op)));
        }
    }

    #[test]
    fn test_mark_applied_is_idempotent() {
        let plan = vec![table_rename("A", "B"), add_column("B", "C")];
        let mut once = AppliedSet::new();
        let todo = pending(&plan, &once);
        assert_eq!(mark_applied(todo.clone(), &mut once), 2);

        let mut twice = once.clone();
        assert_eq!(mark_applied(todo, &mut twice), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_failed_apply_keeps_operations_pending() {
        let plan = vec![table_rename("Brand", "Brands")];
        let applied = AppliedSet::new();
        let todo = pending(&plan, &applied);
        // the backend call failed, mark_applied is never reached
        drop(todo);
        assert_eq!(pending(&plan, &applied).len(), 1);
    }

    #[test]
    fn test_destructive_detection() {
        let safe = vec![table_rename("Brand", "Brands"), add_column("Brands", "Slug")];
        assert!(!has_destructive_ops(&safe));

        let mut with_drop = safe.clone();
        with_drop.push(drop_column("Brands", "Legacy"));
        assert!(has_destructive_ops(&with_drop));

        let rebuild = vec![Operation::ReorderColumn {
            table_from: "Brands".into(),
            column_from: "Slug".into(),
            note: None,
            extra: ReorderExtra {
                new_position: 1,
                rebuild: true,
            },
        }];
        assert!(has_destructive_ops(&rebuild));
        assert!(!has_destructive_ops::<Operation>(&[]));
    }

    #[test]
    fn test_status_listing() {
        let plan = vec![table_rename("A", "B"), table_rename("C", "D")];
        let applied: AppliedSet = [fingerprint(&plan[0])].into_iter().collect();
        let states: Vec<_> = status(&plan, &applied)
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        assert_eq!(
            states,
            vec![OperationStatus::Applied, OperationStatus::Pending]
        );
        assert_eq!(OperationStatus::Pending.to_string(), "pending");
    }
}
