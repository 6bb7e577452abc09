//! Loosely-filled operation records, as entered by a user before validation.

use crate::error::{CoreError, Result};
use crate::operation::{
    AddColumnExtra, ColumnRenameExtra, CompatArea, DropForeignKeyExtra, DropIndexExtra,
    DropPrimaryKeyExtra, ForeignKeyExtra, Operation, OperationKind, PrimaryKeyExtra,
    ReferentialAction, ReorderExtra,
};

/// Every field any operation kind may use. Only the fields relevant to `scope` are read
/// by [`OperationDraft::build`]; the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationDraft {
    pub scope: Option<OperationKind>,
    pub table_from: Option<String>,
    pub table_to: Option<String>,
    pub column_from: Option<String>,
    pub column_to: Option<String>,
    pub sql_type: Option<String>,
    pub area: Option<CompatArea>,
    pub note: Option<String>,
    pub constraint_name: Option<String>,
    pub index_name: Option<String>,
    pub ref_table: Option<String>,
    pub ref_column: Option<String>,
    pub on_delete: Option<ReferentialAction>,
    pub columns: Vec<String>,
    pub clustered: bool,
    pub replace_existing: bool,
    pub allow_data_loss: bool,
    pub nullable: Option<bool>,
    pub default_value: Option<String>,
    pub new_position: Option<u32>,
    pub rebuild: bool,
}

impl OperationDraft {
    pub fn new(scope: OperationKind) -> Self {
        Self {
            scope: Some(scope),
            ..Self::default()
        }
    }

    /// Builds and validates the typed operation.
    pub fn build(&self) -> Result<Operation> {
        let scope = self
            .scope
            .ok_or_else(|| CoreError::validation("operation", "scope is required"))?;
        let s = scope.as_str();
        let table_from = required(s, "tableFrom", &self.table_from)?;
        let note = optional(&self.note);

        let op = match scope {
            OperationKind::TableRename => Operation::TableRename {
                table_from,
                table_to: required(s, "tableTo", &self.table_to)?,
                area: self.area,
                note,
            },
            OperationKind::ColumnRename => Operation::ColumnRename {
                table_from,
                column_from: required(s, "columnFrom", &self.column_from)?,
                column_to: required(s, "columnTo", &self.column_to)?,
                sql_type: optional(&self.sql_type),
                area: self.area,
                note,
                extra: ColumnRenameExtra {
                    allow_data_loss: self.allow_data_loss,
                },
            },
            OperationKind::AddColumn => Operation::AddColumn {
                table_from,
                column_to: required(s, "columnTo", &self.column_to)?,
                sql_type: required(s, "type", &self.sql_type)?,
                note,
                extra: AddColumnExtra {
                    nullable: self.nullable,
                    default_value: optional(&self.default_value),
                },
            },
            OperationKind::DropColumn => Operation::DropColumn {
                table_from,
                column_from: required(s, "columnFrom", &self.column_from)?,
                note,
            },
            OperationKind::DropTable => Operation::DropTable { table_from, note },
            OperationKind::DropIndex => Operation::DropIndex {
                table_from,
                note,
                extra: DropIndexExtra {
                    index_name: required(s, "extra.indexName", &self.index_name)?,
                },
            },
            OperationKind::AddPrimaryKey => Operation::AddPrimaryKey {
                table_from,
                note,
                extra: PrimaryKeyExtra {
                    constraint_name: optional(&self.constraint_name),
                    columns: self
                        .columns
                        .iter()
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect(),
                    clustered: self.clustered,
                    replace_existing: self.replace_existing,
                },
            },
            OperationKind::DropPrimaryKey => Operation::DropPrimaryKey {
                table_from,
                note,
                extra: DropPrimaryKeyExtra {
                    constraint_name: optional(&self.constraint_name),
                },
            },
            OperationKind::AddForeignKey => Operation::AddForeignKey {
                table_from,
                column_from: required(s, "columnFrom", &self.column_from)?,
                note,
                extra: ForeignKeyExtra {
                    constraint_name: optional(&self.constraint_name),
                    ref_table: required(s, "extra.refTable", &self.ref_table)?,
                    ref_column: required(s, "extra.refColumn", &self.ref_column)?,
                    on_delete: self.on_delete,
                },
            },
            OperationKind::DropForeignKey => Operation::DropForeignKey {
                table_from,
                note,
                extra: DropForeignKeyExtra {
                    constraint_name: required(s, "extra.constraintName", &self.constraint_name)?,
                },
            },
            OperationKind::ReorderColumn => Operation::ReorderColumn {
                table_from,
                column_from: required(s, "columnFrom", &self.column_from)?,
                note,
                extra: ReorderExtra {
                    new_position: self.new_position.ok_or_else(|| {
                        CoreError::validation(s, "extra.newPosition is required")
                    })?,
                    rebuild: self.rebuild,
                },
            },
        };

        op.validate()?;
        Ok(op)
    }
}

impl From<&Operation> for OperationDraft {
    fn from(op: &Operation) -> Self {
        let mut draft = OperationDraft::new(op.kind());
        draft.table_from = Some(op.table_from().to_string());
        draft.note = op.note().map(str::to_string);

        match op {
            Operation::TableRename { table_to, area, .. } => {
                draft.table_to = Some(table_to.clone());
                draft.area = *area;
            }
            Operation::ColumnRename {
                column_from,
                column_to,
                sql_type,
                area,
                extra,
                ..
            } => {
                draft.column_from = Some(column_from.clone());
                draft.column_to = Some(column_to.clone());
                draft.sql_type = sql_type.clone();
                draft.area = *area;
                draft.allow_data_loss = extra.allow_data_loss;
            }
            Operation::AddColumn {
                column_to,
                sql_type,
                extra,
                ..
            } => {
                draft.column_to = Some(column_to.clone());
                draft.sql_type = Some(sql_type.clone());
                draft.nullable = extra.nullable;
                draft.default_value = extra.default_value.clone();
            }
            Operation::DropColumn { column_from, .. } => {
                draft.column_from = Some(column_from.clone());
            }
            Operation::DropTable { .. } => {}
            Operation::DropIndex { extra, .. } => {
                draft.index_name = Some(extra.index_name.clone());
            }
            Operation::AddPrimaryKey { extra, .. } => {
                draft.constraint_name = extra.constraint_name.clone();
                draft.columns = extra.columns.clone();
                draft.clustered = extra.clustered;
                draft.replace_existing = extra.replace_existing;
            }
            Operation::DropPrimaryKey { extra, .. } => {
                draft.constraint_name = extra.constraint_name.clone();
            }
            Operation::AddForeignKey {
                column_from, extra, ..
            } => {
                draft.column_from = Some(column_from.clone());
                draft.constraint_name = extra.constraint_name.clone();
                draft.ref_table = Some(extra.ref_table.clone());
                draft.ref_column = Some(extra.ref_column.clone());
                draft.on_delete = extra.on_delete;
            }
            Operation::DropForeignKey { extra, .. } => {
                draft.constraint_name = Some(extra.constraint_name.clone());
            }
            Operation::ReorderColumn {
                column_from, extra, ..
            } => {
                draft.column_from = Some(column_from.clone());
                draft.new_position = Some(extra.new_position);
                draft.rebuild = extra.rebuild;
            }
        }
        draft
    }
}

fn required(scope: &str, field: &str, value: &Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| CoreError::validation(scope, format!("{field} is required")))
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_table_rename() {
        let mut draft = OperationDraft::new(OperationKind::TableRename);
        draft.table_from = Some(" Brand ".into());
        draft.table_to = Some("Brands".into());
        draft.note = Some("".into());
        // irrelevant for a table rename
        draft.column_from = Some("Ignored".into());

        let op = draft.build().unwrap();
        assert_eq!(
            op,
            Operation::TableRename {
                table_from: "Brand".into(),
                table_to: "Brands".into(),
                area: None,
                note: None,
            }
        );
    }

    #[test]
    fn test_build_reports_missing_field() {
        let mut draft = OperationDraft::new(OperationKind::AddForeignKey);
        draft.table_from = Some("Product".into());
        draft.column_from = Some("BrandId".into());
        draft.ref_table = Some("Brand".into());

        let err = draft.build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid add-foreign-key operation: extra.refColumn is required"
        );
    }

    #[test]
    fn test_build_without_scope() {
        assert!(OperationDraft::default().build().is_err());
    }

    #[test]
    fn test_draft_round_trip_for_editing() {
        let mut draft = OperationDraft::new(OperationKind::AddPrimaryKey);
        draft.table_from = Some("Brand".into());
        draft.columns = vec!["Id".into(), " ".into()];
        draft.clustered = true;
        let op = draft.build().unwrap();

        let mut edited = OperationDraft::from(&op);
        edited.columns.push("TenantId".into());
        let rebuilt = edited.build().unwrap();

        match rebuilt {
            Operation::AddPrimaryKey { extra, .. } => {
                assert_eq!(extra.columns, vec!["Id".to_string(), "TenantId".to_string()]);
                assert!(extra.clustered);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reorder_requires_position() {
        let mut draft = OperationDraft::new(OperationKind::ReorderColumn);
        draft.table_from = Some("Brand".into());
        draft.column_from = Some("Name".into());
        assert!(draft.build().is_err());

        draft.new_position = Some(1);
        assert!(draft.build().is_ok());
    }
}
