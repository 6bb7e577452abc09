//! Planned schema operations.
//!
//! An [`Operation`] is one atomic schema change. The wire form is camelCase JSON with a
//! kebab-case `scope` tag, and every variant carries only the fields its kind needs:
//!
//! ```json
//! { "scope": "column-rename", "tableFrom": "Brand", "columnFrom": "Nm", "columnTo": "Name" }
//! ```
//!
//! Kind-specific details (constraint names, referenced columns, positions) live in a
//! typed `extra` bag that is omitted when empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The eleven operation kinds, in their wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    #[serde(alias = "table")]
    TableRename,
    #[serde(alias = "column")]
    ColumnRename,
    AddColumn,
    DropColumn,
    DropTable,
    DropIndex,
    AddPrimaryKey,
    DropPrimaryKey,
    AddForeignKey,
    DropForeignKey,
    ReorderColumn,
}

impl OperationKind {
    pub const ALL: [OperationKind; 11] = [
        Self::TableRename,
        Self::ColumnRename,
        Self::AddColumn,
        Self::DropColumn,
        Self::DropTable,
        Self::DropIndex,
        Self::AddPrimaryKey,
        Self::DropPrimaryKey,
        Self::AddForeignKey,
        Self::DropForeignKey,
        Self::ReorderColumn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableRename => "table-rename",
            Self::ColumnRename => "column-rename",
            Self::AddColumn => "add-column",
            Self::DropColumn => "drop-column",
            Self::DropTable => "drop-table",
            Self::DropIndex => "drop-index",
            Self::AddPrimaryKey => "add-primary-key",
            Self::DropPrimaryKey => "drop-primary-key",
            Self::AddForeignKey => "add-foreign-key",
            Self::DropForeignKey => "drop-foreign-key",
            Self::ReorderColumn => "reorder-column",
        }
    }

    /// True for kinds whose name carries the `drop-` prefix.
    pub fn is_drop(&self) -> bool {
        self.as_str().starts_with("drop-")
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "table" => Ok(Self::TableRename),
            "column" => Ok(Self::ColumnRename),
            other => Self::ALL
                .into_iter()
                .find(|kind| kind.as_str() == other)
                .ok_or_else(|| CoreError::unknown_scope(s)),
        }
    }
}

/// Which side of a rename receives backward-compatibility objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatArea {
    Write,
    Read,
    Both,
}

impl FromStr for CompatArea {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "write" => Ok(Self::Write),
            "read" => Ok(Self::Read),
            "both" => Ok(Self::Both),
            _ => Err(CoreError::validation(
                "operation",
                format!("unknown area \"{s}\" (expected write, read or both)"),
            )),
        }
    }
}

/// ON DELETE behavior of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[serde(rename = "NO ACTION")]
    NoAction,
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
}

impl FromStr for ReferentialAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "NO ACTION" => Ok(Self::NoAction),
            "CASCADE" => Ok(Self::Cascade),
            "SET NULL" => Ok(Self::SetNull),
            "SET DEFAULT" => Ok(Self::SetDefault),
            _ => Err(CoreError::validation(
                "add-foreign-key",
                format!("unknown ON DELETE action \"{s}\""),
            )),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRenameExtra {
    /// The type change may truncate or discard existing values.
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_data_loss: bool,
}

impl ColumnRenameExtra {
    pub fn is_empty(&self) -> bool {
        !self.allow_data_loss
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddColumnExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl AddColumnExtra {
    pub fn is_empty(&self) -> bool {
        self.nullable.is_none() && self.default_value.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropIndexExtra {
    pub index_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub clustered: bool,
    /// Drop the table's current primary key first.
    #[serde(default, skip_serializing_if = "is_false")]
    pub replace_existing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPrimaryKeyExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
}

impl DropPrimaryKeyExtra {
    pub fn is_empty(&self) -> bool {
        self.constraint_name.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    pub ref_table: String,
    pub ref_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropForeignKeyExtra {
    pub constraint_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderExtra {
    /// 1-based ordinal position.
    pub new_position: u32,
    /// Rebuild the table to physically move the column.
    #[serde(default, skip_serializing_if = "is_false")]
    pub rebuild: bool,
}

/// One planned schema change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Operation {
    #[serde(alias = "table")]
    TableRename {
        table_from: String,
        table_to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        area: Option<CompatArea>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    #[serde(alias = "column")]
    ColumnRename {
        table_from: String,
        column_from: String,
        column_to: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        sql_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        area: Option<CompatArea>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(default, skip_serializing_if = "ColumnRenameExtra::is_empty")]
        extra: ColumnRenameExtra,
    },
    AddColumn {
        table_from: String,
        column_to: String,
        #[serde(rename = "type")]
        sql_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(default, skip_serializing_if = "AddColumnExtra::is_empty")]
        extra: AddColumnExtra,
    },
    DropColumn {
        table_from: String,
        column_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    DropTable {
        table_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    DropIndex {
        table_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        extra: DropIndexExtra,
    },
    AddPrimaryKey {
        table_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        extra: PrimaryKeyExtra,
    },
    DropPrimaryKey {
        table_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(default, skip_serializing_if = "DropPrimaryKeyExtra::is_empty")]
        extra: DropPrimaryKeyExtra,
    },
    AddForeignKey {
        table_from: String,
        column_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        extra: ForeignKeyExtra,
    },
    DropForeignKey {
        table_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        extra: DropForeignKeyExtra,
    },
    ReorderColumn {
        table_from: String,
        column_from: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        extra: ReorderExtra,
    },
}

impl AsRef<Operation> for Operation {
    fn as_ref(&self) -> &Operation {
        self
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::TableRename { .. } => OperationKind::TableRename,
            Self::ColumnRename { .. } => OperationKind::ColumnRename,
            Self::AddColumn { .. } => OperationKind::AddColumn,
            Self::DropColumn { .. } => OperationKind::DropColumn,
            Self::DropTable { .. } => OperationKind::DropTable,
            Self::DropIndex { .. } => OperationKind::DropIndex,
            Self::AddPrimaryKey { .. } => OperationKind::AddPrimaryKey,
            Self::DropPrimaryKey { .. } => OperationKind::DropPrimaryKey,
            Self::AddForeignKey { .. } => OperationKind::AddForeignKey,
            Self::DropForeignKey { .. } => OperationKind::DropForeignKey,
            Self::ReorderColumn { .. } => OperationKind::ReorderColumn,
        }
    }

    pub fn table_from(&self) -> &str {
        match self {
            Self::TableRename { table_from, .. }
            | Self::ColumnRename { table_from, .. }
            | Self::AddColumn { table_from, .. }
            | Self::DropColumn { table_from, .. }
            | Self::DropTable { table_from, .. }
            | Self::DropIndex { table_from, .. }
            | Self::AddPrimaryKey { table_from, .. }
            | Self::DropPrimaryKey { table_from, .. }
            | Self::AddForeignKey { table_from, .. }
            | Self::DropForeignKey { table_from, .. }
            | Self::ReorderColumn { table_from, .. } => table_from,
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            Self::TableRename { note, .. }
            | Self::ColumnRename { note, .. }
            | Self::AddColumn { note, .. }
            | Self::DropColumn { note, .. }
            | Self::DropTable { note, .. }
            | Self::DropIndex { note, .. }
            | Self::AddPrimaryKey { note, .. }
            | Self::DropPrimaryKey { note, .. }
            | Self::AddForeignKey { note, .. }
            | Self::DropForeignKey { note, .. }
            | Self::ReorderColumn { note, .. } => note.as_deref(),
        }
    }

    /// True when the extra bag explicitly opts into destructive behavior.
    pub fn requests_destructive(&self) -> bool {
        match self {
            Self::ColumnRename { extra, .. } => extra.allow_data_loss,
            Self::AddPrimaryKey { extra, .. } => extra.replace_existing,
            Self::ReorderColumn { extra, .. } => extra.rebuild,
            _ => false,
        }
    }

    /// Drop kinds plus operations that request destructive behavior.
    pub fn is_destructive(&self) -> bool {
        self.kind().is_drop() || self.requests_destructive()
    }

    /// Short human-readable description, e.g. `Brand.Nm -> Brand.Name`.
    pub fn summary(&self) -> String {
        match self {
            Self::TableRename {
                table_from,
                table_to,
                ..
            } => format!("{table_from} -> {table_to}"),
            Self::ColumnRename {
                table_from,
                column_from,
                column_to,
                sql_type,
                ..
            } => match sql_type {
                Some(t) => format!("{table_from}.{column_from} -> {table_from}.{column_to} ({t})"),
                None => format!("{table_from}.{column_from} -> {table_from}.{column_to}"),
            },
            Self::AddColumn {
                table_from,
                column_to,
                sql_type,
                ..
            } => format!("+ {table_from}.{column_to} {sql_type}"),
            Self::DropColumn {
                table_from,
                column_from,
                ..
            } => format!("- {table_from}.{column_from}"),
            Self::DropTable { table_from, .. } => format!("- {table_from}"),
            Self::DropIndex {
                table_from, extra, ..
            } => format!("- {table_from} index {}", extra.index_name),
            Self::AddPrimaryKey {
                table_from, extra, ..
            } => format!("+ {table_from} PK ({})", extra.columns.join(", ")),
            Self::DropPrimaryKey { table_from, .. } => format!("- {table_from} PK"),
            Self::AddForeignKey {
                table_from,
                column_from,
                extra,
                ..
            } => format!(
                "+ {table_from}.{column_from} FK -> {}.{}",
                extra.ref_table, extra.ref_column
            ),
            Self::DropForeignKey {
                table_from, extra, ..
            } => format!("- {table_from} FK {}", extra.constraint_name),
            Self::ReorderColumn {
                table_from,
                column_from,
                extra,
                ..
            } => format!("{table_from}.{column_from} -> position {}", extra.new_position),
        }
    }

    /// Checks that every identifier the kind requires is present.
    pub fn validate(&self) -> Result<()> {
        let scope = self.kind().as_str();
        require(scope, "tableFrom", self.table_from())?;

        match self {
            Self::TableRename {
                table_from,
                table_to,
                ..
            } => {
                require(scope, "tableTo", table_to)?;
                if table_from == table_to {
                    return Err(CoreError::validation(
                        scope,
                        "tableTo must differ from tableFrom",
                    ));
                }
            }
            Self::ColumnRename {
                column_from,
                column_to,
                sql_type,
                ..
            } => {
                require(scope, "columnFrom", column_from)?;
                require(scope, "columnTo", column_to)?;
                if let Some(t) = sql_type {
                    require(scope, "type", t)?;
                }
                if column_from == column_to && sql_type.is_none() {
                    return Err(CoreError::validation(
                        scope,
                        "columnTo must differ from columnFrom unless the type changes",
                    ));
                }
            }
            Self::AddColumn {
                column_to,
                sql_type,
                ..
            } => {
                require(scope, "columnTo", column_to)?;
                require(scope, "type", sql_type)?;
            }
            Self::DropColumn { column_from, .. } => require(scope, "columnFrom", column_from)?,
            Self::DropTable { .. } | Self::DropPrimaryKey { .. } => {}
            Self::DropIndex { extra, .. } => require(scope, "extra.indexName", &extra.index_name)?,
            Self::AddPrimaryKey { extra, .. } => {
                if extra.columns.is_empty() {
                    return Err(CoreError::validation(
                        scope,
                        "extra.columns must name at least one column",
                    ));
                }
                for column in &extra.columns {
                    require(scope, "extra.columns", column)?;
                }
            }
            Self::AddForeignKey {
                column_from, extra, ..
            } => {
                require(scope, "columnFrom", column_from)?;
                require(scope, "extra.refTable", &extra.ref_table)?;
                require(scope, "extra.refColumn", &extra.ref_column)?;
            }
            Self::DropForeignKey { extra, .. } => {
                require(scope, "extra.constraintName", &extra.constraint_name)?
            }
            Self::ReorderColumn {
                column_from, extra, ..
            } => {
                require(scope, "columnFrom", column_from)?;
                if extra.new_position == 0 {
                    return Err(CoreError::validation(
                        scope,
                        "extra.newPosition is 1-based",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn require(scope: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(scope, format!("{field} is required")));
    }
    Ok(())
}
