//! Schema snapshot returned by the backend's analyzer.
//!
//! The backend has answered in both camelCase and PascalCase over time, and either as a
//! bare array of tables or wrapped in `{ "tables": [...] }`. Everything is normalized
//! here so nothing downstream has to care.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(rename = "type", alias = "Type", alias = "sqlType", alias = "SqlType", default)]
    pub sql_type: String,
    #[serde(alias = "IsNullable", default)]
    pub is_nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyInfo {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "FromTable", default, skip_serializing_if = "Option::is_none")]
    pub from_table: Option<String>,
    #[serde(alias = "FromColumn", default, skip_serializing_if = "Option::is_none")]
    pub from_column: Option<String>,
    #[serde(alias = "ToTable", default, skip_serializing_if = "Option::is_none")]
    pub to_table: Option<String>,
    #[serde(alias = "ToColumn", default, skip_serializing_if = "Option::is_none")]
    pub to_column: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "IsUnique", default)]
    pub is_unique: bool,
    #[serde(alias = "Columns", default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    #[serde(alias = "Schema", default)]
    pub schema: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Columns", default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(alias = "ForeignKeys", default)]
    pub foreign_keys: Vec<ForeignKeyInfo>,
    #[serde(alias = "Indexes", default)]
    pub indexes: Vec<IndexInfo>,
}

impl TableInfo {
    /// `schema.name`, or just `name` when the schema is empty.
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

/// Reads an analyzer payload into tables. Unrecognized shapes and malformed tables are
/// skipped with a warning.
pub fn normalize_schema(raw: &Value) -> Vec<TableInfo> {
    let tables = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("tables").or_else(|| map.get("Tables")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    tables
        .iter()
        .filter_map(|table| match TableInfo::deserialize(table) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(error = %e, "skipping malformed table in schema payload");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case_object_payload() {
        let raw = json!({
            "tables": [{
                "schema": "dbo",
                "name": "Brand",
                "columns": [{"name": "Id", "type": "int", "isNullable": false}],
                "foreignKeys": [],
                "indexes": [{"name": "PK_Brand", "isUnique": true, "columns": ["Id"]}]
            }]
        });
        let tables = normalize_schema(&raw);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].qualified_name(), "dbo.Brand");
        assert_eq!(tables[0].columns[0].sql_type, "int");
        assert!(tables[0].indexes[0].is_unique);
    }

    #[test]
    fn test_pascal_case_array_payload() {
        let raw = json!([{
            "Schema": "sales",
            "Name": "Product",
            "Columns": [{"Name": "BrandId", "SqlType": "int", "IsNullable": true}],
            "ForeignKeys": [{
                "Name": "FK_Product_Brand",
                "FromTable": "Product",
                "FromColumn": "BrandId",
                "ToTable": "Brand",
                "ToColumn": "Id"
            }]
        }]);
        let tables = normalize_schema(&raw);
        assert_eq!(tables[0].name, "Product");
        assert!(tables[0].columns[0].is_nullable);
        assert_eq!(tables[0].foreign_keys[0].to_table.as_deref(), Some("Brand"));
        assert!(tables[0].indexes.is_empty());
    }

    #[test]
    fn test_unrecognized_payloads_yield_nothing() {
        assert!(normalize_schema(&json!(null)).is_empty());
        assert!(normalize_schema(&json!({"rows": []})).is_empty());
        assert_eq!(
            normalize_schema(&json!([{"name": "Ok"}, {"columns": "broken"}])).len(),
            1
        );
    }
}
