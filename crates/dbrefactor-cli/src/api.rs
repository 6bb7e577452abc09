//! Request and response bodies of the refactoring backend.
//!
//! Responses are read leniently: the backend has shipped both camelCase and PascalCase
//! payloads, and older code-fix results used `scanned`/`changed`/`files`.

use dbrefactor_core::Operation;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How a request reaches the database: an open session or a one-off connection string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Connection {
    Session {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    ConnectionString {
        #[serde(rename = "connectionString")]
        connection_string: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest<'a> {
    pub connection_string: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    #[serde(alias = "SessionId")]
    pub session_id: String,
    #[serde(alias = "ExpiresAtUtc", default)]
    pub expires_at_utc: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeSchemaRequest<'a> {
    #[serde(flatten)]
    pub connection: &'a Connection,
}

/// Switches that shape the generated SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub use_synonyms: bool,
    pub use_views: bool,
    pub cqrs: bool,
    pub allow_destructive: bool,
}

#[derive(Debug, Serialize)]
pub struct RefactorPlanDto<'a> {
    pub renames: Vec<&'a Operation>,
}

impl<'a> RefactorPlanDto<'a> {
    pub fn new<T: AsRef<Operation>>(ops: &[&'a T]) -> Self {
        Self {
            renames: ops.iter().map(|op| (*op).as_ref()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactorRequest<'a> {
    #[serde(flatten)]
    pub connection: &'a Connection,
    pub apply: bool,
    pub root_key: &'a str,
    pub use_synonyms: bool,
    pub use_views: bool,
    pub cqrs: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_destructive: bool,
    pub plan: RefactorPlanDto<'a>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlBundle {
    #[serde(alias = "RenameSql", default)]
    pub rename_sql: Option<String>,
    #[serde(alias = "CompatSql", default)]
    pub compat_sql: Option<String>,
    #[serde(alias = "CleanupSql", default)]
    pub cleanup_sql: Option<String>,
}

impl SqlBundle {
    pub fn is_empty(&self) -> bool {
        [&self.rename_sql, &self.compat_sql, &self.cleanup_sql]
            .iter()
            .all(|s| s.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    #[serde(alias = "Path", alias = "file", alias = "File")]
    pub path: String,
    #[serde(alias = "Changed", default)]
    pub changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixResult {
    #[serde(alias = "FilesScanned", alias = "scanned", alias = "Scanned", default)]
    pub files_scanned: u64,
    #[serde(alias = "FilesChanged", alias = "changed", alias = "Changed", default)]
    pub files_changed: u64,
    #[serde(alias = "Changes", alias = "files", alias = "Files", default)]
    pub changes: Vec<FileChange>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefactorResponse {
    #[serde(alias = "Ok", default = "default_true")]
    pub ok: bool,
    #[serde(alias = "Sql", default)]
    pub sql: SqlBundle,
    #[serde(alias = "Codefix", alias = "codeFix", alias = "CodeFix", default)]
    pub codefix: Option<CodeFixResult>,
    #[serde(alias = "DbLog", default, deserialize_with = "lines")]
    pub db_log: Vec<String>,
    #[serde(alias = "Message", alias = "error", alias = "Error", default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest<'a> {
    #[serde(flatten)]
    pub connection: &'a Connection,
    pub renames: Vec<&'a Operation>,
    pub use_synonyms: bool,
    pub use_views: bool,
    pub cqrs: bool,
    pub allow_destructive: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    #[serde(alias = "Ok", default = "default_true")]
    pub ok: bool,
    #[serde(alias = "Log", default, deserialize_with = "lines")]
    pub log: Vec<String>,
    #[serde(alias = "Sql", default)]
    pub sql: SqlBundle,
    #[serde(alias = "Message", alias = "error", alias = "Error", default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixRequest<'a> {
    pub root_key: &'a str,
    pub apply: bool,
    pub plan: RefactorPlanDto<'a>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub include_globs: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub exclude_globs: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixResponse {
    #[serde(alias = "Ok", default = "default_true")]
    pub ok: bool,
    #[serde(flatten)]
    pub result: CodeFixResult,
    #[serde(alias = "Message", alias = "error", alias = "Error", default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A log that arrives either as one string or as an array of lines.
fn lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(s) => s.lines().map(str::to_string).collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        other => vec![other.to_string()],
    })
}
