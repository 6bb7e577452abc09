use colored::Colorize;
use dbrefactor_core::{OperationStatus, PlanEntry, TableInfo};
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::api::{CodeFixResult, SqlBundle};
use crate::cli::OutputFormat;

/// Prints a serializable value as JSON or YAML. Returns `false` for the table format so
/// the caller can render its own table.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            println!("{}", format_yaml(&serde_json::to_value(value)?, 0));
            Ok(true)
        }
        OutputFormat::Table => Ok(false),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_plan(entries: &[(&PlanEntry, OperationStatus)]) {
    if entries.is_empty() {
        println!("Plan is empty.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["#", "ID", "Scope", "Operation", "Status", "Note"]);
    for (position, (entry, state)) in entries.iter().enumerate() {
        let status = match state {
            OperationStatus::Applied => state.to_string().green().to_string(),
            OperationStatus::Pending => state.to_string().yellow().to_string(),
        };
        let scope = if entry.operation.is_destructive() {
            entry.operation.kind().to_string().red().to_string()
        } else {
            entry.operation.kind().to_string()
        };
        builder.push_record([
            (position + 1).to_string(),
            short_id(&entry.id).to_string(),
            scope,
            entry.operation.summary(),
            status,
            entry.operation.note().unwrap_or("").to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));

    let applied = entries
        .iter()
        .filter(|(_, s)| *s == OperationStatus::Applied)
        .count();
    println!("Total: {} ({} applied, {} pending)", entries.len(), applied, entries.len() - applied);
}

pub fn print_tables(tables: &[TableInfo]) {
    if tables.is_empty() {
        println!("No tables found.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Table", "Columns", "Foreign keys", "Indexes"]);
    for table in tables {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let null = if c.is_nullable { " null" } else { "" };
                format!("{} {}{}", c.name, c.sql_type, null)
            })
            .collect();
        let fks: Vec<&str> = table.foreign_keys.iter().map(|f| f.name.as_str()).collect();
        let indexes: Vec<&str> = table.indexes.iter().map(|i| i.name.as_str()).collect();
        builder.push_record([
            table.qualified_name(),
            columns.join("\n"),
            fks.join("\n"),
            indexes.join("\n"),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("Total: {}", tables.len());
}

pub fn print_sql(sql: &SqlBundle) {
    if sql.is_empty() {
        println!("No SQL generated.");
        return;
    }
    for (title, body) in [
        ("Rename SQL", &sql.rename_sql),
        ("Compatibility SQL", &sql.compat_sql),
        ("Cleanup SQL", &sql.cleanup_sql),
    ] {
        if let Some(body) = body.as_deref().filter(|b| !b.trim().is_empty()) {
            println!("{}", format!("-- {title}").cyan());
            println!("{}", body.trim_end());
            println!();
        }
    }
}

pub fn print_codefix(result: &CodeFixResult) {
    println!(
        "{}: {} scanned, {} changed",
        "Code fix".cyan(),
        result.files_scanned,
        result.files_changed
    );
    for change in result.changes.iter().filter(|c| c.changed) {
        println!("  {} {}", "~".yellow(), change.path);
    }
}

pub fn print_log(lines: &[String]) {
    for line in lines {
        println!("  {line}");
    }
}

/// First 8 characters of an entry id, enough to reference it on the command line.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn format_yaml(value: &Value, indent: usize) -> String {
    let prefix = " ".repeat(indent);
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.contains('\n') || s.contains(':') || s.contains('#') {
                format!(
                    "|\n{}{}",
                    " ".repeat(indent + 2),
                    s.replace('\n', &format!("\n{}", " ".repeat(indent + 2)))
                )
            } else {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
        Value::Array(arr) => {
            if arr.is_empty() {
                return "[]".to_string();
            }
            let items: Vec<String> = arr
                .iter()
                .map(|v| format!("{prefix}- {}", format_yaml(v, indent + 2).trim_start()))
                .collect();
            format!("\n{}", items.join("\n"))
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                return "{}".to_string();
            }
            let items: Vec<String> = obj
                .iter()
                .map(|(k, v)| {
                    let val = format_yaml(v, indent + 2);
                    if val.starts_with('\n') {
                        format!("{prefix}{k}:{val}")
                    } else {
                        format!("{prefix}{k}: {val}")
                    }
                })
                .collect();
            if indent == 0 {
                items.join("\n")
            } else {
                format!("\n{}", items.join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_format_yaml_scalars_and_nesting() {
        let value = json!({"extra": {"rebuild": true}});
        assert_eq!(format_yaml(&value, 0), "extra:\n  rebuild: true");
        assert_eq!(format_yaml(&json!("Brand"), 0), "\"Brand\"");
        assert_eq!(format_yaml(&json!([]), 0), "[]");
    }

    #[test]
    fn test_format_yaml_escapes_quotes() {
        assert_eq!(
            format_yaml(&json!({"note": "say \"hi\""}), 0),
            r#"note: "say \"hi\"""#
        );
        assert_eq!(format_yaml(&json!(r"dumps\old"), 0), r#""dumps\\old""#);
    }

    #[test]
    fn test_format_yaml_multiline_string() {
        let value = json!({"sql": "EXEC a;\nEXEC b;"});
        assert_eq!(format_yaml(&value, 0), "sql: |\n    EXEC a;\n    EXEC b;");
    }
}
