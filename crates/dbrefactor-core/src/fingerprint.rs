//! Content fingerprints for operations.
//!
//! A fingerprint identifies an operation by its semantically relevant fields only:
//!
//! 1. the transient client id is stripped,
//! 2. keys are normalized to their wire spelling and `null` values dropped,
//! 3. the record is serialized compactly with keys sorted at every level,
//! 4. the serialized text is reduced to a wrapping 32-bit polynomial checksum
//!    (`h = h * 31 + unit` over UTF-16 code units) whose decimal form is the fingerprint.
//!
//! This is a checksum, not a cryptographic digest. Two different operations can collide;
//! the consequence is that one of them is reported as already applied.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::operation::Operation;

/// Stable identity of an operation's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Fingerprint of a typed operation.
pub fn fingerprint(op: &Operation) -> Fingerprint {
    // Operation serializes to a plain JSON object, this cannot fail.
    let value = serde_json::to_value(op).unwrap_or_default();
    hash_canonical(&canonicalize(&value, true))
}

/// Fingerprint of a loosely-typed record in any key casing.
///
/// Records that read as a valid [`Operation`] after normalization, without losing any
/// field that carries a value, are hashed in their typed form, so legacy spellings
/// (`"scope": "table"`) match their canonical equivalents. Anything else is hashed as the
/// normalized record. Never fails.
pub fn fingerprint_value(record: &Value) -> Fingerprint {
    let canonical = canonicalize(record, true);
    let typed = serde_json::from_value::<Operation>(canonical.clone())
        .ok()
        .and_then(|op| serde_json::to_value(&op).ok().map(|value| (op, value)));
    match typed {
        Some((op, value)) if !drops_content(&canonical, &value) => fingerprint(&op),
        _ => hash_canonical(&canonical),
    }
}

// True when `original` has a key absent from `typed` whose value is more than an unset
// flag or an empty object.
fn drops_content(original: &Value, typed: &Value) -> bool {
    let (Value::Object(original), Value::Object(typed)) = (original, typed) else {
        return false;
    };
    original.iter().any(|(key, field)| match typed.get(key) {
        Some(kept) => drops_content(field, kept),
        None => !is_unset(field),
    })
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Object(map) => map.values().all(is_unset),
        _ => false,
    }
}

fn hash_canonical(value: &Value) -> Fingerprint {
    let text = serde_json::to_string(value).unwrap_or_default();
    Fingerprint(rolling_hash(&text).to_string())
}

pub(crate) fn rolling_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Normalized copy of `value`: camelCase keys in sorted order, no nulls, and at the top
/// level no client id.
pub(crate) fn canonicalize(value: &Value, top_level: bool) -> Value {
    match value {
        Value::Object(map) => {
            // Iterate in original key order so colliding spellings resolve the same way
            // regardless of insertion order.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut normalized = std::collections::BTreeMap::new();
            for key in keys {
                let field = &map[key];
                if field.is_null() {
                    continue;
                }
                let camel = fold_key(key);
                if top_level && camel == "id" {
                    continue;
                }
                normalized.insert(camel, canonicalize(field, false));
            }

            let mut out = Map::new();
            for (key, field) in normalized {
                out.insert(key, field);
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| canonicalize(item, false)).collect())
        }
        other => other.clone(),
    }
}

/// Every field name an operation can carry, in wire spelling.
const OPERATION_FIELDS: &[&str] = &[
    "scope",
    "id",
    "tableFrom",
    "tableTo",
    "columnFrom",
    "columnTo",
    "type",
    "area",
    "note",
    "extra",
    "allowDataLoss",
    "nullable",
    "defaultValue",
    "indexName",
    "constraintName",
    "columns",
    "clustered",
    "replaceExisting",
    "refTable",
    "refColumn",
    "onDelete",
    "newPosition",
    "rebuild",
];

/// Wire name for `key`. Operation fields match regardless of letter case and separators
/// (`tablefrom`, `TABLEFROM` and `Table_From` are all `tableFrom`, `sqlType` is `type`);
/// other keys fall back to [`to_camel_case`].
pub fn fold_key(key: &str) -> String {
    let folded: String = key
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect();
    if folded == "sqltype" {
        return "type".to_string();
    }
    OPERATION_FIELDS
        .iter()
        .find(|field| field.to_ascii_lowercase() == folded)
        .map_or_else(|| to_camel_case(key), |field| (*field).to_string())
}

/// `TableFrom`, `table_from`, `table-from` and `TABLE_FROM` all become `tableFrom`.
pub fn to_camel_case(key: &str) -> String {
    let shouting = !key.chars().any(char::is_lowercase);
    let mut out = String::with_capacity(key.len());

    for (i, segment) in key
        .split(['_', '-', ' '])
        .filter(|s| !s.is_empty())
        .enumerate()
    {
        let segment = if shouting {
            segment.to_lowercase()
        } else {
            segment.to_string()
        };
        if i == 0 {
            out.push_str(&lower_leading(&segment));
        } else {
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

// Lowercases a leading capital run, keeping the last capital when it starts a word
// (`SQLType` -> `sqlType`).
fn lower_leading(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lower = match run {
        0 | 1 => run,
        n if n == chars.len() => n,
        n => n - 1,
    };
    chars
        .iter()
        .enumerate()
        .flat_map(|(i, c)| {
            if i < lower {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![*c]
            }
        })
        .collect()
}
