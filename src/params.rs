//! Companion parameter file synchronization.
//!
//! The `.json` next to a layout maps every container id to its layout kind and
//! the per-child layout parameters:
//!
//! ```json
//! { "panel": { "type": "RelativeLayout", "params": { "label": {} } } }
//! ```
//!
//! Sync only ever adds missing keys. Hand-written values, unknown keys and key
//! order survive untouched.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{GenError, Result};
use crate::flatten::FlatNodeIndex;

const KEY_TYPE: &str = "type";
const KEY_PARAMS: &str = "params";

pub type ParamDocument = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct ParamSyncOutcome {
    pub document: ParamDocument,
    /// False means the file on disk is already complete and must not be rewritten.
    pub changed: bool,
    pub added_entries: Vec<String>,
    pub added_params: Vec<(String, String)>,
}

impl ParamSyncOutcome {
    pub fn to_json_string(&self) -> Result<String> {
        to_pretty_json(&self.document)
    }
}

/// Missing or blank content is an empty document; anything else must be a JSON object.
pub fn parse_param_document(existing: Option<&str>, origin: &str) -> Result<ParamDocument> {
    let source = match existing {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(Map::new()),
    };

    match serde_json::from_str::<Value>(source) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(GenError::json(
            origin,
            format!("expected an object at top level, found {}", json_kind(&other)),
        )),
        Err(e) => Err(GenError::json(origin, e)),
    }
}

pub fn sync_params(
    index: &FlatNodeIndex,
    existing: Option<&str>,
    default_type: &str,
    origin: &str,
) -> Result<ParamSyncOutcome> {
    let mut outcome = ParamSyncOutcome {
        document: parse_param_document(existing, origin)?,
        ..Default::default()
    };

    for record in index.non_leaves() {
        let is_new = !outcome.document.contains_key(&record.id);
        let entry = outcome
            .document
            .entry(record.id.clone())
            .or_insert_with(|| Value::Object(Map::new()));

        let Some(entry) = entry.as_object_mut() else {
            log::warn!("{}: entry '{}' is not an object, left as is", origin, record.id);
            continue;
        };
        if is_new {
            outcome.added_entries.push(record.id.clone());
        }

        if !entry.contains_key(KEY_TYPE) {
            entry.insert(KEY_TYPE.to_string(), Value::String(default_type.to_string()));
            outcome.changed = true;
        }
        if !entry.contains_key(KEY_PARAMS) {
            entry.insert(KEY_PARAMS.to_string(), Value::Object(Map::new()));
            outcome.changed = true;
        }

        let Some(params) = entry.get_mut(KEY_PARAMS).and_then(Value::as_object_mut) else {
            log::warn!("{}: '{}.params' is not an object, left as is", origin, record.id);
            continue;
        };
        for child in index.children_of(record) {
            if !params.contains_key(&child.id) {
                params.insert(child.id.clone(), Value::Object(Map::new()));
                outcome.added_params.push((record.id.clone(), child.id.clone()));
                outcome.changed = true;
            }
        }
    }

    Ok(outcome)
}

/// Four-space indented JSON with a trailing newline.
pub fn to_pretty_json(document: &ParamDocument) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|e| GenError::json("serializer", e))?;
    let mut out = String::from_utf8(buf).map_err(|e| GenError::json("serializer", e))?;
    out.push('\n');
    Ok(out)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::tree::XmlNode;
    use serde_json::json;

    /// P[c1, c2]
    fn container_index() -> FlatNodeIndex {
        flatten(
            &XmlNode::new("CompositeView")
                .with_attr("id", "P")
                .with_child(XmlNode::new("Button").with_attr("id", "c1"))
                .with_child(XmlNode::new("Button").with_attr("id", "c2")),
        )
    }

    #[test]
    fn test_existing_values_are_kept() {
        let existing = r#"{"P": {"type": "Grid", "params": {"c1": {"x": 1}}}}"#;
        let outcome = sync_params(&container_index(), Some(existing), "RelativeLayout", "P.json").unwrap();

        assert!(outcome.changed);
        assert_eq!(
            Value::Object(outcome.document.clone()),
            json!({"P": {"type": "Grid", "params": {"c1": {"x": 1}, "c2": {}}}})
        );
        assert_eq!(outcome.added_params, vec![("P".to_string(), "c2".to_string())]);
        assert!(outcome.added_entries.is_empty());
    }

    #[test]
    fn test_missing_file_creates_entries() {
        let outcome = sync_params(&container_index(), None, "RelativeLayout", "P.json").unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.added_entries, vec!["P".to_string()]);
        assert_eq!(
            Value::Object(outcome.document),
            json!({"P": {"type": "RelativeLayout", "params": {"c1": {}, "c2": {}}}})
        );
    }

    #[test]
    fn test_second_run_has_no_changes() {
        let index = container_index();
        let first = sync_params(&index, Some(""), "RelativeLayout", "P.json").unwrap();
        let written = first.to_json_string().unwrap();

        let second = sync_params(&index, Some(&written), "RelativeLayout", "P.json").unwrap();
        assert!(!second.changed);
        assert_eq!(second.to_json_string().unwrap(), written);
    }

    #[test]
    fn test_backfills_only_missing_fields() {
        let existing = r#"{"P": {"params": {"c1": {}, "c2": {}}, "note": "keep"}}"#;
        let outcome = sync_params(&container_index(), Some(existing), "RelativeLayout", "P.json").unwrap();
        assert!(outcome.changed);
        let entry = &outcome.document["P"];
        assert_eq!(entry["type"], json!("RelativeLayout"));
        assert_eq!(entry["note"], json!("keep"));
    }

    #[test]
    fn test_leaves_and_unrelated_entries_are_ignored() {
        let existing = r#"{"other": {"type": "Stack"}}"#;
        let outcome = sync_params(&container_index(), Some(existing), "RelativeLayout", "P.json").unwrap();
        let keys: Vec<&String> = outcome.document.keys().collect();
        assert_eq!(keys, vec!["other", "P"]);
        assert!(!outcome.document.contains_key("c1"));
        assert_eq!(outcome.document["other"], json!({"type": "Stack"}));
    }

    #[test]
    fn test_non_object_entry_is_left_alone() {
        let existing = r#"{"P": 3}"#;
        let outcome = sync_params(&container_index(), Some(existing), "RelativeLayout", "P.json").unwrap();
        assert!(!outcome.changed);
        assert!(outcome.added_entries.is_empty());
        assert!(outcome.added_params.is_empty());
        assert_eq!(Value::Object(outcome.document), json!({"P": 3}));
    }

    #[test]
    fn test_non_object_params_are_left_alone() {
        let existing = r#"{"P": {"type": "Grid", "params": []}}"#;
        let outcome = sync_params(&container_index(), Some(existing), "RelativeLayout", "P.json").unwrap();
        assert!(!outcome.changed);
        assert!(outcome.added_params.is_empty());
        assert_eq!(
            Value::Object(outcome.document),
            json!({"P": {"type": "Grid", "params": []}})
        );

        // a missing `type` is still backfilled next to a malformed `params`
        let existing = r#"{"P": {"params": []}}"#;
        let outcome = sync_params(&container_index(), Some(existing), "RelativeLayout", "P.json").unwrap();
        assert!(outcome.changed);
        assert_eq!(
            Value::Object(outcome.document),
            json!({"P": {"params": [], "type": "RelativeLayout"}})
        );
    }

    #[test]
    fn test_malformed_json_is_a_parse_failure() {
        let err = sync_params(&container_index(), Some("{ broken"), "RelativeLayout", "P.json").unwrap_err();
        assert!(err.is_parse_failure());

        let err = sync_params(&container_index(), Some("[1, 2]"), "RelativeLayout", "P.json").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let mut doc = Map::new();
        doc.insert("a".to_string(), json!({"type": "RelativeLayout"}));
        let text = to_pretty_json(&doc).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"type\": \"RelativeLayout\"\n    }\n}\n");
    }
}
