//! Loading declarative alias maps from JSON documents.
//!
//! Compute hooks have no JSON form; load the static part of a composite map and
//! attach hooks afterwards with [`CompositeMap::set_compute`](crate::CompositeMap::set_compute).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::rules::{
    ALIASES_FIELD, AliasMap, CAST_TO_FIELD, COMPUTE_FIELD, CastTo, CompositeRule, KeyValueRule,
};
use crate::value::Value;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read alias map {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid alias map JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("alias map must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("invalid rule '{key}': {reason}")]
    InvalidRule { key: String, reason: String },
}

impl LoadError {
    fn rule(key: &str, reason: impl Into<String>) -> Self {
        LoadError::InvalidRule {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Rule shapes that can be read from a JSON rule entry.
pub trait LoadRule: Sized + Default {
    fn from_json(key: &str, fields: serde_json::Map<String, JsonValue>) -> Result<Self, LoadError>;
}

impl LoadRule for KeyValueRule {
    fn from_json(key: &str, fields: serde_json::Map<String, JsonValue>) -> Result<Self, LoadError> {
        let mut rule = KeyValueRule::default();
        for (name, value) in fields {
            match name.as_str() {
                ALIASES_FIELD => rule.aliases = load_aliases(key, value)?,
                CAST_TO_FIELD => rule.cast_to = load_cast(key, value)?,
                _ => {
                    // Only arrays are value-alias lists; other fields carry no aliases.
                    if let JsonValue::Array(items) = value {
                        let aliases = items
                            .into_iter()
                            .map(|item| Value::from_json(item).text_form())
                            .collect();
                        rule.values.insert(name, aliases);
                    }
                }
            }
        }
        Ok(rule)
    }
}

impl LoadRule for CompositeRule {
    fn from_json(key: &str, fields: serde_json::Map<String, JsonValue>) -> Result<Self, LoadError> {
        let mut rule = CompositeRule::default();
        for (name, value) in fields {
            match name.as_str() {
                ALIASES_FIELD => rule.aliases = load_aliases(key, value)?,
                COMPUTE_FIELD => {
                    return Err(LoadError::rule(
                        key,
                        "'_compute' cannot be loaded from JSON; attach it with set_compute",
                    ));
                }
                _ => {
                    rule.fields.insert(name, Value::from_json(value));
                }
            }
        }
        Ok(rule)
    }
}

impl<R: LoadRule> AliasMap<R> {
    pub fn from_json_value(value: JsonValue) -> Result<Self, LoadError> {
        let entries = match value {
            JsonValue::Object(entries) => entries,
            other => return Err(LoadError::NotAnObject(json_kind(other))),
        };
        let mut map = AliasMap::new();
        for (key, entry) in entries {
            let rule = match entry {
                JsonValue::Null => R::default(),
                JsonValue::Object(fields) => R::from_json(&key, fields)?,
                other => {
                    return Err(LoadError::rule(
                        &key,
                        format!("expected object or null, got {}", json_kind(other)),
                    ));
                }
            };
            map.insert(key, rule);
        }
        log::debug!("loaded alias map with {} rules", map.len());
        Ok(map)
    }

    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        Self::from_json_value(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

impl<'de, R: LoadRule> Deserialize<'de> for AliasMap<R> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        AliasMap::from_json_value(value).map_err(serde::de::Error::custom)
    }
}

fn load_aliases(key: &str, value: JsonValue) -> Result<Vec<String>, LoadError> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::String(alias) => Ok(alias),
                other => Err(LoadError::rule(
                    key,
                    format!("'_aliases' entries must be strings, got {}", json_kind(other)),
                )),
            })
            .collect(),
        other => Err(LoadError::rule(
            key,
            format!("'_aliases' must be an array, got {}", json_kind(other)),
        )),
    }
}

fn load_cast(key: &str, value: JsonValue) -> Result<Option<CastTo>, LoadError> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(name) => name
            .parse::<CastTo>()
            .map(Some)
            .map_err(|err| LoadError::rule(key, err.to_string())),
        other => Err(LoadError::rule(
            key,
            format!("'_castTo' must be a string, got {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: JsonValue) -> &'static str {
    Value::from_json(value).kind()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompositeMap, KeyValueMap, rules::AliasRule};
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn loads_key_value_rules_in_declaration_order() {
        let map = KeyValueMap::from_json_value(json!({
            "test": { "_castTo": "boolean", "true": ["yes", 1], "false": ["no"] },
            "firstName": { "_aliases": ["name", "first_name"] },
            "empty": null
        }))
        .unwrap();

        let keys: Vec<_> = map.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["test", "firstName", "empty"]);

        let test = map.get("test").unwrap();
        assert_eq!(test.cast_to, Some(CastTo::Boolean));
        assert_eq!(test.values["true"], ["yes", "1"]);
        assert_eq!(test.values["false"], ["no"]);
        assert_eq!(map.get("firstName").unwrap().aliases(), ["name", "first_name"]);
        assert_eq!(map.get("empty").unwrap(), &KeyValueRule::default());
    }

    #[test]
    fn non_array_key_value_fields_are_ignored() {
        let map = KeyValueMap::from_json_str(r#"{ "status": { "note": "free text", "active": ["a"] } }"#)
            .unwrap();
        let status = map.get("status").unwrap();
        assert_eq!(status.values.len(), 1);
        assert_eq!(status.values["active"], ["a"]);
    }

    #[test]
    fn loads_each_cast_name() {
        let map = KeyValueMap::from_json_value(json!({
            "flag": { "_castTo": "boolean" },
            "count": { "_castTo": "number" },
            "plain": { "_castTo": null }
        }))
        .unwrap();
        assert_eq!(map.get("flag").unwrap().cast_to, Some(CastTo::Boolean));
        assert_eq!(map.get("count").unwrap().cast_to, Some(CastTo::Number));
        assert_eq!(map.get("plain").unwrap().cast_to, None);
    }

    #[test]
    fn rejects_unknown_cast() {
        let err = KeyValueMap::from_json_value(json!({ "n": { "_castTo": "date" } })).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRule { ref key, .. } if key == "n"), "{err}");
    }

    #[test]
    fn rejects_non_string_aliases() {
        let err = KeyValueMap::from_json_value(json!({ "n": { "_aliases": "num" } })).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRule { .. }));
        let err = KeyValueMap::from_json_value(json!({ "n": { "_aliases": [1] } })).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRule { .. }));
    }

    #[test]
    fn rejects_non_object_documents() {
        let err = KeyValueMap::from_json_value(json!(["a"])).unwrap_err();
        assert!(matches!(err, LoadError::NotAnObject("list")));
        let err = KeyValueMap::from_json_value(json!({ "a": 3 })).unwrap_err();
        assert_eq!(err.to_string(), "invalid rule 'a': expected object or null, got number");
        let err = KeyValueMap::from_json_value(json!({ "n": { "_castTo": true } })).unwrap_err();
        assert_eq!(err.to_string(), "invalid rule 'n': '_castTo' must be a string, got bool");
    }

    #[test]
    fn composite_static_fields_keep_json_values() {
        let map = CompositeMap::from_json_value(json!({
            "center": { "_aliases": ["middle"], "x": "center", "y": "center", "z": 2 }
        }))
        .unwrap();
        let center = map.get("center").unwrap();
        assert_eq!(center.aliases(), ["middle"]);
        assert_eq!(center.fields.get("x"), Some(&Value::from("center")));
        assert_eq!(center.fields.get("z"), Some(&Value::Number(2.0)));
        assert!(center.compute.is_none());
    }

    #[test]
    fn composite_compute_cannot_come_from_json() {
        let err = CompositeMap::from_json_value(json!({ "margin": { "_compute": "expand" } }))
            .unwrap_err();
        assert!(err.to_string().contains("_compute"));
    }

    #[test]
    fn loads_from_path_and_reports_missing_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "firstName": {{ "_aliases": ["name"] }} }}"#).unwrap();
        let map = KeyValueMap::from_path(file.path()).unwrap();
        assert_eq!(map.len(), 1);

        let missing = file.path().with_extension("missing");
        let err = KeyValueMap::from_path(&missing).unwrap_err();
        assert!(matches!(err, LoadError::Io { ref path, .. } if path == &missing));
    }

    #[test]
    fn deserializes_through_serde() {
        let map: KeyValueMap =
            serde_json::from_str(r#"{ "value": { "_castTo": "number", "0": ["reset"] } }"#).unwrap();
        assert_eq!(map.get("value").unwrap().cast_to, Some(CastTo::Number));
        let err = serde_json::from_str::<KeyValueMap>(r#"{ "value": 1 }"#).unwrap_err();
        assert!(err.to_string().contains("invalid rule 'value'"));
    }
}
