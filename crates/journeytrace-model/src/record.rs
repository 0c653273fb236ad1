//! Recorder record values: the loosely-typed nested key/value tree that
//! handler-result clips carry.
//!
//! The source engine serializes handler output as either a plain string, an
//! object with a `Values: [{Key, Value}]` envelope, a bare object, or an
//! array of any of these. All four collapse into one recursive sum type so
//! interpreters can extract fields through named helpers instead of inline
//! JSON poking.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One value inside a recorder record tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A scalar, normalized to its string form.
    Text(String),
    /// An ordered list of key/value entries. Keys may repeat.
    Record(Vec<(String, RecordValue)>),
    /// An ordered list of values.
    List(Vec<RecordValue>),
}

impl RecordValue {
    /// Collapse arbitrary JSON into a record value.
    ///
    /// Objects carrying a `Values` array of `{Key, Value}` entries are the
    /// engine's envelope form and unwrap into a [`RecordValue::Record`];
    /// any other object maps its entries directly.
    pub fn from_json(value: &Value) -> RecordValue {
        match value {
            Value::Null => RecordValue::Text(String::new()),
            Value::Bool(b) => RecordValue::Text(b.to_string()),
            Value::Number(n) => RecordValue::Text(n.to_string()),
            Value::String(s) => RecordValue::Text(s.clone()),
            Value::Array(items) => {
                RecordValue::List(items.iter().map(RecordValue::from_json).collect())
            }
            Value::Object(map) => {
                if let Some(Value::Array(entries)) = map.get("Values") {
                    let mut values = Vec::with_capacity(entries.len());
                    for entry in entries {
                        if let Some(pair) = envelope_entry(entry) {
                            values.push(pair);
                        }
                    }
                    return RecordValue::Record(values);
                }
                RecordValue::Record(
                    map.iter()
                        .map(|(k, v)| (k.clone(), RecordValue::from_json(v)))
                        .collect(),
                )
            }
        }
    }

    /// The scalar text, if this value is a scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Entries of a record, or empty for scalars and lists.
    pub fn entries(&self) -> &[(String, RecordValue)] {
        match self {
            RecordValue::Record(entries) => entries.as_slice(),
            _ => &[],
        }
    }

    /// Items of a list, or empty for scalars and records.
    pub fn items(&self) -> &[RecordValue] {
        match self {
            RecordValue::List(items) => items.as_slice(),
            _ => &[],
        }
    }

    /// First entry with the given key, if this is a record.
    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.entries()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Scalar text of the first entry with the given key.
    pub fn text_of(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(RecordValue::as_text)
    }

    /// Walk a key path through nested records, returning the value at the
    /// end of the path.
    pub fn at_path(&self, path: &[&str]) -> Option<&RecordValue> {
        let mut current = self;
        for key in path {
            current = current.get(key)?;
        }
        Some(current)
    }

    /// Scalar text at the end of a key path.
    pub fn text_at(&self, path: &[&str]) -> Option<&str> {
        self.at_path(path).and_then(RecordValue::as_text)
    }

    /// Depth-first search for the first entry anywhere in the tree with the
    /// given key. Records are searched before lists.
    pub fn find_first(&self, key: &str) -> Option<&RecordValue> {
        match self {
            RecordValue::Text(_) => None,
            RecordValue::Record(entries) => {
                for (k, v) in entries {
                    if k == key {
                        return Some(v);
                    }
                }
                entries.iter().find_map(|(_, v)| v.find_first(key))
            }
            RecordValue::List(items) => items.iter().find_map(|v| v.find_first(key)),
        }
    }

    /// True for a record or list with no entries, or empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            RecordValue::Text(text) => text.is_empty(),
            RecordValue::Record(entries) => entries.is_empty(),
            RecordValue::List(items) => items.is_empty(),
        }
    }
}

fn envelope_entry(entry: &Value) -> Option<(String, RecordValue)> {
    let map = entry.as_object()?;
    let key = map.get("Key")?.as_str()?.to_string();
    let value = map
        .get("Value")
        .map(RecordValue::from_json)
        .unwrap_or_else(|| RecordValue::Text(String::new()));
    Some((key, value))
}

impl<'de> Deserialize<'de> for RecordValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(RecordValue::from_json(&value))
    }
}

impl Serialize for RecordValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RecordValue::Text(text) => serializer.serialize_str(text),
            RecordValue::List(items) => serializer.collect_seq(items),
            RecordValue::Record(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_objects_collapse_into_records() {
        let value = RecordValue::from_json(&json!({
            "Values": [
                {"Key": "TechnicalProfileId", "Value": "AAD-UserRead"},
                {"Key": "Protocol", "Value": {"Values": [
                    {"Key": "Name", "Value": "OpenIdConnect"},
                ]}},
            ]
        }));

        assert_eq!(value.text_of("TechnicalProfileId"), Some("AAD-UserRead"));
        assert_eq!(
            value.text_at(&["Protocol", "Name"]),
            Some("OpenIdConnect")
        );
    }

    #[test]
    fn bare_objects_map_their_entries() {
        let value = RecordValue::from_json(&json!({
            "SubJourneyId": "PasswordReset",
            "Attempts": 2,
            "Interactive": true,
        }));

        assert_eq!(value.text_of("SubJourneyId"), Some("PasswordReset"));
        assert_eq!(value.text_of("Attempts"), Some("2"));
        assert_eq!(value.text_of("Interactive"), Some("true"));
    }

    #[test]
    fn find_first_descends_through_lists_and_records() {
        let value = RecordValue::from_json(&json!({
            "Actions": [
                {"Values": [{"Key": "Inner", "Value": "deep"}]},
            ]
        }));

        assert_eq!(
            value.find_first("Inner").and_then(RecordValue::as_text),
            Some("deep")
        );
        assert!(value.find_first("Missing").is_none());
    }

    #[test]
    fn duplicate_keys_survive_in_order() {
        let value = RecordValue::from_json(&json!({
            "Values": [
                {"Key": "Option", "Value": "FacebookExchange"},
                {"Key": "Option", "Value": "GoogleExchange"},
            ]
        }));

        let options: Vec<&str> = value
            .entries()
            .iter()
            .filter(|(k, _)| k == "Option")
            .filter_map(|(_, v)| v.as_text())
            .collect();
        assert_eq!(options, vec!["FacebookExchange", "GoogleExchange"]);
    }
}
