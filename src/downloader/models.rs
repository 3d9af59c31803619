// Common data models for the extraction and download pipeline

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator value marking a playlist record
pub const PLAYLIST_TYPE: &str = "playlist";
/// Field holding the record type discriminator
pub const TYPE_FIELD: &str = "_type";
/// Field holding the ordered playlist entries
pub const ENTRIES_FIELD: &str = "entries";
/// Field holding the item title
pub const TITLE_FIELD: &str = "title";
/// Field the extractor fills with the local file path after a download
pub const FILENAME_FIELD: &str = "_filename";

/// Extractor metadata for one playable item or a playlist.
///
/// The record is an arbitrary JSON object; only a handful of fields
/// (`_type`, `entries`, `title`, `_filename`, ...) carry meaning here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a JSON object. `null` yields an empty record.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }

    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str(TITLE_FIELD)
    }

    /// Local file written by a completed download
    pub fn filename(&self) -> Option<&str> {
        self.get_str(FILENAME_FIELD)
    }

    pub fn is_playlist(&self) -> bool {
        self.get_str(TYPE_FIELD) == Some(PLAYLIST_TYPE)
    }

    /// Raw entries of a playlist record, possibly containing nulls.
    pub fn raw_entries(&self) -> &[Value] {
        self.0
            .get(ENTRIES_FIELD)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries that are JSON objects, in order.
    pub fn entries(&self) -> Vec<Metadata> {
        self.raw_entries()
            .iter()
            .filter_map(|entry| entry.as_object().cloned().map(Metadata))
            .collect()
    }

    /// Replace the playlist entries wholesale.
    pub fn set_entries(&mut self, entries: Vec<Metadata>) {
        let values = entries.into_iter().map(Metadata::into_value).collect();
        self.0.insert(ENTRIES_FIELD.to_string(), Value::Array(values));
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
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

/// Result of a top-level operation: the data plus every diagnostic
/// collected while producing it.
///
/// A non-empty `errors` does not mean `data` is unusable; a playlist
/// download where some entries failed still returns all entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub data: T,
    pub errors: Vec<String>,
}

impl<T> Outcome<T> {
    pub fn new(data: T, errors: Vec<String>) -> Self {
        Self { data, errors }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
