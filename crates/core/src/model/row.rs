use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key-value row as returned by a schemaless remote table.
///
/// Field names are not fixed; callers look values up through alias lists
/// (`first_text(&["question_text", "question", "text"])`) and take the first
/// field that carries a usable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Builder-style insert, used to assemble insert payloads.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Column names in this row, in map order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Non-empty text for `key`. Numbers are rendered as text.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(value_text)
    }

    /// First non-empty text among `candidates`, in candidate order.
    #[must_use]
    pub fn first_text(&self, candidates: &[&str]) -> Option<String> {
        self.first_present_field(candidates).map(|(_, value)| value)
    }

    /// Like [`RawRow::first_text`] but also reports which candidate matched.
    #[must_use]
    pub fn first_present_field<'a>(&self, candidates: &[&'a str]) -> Option<(&'a str, String)> {
        candidates
            .iter()
            .find_map(|field| self.text(field).map(|value| (*field, value)))
    }

    /// Integer for `key`, accepting JSON numbers and numeric strings.
    #[must_use]
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn first_integer(&self, candidates: &[&str]) -> Option<i64> {
        candidates.iter().find_map(|field| self.integer(field))
    }

    /// Floating point value for `key`, accepting numbers and numeric strings.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn first_number(&self, candidates: &[&str]) -> Option<f64> {
        candidates.iter().find_map(|field| self.number(field))
    }

    /// Truthiness for flag-like columns (`true`, `1`, `"yes"`, `"t"`).
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    #[must_use]
    pub fn first_flag(&self, candidates: &[&str]) -> Option<bool> {
        candidates.iter().find_map(|field| self.flag(field))
    }

    /// Timestamp for the first candidate that parses.
    ///
    /// Accepts RFC 3339 text, bare `YYYY-MM-DD` dates (midnight UTC), and
    /// integer epoch seconds.
    #[must_use]
    pub fn first_timestamp(&self, candidates: &[&str]) -> Option<DateTime<Utc>> {
        candidates
            .iter()
            .find_map(|field| self.0.get(*field).and_then(value_timestamp))
    }
}

impl From<Map<String, Value>> for RawRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.with_timezone(&Utc));
            }
            // Postgres `timestamp` columns come back without an offset.
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(naive.and_utc());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        _ => None,
    }
}
