use std::fmt;
use std::io::{Read, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use indexmap::IndexMap;
use ndarray::Array1;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Canonical text form of a timestamp without offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const NAIVE_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A single metadata entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Anything JSON can hold that is not a sequence, kept as read.
    Json(Value),
    Timestamp(NaiveDateTime),
    /// A sequence of numbers.
    Array(Array1<f64>),
    /// A sequence with at least one non-numeric element.
    List(Vec<Value>),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array1<f64>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl Serialize for MetaValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(v) => v.serialize(serializer),
            Self::Timestamp(t) => serializer.collect_str(&t.format(TIMESTAMP_FORMAT)),
            Self::Array(a) => serializer.collect_seq(a.iter()),
            Self::List(l) => l.serialize(serializer),
        }
    }
}

impl From<Value> for MetaValue {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Json(Value::from(s))
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Json(Value::from(s))
    }
}

impl From<f64> for MetaValue {
    fn from(x: f64) -> Self {
        Self::Json(Value::from(x))
    }
}

impl From<i64> for MetaValue {
    fn from(x: i64) -> Self {
        Self::Json(Value::from(x))
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Json(Value::from(b))
    }
}

impl From<NaiveDateTime> for MetaValue {
    fn from(t: NaiveDateTime) -> Self {
        Self::Timestamp(t)
    }
}

impl From<Array1<f64>> for MetaValue {
    fn from(a: Array1<f64>) -> Self {
        Self::Array(a)
    }
}

impl From<Vec<f64>> for MetaValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(Array1::from(v))
    }
}

/// Turns a value read from a metadata file into its in-memory form.
pub type Coercion = fn(&str, Value) -> Result<MetaValue>;

/// Which [`Coercion`] applies to which key. Keys without an entry go through
/// [`coerce_by_shape`].
#[derive(Clone)]
pub struct MetadataPolicy {
    keys: IndexMap<String, Coercion>,
}

impl Default for MetadataPolicy {
    fn default() -> Self {
        Self::empty()
            .with("started", coerce_timestamp)
            .with("finished", coerce_timestamp)
    }
}

impl fmt::Debug for MetadataPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys.keys()).finish()
    }
}

impl MetadataPolicy {
    pub fn empty() -> Self {
        Self {
            keys: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, coercion: Coercion) -> Self {
        self.keys.insert(key.into(), coercion);
        self
    }

    pub fn coerce(&self, key: &str, value: Value) -> Result<MetaValue> {
        match self.keys.get(key) {
            Some(coercion) => coercion(key, value),
            None => coerce_by_shape(key, value),
        }
    }
}

/// Sequences become arrays, everything else is kept.
pub fn coerce_by_shape(_key: &str, value: Value) -> Result<MetaValue> {
    Ok(match value {
        Value::Array(items) => {
            let numbers: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            match numbers {
                Some(numbers) => MetaValue::Array(Array1::from(numbers)),
                None => MetaValue::List(items),
            }
        }
        other => MetaValue::Json(other),
    })
}

/// Parses a date/time and rewrites it in canonical form. `null` is kept so an
/// unfinished run can be saved.
pub fn coerce_timestamp(key: &str, value: Value) -> Result<MetaValue> {
    let invalid = |value: &Value| Error::InvalidTimestamp {
        key: key.to_owned(),
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(MetaValue::Json(Value::Null)),
        Value::String(ref text) => canonical_timestamp(text)
            .map(MetaValue::from)
            .ok_or_else(|| invalid(&value)),
        other => Err(invalid(&other)),
    }
}

/// Canonical text of a date/time: [`TIMESTAMP_FORMAT`], or RFC 3339 when the
/// input carries an offset.
pub fn canonical_timestamp(text: &str) -> Option<String> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.to_rfc3339_opts(SecondsFormat::AutoSi, false));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|t| format_timestamp(&t))
}

pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Ordered key-value metadata of a persisted object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(IndexMap<String, MetaValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Option<MetaValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Loads metadata from JSON, coercing each value by `policy`.
    pub fn read_from<R: Read>(reader: R, policy: &MetadataPolicy) -> Result<Self> {
        let raw: IndexMap<String, Value> = serde_json::from_reader(reader)?;
        raw.into_iter()
            .map(|(key, value)| {
                let value = policy.coerce(&key, value)?;
                Ok((key, value))
            })
            .collect::<Result<IndexMap<_, _>>>()
            .map(Self)
    }

    /// Saves metadata as pretty-printed JSON.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
