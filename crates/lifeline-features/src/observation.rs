//! Schema-free sensor observations.
//!
//! An [`Observation`] is a set of named numeric readings with no fixed schema. Callers usually
//! build one from a parsed JSON object with [`Observation::from_record`], which coerces each
//! value into a finite `f64`:
//!
//! | JSON value                 | Result                      |
//! |----------------------------|-----------------------------|
//! | number                     | the number                  |
//! | `true` / `false`           | `1.0` / `0.0`               |
//! | string holding a number    | the parsed number           |
//! | `null`                     | field treated as absent     |
//! | anything else              | [`SchemaError`]             |
//!
//! Non-finite results (`"NaN"`, `"inf"`) are rejected as well, so every reading that reaches
//! the encoder or the heuristics can be compared safely.

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A field value that could not be coerced into a number.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("field `{field}` {reason}")]
pub struct SchemaError {
    /// Name of the offending field.
    pub field: String,
    /// Why the value was rejected.
    pub reason: SchemaErrorReason,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum SchemaErrorReason {
    #[display("holds {kind}, expected a number")]
    NotNumeric { kind: &'static str },
    #[display("holds non-numeric string {_0:?}")]
    UnparsableString(String),
    #[display("is not a finite number")]
    NonFinite,
}

/// Named numeric readings for a single astronaut at a single point in time.
///
/// Field order is irrelevant; iteration is always in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation {
    readings: BTreeMap<String, f64>,
}

impl Observation {
    /// Coerces every field of a raw record.
    pub fn from_record(record: &Map<String, Value>) -> Result<Self, SchemaError> {
        Self::from_record_excluding(record, &[])
    }

    /// Like [`Self::from_record`], but skips the named fields entirely.
    ///
    /// Skipped fields are neither coerced nor kept, so a string-valued label field does not
    /// cause a [`SchemaError`].
    pub fn from_record_excluding(
        record: &Map<String, Value>,
        excluded: &[&str],
    ) -> Result<Self, SchemaError> {
        let mut readings = BTreeMap::new();
        for (field, value) in record {
            if excluded.contains(&field.as_str()) {
                continue;
            }
            let coerced = coerce(value).map_err(|reason| SchemaError {
                field: field.clone(),
                reason,
            })?;
            if let Some(number) = coerced {
                readings.insert(field.clone(), number);
            }
        }
        Ok(Self { readings })
    }

    /// Returns the reading for `field`, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<f64> {
        self.readings.get(field).copied()
    }

    /// Returns the first present reading among `fields`, in order.
    #[must_use]
    pub fn get_first(&self, fields: &[&str]) -> Option<f64> {
        fields.iter().find_map(|field| self.get(field))
    }

    pub fn insert(&mut self, field: impl Into<String>, value: f64) {
        self.readings.insert(field.into(), value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Iterates field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.readings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, f64> {
        self.readings.iter()
    }
}

impl<K> FromIterator<(K, f64)> for Observation
where
    K: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
    {
        Self {
            readings: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Observation {
    type Item = (&'a String, &'a f64);
    type IntoIter = btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn coerce(value: &Value) -> Result<Option<f64>, SchemaErrorReason> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n
            .as_f64()
            .ok_or(SchemaErrorReason::NotNumeric { kind: "a number" })?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| SchemaErrorReason::UnparsableString(s.clone()))?,
        Value::Array(_) => return Err(SchemaErrorReason::NotNumeric { kind: "an array" }),
        Value::Object(_) => return Err(SchemaErrorReason::NotNumeric { kind: "an object" }),
    };
    if !number.is_finite() {
        return Err(SchemaErrorReason::NonFinite);
    }
    Ok(Some(number))
}
