use std::borrow::Cow;
use std::collections::BTreeMap;

use sentry_core::protocol::Value;

use crate::level::LogLevel;

/// The names of the reserved fields of a log record.
///
/// Every other field of a record ends up in the `extra` data of the Sentry
/// event. The defaults match the common JSON line layout:
///
/// ```json
/// {"level":"error","time":"2020-06-25T17:19:00+03:00","message":"boom","error":"dial timeout"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    /// The field holding the severity. (defaults to `level`)
    pub level: Cow<'static, str>,
    /// The field holding the time of the record. (defaults to `time`)
    pub timestamp: Cow<'static, str>,
    /// The field holding the message. (defaults to `message`)
    pub message: Cow<'static, str>,
    /// The field holding the name of the logger. (defaults to `logger`)
    pub logger: Cow<'static, str>,
    /// The field holding the error or cause. (defaults to `error`)
    pub error: Cow<'static, str>,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            level: Cow::Borrowed("level"),
            timestamp: Cow::Borrowed("time"),
            message: Cow::Borrowed("message"),
            logger: Cow::Borrowed("logger"),
            error: Cow::Borrowed("error"),
        }
    }
}

impl FieldNames {
    /// The layout written by `tracing-subscriber`'s JSON formatter with
    /// `flatten_event(true)`.
    pub fn tracing_json() -> Self {
        Self {
            timestamp: Cow::Borrowed("timestamp"),
            logger: Cow::Borrowed("target"),
            ..Self::default()
        }
    }
}

/// A single decoded log record.
///
/// This is a schema-less mapping of every top-level field of one JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Decodes one JSON object.
    ///
    /// A blank payload decodes to an empty record. Anything that is not a
    /// well-formed JSON object is an error.
    pub fn decode(payload: &[u8]) -> Result<Record, serde_json::Error> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Ok(Record::default());
        }
        let fields = serde_json::from_slice(payload)?;
        Ok(Record { fields })
    }

    /// Returns the severity of the record.
    ///
    /// A record without a level field has [`LogLevel::NoLevel`]. `None` means
    /// the level field is present but not recognized.
    pub fn level(&self, names: &FieldNames) -> Option<LogLevel> {
        match self.fields.get(names.level.as_ref()) {
            None => Some(LogLevel::NoLevel),
            Some(Value::String(level)) => level.parse().ok(),
            Some(_) => None,
        }
    }

    /// Returns the value of a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets a field, returning its previous value.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.fields.insert(key, value)
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consumes the record, returning all remaining fields.
    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }
}

/// Splits a payload into the non-blank lines it contains.
pub(crate) fn lines(payload: &[u8]) -> impl Iterator<Item = &[u8]> {
    payload
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
}
