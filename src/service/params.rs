//! Conversion of Rust values into form parameter strings
//!
//! The services API takes every parameter as a string. Booleans are sent as
//! `1`/`0`, datetimes as `YYYY-MM-DD HH:MM:SS` and lists as JSON arrays.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;

/// Wire format of datetime parameters and filter values
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value ready to be sent as a form parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue(String);

impl ParamValue {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the wire string
    pub fn into_inner(self) -> String {
        self.0
    }

    /// JSON-encode a list of values
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        let items: Vec<Value> = values
            .into_iter()
            .map(|v| Value::String(v.into().into_inner()))
            .collect();
        ParamValue(Value::Array(items).to_string())
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue(v)
    }
}

impl From<&String> for ParamValue {
    fn from(v: &String) -> Self {
        ParamValue(v.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue(if v { "1" } else { "0" }.to_string())
    }
}

macro_rules! numeric_param {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(v: $t) -> Self {
                    ParamValue(v.to_string())
                }
            }
        )*
    };
}

numeric_param!(i32, i64, u32, u64, usize, f64);

impl From<uuid::Uuid> for ParamValue {
    fn from(v: uuid::Uuid) -> Self {
        ParamValue(v.to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ParamValue
where
    Tz::Offset: std::fmt::Display,
{
    fn from(v: DateTime<Tz>) -> Self {
        ParamValue(v.format(DATETIME_FORMAT).to_string())
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(v: NaiveDateTime) -> Self {
        ParamValue(v.format(DATETIME_FORMAT).to_string())
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(v: NaiveDate) -> Self {
        ParamValue(v.format("%Y-%m-%d").to_string())
    }
}

impl From<Value> for ParamValue {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => ParamValue(s),
            other => ParamValue(other.to_string()),
        }
    }
}
