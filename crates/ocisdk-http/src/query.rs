//! Query string encoding.
//!
//! Parameters are written in three groups, each in insertion order:
//!
//! 1. scalars: `key=value`
//! 2. arrays: `key=v1&key=v2`
//! 3. maps: `key.inner=value`, with array values repeated
//!    (`key.inner=v1&key.inner=v2`)
//!
//! Timestamps are RFC 3339 in UTC, with milliseconds only when non-zero.
//! Every value is percent-encoded; keys are written as given.

use chrono::{DateTime, Timelike, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Everything except RFC 3986 unreserved characters.
const QUERY_VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A plain value.
    Scalar(String),
    /// A timestamp.
    DateTime(DateTime<Utc>),
    /// Repeated once per element.
    Array(Vec<String>),
    /// Exploded per inner key; each inner key may carry several values.
    Map(Vec<(String, Vec<String>)>),
}

/// An ordered set of query parameters.
///
/// # Examples
///
/// ```
/// use ocisdk_http::QueryParams;
///
/// let query = QueryParams::new()
///     .map("c", [("k", vec!["v1", "v2"])])
///     .array("b", ["x", "y"])
///     .scalar("a", "1");
/// assert_eq!(query.encode(), "a=1&b=x&b=y&c.k=v1&c.k=v2");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// No parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any earlier value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) {
        let key = key.into();
        if let Some(slot) = self.params.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.params.push((key, value));
        }
    }

    /// Add a scalar.
    #[must_use]
    pub fn scalar(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, QueryValue::Scalar(value.to_string()));
        self
    }

    /// Add a timestamp.
    #[must_use]
    pub fn date_time(mut self, key: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.insert(key, QueryValue::DateTime(value));
        self
    }

    /// Add an array.
    #[must_use]
    pub fn array<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.insert(key, QueryValue::Array(values));
        self
    }

    /// Add a map.
    #[must_use]
    pub fn map<I, K, V>(mut self, key: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: ToString,
    {
        let entries = entries
            .into_iter()
            .map(|(k, vs)| (k.into(), vs.iter().map(ToString::to_string).collect()))
            .collect();
        self.insert(key, QueryValue::Map(entries));
        self
    }

    /// Build parameters from a JSON object.
    ///
    /// Strings, numbers and booleans become scalars, arrays become arrays,
    /// and objects become maps. `null` values are skipped.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let mut query = Self::new();
        let Value::Object(entries) = value else {
            return query;
        };

        for (key, value) in entries {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    query.insert(key.clone(), QueryValue::Array(items.iter().filter_map(scalar_text).collect()));
                }
                Value::Object(inner) => {
                    let inner = inner
                        .iter()
                        .map(|(k, v)| {
                            let values = match v {
                                Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
                                other => scalar_text(other).into_iter().collect(),
                            };
                            (k.clone(), values)
                        })
                        .collect();
                    query.insert(key.clone(), QueryValue::Map(inner));
                }
                scalar => {
                    if let Some(text) = scalar_text(scalar) {
                        query.insert(key.clone(), QueryValue::Scalar(text));
                    }
                }
            }
        }
        query
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Encode to a query string without the leading `?`.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut scalars = Vec::new();
        let mut arrays = Vec::new();
        let mut maps = Vec::new();

        for (key, value) in &self.params {
            match value {
                QueryValue::Scalar(v) => scalars.push(pair(key, v)),
                QueryValue::DateTime(dt) => scalars.push(pair(key, &format_date_time(dt))),
                QueryValue::Array(values) => {
                    arrays.extend(values.iter().map(|v| pair(key, v)));
                }
                QueryValue::Map(entries) => {
                    for (inner, values) in entries {
                        let full = format!("{key}.{inner}");
                        maps.extend(values.iter().map(|v| pair(&full, v)));
                    }
                }
            }
        }

        scalars
            .into_iter()
            .chain(arrays)
            .chain(maps)
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// RFC 3339 in UTC, dropping the fractional part when the milliseconds are zero.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ocisdk_http::query::format_date_time;
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(format_date_time(&t), "2024-01-02T03:04:05Z");
/// ```
#[must_use]
pub fn format_date_time(dt: &DateTime<Utc>) -> String {
    if dt.nanosecond() / 1_000_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

fn pair(key: &str, value: &str) -> String {
    format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE_ENCODE_SET))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
