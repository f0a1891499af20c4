//! Native values flowing in and out of element trees.
//!
//! [`Value`] is both the input accepted by [`set`](crate::ElementMut::set)
//! and the typed output of [`value`](crate::ElementRef::value). Scalars hold
//! one of the leaf variants after coercion; Dicts project to
//! [`Value::Map`] and sequences to [`Value::List`].

use std::collections::BTreeMap;
use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A native value.
///
/// # Examples
///
/// ```
/// use flatland_core::Value;
///
/// let v = Value::map([("x", Value::from(1)), ("y", Value::from("two"))]);
/// assert_eq!(v.get("x"), Some(&Value::Int(1)));
/// assert_eq!(v.repr(), "{'x': 1, 'y': 'two'}");
///
/// assert_eq!(Value::from(vec!["a", "b"]).repr(), "['a', 'b']");
/// assert!(Value::None.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Signed integer (Integer and Long elements).
    Int(i64),
    /// Binary floating point.
    Float(f64),
    /// Arbitrary precision decimal.
    Decimal(BigDecimal),
    /// Text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
    /// Ordered sequence.
    List(Vec<Value>),
    /// String-keyed mapping.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Builds a [`Value::Map`] from key/value pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a [`Value::List`] from items.
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a [`Value::List`] of two-item lists, the pair-sequence form
    /// accepted by Dict `set`.
    pub fn pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::List(
            pairs
                .into_iter()
                .map(|(k, v)| Self::List(vec![Self::Text(k.into()), v.into()]))
                .collect(),
        )
    }

    /// Returns `true` for [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` for `None` and for empty text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the text if this is a [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float if this is a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the items if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` in a [`Value::Map`].
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Plain text form, used as coercion input and as the text projection
    /// of values that failed coercion. `None` renders as empty text.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Text(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// Quoted, nested rendering used for container text projections.
    pub fn repr(&self) -> String {
        match self {
            Self::None => "None".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::Text(s) => quote(s),
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
            Self::Time(t) => t.format(TIME_FORMAT).to_string(),
            Self::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Self::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Map(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", quote(k), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
        }
    }

    /// Converts to a [`serde_json::Value`].
    ///
    /// Decimals and temporal values become JSON strings; non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::None => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::Decimal(d) => Json::String(d.to_string()),
            Self::Text(s) => Json::String(s.clone()),
            Self::Date(_) | Self::Time(_) | Self::DateTime(_) => Json::String(self.to_text()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

pub(crate) fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::None,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::None, Into::into)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::List(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::None.to_text(), "");
        assert_eq!(Value::Int(-3).to_text(), "-3");
        assert_eq!(Value::from("abc").to_text(), "abc");
        assert_eq!(Value::List(vec![]).to_text(), "[]");
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2010, 8, 2).unwrap()).to_text(),
            "2010-08-02"
        );
    }

    #[test]
    fn test_repr_quotes_nested_text() {
        let v = Value::map([("d", Value::map([("x", "it's")]))]);
        assert_eq!(v.repr(), r"{'d': {'x': 'it\'s'}}");
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"x": 1, "y": [1.5, "a", null], "z": true});
        let value = Value::from(json.clone());

        assert_eq!(value.get("x"), Some(&Value::Int(1)));
        assert_eq!(
            value.get("y"),
            Some(&Value::List(vec![
                Value::Float(1.5),
                Value::from("a"),
                Value::None
            ]))
        );
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_decimal_serializes_as_string() {
        let value = Value::Decimal(BigDecimal::from_str("12.50").unwrap());
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"12.50\"");
    }

    #[test]
    fn test_blank() {
        assert!(Value::None.is_blank());
        assert!(Value::from("").is_blank());
        assert!(!Value::Int(0).is_blank());
    }
}
