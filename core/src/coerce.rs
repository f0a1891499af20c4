//! Scalar value coercion.
//!
//! Each [`ScalarKind`] adapts native input into its typed value and renders
//! a typed value back to canonical text. Adaption is strict and locale-free;
//! any parse failure, including out-of-range date components, is a
//! [`CoercionError`].

use std::str::FromStr;

use bigdecimal::{BigDecimal, Signed, ToPrimitive, Zero};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::CoercionError;
use crate::options::{NumberFormat, Options};
use crate::value::{DATE_FORMAT, DATETIME_FORMAT, TIME_FORMAT};
use crate::Value;

/// Scalar element types.
///
/// # Examples
///
/// ```
/// use flatland_core::{Options, ScalarKind, Value};
///
/// let opts = Options::default();
/// let adapted = ScalarKind::Integer.adapt(&Value::from(" -12 "), &opts).unwrap();
/// assert_eq!(adapted, Value::Int(-12));
/// assert_eq!(ScalarKind::Integer.serialize(&adapted, &opts), "-12");
///
/// assert!(ScalarKind::Integer.adapt(&Value::from("12.0"), &opts).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Base scalar with no adaption; `set` is unsupported.
    Abstract,
    /// Text.
    String,
    /// Signed integer.
    Integer,
    /// Signed integer, declared as a long.
    Long,
    /// Binary float, `%0.6f` canonical text by default.
    Float,
    /// Decimal, `%0.6f` canonical text by default.
    Decimal,
    /// Boolean with configurable synonyms.
    Boolean,
    /// `YYYY-MM-DD`.
    Date,
    /// `HH:MM:SS`.
    Time,
    /// `YYYY-MM-DD HH:MM:SS`.
    DateTime,
}

impl ScalarKind {
    /// Lowercase kind name, as used in definition files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Abstract => "scalar",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
        }
    }

    /// Returns `true` for the numeric kinds honoring `signed` and `format`.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Long | Self::Float | Self::Decimal
        )
    }

    /// Adapts a native value into this kind's typed value.
    ///
    /// `Value::None` always adapts to `Value::None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError`] when the input can not be represented.
    pub fn adapt(&self, value: &Value, opts: &Options) -> Result<Value, CoercionError> {
        if value.is_none() {
            return Ok(Value::None);
        }
        let fail = || CoercionError::new(self.name(), value.to_text());
        match self {
            Self::Abstract => Err(fail()),
            Self::String => {
                let text = value.to_text();
                Ok(Value::Text(if opts.strip {
                    text.trim().to_string()
                } else {
                    text
                }))
            }
            Self::Integer | Self::Long => {
                let int = match value {
                    Value::Int(i) => *i,
                    Value::Float(f) if f.fract() == 0.0 => f.to_i64().ok_or_else(fail)?,
                    Value::Decimal(d) if d.is_integer() => d.to_i64().ok_or_else(fail)?,
                    Value::Text(s) => s.trim().parse::<i64>().map_err(|_| fail())?,
                    _ => return Err(fail()),
                };
                if !opts.signed && int < 0 {
                    return Err(fail());
                }
                Ok(Value::Int(int))
            }
            Self::Float => {
                let float = match value {
                    Value::Float(f) => *f,
                    Value::Int(i) => *i as f64,
                    Value::Decimal(d) => d.to_f64().ok_or_else(fail)?,
                    Value::Text(s) => s.trim().parse::<f64>().map_err(|_| fail())?,
                    _ => return Err(fail()),
                };
                if !opts.signed && float < 0.0 {
                    return Err(fail());
                }
                Ok(Value::Float(float))
            }
            Self::Decimal => {
                let decimal = match value {
                    Value::Decimal(d) => d.clone(),
                    Value::Int(i) => BigDecimal::from(*i),
                    Value::Float(f) => BigDecimal::from_str(&f.to_string()).map_err(|_| fail())?,
                    Value::Text(s) => parse_decimal(s.trim()).ok_or_else(fail)?,
                    _ => return Err(fail()),
                };
                if !within_scale_bound(&decimal) || (!opts.signed && decimal.is_negative()) {
                    return Err(fail());
                }
                Ok(Value::Decimal(decimal))
            }
            Self::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Int(i) => Ok(Value::Bool(*i != 0)),
                Value::Float(f) => Ok(Value::Bool(*f != 0.0)),
                Value::Decimal(d) => Ok(Value::Bool(!d.is_zero())),
                Value::List(items) => Ok(Value::Bool(!items.is_empty())),
                Value::Map(map) => Ok(Value::Bool(!map.is_empty())),
                Value::Text(s) => {
                    let needle = s.trim().to_lowercase();
                    if opts.true_synonyms.iter().any(|t| t.to_lowercase() == needle) {
                        Ok(Value::Bool(true))
                    } else if opts.false_synonyms.iter().any(|t| t.to_lowercase() == needle) {
                        Ok(Value::Bool(false))
                    } else {
                        Err(fail())
                    }
                }
                _ => Err(fail()),
            },
            Self::Date => match value {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::Text(s) => {
                    let text = if opts.strip { s.trim() } else { s.as_str() };
                    if !has_shape(text, "dddd-dd-dd") {
                        return Err(fail());
                    }
                    NaiveDate::parse_from_str(text, DATE_FORMAT)
                        .map(Value::Date)
                        .map_err(|_| fail())
                }
                _ => Err(fail()),
            },
            Self::Time => match value {
                Value::Time(t) => Ok(Value::Time(*t)),
                Value::Text(s) => {
                    let text = if opts.strip { s.trim() } else { s.as_str() };
                    if !has_shape(text, "dd:dd:dd") {
                        return Err(fail());
                    }
                    NaiveTime::parse_from_str(text, TIME_FORMAT)
                        .map(Value::Time)
                        .map_err(|_| fail())
                }
                _ => Err(fail()),
            },
            Self::DateTime => match value {
                Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
                Value::Text(s) => {
                    let text = if opts.strip { s.trim() } else { s.as_str() };
                    if !has_shape(text, "dddd-dd-dd dd:dd:dd") {
                        return Err(fail());
                    }
                    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                        .map(Value::DateTime)
                        .map_err(|_| fail())
                }
                _ => Err(fail()),
            },
        }
    }

    /// Renders a typed value as canonical text. `Value::None` renders empty.
    pub fn serialize(&self, value: &Value, opts: &Options) -> String {
        match (self, value) {
            (_, Value::None) => String::new(),
            (Self::Integer | Self::Long, Value::Int(i)) => {
                opts.format.unwrap_or(NumberFormat::Plain).format_int(*i)
            }
            (Self::Float, Value::Float(f)) => opts
                .format
                .unwrap_or(NumberFormat::Fixed(6))
                .format_float(*f),
            (Self::Decimal, Value::Decimal(d)) => opts
                .format
                .unwrap_or(NumberFormat::Fixed(6))
                .format_decimal(d),
            (Self::Boolean, Value::Bool(true)) => opts.true_text.clone(),
            (Self::Boolean, Value::Bool(false)) => opts.false_text.clone(),
            (_, other) => other.to_text(),
        }
    }
}

/// Digit-shape check; chrono alone accepts unpadded fields like `2011-8-2`.
fn has_shape(text: &str, shape: &str) -> bool {
    text.len() == shape.len()
        && text.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            other => c == other,
        })
}

/// Largest decimal exponent, either way, that adaption accepts. Fixed-scale
/// rendering expands the exponent into digits.
const MAX_DECIMAL_SCALE: u64 = 1_000;

fn within_scale_bound(decimal: &BigDecimal) -> bool {
    let (_, scale) = decimal.as_bigint_and_exponent();
    scale.unsigned_abs() <= MAX_DECIMAL_SCALE
}

/// Parses decimal text, accepting one optional leading sign.
fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    if text.starts_with('+') && unsigned.starts_with(['+', '-']) {
        return None;
    }
    // num-bigint tolerates `_` separators; form input must not.
    let digits_only = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'e' | b'E' | b'+'));
    digits_only.then(|| BigDecimal::from_str(unsigned).ok()).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> Options {
        Options::default()
    }

    fn adapt(kind: ScalarKind, raw: &str) -> Option<Value> {
        kind.adapt(&Value::from(raw), &opts()).ok()
    }

    #[test]
    fn test_integer_parsing() {
        assert_eq!(adapt(ScalarKind::Integer, "123"), Some(Value::Int(123)));
        assert_eq!(adapt(ScalarKind::Integer, " +123 "), Some(Value::Int(123)));
        assert_eq!(adapt(ScalarKind::Integer, " -123 "), Some(Value::Int(-123)));
        assert_eq!(adapt(ScalarKind::Integer, "xyz123"), None);
        assert_eq!(adapt(ScalarKind::Integer, "123xyz"), None);
        assert_eq!(adapt(ScalarKind::Integer, "123.0"), None);
        assert_eq!(adapt(ScalarKind::Long, "-9"), Some(Value::Int(-9)));
    }

    #[test]
    fn test_unsigned_rejects_negative_after_parse() {
        let mut unsigned = opts();
        unsigned.signed = false;
        for kind in [
            ScalarKind::Integer,
            ScalarKind::Long,
            ScalarKind::Float,
            ScalarKind::Decimal,
        ] {
            assert!(kind.adapt(&Value::from("-123"), &unsigned).is_err());
            assert!(kind.adapt(&Value::from("+123"), &unsigned).is_ok());
        }
        assert!(
            ScalarKind::Integer
                .adapt(&Value::Int(-123), &unsigned)
                .is_err()
        );
    }

    #[test]
    fn test_float_format() {
        let v = adapt(ScalarKind::Float, "123").unwrap();
        assert_eq!(ScalarKind::Float.serialize(&v, &opts()), "123.000000");

        let mut two = opts();
        two.format = Some(NumberFormat::Fixed(2));
        let v = adapt(ScalarKind::Float, "123.005").unwrap();
        assert_eq!(ScalarKind::Float.serialize(&v, &two), "123.00");
    }

    #[test]
    fn test_decimal() {
        let d = |s: &str| Value::Decimal(BigDecimal::from_str(s).unwrap());
        assert_eq!(adapt(ScalarKind::Decimal, " +123 "), Some(d("123")));
        assert_eq!(adapt(ScalarKind::Decimal, "-123"), Some(d("-123")));
        assert_eq!(adapt(ScalarKind::Decimal, "xyz"), None);
        assert_eq!(adapt(ScalarKind::Decimal, "123xyz"), None);
        assert_eq!(adapt(ScalarKind::Decimal, "+-1"), None);
        assert_eq!(adapt(ScalarKind::Decimal, "1e3"), Some(d("1000")));
        assert_eq!(adapt(ScalarKind::Decimal, "1e1000"), Some(d("1e1000")));
        assert_eq!(
            ScalarKind::Decimal.serialize(&d("-123"), &opts()),
            "-123.000000"
        );
    }

    #[test]
    fn test_decimal_exponent_bound() {
        for huge in ["1e1001", "1e1000000000", "-5E+99999999", "1e-1001", "1e-1000000000"] {
            assert_eq!(adapt(ScalarKind::Decimal, huge), None, "{huge}");
        }
        let wide = Value::Decimal(BigDecimal::from_str("1e5000").unwrap());
        assert!(ScalarKind::Decimal.adapt(&wide, &opts()).is_err());

        let el = crate::Schema::decimal()
            .named("d")
            .from_flat([("d", "1e1000000000")])
            .unwrap();
        assert_eq!(el.value(), Value::None);
        assert_eq!(el.u(), "1e1000000000");
    }

    #[test]
    fn test_boolean_synonyms() {
        for ok in ["on", "TRUE", "True", "1", "yes"] {
            assert_eq!(adapt(ScalarKind::Boolean, ok), Some(Value::Bool(true)));
        }
        for no in ["off", "false", "False", "0", ""] {
            assert_eq!(adapt(ScalarKind::Boolean, no), Some(Value::Bool(false)));
        }
        for bogus in ["abc", "1.0", "0.0", "None"] {
            assert_eq!(adapt(ScalarKind::Boolean, bogus), None);
        }
        assert_eq!(
            ScalarKind::Boolean.adapt(&Value::Int(0), &opts()),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            ScalarKind::Boolean.adapt(&Value::map::<&str, Value>([]), &opts()),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn test_boolean_custom_text() {
        let mut custom = opts();
        custom.true_text = "baz".into();
        custom.false_text = "quux".into();
        assert_eq!(
            ScalarKind::Boolean.serialize(&Value::Bool(true), &custom),
            "baz"
        );
        assert_eq!(
            ScalarKind::Boolean.serialize(&Value::Bool(false), &custom),
            "quux"
        );
    }

    #[test]
    fn test_temporal_strictness() {
        assert!(adapt(ScalarKind::Date, "2009-10-10").is_some());
        assert!(adapt(ScalarKind::Date, " 2010-08-02 ").is_some());
        assert!(adapt(ScalarKind::Date, "2011-8-2").is_none());
        assert!(adapt(ScalarKind::Date, "blagga").is_none());

        assert!(adapt(ScalarKind::Time, "23:24:25").is_some());
        assert!(adapt(ScalarKind::Time, "24:25:26").is_none());

        assert!(adapt(ScalarKind::DateTime, "2009-10-10 08:09:10").is_some());
        assert!(adapt(ScalarKind::DateTime, "2010-08-02 25:26:27").is_none());
        assert!(adapt(ScalarKind::DateTime, "2010-13-22 09:09:09").is_none());

        let mut raw = opts();
        raw.strip = false;
        assert!(
            ScalarKind::Date
                .adapt(&Value::from(" 2010-08-02 "), &raw)
                .is_err()
        );
    }

    #[test]
    fn test_string_strip() {
        assert_eq!(adapt(ScalarKind::String, " abc "), Some(Value::from("abc")));
        assert_eq!(
            ScalarKind::String.adapt(&Value::Int(123), &opts()),
            Ok(Value::from("123"))
        );

        let mut raw = opts();
        raw.strip = false;
        assert_eq!(
            ScalarKind::String.adapt(&Value::from(" abc "), &raw),
            Ok(Value::from(" abc "))
        );
    }
}
