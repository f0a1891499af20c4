//! Schema configuration record.
//!
//! Every [`Schema`](crate::Schema) carries one [`Options`] value. Options are
//! set through the schema builder methods, each of which returns a derived
//! schema and leaves the original untouched.
//!
//! `policy` and `minimum_fields` are stored as the literal the caller
//! supplied and parsed only when an operation depends on them, so a bogus
//! literal fails at the call that exercises it rather than when the schema
//! is declared.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use bigdecimal::{BigDecimal, RoundingMode};
use regex::Regex;

use crate::error::{FlatlandError, Result};
use crate::validate::Validator;
use crate::{ElementRef, Value};

static FIXED_FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%0?\.(\d+)f$").expect("static regex must compile"));

/// Factory computing a default value for an element.
pub type DefaultFactory = Arc<dyn Fn(&ElementRef<'_>) -> Value + Send + Sync>;

/// Canonical text format for numeric scalars.
///
/// # Examples
///
/// ```
/// use flatland_core::NumberFormat;
///
/// let fmt = NumberFormat::parse("%0.2f").unwrap();
/// assert_eq!(fmt, NumberFormat::Fixed(2));
/// assert_eq!(fmt.format_float(123.005), "123.00");
/// assert!(NumberFormat::parse("%x").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// Shortest natural rendering (`123`, `1.5`).
    Plain,
    /// Fixed number of fractional digits.
    Fixed(usize),
}

impl NumberFormat {
    /// Parses a printf-style format: `%d`, `%s`, `%f`, `%.Nf` or `%0.Nf`.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::Configuration`] for any other spelling.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec {
            "%d" | "%i" | "%s" => Ok(Self::Plain),
            "%f" => Ok(Self::Fixed(6)),
            _ => FIXED_FORMAT_RE
                .captures(spec)
                .and_then(|caps| caps[1].parse().ok())
                .map(Self::Fixed)
                .ok_or_else(|| {
                    FlatlandError::Configuration(format!("unsupported number format '{spec}'"))
                }),
        }
    }

    /// Renders a float.
    pub fn format_float(&self, value: f64) -> String {
        match self {
            Self::Plain => value.to_string(),
            Self::Fixed(digits) => format!("{value:.digits$}"),
        }
    }

    /// Renders a decimal, rounding half-up when fixing the digit count.
    pub fn format_decimal(&self, value: &BigDecimal) -> String {
        match self {
            Self::Plain => value.to_string(),
            Self::Fixed(digits) => value
                .with_scale_round(*digits as i64, RoundingMode::HalfUp)
                .to_string(),
        }
    }

    /// Renders an integer; fixed formats add zero fractional digits.
    pub fn format_int(&self, value: i64) -> String {
        match self {
            Self::Plain => value.to_string(),
            Self::Fixed(digits) => format!("{:.digits$}", value as f64),
        }
    }
}

/// Dict `set` strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Accept any subset of the declared keys.
    #[default]
    Duck,
    /// Require exactly the declared keys.
    Strict,
}

impl FromStr for Policy {
    type Err = FlatlandError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "duck" => Ok(Self::Duck),
            "strict" => Ok(Self::Strict),
            other => Err(FlatlandError::Configuration(format!(
                "unknown dict policy '{other}', expected 'duck' or 'strict'"
            ))),
        }
    }
}

/// Which SparseDict keys are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinimumFields {
    /// No key is required; an element may be empty.
    #[default]
    None,
    /// Keys whose schema is not optional are always present.
    Required,
}

impl FromStr for MinimumFields {
    type Err = FlatlandError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            other => Err(FlatlandError::Configuration(format!(
                "unknown minimum_fields '{other}', expected 'none' or 'required'"
            ))),
        }
    }
}

/// Configuration carried by a schema.
#[derive(Clone)]
pub struct Options {
    /// Static default used by `set_default`.
    pub default: Option<Value>,
    /// Computed default; takes precedence over `default`.
    pub default_factory: Option<DefaultFactory>,
    /// Whether an empty value passes validation.
    pub optional: bool,
    /// Trim surrounding whitespace from text input.
    pub strip: bool,
    /// Accept negative numbers.
    pub signed: bool,
    /// Canonical numeric text format; `None` uses the kind's default.
    pub format: Option<NumberFormat>,
    /// Skip empty children when flattening or rehydrating sequences.
    pub prune_empty: bool,
    /// Dict set policy literal (`duck` / `strict`).
    pub policy: Option<String>,
    /// SparseDict minimum literal (`none` / `required`).
    pub minimum_fields: Option<String>,
    /// Canonical text for `true` booleans.
    pub true_text: String,
    /// Canonical text for `false` booleans.
    pub false_text: String,
    /// Case-insensitive texts adapted to `true`.
    pub true_synonyms: Vec<String>,
    /// Case-insensitive texts adapted to `false`.
    pub false_synonyms: Vec<String>,
    /// Upper bound on List children created by `set_flat`.
    pub maximum_set_flat_members: Option<usize>,
    /// Validators run after the built-in required check.
    pub validators: Vec<Arc<dyn Validator>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default: None,
            default_factory: None,
            optional: false,
            strip: true,
            signed: true,
            format: None,
            prune_empty: true,
            policy: None,
            minimum_fields: None,
            true_text: "1".to_string(),
            false_text: String::new(),
            true_synonyms: ["on", "true", "1", "yes"].map(String::from).to_vec(),
            false_synonyms: ["off", "false", "0", "no", ""].map(String::from).to_vec(),
            maximum_set_flat_members: None,
            validators: Vec::new(),
        }
    }
}

impl Options {
    /// Parses the configured dict policy.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::Configuration`] for an unknown literal.
    pub fn policy(&self) -> Result<Policy> {
        self.policy.as_deref().map_or(Ok(Policy::Duck), str::parse)
    }

    /// Parses the configured SparseDict minimum.
    ///
    /// # Errors
    ///
    /// Returns [`FlatlandError::Configuration`] for an unknown literal.
    pub fn minimum_fields(&self) -> Result<MinimumFields> {
        self.minimum_fields
            .as_deref()
            .map_or(Ok(MinimumFields::None), str::parse)
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("default", &self.default)
            .field("default_factory", &self.default_factory.is_some())
            .field("optional", &self.optional)
            .field("strip", &self.strip)
            .field("signed", &self.signed)
            .field("format", &self.format)
            .field("prune_empty", &self.prune_empty)
            .field("policy", &self.policy)
            .field("minimum_fields", &self.minimum_fields)
            .field("true_text", &self.true_text)
            .field("false_text", &self.false_text)
            .field("maximum_set_flat_members", &self.maximum_set_flat_members)
            .field("validators", &self.validators.len())
            .finish()
    }
}
