//! Serializable form definitions.
//!
//! A definition file describes one schema tree plus the separator used for
//! its flat keys.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! separator: "_"
//! schema:
//!   type: dict
//!   name: person
//!   fields:
//!     - { name: age, type: integer, signed: false }
//!     - { name: tags, type: list, member: { type: string, name: tag } }
//! ```
//!
//! Kind names are `scalar`, `string`, `integer`, `long`, `float`,
//! `decimal`, `boolean`, `date`, `time`, `datetime`, `dict`,
//! `sparse_dict`, `array`, `list` and `multi_value`. Options that do not
//! apply to a kind are rejected when the definition is compiled.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use flatland_core::{DEFAULT_SEPARATOR, NumberFormat, ScalarKind, Schema, Value};
use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, Result};

const SCALAR_KINDS: [ScalarKind; 10] = [
    ScalarKind::Abstract,
    ScalarKind::String,
    ScalarKind::Integer,
    ScalarKind::Long,
    ScalarKind::Float,
    ScalarKind::Decimal,
    ScalarKind::Boolean,
    ScalarKind::Date,
    ScalarKind::Time,
    ScalarKind::DateTime,
];

fn default_version() -> String {
    "1.0".to_string()
}

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

/// Top-level definition document.
///
/// # Examples
///
/// ```
/// use flatland_defs::FormDefinition;
///
/// let def = FormDefinition::from_json(
///     r#"{"schema": {"type": "dict", "name": "p", "fields": [{"type": "integer", "name": "age"}]}}"#,
/// )
/// .unwrap();
/// assert_eq!(def.separator, '_');
///
/// let el = def.to_schema().unwrap().from_flat([("p_age", "7")]).unwrap();
/// assert_eq!(el.get("age").unwrap().u(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Definition format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Separator between flat key segments.
    #[serde(default = "default_separator")]
    pub separator: char,
    /// Root schema.
    pub schema: SchemaDef,
}

impl FormDefinition {
    /// Wraps a schema definition with the default version and separator.
    pub fn new(schema: SchemaDef) -> Self {
        Self {
            version: default_version(),
            separator: DEFAULT_SEPARATOR,
            schema,
        }
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError`](DefinitionError::YamlError) on malformed input.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](DefinitionError::JsonError) on malformed input.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a definition file; `.json` files are read as JSON, anything
    /// else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DefinitionError::IoError) if the file cannot be
    /// read, or a parse error for its format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        if is_json(path) {
            Ok(serde_json::from_reader(reader)?)
        } else {
            Ok(serde_yaml::from_reader(reader)?)
        }
    }

    /// Writes the definition, choosing the format by extension as
    /// [`load`](Self::load) does.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DefinitionError::IoError) if the file cannot be
    /// written, or a serialization error for its format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }

    /// Name the registry files this definition under.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Compiles the schema tree.
    ///
    /// # Errors
    ///
    /// As [`SchemaDef::to_schema`].
    pub fn to_schema(&self) -> Result<Schema> {
        self.schema.to_schema()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// One node of a schema definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDef {
    /// Kind name.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<bool>,
    /// printf-style numeric format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune_empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_fields: Option<String>,
    /// Canonical text for `true` booleans.
    #[serde(rename = "true", default, skip_serializing_if = "Option::is_none")]
    pub true_text: Option<String>,
    /// Canonical text for `false` booleans.
    #[serde(rename = "false", default, skip_serializing_if = "Option::is_none")]
    pub false_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_synonyms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_synonyms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_set_flat_members: Option<usize>,
    /// Dict and SparseDict fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SchemaDef>,
    /// Sequence member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Box<SchemaDef>>,
}

impl SchemaDef {
    /// A bare node of `kind` named `name`.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: SchemaDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the sequence member.
    pub fn with_member(mut self, member: SchemaDef) -> Self {
        self.member = Some(Box::new(member));
        self
    }

    /// Compiles this node and its descendants.
    ///
    /// # Errors
    ///
    /// - [`InvalidDefinition`](DefinitionError::InvalidDefinition) for an
    ///   unknown kind, a sequence without a member, fields or a member on
    ///   the wrong kind, or an option the kind does not take.
    /// - [`Flatland`](DefinitionError::Flatland) for an unparseable number
    ///   format.
    pub fn to_schema(&self) -> Result<Schema> {
        self.build(&self.name)
    }

    fn build(&self, path: &str) -> Result<Schema> {
        let child_path = |segment: &str| {
            if path.is_empty() {
                segment.to_string()
            } else {
                format!("{path}.{segment}")
            }
        };

        let is_dict = matches!(self.kind.as_str(), "dict" | "sparse_dict");
        let is_sequence = matches!(self.kind.as_str(), "array" | "list" | "multi_value");
        if !is_dict && !self.fields.is_empty() {
            return Err(DefinitionError::invalid(path, format!("{} takes no fields", self.kind)));
        }
        if !is_sequence && self.member.is_some() {
            return Err(DefinitionError::invalid(path, format!("{} takes no member", self.kind)));
        }

        let schema = match self.kind.as_str() {
            "dict" | "sparse_dict" => {
                let fields = self
                    .fields
                    .iter()
                    .map(|field| field.build(&child_path(&field.name)))
                    .collect::<Result<Vec<_>>>()?;
                if self.kind == "dict" {
                    Schema::dict(fields)
                } else {
                    Schema::sparse_dict(fields)
                }
            }
            "array" | "list" | "multi_value" => {
                let member = self
                    .member
                    .as_deref()
                    .ok_or_else(|| DefinitionError::invalid(path, format!("{} needs a member", self.kind)))?
                    .build(&child_path("*"))?;
                match self.kind.as_str() {
                    "array" => Schema::array(member),
                    "list" => Schema::list(member),
                    _ => Schema::multi_value(member),
                }
            }
            other => SCALAR_KINDS
                .iter()
                .find(|kind| kind.name() == other)
                .map(|kind| Schema::of(*kind))
                .ok_or_else(|| DefinitionError::invalid(path, format!("unknown type '{other}'")))?,
        };
        let schema = schema.named(self.name.clone());

        if let Some(option) = self
            .configured_options()
            .into_iter()
            .find(|option| !schema.accepts_option(option))
        {
            return Err(DefinitionError::invalid(
                path,
                format!("option '{option}' does not apply to {}", self.kind),
            ));
        }
        self.apply_options(schema)
    }

    fn configured_options(&self) -> Vec<&'static str> {
        [
            ("default", self.default.is_some()),
            ("optional", self.optional.is_some()),
            ("strip", self.strip.is_some()),
            ("signed", self.signed.is_some()),
            ("format", self.format.is_some()),
            ("prune_empty", self.prune_empty.is_some()),
            ("policy", self.policy.is_some()),
            ("minimum_fields", self.minimum_fields.is_some()),
            ("true_text", self.true_text.is_some()),
            ("false_text", self.false_text.is_some()),
            ("true_synonyms", self.true_synonyms.is_some()),
            ("false_synonyms", self.false_synonyms.is_some()),
            ("maximum_set_flat_members", self.maximum_set_flat_members.is_some()),
        ]
        .into_iter()
        .filter_map(|(option, set)| set.then_some(option))
        .collect()
    }

    fn apply_options(&self, mut schema: Schema) -> Result<Schema> {
        if let Some(default) = &self.default {
            schema = schema.with_default(Value::from(default.clone()));
        }
        if let Some(optional) = self.optional {
            schema = schema.optional(optional);
        }
        if let Some(strip) = self.strip {
            schema = schema.strip(strip);
        }
        if let Some(signed) = self.signed {
            schema = schema.signed(signed);
        }
        if let Some(format) = &self.format {
            schema = schema.format(NumberFormat::parse(format)?);
        }
        if let Some(prune) = self.prune_empty {
            schema = schema.prune_empty(prune);
        }
        if let Some(policy) = &self.policy {
            schema = schema.policy(policy.clone());
        }
        if let Some(minimum) = &self.minimum_fields {
            schema = schema.minimum_fields(minimum.clone());
        }
        if let Some(text) = &self.true_text {
            schema = schema.true_text(text.clone());
        }
        if let Some(text) = &self.false_text {
            schema = schema.false_text(text.clone());
        }
        if let Some(texts) = &self.true_synonyms {
            schema = schema.true_synonyms(texts.iter().cloned());
        }
        if let Some(texts) = &self.false_synonyms {
            schema = schema.false_synonyms(texts.iter().cloned());
        }
        if let Some(limit) = self.maximum_set_flat_members {
            schema = schema.maximum_set_flat_members(limit);
        }
        Ok(schema)
    }
}
