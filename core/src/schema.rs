//! Immutable schema descriptors.
//!
//! A [`Schema`] is a cheap-to-clone handle describing one node of a form:
//! its name, kind, and [`Options`]. Builder methods never mutate the
//! receiver; each returns a derived schema, so a base schema can be shared
//! and specialised freely.
//!
//! # Examples
//!
//! ```
//! use flatland_core::Schema;
//!
//! let base = Schema::integer().named("age");
//! let optional = base.clone().optional(true);
//!
//! assert!(!base.options().optional);
//! assert!(optional.options().optional);
//! assert_eq!(optional.name(), "age");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::coerce::ScalarKind;
use crate::options::{DefaultFactory, NumberFormat, Options};
use crate::validate::Validator;
use crate::{ElementRef, Value};

/// Structural kind of a schema.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Leaf holding one typed value.
    Scalar(ScalarKind),
    /// Fixed-key mapping; `sparse` dicts only hold the keys that were set.
    Dict {
        /// Declared fields, in declaration order.
        fields: Vec<Schema>,
        /// Whether keys may be absent.
        sparse: bool,
    },
    /// Homogeneous sequence whose children all share the member name.
    Array(Schema),
    /// Homogeneous sequence whose children are named by position.
    List(Schema),
    /// Array whose value is its first child's value.
    MultiValue(Schema),
}

#[derive(Debug)]
struct SchemaNode {
    name: String,
    kind: SchemaKind,
    options: Options,
}

/// Shared, immutable schema handle.
#[derive(Clone)]
pub struct Schema(Arc<SchemaNode>);

const COMMON_OPTIONS: &[&str] = &["name", "default", "optional", "validators"];

impl Schema {
    fn new(kind: SchemaKind) -> Self {
        Self(Arc::new(SchemaNode {
            name: String::new(),
            kind,
            options: Options::default(),
        }))
    }

    fn derive(self, edit: impl FnOnce(&mut SchemaNode)) -> Self {
        let mut node = SchemaNode {
            name: self.0.name.clone(),
            kind: self.0.kind.clone(),
            options: self.0.options.clone(),
        };
        edit(&mut node);
        Self(Arc::new(node))
    }

    /// Abstract scalar; elements can be created but not `set`.
    pub fn scalar() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Abstract))
    }

    /// Text scalar.
    pub fn string() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::String))
    }

    /// Integer scalar.
    pub fn integer() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Integer))
    }

    /// Long integer scalar.
    pub fn long() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Long))
    }

    /// Float scalar.
    pub fn float() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Float))
    }

    /// Decimal scalar.
    pub fn decimal() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Decimal))
    }

    /// Boolean scalar.
    pub fn boolean() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Boolean))
    }

    /// Date scalar.
    pub fn date() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Date))
    }

    /// Time scalar.
    pub fn time() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::Time))
    }

    /// Date-time scalar.
    pub fn datetime() -> Self {
        Self::new(SchemaKind::Scalar(ScalarKind::DateTime))
    }

    /// Scalar of the given kind.
    pub fn of(kind: ScalarKind) -> Self {
        Self::new(SchemaKind::Scalar(kind))
    }

    /// Fixed-key mapping over `fields`. An unnamed dict is a form root.
    pub fn dict(fields: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(SchemaKind::Dict {
            fields: fields.into_iter().collect(),
            sparse: false,
        })
    }

    /// Mapping that only holds the keys that were set.
    pub fn sparse_dict(fields: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(SchemaKind::Dict {
            fields: fields.into_iter().collect(),
            sparse: true,
        })
    }

    /// Sequence of `member` children sharing the member's name.
    pub fn array(member: Schema) -> Self {
        Self::new(SchemaKind::Array(member))
    }

    /// Sequence of `member` children named by position.
    pub fn list(member: Schema) -> Self {
        Self::new(SchemaKind::List(member))
    }

    /// Array whose value is the first child's value.
    pub fn multi_value(member: Schema) -> Self {
        Self::new(SchemaKind::MultiValue(member))
    }

    /// Sets the element name.
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.derive(|n| n.name = name)
    }

    /// Sets the static default.
    pub fn with_default(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.derive(|n| n.options.default = Some(value))
    }

    /// Sets a computed default, evaluated against the element being defaulted.
    pub fn with_default_factory<F>(self, factory: F) -> Self
    where
        F: Fn(&ElementRef<'_>) -> Value + Send + Sync + 'static,
    {
        let factory: DefaultFactory = Arc::new(factory);
        self.derive(|n| n.options.default_factory = Some(factory))
    }

    /// Marks the element as allowed to be empty when validating.
    pub fn optional(self, optional: bool) -> Self {
        self.derive(|n| n.options.optional = optional)
    }

    /// Controls whitespace trimming of text input.
    pub fn strip(self, strip: bool) -> Self {
        self.derive(|n| n.options.strip = strip)
    }

    /// Controls whether negative numbers are accepted.
    pub fn signed(self, signed: bool) -> Self {
        self.derive(|n| n.options.signed = signed)
    }

    /// Sets the canonical numeric text format.
    pub fn format(self, format: NumberFormat) -> Self {
        self.derive(|n| n.options.format = Some(format))
    }

    /// Controls skipping of empty sequence children.
    pub fn prune_empty(self, prune: bool) -> Self {
        self.derive(|n| n.options.prune_empty = prune)
    }

    /// Sets the Dict `set` policy literal (`duck` or `strict`).
    pub fn policy(self, policy: impl Into<String>) -> Self {
        let policy = policy.into();
        self.derive(|n| n.options.policy = Some(policy))
    }

    /// Sets the SparseDict minimum literal (`none` or `required`).
    pub fn minimum_fields(self, minimum: impl Into<String>) -> Self {
        let minimum = minimum.into();
        self.derive(|n| n.options.minimum_fields = Some(minimum))
    }

    /// Sets the canonical text of `true`.
    pub fn true_text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.derive(|n| n.options.true_text = text)
    }

    /// Sets the canonical text of `false`.
    pub fn false_text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.derive(|n| n.options.false_text = text)
    }

    /// Replaces the texts adapted to `true`.
    pub fn true_synonyms<S: Into<String>>(self, texts: impl IntoIterator<Item = S>) -> Self {
        let texts = texts.into_iter().map(Into::into).collect();
        self.derive(|n| n.options.true_synonyms = texts)
    }

    /// Replaces the texts adapted to `false`.
    pub fn false_synonyms<S: Into<String>>(self, texts: impl IntoIterator<Item = S>) -> Self {
        let texts = texts.into_iter().map(Into::into).collect();
        self.derive(|n| n.options.false_synonyms = texts)
    }

    /// Caps the number of List children created from flat input.
    pub fn maximum_set_flat_members(self, limit: usize) -> Self {
        self.derive(|n| n.options.maximum_set_flat_members = Some(limit))
    }

    /// Appends a validator.
    pub fn with_validator(self, validator: impl Validator + 'static) -> Self {
        let validator: Arc<dyn Validator> = Arc::new(validator);
        self.derive(|n| n.options.validators.push(validator))
    }

    /// Edits options in place on a derived copy.
    pub fn using(self, edit: impl FnOnce(&mut Options)) -> Self {
        self.derive(|n| edit(&mut n.options))
    }

    /// Element name; empty for anonymous elements.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Structural kind.
    pub fn kind(&self) -> &SchemaKind {
        &self.0.kind
    }

    /// Configuration.
    pub fn options(&self) -> &Options {
        &self.0.options
    }

    /// Returns the scalar kind for scalar schemas.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.0.kind {
            SchemaKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns `true` for scalar schemas.
    pub fn is_scalar(&self) -> bool {
        self.scalar_kind().is_some()
    }

    /// Declared fields of a Dict; empty for other kinds.
    pub fn fields(&self) -> &[Schema] {
        match &self.0.kind {
            SchemaKind::Dict { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Position of the field named `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name() == name)
    }

    /// Field named `name`.
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields().iter().find(|f| f.name() == name)
    }

    /// Member schema of a sequence.
    pub fn member(&self) -> Option<&Schema> {
        match &self.0.kind {
            SchemaKind::Array(m) | SchemaKind::List(m) | SchemaKind::MultiValue(m) => Some(m),
            _ => None,
        }
    }

    /// Returns `true` for SparseDict schemas.
    pub fn is_sparse(&self) -> bool {
        matches!(self.0.kind, SchemaKind::Dict { sparse: true, .. })
    }

    /// Kind name as used in definition files.
    pub fn kind_name(&self) -> &'static str {
        match &self.0.kind {
            SchemaKind::Scalar(kind) => kind.name(),
            SchemaKind::Dict { sparse: false, .. } => "dict",
            SchemaKind::Dict { sparse: true, .. } => "sparse_dict",
            SchemaKind::Array(_) => "array",
            SchemaKind::List(_) => "list",
            SchemaKind::MultiValue(_) => "multi_value",
        }
    }

    /// Option names meaningful for this kind, beyond the common ones.
    pub fn kind_options(&self) -> &'static [&'static str] {
        match &self.0.kind {
            SchemaKind::Scalar(ScalarKind::Abstract) => &[],
            SchemaKind::Scalar(ScalarKind::String) => &["strip"],
            SchemaKind::Scalar(ScalarKind::Integer | ScalarKind::Long) => &["signed", "format"],
            SchemaKind::Scalar(ScalarKind::Float | ScalarKind::Decimal) => {
                &["signed", "format"]
            }
            SchemaKind::Scalar(ScalarKind::Boolean) => {
                &["true_text", "false_text", "true_synonyms", "false_synonyms"]
            }
            SchemaKind::Scalar(ScalarKind::Date | ScalarKind::Time | ScalarKind::DateTime) => {
                &["strip"]
            }
            SchemaKind::Dict { sparse: false, .. } => &["policy"],
            SchemaKind::Dict { sparse: true, .. } => &["policy", "minimum_fields"],
            SchemaKind::Array(_) | SchemaKind::MultiValue(_) => &["prune_empty"],
            SchemaKind::List(_) => &["prune_empty", "maximum_set_flat_members"],
        }
    }

    /// Returns `true` if `option` may be configured on this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use flatland_core::Schema;
    ///
    /// assert!(Schema::boolean().accepts_option("true_text"));
    /// assert!(!Schema::string().accepts_option("minimum_fields"));
    /// assert!(Schema::string().accepts_option("optional"));
    /// ```
    pub fn accepts_option(&self, option: &str) -> bool {
        COMMON_OPTIONS.contains(&option) || self.kind_options().contains(&option)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("options", &self.0.options)
            .finish()
    }
}

/// Structural issues in a schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Dotted path of the offending schema (`""` for the root).
    pub path: String,
    /// Description.
    pub message: String,
}

/// Checks a schema tree for shapes that can never bind flat data.
///
/// Reports duplicate Dict field names, Array and MultiValue members that
/// are not scalars, List members whose name is all digits, and
/// unparseable `policy` or `minimum_fields` literals.
///
/// # Examples
///
/// ```
/// use flatland_core::{validate_schema, Schema};
///
/// let ok = Schema::dict([Schema::string().named("x")]);
/// assert!(validate_schema(&ok).is_empty());
///
/// let bad = Schema::dict([
///     Schema::string().named("x"),
///     Schema::integer().named("x"),
/// ]);
/// assert_eq!(validate_schema(&bad).len(), 1);
/// ```
pub fn validate_schema(schema: &Schema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    check_node(schema, "", &mut issues);
    issues
}

fn check_node(schema: &Schema, path: &str, issues: &mut Vec<SchemaIssue>) {
    let mut report = |message: String| {
        issues.push(SchemaIssue {
            path: path.to_string(),
            message,
        })
    };
    if let Err(err) = schema.options().policy() {
        report(err.to_string());
    }
    if let Err(err) = schema.options().minimum_fields() {
        report(err.to_string());
    }

    let child_path = |segment: &str| {
        if path.is_empty() {
            segment.to_string()
        } else {
            format!("{path}.{segment}")
        }
    };

    match schema.kind() {
        SchemaKind::Scalar(_) => {}
        SchemaKind::Dict { fields, .. } => {
            let mut seen: Vec<&str> = Vec::new();
            for field in fields {
                if seen.contains(&field.name()) {
                    report(format!("duplicate field '{}'", field.name()));
                }
                seen.push(field.name());
            }
            for field in fields {
                check_node(field, &child_path(field.name()), issues);
            }
        }
        SchemaKind::Array(member) | SchemaKind::MultiValue(member) => {
            if !member.is_scalar() {
                report(format!(
                    "{} member must be a scalar, found {}",
                    schema.kind_name(),
                    member.kind_name()
                ));
            }
            check_node(member, &child_path("*"), issues);
        }
        SchemaKind::List(member) => {
            if !member.name().is_empty() && member.name().bytes().all(|b| b.is_ascii_digit()) {
                report(format!(
                    "list member name '{}' is indistinguishable from an index",
                    member.name()
                ));
            }
            check_node(member, &child_path("*"), issues);
        }
    }
}
