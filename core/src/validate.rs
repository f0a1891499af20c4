//! Element validation.
//!
//! Validation walks a tree bottom-up: children first, then the element
//! itself. Every element is visited even after a failure, and each records
//! its own verdict and messages. An element is valid when its own checks
//! pass and all of its children are valid.
//!
//! The built-in check rejects an empty element unless its schema is
//! `optional`. Empty optional elements skip their validators; empty
//! required ones report only the built-in failure. A required scalar whose
//! text failed to coerce is rejected the same way, since it holds no value.
//!
//! # Examples
//!
//! ```
//! use flatland_core::{Schema, Value};
//!
//! let schema = Schema::dict([
//!     Schema::integer().named("age"),
//!     Schema::string().named("nick").optional(true),
//! ])
//! .named("p");
//!
//! let mut el = schema.from_flat([("p_nick", "al")]).unwrap();
//! assert!(!el.validate());
//! assert_eq!(
//!     el.all_errors(),
//!     vec![("p_age".to_string(), "p_age is required".to_string())]
//! );
//!
//! el.set_flat([("p_age", "42")]).unwrap();
//! assert!(el.validate());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::element::{Element, ElementId, ElementKind, ElementMut, ElementRef};
use crate::Value;

/// A check run against one element.
pub trait Validator: fmt::Debug + Send + Sync {
    /// Returns a message when `element` fails.
    fn validate(&self, element: &ElementRef<'_>) -> Result<(), String>;
}

/// Rejects elements whose value is unset or blank.
///
/// Unlike the built-in required check this also applies to optional
/// elements, and rejects blank text such as `""`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Present;

impl Validator for Present {
    fn validate(&self, element: &ElementRef<'_>) -> Result<(), String> {
        if element.value().is_blank() {
            Err(format!("{} is required", label(element)))
        } else {
            Ok(())
        }
    }
}

/// Accepts only the listed values.
#[derive(Debug, Clone)]
pub struct ValueIn(pub Vec<Value>);

impl Validator for ValueIn {
    fn validate(&self, element: &ElementRef<'_>) -> Result<(), String> {
        let value = element.value();
        if self.0.contains(&value) {
            Ok(())
        } else {
            Err(format!("{} is not an accepted value", value.repr()))
        }
    }
}

type CheckFn = dyn Fn(&ElementRef<'_>) -> Result<(), String> + Send + Sync;

/// Validator built from a closure.
///
/// # Examples
///
/// ```
/// use flatland_core::{Schema, ValidatorFn, Value};
///
/// let even = ValidatorFn::new("even", |el| match el.value() {
///     Value::Int(i) if i % 2 == 0 => Ok(()),
///     _ => Err("must be even".to_string()),
/// });
/// let mut el = Schema::integer().with_validator(even).create_with(3).unwrap();
/// assert!(!el.validate());
/// assert_eq!(el.root().errors(), ["must be even"]);
/// ```
#[derive(Clone)]
pub struct ValidatorFn {
    name: &'static str,
    check: Arc<CheckFn>,
}

impl ValidatorFn {
    /// Wraps `check` under a name used in debug output.
    pub fn new<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&ElementRef<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name,
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for ValidatorFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValidatorFn").field(&self.name).finish()
    }
}

impl Validator for ValidatorFn {
    fn validate(&self, element: &ElementRef<'_>) -> Result<(), String> {
        (self.check)(element)
    }
}

fn label(element: &ElementRef<'_>) -> String {
    let name = element.flat_name();
    if name.is_empty() {
        "value".to_string()
    } else {
        name
    }
}

impl Element {
    fn validate_node(&mut self, id: ElementId) -> bool {
        let mut children_valid = true;
        for child in self.child_ids(id) {
            let valid = self.validate_node(child);
            children_valid = children_valid && valid;
        }

        let errors = own_errors(&ElementRef { tree: self, id });
        let node = self.node_mut(id);
        node.valid = Some(errors.is_empty() && children_valid);
        node.errors = errors;
        node.valid == Some(true)
    }

    /// Validates the whole tree. See [`ElementMut::validate`].
    pub fn validate(&mut self) -> bool {
        self.root_mut().validate()
    }

    /// Flat name and message of every failure in the tree, pre-order.
    pub fn all_errors(&self) -> Vec<(String, String)> {
        self.root().all_errors()
    }
}

fn own_errors(element: &ElementRef<'_>) -> Vec<String> {
    let options = element.schema().options();
    if element.is_empty() {
        return if options.optional {
            Vec::new()
        } else {
            vec![format!("{} is required", label(element))]
        };
    }
    if !options.optional && element.kind() == ElementKind::Scalar && element.value().is_none() {
        return vec![format!(
            "{} is not a valid {}",
            label(element),
            element.schema().kind_name()
        )];
    }
    options
        .validators
        .iter()
        .filter_map(|validator| validator.validate(element).err())
        .collect()
}

impl<'a> ElementRef<'a> {
    /// Verdict of the last validation; `None` if never validated since the
    /// element was created or reset.
    pub fn is_valid(&self) -> Option<bool> {
        self.tree.node(self.id).valid
    }

    /// Messages recorded by the last validation of this element alone.
    pub fn errors(&self) -> &'a [String] {
        &self.tree.node(self.id).errors
    }

    /// Flat name and message of every failure in this subtree, pre-order.
    pub fn all_errors(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .errors()
            .iter()
            .map(|message| (self.flat_name(), message.clone()))
            .collect();
        for child in self.children() {
            out.extend(child.all_errors());
        }
        out
    }
}

impl ElementMut<'_> {
    /// Validates this subtree and returns whether it is valid.
    pub fn validate(&mut self) -> bool {
        self.tree.validate_node(self.id)
    }
}
