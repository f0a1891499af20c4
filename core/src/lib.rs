//! Schema-driven element trees for binding HTML form data.
//!
//! A [`Schema`] describes the shape of some data: typed scalars, fixed-key
//! [`Schema::dict`]s and [`Schema::sparse_dict`]s, and the sequences
//! [`Schema::array`], [`Schema::list`] and [`Schema::multi_value`].
//! Instantiating a schema yields an [`Element`] tree that can be filled
//! from native values ([`Element::set`]) or from the flat `(name, text)`
//! pairs a browser submits ([`Element::set_flat`]), flattened back into
//! those pairs ([`Element::flatten`]), and validated
//! ([`Element::validate`]).
//!
//! Scalars keep both a typed value and its text form. Text that fails to
//! coerce is kept as-is so a form can be redisplayed with what the user
//! typed.
//!
//! # Example
//!
//! ```
//! use flatland_core::*;
//!
//! let schema = Schema::dict([
//!     Schema::string().named("name"),
//!     Schema::integer().named("age"),
//!     Schema::array(Schema::string().named("tag")).named("tags"),
//! ])
//! .named("person");
//!
//! let mut el = schema
//!     .from_flat([
//!         ("person_name", "Ada"),
//!         ("person_age", "36"),
//!         ("person_tags_tag", "math"),
//!         ("person_tags_tag", "engines"),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(el.get("age").unwrap().value(), Value::Int(36));
//! assert_eq!(el.el("tags.1").unwrap().u(), "engines");
//! assert!(el.validate());
//!
//! let pairs = el.flatten();
//! assert_eq!(pairs[0], ("person_name".to_string(), "Ada".to_string()));
//! assert_eq!(pairs.len(), 4);
//! ```

mod coerce;
mod dict;
mod element;
mod error;
mod flatten;
mod grouping;
mod naming;
mod options;
mod schema;
mod sequence;
mod unflatten;
mod validate;
mod value;

pub use coerce::ScalarKind;
pub use dict::Slice;
pub use element::{Element, ElementId, ElementKind, ElementMut, ElementRef};
pub use error::{CoercionError, ErrorCategory, FlatlandError, Result};
pub use flatten::FlatPair;
pub use naming::DEFAULT_SEPARATOR;
pub use options::{DefaultFactory, MinimumFields, NumberFormat, Options, Policy};
pub use schema::{Schema, SchemaIssue, SchemaKind, validate_schema};
pub use validate::{Present, Validator, ValidatorFn, ValueIn};
pub use value::Value;
