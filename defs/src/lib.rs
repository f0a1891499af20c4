//! Declarative form definitions for flatland schemas.
//!
//! Schemas can be described in YAML or JSON files instead of code.
//! [`FormDefinition`] is the serializable document; [`SchemaDef::to_schema`]
//! compiles it into a [`flatland_core::Schema`] and rejects options that do
//! not apply to a node's kind. [`SchemaRegistry`] loads a directory of
//! definitions, or tries a chain of sources through its builder.
//!
//! # Quick start
//!
//! ```
//! use flatland_defs::FormDefinition;
//!
//! let def = FormDefinition::from_yaml(
//!     r#"
//! schema:
//!   type: dict
//!   name: login
//!   fields:
//!     - { name: user, type: string }
//!     - { name: remember, type: boolean, optional: true }
//! "#,
//! )
//! .unwrap();
//!
//! let mut form = def.to_schema().unwrap().from_flat([("login_user", "ada")]).unwrap();
//! assert!(form.validate());
//! ```

mod definition;
mod error;
mod registry;

pub use definition::{FormDefinition, SchemaDef};
pub use error::{DefinitionError, Result};
pub use registry::{RegistryBuilder, RegistrySource, SchemaRegistry};
