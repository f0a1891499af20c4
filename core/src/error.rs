//! Error types for element tree operations.
//!
//! Coercion failures are not errors: [`set`](crate::ElementMut::set) reports
//! them through its boolean return value. [`FlatlandError`] covers the
//! failures that always surface synchronously at the call that triggered
//! them: key-domain violations on fixed-shape containers, invalid
//! configuration literals, unsupported operations, and structural mismatches
//! between a schema and the data it is asked to bind.

use thiserror::Error;

/// Broad classification of a [`FlatlandError`].
///
/// The three key-related categories let callers tell apart a key that the
/// container forbids touching ([`Permission`](Self::Permission)), a key the
/// schema never declared ([`Domain`](Self::Domain)) and a declared key with
/// no instance present ([`Missing`](Self::Missing)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Key structurally disallowed for this operation.
    Permission,
    /// Key not part of the schema at all.
    Domain,
    /// Key valid for the schema but not present on this element.
    Missing,
    /// Invalid schema configuration, detected when exercised.
    Configuration,
    /// Operation meaningless for this element kind.
    Unsupported,
    /// Schema shape cannot bind the requested data.
    Structure,
    /// Attempt to assign a read-only attribute.
    Immutable,
    /// Sequence index out of range.
    Index,
    /// Native value has the wrong shape for this element.
    InvalidValue,
}

/// Errors raised by element tree operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlatlandError {
    /// The key is declared but the container does not allow adding or
    /// removing it.
    #[error("key '{0}' can not be added or removed on this element")]
    ImmutableKey(String),

    /// The key is not declared by the container's schema.
    #[error("key '{0}' is not part of the schema")]
    UnknownKey(String),

    /// The key is declared but not present on this element.
    #[error("key '{0}' is not present")]
    MissingKey(String),

    /// Strict policy rejected a `set` that did not supply every field.
    #[error("strict policy requires all fields, missing: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A path given to [`el`](crate::ElementRef::el) could not be resolved.
    #[error("no element at path '{0}'")]
    PathNotFound(String),

    /// Invalid configuration literal or option combination.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The operation is not supported by this element kind.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The schema cannot bind the supplied data.
    #[error("structural error: {0}")]
    Structure(String),

    /// Containers derive `value` and `u` from their children.
    #[error("attribute '{0}' is read-only on container elements")]
    ImmutableAttribute(&'static str),

    /// Sequence index outside `0..len`.
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current sequence length.
        len: usize,
    },

    /// No child holds the requested value.
    #[error("value not present in sequence: {0}")]
    ValueNotFound(String),

    /// Native input shape does not fit the element.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl FlatlandError {
    /// Returns the broad category of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use flatland_core::{ErrorCategory, FlatlandError};
    ///
    /// let err = FlatlandError::UnknownKey("z".into());
    /// assert_eq!(err.category(), ErrorCategory::Domain);
    /// assert!(err.is_key_error());
    /// ```
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ImmutableKey(_) | Self::MissingFields(_) => ErrorCategory::Permission,
            Self::UnknownKey(_) | Self::PathNotFound(_) => ErrorCategory::Domain,
            Self::MissingKey(_) => ErrorCategory::Missing,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Unsupported(_) => ErrorCategory::Unsupported,
            Self::Structure(_) => ErrorCategory::Structure,
            Self::ImmutableAttribute(_) => ErrorCategory::Immutable,
            Self::IndexOutOfRange { .. } | Self::ValueNotFound(_) => ErrorCategory::Index,
            Self::InvalidValue(_) => ErrorCategory::InvalidValue,
        }
    }

    /// Returns `true` for domain and missing-key errors, the errors a
    /// mapping lookup raises for an absent key.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Domain | ErrorCategory::Missing
        )
    }
}

/// Failure to adapt a native value into a scalar's typed value.
///
/// Returned by [`ScalarKind::adapt`](crate::ScalarKind::adapt). Element
/// `set` swallows it into a `false` return; it never escapes the tree API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("can not adapt {input:?} to {kind}")]
pub struct CoercionError {
    /// Scalar kind name (e.g. `"integer"`).
    pub kind: &'static str,
    /// Text form of the rejected input.
    pub input: String,
}

impl CoercionError {
    pub(crate) fn new(kind: &'static str, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
        }
    }
}

/// Convenience alias for results with [`FlatlandError`].
pub type Result<T> = std::result::Result<T, FlatlandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_error_categories_are_distinct() {
        let permission = FlatlandError::ImmutableKey("x".into());
        let domain = FlatlandError::UnknownKey("z".into());
        let missing = FlatlandError::MissingKey("x".into());

        assert_eq!(permission.category(), ErrorCategory::Permission);
        assert_eq!(domain.category(), ErrorCategory::Domain);
        assert_eq!(missing.category(), ErrorCategory::Missing);
        assert!(!permission.is_key_error());
        assert!(domain.is_key_error());
        assert!(missing.is_key_error());
    }

    #[test]
    fn test_display_messages() {
        let err = FlatlandError::MissingFields(vec!["x".into(), "y".into()]);
        assert_eq!(
            err.to_string(),
            "strict policy requires all fields, missing: x, y"
        );

        let err = CoercionError::new("integer", "xyz");
        assert_eq!(err.to_string(), "can not adapt \"xyz\" to integer");
    }
}
