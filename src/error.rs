//! Error types for resolution and field injection

use std::any::TypeId;
use thiserror::Error;

/// Errors that can occur while resolving or wiring instances
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// Nothing in the scope chain satisfies the request
    #[error("No binding found for {type_name}{}", qualifier(.name))]
    NotFound {
        type_name: &'static str,
        type_id: TypeId,
        name: Option<String>,
    },

    /// A required injection point could not be resolved
    #[error("Cannot inject {field}; no instances bound to {type_name}{}", qualifier(.name))]
    Unsatisfied {
        field: String,
        type_name: &'static str,
        name: Option<String>,
    },

    /// A prototype factory or lazy initializer failed
    #[error("Failed to create instance of {type_name}: {reason}")]
    CreationFailed {
        type_name: &'static str,
        reason: String,
    },

    /// A resolved value could not be written into its field
    #[error("Cannot assign {field}: resolved value is not a {expected}")]
    FieldAssignment {
        field: String,
        expected: &'static str,
    },

    /// A resolved value is not of the type the caller asked for
    #[error("Resolved instance for {requested} is not a {expected}")]
    TypeMismatch {
        requested: &'static str,
        expected: &'static str,
    },

    /// Parent scope was dropped
    #[error("Parent scope has been dropped")]
    ParentDropped,

    /// Internal error
    #[error("Internal DI error: {0}")]
    Internal(String),
}

fn qualifier(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" named \"{name}\""),
        None => String::new(),
    }
}

impl DiError {
    /// Create a NotFound error for a type
    #[inline]
    pub fn not_found<T: 'static>(name: Option<&str>) -> Self {
        Self::NotFound {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            name: name.map(str::to_owned),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name,
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error for a caller expecting `T`
    #[inline]
    pub fn type_mismatch<T: 'static>(requested: &'static str) -> Self {
        Self::TypeMismatch {
            requested,
            expected: std::any::type_name::<T>(),
        }
    }

    /// True for configuration errors (unbound required dependencies)
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Unsatisfied { .. })
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;
