//! Error types for `doppel-gen`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for generator operations.
pub type GenResult<T> = std::result::Result<T, GenError>;

/// Errors that can occur while generating a test double.
#[derive(Debug, Error)]
pub enum GenError {
    /// The target type, or a type it embeds, is not in the catalog
    #[error("bad type: {name}")]
    Lookup {
        /// Name that failed to resolve
        name: String,
    },

    /// The target type cannot be mocked
    #[error("cannot mock {type_name}: {reason}")]
    Shape {
        /// Target type
        type_name: String,
        /// What is wrong with it
        reason: ShapeError,
    },

    /// Filesystem failure
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Catalog input could not be used
    #[error("catalog error: {message}")]
    Catalog {
        /// Description
        message: String,
    },

    /// JSON catalog parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML catalog parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl GenError {
    /// Create a lookup error.
    #[must_use]
    pub fn lookup(name: impl Into<String>) -> Self {
        Self::Lookup { name: name.into() }
    }

    /// Create a shape error for `type_name`.
    #[must_use]
    pub fn shape(type_name: impl Into<String>, reason: ShapeError) -> Self {
        Self::Shape {
            type_name: type_name.into(),
            reason,
        }
    }

    /// Create an I/O error tagged with the path involved.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a catalog error.
    #[must_use]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }
}

/// Reasons a type's shape rules out generating a double.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Only structs can be wrapped
    #[error("not a struct")]
    NotStruct,

    /// Nothing to mock
    #[error("no exported methods")]
    NoMethods,

    /// The same method is declared twice on the type itself
    #[error("method {method} declared more than once")]
    DuplicateMethod {
        /// Method name
        method: String,
    },

    /// Two embedded fields at the same depth both supply a method
    #[error("method {method} is supplied by both {first} and {second}")]
    AmbiguousDelegate {
        /// Method name
        method: String,
        /// First supplying field
        first: String,
        /// Second supplying field
        second: String,
    },
}
