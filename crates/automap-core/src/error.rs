//! Error types for the Automap core library
//!
//! Every failure carries the shape identities involved and, when the failure
//! happened while a value was being mapped, the member name and the property
//! path, so convention failures can be diagnosed without reading plans.

use crate::shape::ShapeId;
use thiserror::Error;

/// Main error type for Automap operations
#[derive(Error, Debug)]
pub enum Error {
    /// The shape pair cannot be mapped at all (both generic, or no plan possible)
    #[error("No mapping found from {source_shape} to {target_shape}: {reason}")]
    NoMappingFound {
        source_shape: ShapeId,
        target_shape: ShapeId,
        reason: String,
    },

    /// An extractor variant received a shape outside its legal domain
    #[error("{extractor} extractor cannot handle shape {shape}: {message}")]
    InvalidShape {
        extractor: String,
        shape: ShapeId,
        message: String,
    },

    /// A class or enum name is not known to the shape provider
    #[error("Unknown shape: {name}")]
    UnknownShape { name: String },

    /// A constructor-required member has no value at execution time
    #[error("Required member '{member}' of {target_shape} has no value (at {path})")]
    RequiredMemberMissing {
        target_shape: ShapeId,
        member: String,
        path: String,
    },

    /// A discriminator value does not select any concrete subtype
    #[error("Discriminator '{property}' value '{value}' does not select a subtype of {target_shape} (at {path})")]
    DiscriminatorMismatch {
        target_shape: ShapeId,
        property: String,
        value: String,
        path: String,
    },

    /// A value could not be converted by its transformer
    #[error("Cannot convert {value} from {from} to {to} (at {path})")]
    Conversion {
        from: String,
        to: String,
        value: String,
        path: String,
    },

    /// A user supplied transformer failed
    #[error("Custom transformer '{id}' failed at {path}: {message}")]
    CustomTransformer {
        id: String,
        path: String,
        message: String,
    },

    /// The runtime value has no mappable shape
    #[error("Cannot map a {kind} value: only objects and maps have a shape")]
    UnsupportedSource { kind: String },

    /// External plan store failures (never cached)
    #[error("Plan store error: {message}")]
    Store {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Invalid configuration or shape declarations
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a conversion error for a value at a property path
    pub fn conversion(
        from: impl Into<String>,
        to: impl Into<String>,
        value: &crate::Value,
        path: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            from: from.into(),
            to: to.into(),
            value: value.summary(),
            path: path.into(),
        }
    }

    /// Clone of a plan-building failure that fails identically on retry.
    ///
    /// Store, IO and internal failures return `None`: they may be transient
    /// and must not be remembered as permanent.
    pub fn cached_copy(&self) -> Option<Error> {
        match self {
            Self::NoMappingFound {
                source_shape,
                target_shape,
                reason,
            } => Some(Self::NoMappingFound {
                source_shape: source_shape.clone(),
                target_shape: target_shape.clone(),
                reason: reason.clone(),
            }),
            Self::InvalidShape {
                extractor,
                shape,
                message,
            } => Some(Self::InvalidShape {
                extractor: extractor.clone(),
                shape: shape.clone(),
                message: message.clone(),
            }),
            Self::UnknownShape { name } => Some(Self::UnknownShape { name: name.clone() }),
            Self::Configuration { message } => Some(Self::Configuration {
                message: message.clone(),
            }),
            _ => None,
        }
    }

    /// Whether the error is raised while building plans rather than mapping values
    pub fn is_plan_error(&self) -> bool {
        matches!(
            self,
            Self::NoMappingFound { .. }
                | Self::InvalidShape { .. }
                | Self::UnknownShape { .. }
                | Self::Configuration { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_shapes() {
        let err = Error::NoMappingFound {
            source_shape: ShapeId::Map,
            target_shape: ShapeId::Map,
            reason: "both shapes are generic".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No mapping found from map to map: both shapes are generic"
        );
    }

    #[test]
    fn test_cached_copy_only_for_idempotent_failures() {
        let err = Error::UnknownShape {
            name: "User".to_string(),
        };
        assert!(matches!(err.cached_copy(), Some(Error::UnknownShape { .. })));

        let store = Error::Store {
            message: "disk full".to_string(),
            source: anyhow::anyhow!("disk full"),
        };
        assert!(store.cached_copy().is_none());
        assert!(!store.is_plan_error());
    }

    #[test]
    fn test_required_member_message_has_path() {
        let err = Error::RequiredMemberMissing {
            target_shape: ShapeId::class("UserDto"),
            member: "id".to_string(),
            path: "$.owner".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("UserDto"));
        assert!(message.contains("'id'"));
        assert!(message.contains("$.owner"));
    }
}
