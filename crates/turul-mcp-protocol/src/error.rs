//! Error types for the serialization core

use thiserror::Error;
use turul_mcp_json_rpc_server::{JsonRpcErrorObject, ToJsonRpcError};

/// Result type used throughout the serialization core
pub type Result<T, E = SerializationError> = std::result::Result<T, E>;

/// A model invariant was violated, either at construction or while rebuilding
/// a model from a wire DTO. Never repaired silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{model}.{field}: {reason}")]
pub struct ModelValidationError {
    pub model: &'static str,
    pub field: &'static str,
    pub reason: String,
}

impl ModelValidationError {
    pub fn new(model: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            model,
            field,
            reason: reason.into(),
        }
    }
}

/// Every failure the serialization core reports
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A required registration or builder argument was missing or malformed
    #[error("Invalid argument '{name}': {reason}")]
    Argument { name: &'static str, reason: String },

    /// The ambient session slot was entered while already active for this call
    #[error("Reentrant call to {operation} detected: a session context is already active")]
    ReentrantContext { operation: &'static str },

    #[error("Model validation failed: {0}")]
    Validation(#[from] ModelValidationError),

    #[error("Failed to decode {target}: {source}")]
    Decode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {target}: {source}")]
    Encode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl SerializationError {
    /// Misuse detected at registration or build time
    pub fn argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Argument {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn decode<T: ?Sized>(source: serde_json::Error) -> Self {
        Self::Decode {
            target: std::any::type_name::<T>(),
            source,
        }
    }

    pub(crate) fn encode<T: ?Sized>(source: serde_json::Error) -> Self {
        Self::Encode {
            target: std::any::type_name::<T>(),
            source,
        }
    }

    /// True for a nested entry into an already active session scope
    pub fn is_reentrant(&self) -> bool {
        matches!(self, Self::ReentrantContext { .. })
    }
}

impl ToJsonRpcError for SerializationError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            SerializationError::Decode { .. } | SerializationError::Validation(_) => {
                JsonRpcErrorObject::invalid_params(self.to_string())
            }
            SerializationError::Argument { .. }
            | SerializationError::ReentrantContext { .. }
            | SerializationError::Encode { .. } => {
                JsonRpcErrorObject::internal_error(Some(self.to_string()))
            }
        }
    }
}
