/// Classified API errors
///
/// Evaluation and validation never retry or recover: the first error aborts the
/// whole call and is propagated unchanged to the HTTP layer, which maps it to a
/// status code and an `{"error": {...}}` body.

use serde_json::{json, Value};

pub type ApiResult<T> = Result<T, ApiError>;

/// Error code for processing failures (matches the legacy client contract)
pub const CODE_PROCESSING: u16 = 1;
/// Error code for bad requests / unknown resources
pub const CODE_REQUEST: u16 = 3;
/// Error code for authentication failures
pub const CODE_AUTH: u16 = 4;
/// Error code for validation failures
pub const CODE_VALIDATION: u16 = 6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Node is neither a processor reference nor a usable literal, or ids clash
    #[error("{message}")]
    MalformedDefinition { message: String, id: Option<String> },

    #[error("unknown processor machine name: {name}")]
    UnknownProcessor { name: String, id: Option<String> },

    /// Validator only: cardinality, type, literal or limit breach
    #[error("{message}")]
    ContractViolation { message: String, id: String },

    /// Raised by a concrete processor while evaluating
    #[error("{message}")]
    ProcessorFailure {
        message: String,
        id: String,
        code: u16,
        status: u16,
    },

    #[error("invalid fragment name: {name}")]
    FragmentResolution { name: String, id: String },

    #[error("{message}")]
    Unauthorized { message: String, id: Option<String> },

    #[error("{message}")]
    NotFound { message: String },

    /// Another resource already serves the route
    #[error("{message}")]
    Conflict { message: String },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn malformed(message: impl Into<String>, id: Option<&str>) -> Self {
        ApiError::MalformedDefinition {
            message: message.into(),
            id: id.map(str::to_string),
        }
    }

    pub fn contract(message: impl Into<String>, id: &str) -> Self {
        ApiError::ContractViolation {
            message: message.into(),
            id: id.to_string(),
        }
    }

    /// Processor failure with the default processing code and a 400 status
    pub fn processor(message: impl Into<String>, id: &str) -> Self {
        Self::processor_with(message, id, CODE_PROCESSING, 400)
    }

    pub fn processor_with(message: impl Into<String>, id: &str, code: u16, status: u16) -> Self {
        ApiError::ProcessorFailure {
            message: message.into(),
            id: id.to_string(),
            code,
            status,
        }
    }

    pub fn unauthorized(id: Option<&str>) -> Self {
        ApiError::Unauthorized {
            message: "permission denied".to_string(),
            id: id.map(str::to_string),
        }
    }

    /// Numeric error code reported to API clients
    pub fn code(&self) -> u16 {
        match self {
            ApiError::MalformedDefinition { .. }
            | ApiError::ContractViolation { .. }
            | ApiError::FragmentResolution { .. } => CODE_VALIDATION,
            ApiError::UnknownProcessor { .. } | ApiError::Storage(_) => CODE_PROCESSING,
            ApiError::ProcessorFailure { code, .. } => *code,
            ApiError::Unauthorized { .. } => CODE_AUTH,
            ApiError::NotFound { .. } | ApiError::Conflict { .. } => CODE_REQUEST,
        }
    }

    /// HTTP status the API layer should answer with
    pub fn status(&self) -> u16 {
        match self {
            ApiError::MalformedDefinition { .. } | ApiError::ContractViolation { .. } => 406,
            ApiError::UnknownProcessor { .. } => 400,
            ApiError::ProcessorFailure { status, .. } => *status,
            ApiError::FragmentResolution { .. } => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::Storage(_) => 500,
        }
    }

    /// Id of the node the error is attributed to, if any
    pub fn node_id(&self) -> Option<&str> {
        match self {
            ApiError::MalformedDefinition { id, .. }
            | ApiError::UnknownProcessor { id, .. }
            | ApiError::Unauthorized { id, .. } => id.as_deref(),
            ApiError::ContractViolation { id, .. }
            | ApiError::ProcessorFailure { id, .. }
            | ApiError::FragmentResolution { id, .. } => Some(id),
            ApiError::NotFound { .. } | ApiError::Conflict { .. } | ApiError::Storage(_) => None,
        }
    }

    /// Attach a node id to errors raised before the owning node was known
    pub fn with_node_id(self, node_id: &str) -> Self {
        match self {
            ApiError::UnknownProcessor { name, id: None } => ApiError::UnknownProcessor {
                name,
                id: Some(node_id.to_string()),
            },
            ApiError::MalformedDefinition { message, id: None } => ApiError::MalformedDefinition {
                message,
                id: Some(node_id.to_string()),
            },
            other => other,
        }
    }

    /// Client-facing error body
    pub fn to_body(&self) -> Value {
        let id = match self.node_id() {
            Some(id) => Value::String(id.to_string()),
            None => json!(-1),
        };
        json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "id": id,
            }
        })
    }
}
