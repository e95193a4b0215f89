/// Core engine primitives
/// 
/// Types shared by every layer of the gateway:
/// - Type-tagged value container passed between processor nodes
/// - Classified API errors
/// - Per-request context read by processors during evaluation

// Type-tagged value wrapper and loose coercion helpers
pub mod value;

// Classified error taxonomy for evaluation and validation
pub mod error;

// Request-scoped state (fragments, vars, token, temporary store)
pub mod context;

// Re-export commonly used types
pub use context::{MemoryVarStore, RequestContext, VarStore};
pub use error::{ApiError, ApiResult};
pub use value::{DataContainer, DataType};
