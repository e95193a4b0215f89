/// Gaterway: low-code API gateway
///
/// Resources declare an endpoint as trees of typed processor nodes (security,
/// process, output and named fragments). This library validates those trees
/// against processor contracts at import time and evaluates them per request.

// Core configuration and setup
pub mod config;

// Shared primitives - value container, errors, request context
pub mod core;

// Processor contracts, registry and the built-in catalogue
pub mod processor;

// Resource management layer - definitions, validation, storage, and registry
pub mod resource;

// Runtime evaluation engine - graph evaluation, fragments, cache, pipeline
pub mod runtime;

// HTTP API layer - resource management and gateway calls
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use crate::core::{ApiError, ApiResult, DataContainer, DataType, RequestContext};
pub use processor::ProcessorRegistry;
pub use resource::{Resource, ResourceDocument, ResourceMeta, ResourceValidator};
pub use runtime::{Gateway, GraphEvaluator};
pub use server::start_server;
