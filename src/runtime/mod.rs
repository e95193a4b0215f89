/// Runtime Evaluation Engine
///
/// This module evaluates resource metadata trees at request time.
/// It handles:
/// - Dependency-ordered evaluation of processor node trees
/// - Once-per-request resolution of named fragments
/// - Result caching by call path
/// - The request pipeline from security check to rendered output

// Worklist-based evaluator for metadata trees
pub mod engine;

// Named fragment pre-evaluation
pub mod fragments;

// Process result cache with per-resource ttl
pub mod cache;

// Security, cache, process and output for one call
pub mod gateway;

// Re-export main types
pub use cache::ResultCache;
pub use engine::GraphEvaluator;
pub use fragments::FragmentResolver;
pub use gateway::{Gateway, GatewayResponse};
