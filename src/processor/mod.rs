/// Processor layer
///
/// Processors are the typed units a resource tree is made of. This module
/// provides:
/// - The processor trait and its static input contract
/// - The namespaced registry resolving machine names to factories
/// - The built-in processor catalogue

// Processor trait, input contracts and resolved input access
pub mod contract;

// Machine name -> factory lookup across namespaces
pub mod registry;

// Built-in processors (vars, logic, security, output, endpoint)
pub mod builtin;

// Re-export commonly used types
pub use contract::{InputSpec, InputType, Processor, ProcessorContract, ProcessorInput};
pub use registry::{Namespace, ProcessorRegistry};
