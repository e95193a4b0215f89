/// Resource Management Layer
///
/// Resources are the gateway's endpoints: a route (appid, method, uri) bound
/// to metadata trees of processor nodes. This module provides:
/// - Type definitions (Resource, ResourceMeta, MetaNode, SlotValue)
/// - Import-time validation against processor contracts
/// - SQLite persistence with sqlx
/// - Lock-free hot-reload registry using ArcSwap

// Resource, metadata tree and import document types
pub mod types;

// Contract and structure checks run before a resource is stored
pub mod validator;

// SQLite persistence layer for resource storage
pub mod storage;

// Hot-reload registry and route lookup
pub mod registry;

// Re-export commonly used types
pub use registry::{ResourceRegistry, RouteMatch};
pub use storage::{ResourceStorage, ResourceSummary};
pub use types::{MetaNode, Resource, ResourceDocument, ResourceMeta, SlotValue};
pub use validator::ResourceValidator;
