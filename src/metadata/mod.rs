//! # Resource Metadata
//!
//! Narrow view of the service's metadata catalog used by the query core:
//! primitive EDM types, resource types with their properties, a lookup
//! capability, and get/set access on entity instances.

mod instance;
mod provider;
mod types;

pub use instance::ResourceInstance;
pub use provider::{InMemoryMetadata, MetadataError, MetadataProvider};
pub use types::{EdmType, PropertyKind, ResourceProperty, ResourceType, ResourceTypeKind};

#[cfg(test)]
pub(crate) mod fixtures;
