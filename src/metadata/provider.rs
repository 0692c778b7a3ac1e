//! # Metadata Lookup
//!
//! The property-resolution capability consumed by the parser, the
//! orderby builder and the skiptoken resolver.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::errors::ODataError;

use super::types::{ResourceProperty, ResourceType};

/// Metadata lookup failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetadataError {
    /// Property is not declared on the type
    #[error("Property '{property}' not found on type '{type_name}'")]
    PropertyNotFound { type_name: String, property: String },

    /// Resource type is not registered
    #[error("Resource type '{0}' not found")]
    TypeNotFound(String),

    /// Metadata document could not be read
    #[error("Invalid metadata document: {0}")]
    InvalidDocument(String),
}

impl From<MetadataError> for ODataError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::PropertyNotFound {
                type_name,
                property,
            } => ODataError::unknown_property(&type_name, &property),
            MetadataError::TypeNotFound(name) => ODataError::new(
                crate::errors::ODataErrorCode::UnknownProperty,
                format!("Resource type '{}' not found", name),
            ),
            MetadataError::InvalidDocument(reason) => ODataError::provider_configuration(reason),
        }
    }
}

/// Metadata lookup capability
pub trait MetadataProvider {
    /// Find a resource type by name
    fn resource_type(&self, name: &str) -> Option<&ResourceType>;

    /// Resolve a property name against a parent type
    fn resolve_property<'a>(
        &'a self,
        parent: &'a ResourceType,
        name: &str,
    ) -> Result<&'a ResourceProperty, MetadataError> {
        parent
            .property(name)
            .ok_or_else(|| MetadataError::PropertyNotFound {
                type_name: parent.name.clone(),
                property: name.to_string(),
            })
    }

    /// Resource type a non-primitive property points at
    fn target_type(&self, property: &ResourceProperty) -> Result<&ResourceType, MetadataError> {
        let name = property
            .target_type_name()
            .ok_or_else(|| MetadataError::TypeNotFound(property.name.clone()))?;
        self.resource_type(name)
            .ok_or_else(|| MetadataError::TypeNotFound(name.to_string()))
    }
}

/// Serialized form of a metadata document
#[derive(Debug, Deserialize)]
struct MetadataDocument {
    types: Vec<ResourceType>,
}

/// Hash map backed metadata catalog
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    types: HashMap<String, ResourceType>,
}

impl InMemoryMetadata {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource type
    pub fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.register(resource_type);
        self
    }

    /// Register a resource type, replacing one of the same name
    pub fn register(&mut self, resource_type: ResourceType) {
        self.types.insert(resource_type.name.clone(), resource_type);
    }

    /// Parse a JSON metadata document: `{"types": [...]}`
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        let doc: MetadataDocument = serde_json::from_str(json)
            .map_err(|e| MetadataError::InvalidDocument(e.to_string()))?;

        let mut metadata = Self::new();
        for resource_type in doc.types {
            metadata.register(resource_type);
        }
        metadata.check_references()?;
        Ok(metadata)
    }

    /// Load a JSON metadata document from disk
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MetadataError::InvalidDocument(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Every non-primitive property must point at a registered type
    fn check_references(&self) -> Result<(), MetadataError> {
        for resource_type in self.types.values() {
            for property in &resource_type.properties {
                if let Some(target) = property.target_type_name() {
                    if !self.types.contains_key(target) {
                        return Err(MetadataError::TypeNotFound(target.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Registered type names
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl MetadataProvider for InMemoryMetadata {
    fn resource_type(&self, name: &str) -> Option<&ResourceType> {
        self.types.get(name)
    }
}
