//! EDM type and resource type definitions
//!
//! Primitive types follow the `Edm.*` naming used on the wire. Numeric
//! types widen along a single chain:
//! Byte < Int16 < Int32 < Int64 < Decimal < Single < Double

use std::fmt;

use serde::{Deserialize, Serialize};

/// Types an expression node or property can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdmType {
    /// Type of the `null` literal
    #[serde(rename = "Edm.Null")]
    Null,
    #[serde(rename = "Edm.Boolean")]
    Boolean,
    #[serde(rename = "Edm.Byte")]
    Byte,
    #[serde(rename = "Edm.Int16")]
    Int16,
    #[serde(rename = "Edm.Int32")]
    Int32,
    #[serde(rename = "Edm.Int64")]
    Int64,
    #[serde(rename = "Edm.Decimal")]
    Decimal,
    #[serde(rename = "Edm.Single")]
    Single,
    #[serde(rename = "Edm.Double")]
    Double,
    #[serde(rename = "Edm.String")]
    String,
    #[serde(rename = "Edm.Guid")]
    Guid,
    #[serde(rename = "Edm.DateTime")]
    DateTime,
    #[serde(rename = "Edm.Binary")]
    Binary,
    /// Complex or entity valued node (non-primitive hop of a property path)
    #[serde(rename = "Resource")]
    Resource,
}

impl EdmType {
    /// Returns the wire name
    pub fn name(&self) -> &'static str {
        match self {
            EdmType::Null => "Edm.Null",
            EdmType::Boolean => "Edm.Boolean",
            EdmType::Byte => "Edm.Byte",
            EdmType::Int16 => "Edm.Int16",
            EdmType::Int32 => "Edm.Int32",
            EdmType::Int64 => "Edm.Int64",
            EdmType::Decimal => "Edm.Decimal",
            EdmType::Single => "Edm.Single",
            EdmType::Double => "Edm.Double",
            EdmType::String => "Edm.String",
            EdmType::Guid => "Edm.Guid",
            EdmType::DateTime => "Edm.DateTime",
            EdmType::Binary => "Edm.Binary",
            EdmType::Resource => "Resource",
        }
    }

    /// Position on the numeric widening chain
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            EdmType::Byte => Some(1),
            EdmType::Int16 => Some(2),
            EdmType::Int32 => Some(3),
            EdmType::Int64 => Some(4),
            EdmType::Decimal => Some(5),
            EdmType::Single => Some(6),
            EdmType::Double => Some(7),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            EdmType::Byte | EdmType::Int16 | EdmType::Int32 | EdmType::Int64
        )
    }

    /// True for types that only support `eq` and `ne`
    pub fn is_equality_only(&self) -> bool {
        matches!(self, EdmType::Guid | EdmType::Binary)
    }

    /// True for primitive types (everything except `Resource` and `Null`)
    pub fn is_primitive(&self) -> bool {
        !matches!(self, EdmType::Resource | EdmType::Null)
    }

    /// Whether a value of type `actual` may be used where `self` is declared.
    ///
    /// Numeric types widen, never narrow. `null` is accepted everywhere.
    /// All other types require an exact match.
    pub fn accepts(&self, actual: EdmType) -> bool {
        if *self == actual || actual == EdmType::Null {
            return true;
        }
        match (self.numeric_rank(), actual.numeric_rank()) {
            (Some(declared), Some(given)) => given <= declared,
            _ => false,
        }
    }

    /// Wider of two numeric types, None if either is not numeric
    pub fn promote(a: EdmType, b: EdmType) -> Option<EdmType> {
        match (a.numeric_rank(), b.numeric_rank()) {
            (Some(ra), Some(rb)) => Some(if ra >= rb { a } else { b }),
            _ => None,
        }
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a property holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Primitive value
    Primitive(EdmType),
    /// Complex type instance (by type name)
    Complex(String),
    /// Single-valued navigation to an entity type
    Navigation(String),
    /// Collection-valued navigation to an entity type
    Collection(String),
}

/// A declared property of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProperty {
    pub name: String,
    pub kind: PropertyKind,
}

impl ResourceProperty {
    pub fn primitive(name: impl Into<String>, edm_type: EdmType) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Primitive(edm_type),
        }
    }

    pub fn complex(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Complex(type_name.into()),
        }
    }

    pub fn navigation(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Navigation(type_name.into()),
        }
    }

    pub fn collection(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Collection(type_name.into()),
        }
    }

    /// Expression type of a value read through this property
    pub fn edm_type(&self) -> EdmType {
        match &self.kind {
            PropertyKind::Primitive(t) => *t,
            _ => EdmType::Resource,
        }
    }

    /// Name of the target resource type for non-primitive properties
    pub fn target_type_name(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Primitive(_) => None,
            PropertyKind::Complex(t) | PropertyKind::Navigation(t) | PropertyKind::Collection(t) => {
                Some(t)
            }
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, PropertyKind::Primitive(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, PropertyKind::Collection(_))
    }
}

/// Kind of resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceTypeKind {
    Entity,
    Complex,
}

/// A resource (entity or complex) type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub name: String,
    pub kind: ResourceTypeKind,
    /// Names of key properties, entity types only
    #[serde(default)]
    pub keys: Vec<String>,
    pub properties: Vec<ResourceProperty>,
}

impl ResourceType {
    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceTypeKind::Entity,
            keys: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn complex(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceTypeKind::Complex,
            keys: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Adds a property
    pub fn with_property(mut self, property: ResourceProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a primitive key property
    pub fn with_key(mut self, name: impl Into<String>, edm_type: EdmType) -> Self {
        let name = name.into();
        self.keys.push(name.clone());
        self.properties.push(ResourceProperty::primitive(name, edm_type));
        self
    }

    /// Looks up a declared property by name
    pub fn property(&self, name: &str) -> Option<&ResourceProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Key properties in declaration order
    pub fn key_properties(&self) -> Vec<&ResourceProperty> {
        self.keys.iter().filter_map(|k| self.property(k)).collect()
    }
}
