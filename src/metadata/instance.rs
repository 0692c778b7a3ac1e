//! Property get/set on entity instances
//!
//! Entities travel through the core as JSON objects. Absent keys and
//! JSON `null` both read back as "no value".

use serde_json::{Map, Value};

use crate::errors::{ODataError, ODataResult};

use super::types::{ResourceProperty, ResourceType};

/// Get/set a named property on a resource instance
pub trait ResourceInstance: Sized {
    /// Fresh, empty instance of the given type
    fn new_instance(resource_type: &ResourceType) -> Self;

    /// Read a property; `Ok(None)` when the value is null or missing
    fn get_property(&self, property: &ResourceProperty) -> ODataResult<Option<&Self>>;

    /// Write a property
    fn set_property(&mut self, property: &ResourceProperty, value: Self) -> ODataResult<()>;
}

impl ResourceInstance for Value {
    fn new_instance(_resource_type: &ResourceType) -> Self {
        Value::Object(Map::new())
    }

    fn get_property(&self, property: &ResourceProperty) -> ODataResult<Option<&Value>> {
        match self {
            Value::Object(fields) => Ok(fields.get(&property.name).filter(|v| !v.is_null())),
            other => Err(ODataError::internal(format!(
                "Cannot read property '{}' from non-object value {}",
                property.name, other
            ))),
        }
    }

    fn set_property(&mut self, property: &ResourceProperty, value: Value) -> ODataResult<()> {
        match self {
            Value::Object(fields) => {
                fields.insert(property.name.clone(), value);
                Ok(())
            }
            other => Err(ODataError::internal(format!(
                "Cannot write property '{}' on non-object value {}",
                property.name, other
            ))),
        }
    }
}
