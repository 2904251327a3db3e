//! Instances - property bags dispatched through their class.

use super::ClassDescriptor;
use kiln_foundation::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// One object of a [`ClassDescriptor`].
///
/// Holds its own properties; reads fall back to the class's data members,
/// method dispatch walks the facet chain.
pub struct Instance {
    id: Uuid,
    class: Arc<ClassDescriptor>,
    properties: HashMap<String, Value>,
}

impl Instance {
    pub(crate) fn new(class: Arc<ClassDescriptor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            properties: HashMap::new(),
        }
    }

    /// Unique instance id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The class this instance was constructed from.
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// Whether this instance's class is `class` or derives from it.
    pub fn is_instance_of(&self, class: &Arc<ClassDescriptor>) -> bool {
        self.class.derives_from(class)
    }

    /// Read a property; falls back to the class's data members.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.properties
            .get(name)
            .cloned()
            .or_else(|| self.class.instance_value(name))
    }

    /// Write an own property.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Invoke a method by name, dispatching through the class facet chain.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let method = self
            .class
            .instance_method(name)
            .ok_or_else(|| Error::MemberNotFound(name.to_string()))?;
        method.invoke(self, args)
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("properties", &self.properties)
            .finish()
    }
}
