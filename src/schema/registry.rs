//! In-memory registry of resource-type schemas.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::types::ResourceTypeSchema;

/// Holds every registered resource-type schema, keyed by resource type name.
/// Immutable from the point of view of readers: registration happens once at
/// startup per type and is not expected to change for the life of the
/// process.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, ResourceTypeSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, schema: ResourceTypeSchema) {
        self.schemas
            .write()
            .expect("schema registry lock poisoned")
            .insert(schema.resource_type.clone(), schema);
    }

    pub fn get(&self, resource_type: &str) -> Result<ResourceTypeSchema> {
        self.schemas
            .read()
            .expect("schema registry lock poisoned")
            .get(resource_type)
            .cloned()
            .ok_or_else(|| StoreError::ResourceTypeNotFound(resource_type.to_string()))
    }

    pub fn has(&self, resource_type: &str) -> bool {
        self.schemas
            .read()
            .expect("schema registry lock poisoned")
            .contains_key(resource_type)
    }

    pub fn list(&self) -> Vec<String> {
        self.schemas
            .read()
            .expect("schema registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}
