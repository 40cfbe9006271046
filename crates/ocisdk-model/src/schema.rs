//! Explicit schema tables for wire models.

use std::collections::HashMap;

use crate::descriptor::TypeDescriptor;
use crate::model::WireModel;

/// One field of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Logical (snake_case) name, also accepted on input as an alias.
    pub name: &'static str,
    /// camelCase name used on the wire.
    pub wire_name: &'static str,
    /// Declared type.
    pub descriptor: TypeDescriptor,
}

impl FieldSchema {
    /// Create a field.
    #[must_use]
    pub fn new(name: &'static str, wire_name: &'static str, descriptor: TypeDescriptor) -> Self {
        Self {
            name,
            wire_name,
            descriptor,
        }
    }
}

/// The schema of one model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    /// Model name, as used in [`TypeDescriptor::Model`].
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<FieldSchema>,
    /// Wire name of the body field carrying the next page token, for list
    /// responses that paginate in the body rather than in a header.
    pub next_page_field: Option<&'static str>,
}

impl ModelSchema {
    /// Create a schema without a pagination field.
    #[must_use]
    pub fn new(name: &'static str, fields: Vec<FieldSchema>) -> Self {
        Self {
            name,
            fields,
            next_page_field: None,
        }
    }

    /// Mark a field as carrying the next page token.
    #[must_use]
    pub fn with_next_page_field(mut self, wire_name: &'static str) -> Self {
        self.next_page_field = Some(wire_name);
        self
    }

    /// Look up a field by logical or wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.wire_name == name)
    }
}

/// Schema lookup by model name.
///
/// Built once at client construction and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    schemas: HashMap<&'static str, &'static ModelSchema>,
}

impl ModelRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. A later registration under the same name wins.
    pub fn register(&mut self, schema: &'static ModelSchema) -> &mut Self {
        self.schemas.insert(schema.name, schema);
        self
    }

    /// Register the schema of a model type.
    pub fn register_model<M: WireModel>(&mut self) -> &mut Self {
        self.register(M::schema())
    }

    /// Look up a schema.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static ModelSchema> {
        self.schemas.get(name).copied()
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schemas are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
