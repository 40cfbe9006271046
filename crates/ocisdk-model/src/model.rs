//! The contract every wire model fulfils.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::convert::normalize_model;
use crate::error::ModelResult;
use crate::schema::{ModelRegistry, ModelSchema};

/// A type that maps to and from a JSON object on the wire.
///
/// Implementors provide the schema table; serialisation goes through serde,
/// and input is normalised through the schema first so that snake_case
/// aliases are accepted.
pub trait WireModel: Serialize + DeserializeOwned {
    /// The model's schema.
    fn schema() -> &'static ModelSchema;

    /// Serialise to a wire map keyed by camelCase names.
    fn to_wire(&self) -> ModelResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Build from a decoded JSON object, accepting either naming convention.
    fn from_wire(value: Value, registry: &ModelRegistry) -> ModelResult<Self> {
        let normalized = normalize_model(value, Self::schema(), registry)?;
        Ok(serde_json::from_value(normalized)?)
    }
}
