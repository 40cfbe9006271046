//! Wire model contract for OciSDK.
//!
//! Models are plain serde structs paired with an explicit schema table
//! ([`ModelSchema`]) listing each field's logical name, wire name and declared
//! [`TypeDescriptor`]. Decoded JSON is converted into a declared shape by
//! [`convert`], which walks the value and the descriptor together and
//! resolves nested models by name through a [`ModelRegistry`]. No runtime
//! reflection is involved.

pub mod convert;
pub mod descriptor;
pub mod error;
pub mod model;
mod open_enum;
pub mod samples;
pub mod schema;

pub use convert::{convert, normalize_model};
pub use descriptor::TypeDescriptor;
pub use error::{ModelError, ModelResult};
pub use model::WireModel;
pub use schema::{FieldSchema, ModelRegistry, ModelSchema};

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
