//! Core types, configuration, and region resolution for OciSDK.
//!
//! This crate provides the building blocks shared by every OciSDK layer:
//! the immutable [`EndpointConfig`] a client is constructed from, the
//! [`RegionRegistry`] that maps region identifiers onto realm domains (and
//! learns unknown regions at runtime), and the `user-agent` string sent on
//! every request.

mod config;
mod error;
pub mod region;
mod types;
mod user_agent;

pub use config::{EndpointConfig, ProxySettings};
pub use error::{CoreError, CoreResult};
pub use region::{
    EnvRegionSource, FileRegionSource, Realm, RegionMetadata, RegionMetadataSource,
    RegionRegistry,
};
pub use types::SigningStrategy;
pub use user_agent::UserAgent;
