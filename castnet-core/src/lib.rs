//! # castnet-core
//!
//! Shared foundation for the castnet workspace: layered configuration,
//! crash-safe persistence helpers, and the configuration error type.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    CastnetConfig, FeaturesConfig, GraphKind, InputConfig, NetworkConfig, load_config,
};
pub use error::CoreError;
