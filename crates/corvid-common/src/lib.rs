//! CorvidDB common types, errors, and configuration.
//!
//! This crate provides shared definitions used across all CorvidDB components.

pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::{EngineConfig, IndexConfig, SnapshotBacking, SnapshotConfig};
pub use error::{CorvidError, Result};
pub use types::TypeId;
pub use value::Value;
