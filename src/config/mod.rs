//! Configuration: YAML file schema, presets, and CLI/env/file resolution.

pub mod loader;
pub mod preset;
pub mod schema;

pub use loader::{load_config, ConfigError, ConfigOverrides, UpwindConfig};
pub use schema::PresetName;
