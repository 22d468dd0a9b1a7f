// src/config/mod.rs

//! Configuration model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    CheckConfig, ConfigFile, ScriptsSection, ServerSection, StylesSection, WatchBinding,
};
pub use validate::validate_config;
