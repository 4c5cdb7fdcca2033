// src/config/mod.rs

//! Roster configuration: which programs to supervise and the supervisor's
//! timing constants.
//!
//! - [`model`] is the serde mapping of the TOML file.
//! - [`loader`] reads and deserializes it.
//! - [`validate`] performs semantic checks after deserialization.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ProgramConfig, SupervisorSection};
