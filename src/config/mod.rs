//! Configuration module for calldigest
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{LogFormat, Settings};
