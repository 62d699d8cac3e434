//! Configuration module for Indirect-Image
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use indirect_image::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("indirect-image.toml")).unwrap();
//! println!("Site rules loaded: {}", config.rules.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, ContentConfig, ProtocolConfig, RuleEntry};

// Re-export parser functions
pub use parser::{load_config, parse_config};
