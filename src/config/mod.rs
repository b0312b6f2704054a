//! Configuration module for Image-Pager
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use image_pager::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pager.toml")).unwrap();
//! println!("Fetching at most {} images at once", config.connection_limit());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BoundsConfig, Config, FetchConfig, LayoutConfig, SaveConfig, SearchConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
