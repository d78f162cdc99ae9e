//! Configuration module for Byline
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. CLI flags are layered on top by the binary before validation.
//!
//! # Example
//!
//! ```no_run
//! use byline::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("byline.toml")).unwrap();
//! println!("Scraping {}", config.input.author_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, InputConfig, OutputConfig, OutputFormat, ScraperConfig, TagMatch, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{config_fingerprint, load_config, parse_config};
pub use validation::validate;
