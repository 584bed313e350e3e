//! Configuration management for the starchart application.
//!
//! This crate handles loading, validating, and persisting configuration
//! from multiple sources (files, environment variables, defaults).
//!
//! # Overview
//!
//! The crate is organized into the following modules:
//!
//! - [`config`]: Core configuration struct and loading logic
//! - [`github`]: GitHub API settings (tokens, page size, usage threshold)
//! - [`cache`]: Cache backing store settings
//! - [`env`]: Environment variable overrides
//! - [`persistence`]: Config file reading and writing
//! - [`error`]: Error types for configuration operations
//!
//! # Configuration Sources (Priority)
//!
//! Configuration is loaded from multiple sources with the following priority
//! (highest to lowest):
//!
//! 1. Environment variables (`GITHUB_TOKENS`, `GITHUB_PAGE_SIZE`, ...)
//! 2. Local config (`./starchart.json5` or `./starchart.json`)
//! 3. User config (`~/.config/starchart/config.json5` or `~/.config/starchart/config.json`)
//! 4. Built-in defaults
//!
//! # Examples
//!
//! Loading configuration:
//!
//! ```no_run
//! use starchart_config::Config;
//!
//! # fn example() -> starchart_config::Result<()> {
//! let config = Config::load()?;
//!
//! println!("{} tokens configured", config.github.tokens.len());
//! println!("page size {}", config.github.page_size);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod env;
pub mod error;
pub mod github;
pub mod persistence;

// Re-export primary types at crate root for convenience
pub use cache::CacheConfig;
pub use config::Config;
pub use error::{ConfigError, Result};
pub use github::{GitHubConfig, MAX_PAGE_SIZE};
