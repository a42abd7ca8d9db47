#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for tollgate.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tollgate_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("gate enabled: {}", resolved.config.gate.enabled);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. Workspace (`{workspace}/.tollgate/config.toml`)
//! 2. User (`~/.tollgate/config.toml`)
//! 3. Environment variables (`TOLLGATE_*`), fallback only
//! 4. Embedded defaults
//!
//! This crate has no dependencies on other tollgate crates. Conversion into
//! gate and logging options happens in the binary.

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered merging with source tracking.
pub mod merge;
/// Resolved configuration display.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use merge::ConfigLayer;
pub use show::ResolvedConfig;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Timeout as a [`std::time::Duration`], if one is configured.
    #[must_use]
    pub fn pending_timeout(&self) -> Option<std::time::Duration> {
        self.gate
            .pending_timeout_secs
            .map(std::time::Duration::from_secs)
    }
}
