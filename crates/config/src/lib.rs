//! Configuration loading, env substitution, and validation for ntfy-relay.
//!
//! Config files: `ntfy-relay.toml`, `ntfy-relay.yaml`, or `ntfy-relay.json`
//! Searched in `./` then `~/.config/ntfy-relay/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all
//! string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config, load_or_init},
    schema::{ChannelMapping, HostMapping, OneBotConfig, RelayConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
