use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::RelayConfig,
    template::default_config_template,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "ntfy-relay.toml",
    "ntfy-relay.yaml",
    "ntfy-relay.yml",
    "ntfy-relay.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<RelayConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Load config from `path`, writing the default template there if it does
/// not exist yet.
///
/// A freshly written template is never loaded: the caller gets
/// [`Error::ConfigNotFound`] so startup halts until the file is edited.
pub fn load_or_init(path: &Path) -> Result<RelayConfig> {
    if path.exists() {
        return load_config(path);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| Error::WriteDefault {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, default_config_template()).map_err(|source| Error::WriteDefault {
        path: path.to_path_buf(),
        source,
    })?;

    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    info!(path = %path.display(), "wrote default config");
    Err(Error::ConfigNotFound { path })
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./ntfy-relay.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/ntfy-relay/ntfy-relay.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to [`load_or_init`] on the user-global TOML path.
pub fn discover_and_load() -> Result<RelayConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            let path = config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_FILENAMES[0]);
            warn!(path = %path.display(), "no config file found");
            load_or_init(&path)
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/ntfy-relay/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ntfy-relay").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<RelayConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat {
            ext: other.to_string(),
        }),
    }
}
