use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    ntfy_relay_config::{RelayConfig, Severity, ValidationResult},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Load the config at `path`, or discover it, without writing a template.
pub fn load_for_check(path: Option<&Path>) -> Result<(Option<PathBuf>, RelayConfig)> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(ntfy_relay_config::find_config_file);
    match path {
        Some(path) => {
            let config = ntfy_relay_config::load_config(&path)?;
            Ok((Some(path), config))
        },
        None => Ok((None, RelayConfig::default())),
    }
}

/// Validate the configuration and print diagnostics. Exits with status 1 on
/// errors.
pub fn check(path: Option<&Path>) -> Result<()> {
    let (path, config) = load_for_check(path)?;
    match &path {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let result = ntfy_relay_config::validate(&config);
    print_diagnostics(&result);

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
        };
        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if !result.diagnostics.is_empty() {
        eprintln!();
    }
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_loads_explicit_path_without_writing_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ntfy-relay.toml");
        std::fs::write(
            &path,
            r#"
ntfy_server = "ftp://ntfy.example"

[[ntfy_to_qq_mapping]]
ntfy_channel = "alerts"
qq_targets = ["group_1"]
"#,
        )
        .unwrap();

        let (found, config) = load_for_check(Some(&path)).unwrap();
        assert_eq!(found.as_deref(), Some(path.as_path()));
        assert!(ntfy_relay_config::validate(&config).has_errors());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_for_check(Some(&path)).is_err());
        assert!(!path.exists());
    }
}
