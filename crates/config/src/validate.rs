//! Semantic checks over a loaded [`RelayConfig`].
//!
//! Parsing already rejected type errors; these diagnostics catch values that
//! deserialize fine but cannot work at runtime.

use std::collections::HashSet;

use ntfy_relay_channels::Destination;

use crate::schema::RelayConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "server", "mapping", "target", "interval", "host-mapping"
    pub category: &'static str,
    /// Dotted path, e.g. "ntfy_to_qq_mapping[0].qq_targets[1]"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.category, self.path, self.message
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a loaded configuration.
pub fn validate(config: &RelayConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    match url::Url::parse(&config.ntfy_server) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "ws" | "wss") => {},
        Ok(url) => result.push(
            Severity::Error,
            "server",
            "ntfy_server",
            format!("unsupported scheme \"{}\"", url.scheme()),
        ),
        Err(e) => result.push(
            Severity::Error,
            "server",
            "ntfy_server",
            format!("invalid URL: {e}"),
        ),
    }

    if config.reconnect_interval == 0 {
        result.push(
            Severity::Warning,
            "interval",
            "reconnect_interval",
            "0 reconnects in a tight loop when the server is down",
        );
    }
    if config.cache_clean_interval == 0 {
        result.push(
            Severity::Error,
            "interval",
            "cache_clean_interval",
            "must be at least 1 minute",
        );
    }

    if config.report_error && config.superusers.is_empty() {
        result.push(
            Severity::Warning,
            "mapping",
            "superusers",
            "report_error is enabled but no superusers are configured",
        );
    }

    for (i, rule) in config.attachment_host_mapping.iter().enumerate() {
        if rule.from.is_empty() {
            result.push(
                Severity::Error,
                "host-mapping",
                format!("attachment_host_mapping[{i}].from"),
                "empty prefix would match every URL",
            );
        }
    }

    if config.ntfy_to_qq_mapping.is_empty() {
        result.push(
            Severity::Warning,
            "mapping",
            "ntfy_to_qq_mapping",
            "no topics configured, nothing will be forwarded",
        );
    }

    let mut seen = HashSet::new();
    for (i, mapping) in config.ntfy_to_qq_mapping.iter().enumerate() {
        let base = format!("ntfy_to_qq_mapping[{i}]");
        if mapping.ntfy_channel.trim().is_empty() {
            result.push(
                Severity::Error,
                "mapping",
                format!("{base}.ntfy_channel"),
                "topic name is empty",
            );
        } else if !seen.insert(mapping.ntfy_channel.as_str()) {
            result.push(
                Severity::Warning,
                "mapping",
                format!("{base}.ntfy_channel"),
                format!(
                    "topic \"{}\" is mapped more than once; each entry opens its own subscription",
                    mapping.ntfy_channel
                ),
            );
        }

        if mapping.qq_targets.is_empty() {
            result.push(
                Severity::Warning,
                "mapping",
                format!("{base}.qq_targets"),
                "no targets; events will be received and dropped",
            );
        }

        for (j, target) in mapping.qq_targets.iter().enumerate() {
            if let Err(e) = target.parse::<Destination>() {
                result.push(
                    Severity::Warning,
                    "target",
                    format!("{base}.qq_targets[{j}]"),
                    format!("{e}; this target will be skipped"),
                );
            }
        }
    }

    result
}
