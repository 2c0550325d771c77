//! Default configuration template written on first run.

/// Commented TOML template with every option at its default value.
pub fn default_config_template() -> &'static str {
    r##"# ntfy-relay configuration
# ========================
# Forwards ntfy topic notifications to QQ groups and users.
# Changes require a restart to take effect.
#
# Environment variable substitution is supported: ${ENV_VAR} or ${ENV_VAR:-default}
# Example: ntfy_token = "${NTFY_TOKEN}"

# ══════════════════════════════════════════════════════════════════════════════
# NTFY SOURCE
# ══════════════════════════════════════════════════════════════════════════════

ntfy_server = "https://ntfy.sh"    # ntfy server URL
ntfy_token = ""                    # Access token; leave empty for anonymous access
reconnect_interval = 10            # Seconds between reconnect attempts

# ══════════════════════════════════════════════════════════════════════════════
# MEDIA CACHE
# ══════════════════════════════════════════════════════════════════════════════

cache_clean_interval = 60          # Minutes between media cache sweeps
cache_grace_secs = 30              # Files newer than this survive a sweep

# ══════════════════════════════════════════════════════════════════════════════
# DELIVERY
# ══════════════════════════════════════════════════════════════════════════════

send_interval_ms = 1000            # Pause after every send
report_error = false               # Send failure reports to superusers
superusers = []                    # Admin QQ ids, e.g. [10001]

# Attachment host rewrites, checked in order; the first matching prefix wins.
# [[attachment_host_mapping]]
# from = "https://blocked.cdn"
# to = "https://proxy.cdn"

# ══════════════════════════════════════════════════════════════════════════════
# FORWARDING TABLE
# ══════════════════════════════════════════════════════════════════════════════
# Targets are "group_<id>" or "user_<id>" and receive messages in list order.

[[ntfy_to_qq_mapping]]
ntfy_channel = "channel1"
qq_targets = ["group_123456", "user_654321"]

# ══════════════════════════════════════════════════════════════════════════════
# ONEBOT ADAPTER
# ══════════════════════════════════════════════════════════════════════════════

[onebot]
api_url = "http://127.0.0.1:5700"  # OneBot v11 HTTP API base URL
access_token = ""                  # Sent as Authorization: Bearer when set
timeout_secs = 30
"##
}

#[cfg(test)]
mod tests {
    use {super::*, crate::schema::RelayConfig};

    #[test]
    fn template_parses_to_defaults() {
        let cfg: RelayConfig = toml::from_str(default_config_template()).unwrap();
        let defaults = RelayConfig::default();
        assert_eq!(cfg.ntfy_server, defaults.ntfy_server);
        assert_eq!(cfg.reconnect_interval, defaults.reconnect_interval);
        assert_eq!(cfg.cache_clean_interval, defaults.cache_clean_interval);
        assert_eq!(cfg.send_interval_ms, defaults.send_interval_ms);
        assert_eq!(cfg.ntfy_to_qq_mapping, defaults.ntfy_to_qq_mapping);
        assert!(cfg.attachment_host_mapping.is_empty());
    }
}
