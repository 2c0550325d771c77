//! Config schema types (ntfy source, forwarding table, cache, adapter).

use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Base URL of the ntfy server, e.g. `https://ntfy.sh`.
    pub ntfy_server: String,

    /// Access token sent as `Authorization: Bearer`. Empty means anonymous.
    #[serde(serialize_with = "serialize_secret")]
    pub ntfy_token: Secret<String>,

    /// Seconds to wait before reconnecting a dropped topic subscription.
    pub reconnect_interval: u64,

    /// Minutes between media cache sweeps.
    pub cache_clean_interval: u64,

    /// Cached files younger than this many seconds survive a sweep.
    pub cache_grace_secs: u64,

    /// Pause after every outbound send, in milliseconds.
    pub send_interval_ms: u64,

    /// Notify `superusers` when a send fails.
    pub report_error: bool,

    /// Admin user ids that receive error reports.
    pub superusers: Vec<i64>,

    /// Ordered attachment host rewrites; the first matching prefix wins.
    pub attachment_host_mapping: Vec<HostMapping>,

    /// Topic to destination table.
    pub ntfy_to_qq_mapping: Vec<ChannelMapping>,

    /// Settings for the bundled OneBot v11 adapter.
    pub onebot: OneBotConfig,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("ntfy_server", &self.ntfy_server)
            .field("ntfy_token", &"[REDACTED]")
            .field("reconnect_interval", &self.reconnect_interval)
            .field("cache_clean_interval", &self.cache_clean_interval)
            .field("report_error", &self.report_error)
            .field("ntfy_to_qq_mapping", &self.ntfy_to_qq_mapping)
            .finish_non_exhaustive()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ntfy_server: "https://ntfy.sh".into(),
            ntfy_token: Secret::new(String::new()),
            reconnect_interval: 10,
            cache_clean_interval: 60,
            cache_grace_secs: 30,
            send_interval_ms: 1000,
            report_error: false,
            superusers: Vec::new(),
            attachment_host_mapping: Vec::new(),
            ntfy_to_qq_mapping: vec![ChannelMapping {
                ntfy_channel: "channel1".into(),
                qq_targets: vec!["group_123456".into(), "user_654321".into()],
            }],
            onebot: OneBotConfig::default(),
        }
    }
}

impl RelayConfig {
    /// The ntfy token, or `None` when it is unset.
    pub fn token(&self) -> Option<&str> {
        let token = self.ntfy_token.expose_secret();
        (!token.is_empty()).then_some(token.as_str())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval)
    }

    pub fn cache_clean_period(&self) -> Duration {
        Duration::from_secs(self.cache_clean_interval.saturating_mul(60))
    }

    pub fn cache_grace(&self) -> Duration {
        Duration::from_secs(self.cache_grace_secs)
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

/// One ntfy topic and the chat destinations it forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMapping {
    pub ntfy_channel: String,
    /// `group_<id>` or `user_<id>`, delivered in this order.
    pub qq_targets: Vec<String>,
}

/// Rewrite attachment URLs starting with `from` so they start with `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMapping {
    pub from: String,
    pub to: String,
}

/// OneBot v11 HTTP API endpoint used to deliver messages.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OneBotConfig {
    pub api_url: String,
    #[serde(serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OneBotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneBotConfig")
            .field("api_url", &self.api_url)
            .field("access_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for OneBotConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5700".into(),
            access_token: Secret::new(String::new()),
            timeout_secs: 30,
        }
    }
}

impl OneBotConfig {
    pub fn access_token(&self) -> Option<&str> {
        let token = self.access_token.expose_secret();
        (!token.is_empty()).then_some(token.as_str())
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
