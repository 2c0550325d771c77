use std::{sync::Arc, time::Duration};

use {
    ntfy_relay_channels::ChannelRegistry,
    ntfy_relay_config::RelayConfig,
    ntfy_relay_media::{HostRewriter, MediaCache, MediaFetcher},
    tracing::{debug, warn},
};

use crate::error::Result;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide state shared by every listener: the loaded config, one HTTP
/// client, the media cache, and the outbound adapter registry.
///
/// Built once before any listener starts and torn down once after all of
/// them stop.
pub struct RelayContext {
    pub config: Arc<RelayConfig>,
    pub http: reqwest::Client,
    pub cache: Arc<MediaCache>,
    pub registry: Arc<ChannelRegistry>,
}

impl RelayContext {
    /// Create the context with a fresh temporary media cache.
    pub fn new(config: RelayConfig, registry: Arc<ChannelRegistry>) -> Result<Self> {
        let cache = MediaCache::temporary()?;
        Self::with_cache(config, registry, cache)
    }

    pub fn with_cache(
        config: RelayConfig,
        registry: Arc<ChannelRegistry>,
        cache: MediaCache,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ntfy-relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        debug!(cache_dir = %cache.dir().display(), "relay context ready");

        Ok(Self {
            config: Arc::new(config),
            http,
            cache: Arc::new(cache),
            registry,
        })
    }

    pub fn host_rewriter(&self) -> HostRewriter {
        HostRewriter::new(
            self.config
                .attachment_host_mapping
                .iter()
                .map(|m| (m.from.clone(), m.to.clone())),
        )
    }

    pub fn fetcher(&self) -> MediaFetcher {
        MediaFetcher::new(self.http.clone(), Arc::clone(&self.cache))
    }

    /// Remove the media cache directory. Safe to call more than once.
    pub fn close(&self) {
        if let Err(e) = self.cache.close() {
            warn!(error = %e, "failed to remove media cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, ntfy_relay_config::HostMapping};

    #[test]
    fn rewriter_follows_configured_order() {
        let config = RelayConfig {
            attachment_host_mapping: vec![
                HostMapping {
                    from: "https://a.example".into(),
                    to: "https://proxy-1".into(),
                },
                HostMapping {
                    from: "https://a.example/deep".into(),
                    to: "https://proxy-2".into(),
                },
            ],
            ..RelayConfig::default()
        };
        let ctx = RelayContext::new(config, Arc::new(ChannelRegistry::new())).unwrap();
        assert_eq!(
            ctx.host_rewriter().rewrite("https://a.example/deep/x.png"),
            "https://proxy-1/deep/x.png"
        );
        ctx.close();
    }

    #[test]
    fn close_removes_cache_dir() {
        let ctx = RelayContext::new(RelayConfig::default(), Arc::new(ChannelRegistry::new()))
            .unwrap();
        let dir = ctx.cache.dir().to_path_buf();
        assert!(dir.exists());
        ctx.close();
        assert!(!dir.exists());
        ctx.close();
    }
}
