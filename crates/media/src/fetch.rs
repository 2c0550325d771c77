use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    futures::StreamExt,
    tokio::io::AsyncWriteExt,
    tracing::{debug, warn},
};

use crate::{
    cache::MediaCache,
    error::{Error, Result},
};

/// Downloads attachments into a [`MediaCache`].
#[derive(Clone)]
pub struct MediaFetcher {
    client: reqwest::Client,
    cache: Arc<MediaCache>,
}

impl MediaFetcher {
    pub fn new(client: reqwest::Client, cache: Arc<MediaCache>) -> Self {
        Self { client, cache }
    }

    /// Stream `url` into the cache and return the local path.
    ///
    /// A non-2xx status fails without retrying. The body is written chunk by
    /// chunk to a staging file which is renamed over any existing file with
    /// the same basename once the transfer completes.
    pub async fn fetch(&self, url: &str) -> Result<PathBuf> {
        let dest = self.cache.path_for(url)?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::request(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        let staging = self.cache.staging_path();
        match write_body(resp, &staging, url).await {
            Ok(bytes) => {
                tokio::fs::rename(&staging, &dest).await.map_err(|e| {
                    Error::io(format!("failed to publish {}", dest.display()), e)
                })?;
                debug!(url, path = %dest.display(), bytes, "downloaded media");
                Ok(dest)
            },
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&staging).await
                    && rm.kind() != std::io::ErrorKind::NotFound
                {
                    warn!(path = %staging.display(), error = %rm, "failed to remove partial download");
                }
                Err(e)
            },
        }
    }
}

async fn write_body(resp: reqwest::Response, path: &Path, url: &str) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| Error::io(format!("failed to create {}", path.display()), e))?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::request(url, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io(format!("failed to write {}", path.display()), e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| Error::io(format!("failed to flush {}", path.display()), e))?;
    Ok(written)
}
