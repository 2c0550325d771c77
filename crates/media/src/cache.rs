//! Scratch directory for downloaded attachments.
//!
//! Files are keyed by the basename of their source URL; a second download of
//! the same basename overwrites the first. Downloads are staged under
//! `.incoming/` and renamed into place once complete, so a sweep (which only
//! touches regular files directly under the root) never sees a partial file.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, SystemTime},
};

use {
    tempfile::TempDir,
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

const INCOMING_DIR: &str = ".incoming";

pub struct MediaCache {
    root: PathBuf,
    /// Taken by the first [`close`](Self::close).
    owned: Mutex<Option<TempDir>>,
}

/// Outcome of a cache sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    /// Files younger than the grace period.
    pub kept: usize,
    pub failed: usize,
}

impl MediaCache {
    /// Create a cache in a fresh temporary directory.
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("ntfy-relay-media-")
            .tempdir()
            .map_err(|e| Error::io("failed to create media cache dir", e))?;
        let root = dir.path().to_path_buf();
        std::fs::create_dir_all(root.join(INCOMING_DIR))
            .map_err(|e| Error::io("failed to create media staging dir", e))?;
        debug!(dir = %root.display(), "media cache created");
        Ok(Self {
            root,
            owned: Mutex::new(Some(dir)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.root
    }

    /// Final location for the attachment at `url`.
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        Ok(self.root.join(file_name_for(url)?))
    }

    /// A unique staging path for an in-flight download.
    pub(crate) fn staging_path(&self) -> PathBuf {
        self.root
            .join(INCOMING_DIR)
            .join(format!("{}.part", uuid::Uuid::new_v4()))
    }

    /// Delete every regular file directly under the cache root whose mtime is
    /// at least `grace` old. Directories are left alone; per-file failures are
    /// logged and the sweep continues.
    pub async fn sweep(&self, grace: Duration) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(Error::io("failed to list media cache", e)),
        };
        let now = SystemTime::now();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "error reading media cache entry");
                    report.failed += 1;
                    break;
                },
            };
            let path = entry.path();

            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error cleaning media cache");
                    report.failed += 1;
                    continue;
                },
            };
            if !meta.is_file() {
                continue;
            }

            if !grace.is_zero() {
                let age = meta
                    .modified()
                    .ok()
                    .and_then(|m| now.duration_since(m).ok())
                    .unwrap_or_default();
                if age < grace {
                    report.kept += 1;
                    continue;
                }
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => report.removed += 1,
                // Gone already, e.g. a concurrent sweep.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error cleaning media cache");
                    report.failed += 1;
                },
            }
        }

        Ok(report)
    }

    /// Remove the whole cache directory. Later calls are no-ops.
    pub fn close(&self) -> Result<()> {
        let owned = self.owned.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(dir) = owned {
            dir.close()
                .map_err(|e| Error::io("failed to remove media cache dir", e))?;
            debug!(dir = %self.root.display(), "media cache removed");
        }
        Ok(())
    }
}

/// Basename of the URL path; query and fragment are ignored.
fn file_name_for(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." || name == INCOMING_DIR {
        return Err(Error::InvalidUrl {
            url: url.to_string(),
            reason: "url path has no file name".into(),
        });
    }
    Ok(name.to_string())
}
