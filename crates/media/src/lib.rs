//! Attachment handling: local media cache, HTTP fetcher, host rewrites and
//! the periodic cache janitor.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod janitor;
pub mod rewrite;

pub use {
    cache::{MediaCache, SweepReport},
    error::{Error, Result},
    fetch::MediaFetcher,
    janitor::CacheJanitor,
    rewrite::HostRewriter,
};
