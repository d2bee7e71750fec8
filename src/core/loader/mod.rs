//! Memoized resource loading
//!
//! Each key is fetched at most once per [`LoaderService`]; concurrent callers
//! for the same key share the in-flight fetch. A failed fetch leaves the key
//! unloaded so the next call tries again.

mod fetcher;
mod service;

pub use fetcher::{HttpFetcher, ResourceFetcher};
pub use service::LoaderService;

/// Loader for script and asset bodies served over HTTP
pub type ScriptLoader = LoaderService<HttpFetcher>;
