//! # community-hub
//!
//! Session roles, badge counters and backend plumbing for a community
//! application running against a hosted backend (REST data API, realtime
//! change feed, serverless functions).
//!
//! ## Features
//!
//! - **Role impersonation**: admins and owners can view the app as another
//!   role; the override is persisted locally and resolved into a
//!   [`SessionContext`]
//! - **Badge counters**: exact counts kept fresh by change notifications, gated
//!   on the session's capabilities
//! - **Retry with backoff**: bounded exponential backoff with jitter and
//!   observable progress
//! - **Memoized loading**: per-key once-only resource fetches
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use community_hub::{Config, Hub, UserRole};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None).await?;
//!     let hub = Hub::open(config)?;
//!
//!     let session = hub.session(Some(UserRole::Admin));
//!     let badges = hub.start_badges(&session).await?;
//!     badges.ready().await;
//!     println!("{} items need attention", badges.total());
//!     badges.stop().await;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod auth;
pub mod config;
pub mod core;
pub mod storage;
pub mod utils;

// Re-export main types
pub use auth::{Capability, ImpersonationResolver, SessionContext, UserRole};
pub use config::Config;
pub use core::counters::{BadgeCounters, CounterSpec, CounterState, CounterSynchronizer};
pub use core::loader::{HttpFetcher, LoaderService, ResourceFetcher};
pub use storage::{ChangeFeed, DataStore, FunctionsClient, KeyValueStore};
pub use utils::error::{HubError, Result, RetryOptions, RetryTracker};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use storage::{FileStore, OfflineFeed, RealtimeClient, RestDataStore};
use tracing::{debug, info, warn};

/// Wiring of the hub's collaborators from one [`Config`]
///
/// Only the local session store is opened eagerly; backend clients are built
/// when first needed so role commands work without a configured backend.
pub struct Hub {
    config: Config,
    resolver: ImpersonationResolver,
    retry: RetryTracker,
}

impl Hub {
    /// Open the hub with a file-backed session store
    pub fn open(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.session.state_file)?);
        Self::with_session_store(config, store)
    }

    /// Open the hub over any key/value store
    pub fn with_session_store(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let resolver = ImpersonationResolver::new(store, config.session.impersonation_key.clone())?;
        Ok(Self {
            config,
            resolver,
            retry: RetryTracker::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &ImpersonationResolver {
        &self.resolver
    }

    /// Progress of the most recent [`Hub::invoke`]
    pub fn retry_tracker(&self) -> &RetryTracker {
        &self.retry
    }

    /// Resolved session for a user whose stored role is `actual`
    pub fn session(&self, actual: Option<UserRole>) -> SessionContext {
        self.resolver.session(actual)
    }

    /// Configured counters, watching the backend schema unless they name one
    pub fn counter_specs(&self) -> Vec<CounterSpec> {
        self.config
            .counters
            .iter()
            .cloned()
            .map(|spec| spec.or_schema(&self.config.backend.schema))
            .collect()
    }

    /// Start the configured badge counters against the backend
    ///
    /// The realtime connection is only opened when at least one counter is
    /// visible to `session`. If it cannot be opened the counters still count
    /// once and on refresh, without live updates.
    pub async fn start_badges(&self, session: &SessionContext) -> Result<BadgeCounters> {
        let specs = self.counter_specs();
        let store: Arc<dyn DataStore> = Arc::new(RestDataStore::new(&self.config.backend)?);

        let feed: Arc<dyn ChangeFeed> = if specs.iter().any(|spec| session.has(spec.required)) {
            match RealtimeClient::connect(&self.config.backend, &self.config.realtime).await {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    warn!("Realtime unavailable, badge counters will not update live: {}", e);
                    Arc::new(OfflineFeed::new(e.to_string()))
                }
            }
        } else {
            debug!("No badge counter visible to this session, not connecting to realtime");
            Arc::new(OfflineFeed::new("no visible counters"))
        };

        info!(
            "Starting badge counters for {:?} (effective {:?})",
            session.actual_role, session.effective_role
        );
        Ok(BadgeCounters::start(&specs, session, store, feed).await)
    }

    /// Invoke a serverless function, retrying transient failures
    pub async fn invoke<Req, Resp>(&self, name: &str, payload: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let functions = FunctionsClient::new(&self.config.backend)?;
        let options = self.config.retry.to_options();
        self.retry
            .fetch_with_retry_if(
                || functions.invoke(name, payload),
                &options,
                HubError::is_transient,
            )
            .await
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("resolver", &self.resolver)
            .field("counters", &self.config.counters.len())
            .finish()
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information stamped by the build script
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_time: &'static str,
    pub git_hash: &'static str,
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
