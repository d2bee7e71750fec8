//! Count synchronizer driven by change notifications

use super::types::{CounterSpec, CounterState};
use crate::auth::impersonation::SessionContext;
use crate::storage::realtime::{ChangeEvent, ChangeFeed, Subscription};
use crate::storage::remote::{DataStore, Query};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

enum Signal {
    Refresh,
    Shutdown,
}

/// Keeps one counter in sync with the remote store
///
/// A single background task owns the subscription. It performs one count at a
/// time; notifications that arrive during a fetch are folded into a single
/// follow-up fetch, so the published count always reflects the latest query.
pub struct CounterSynchronizer {
    spec: CounterSpec,
    state: watch::Receiver<CounterState>,
    last_count: Arc<AtomicU64>,
    signals: Option<mpsc::Sender<Signal>>,
    task: Option<JoinHandle<()>>,
}

impl CounterSynchronizer {
    /// Start syncing `spec` for `session`
    ///
    /// Without the required capability the counter reads zero and nothing is
    /// queried or subscribed. A feed that refuses the subscription leaves the
    /// counter working on manual refreshes only.
    pub async fn start(
        spec: CounterSpec,
        session: &SessionContext,
        store: Arc<dyn DataStore>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        let (state_tx, state) = watch::channel(CounterState::Idle);
        let last_count = Arc::new(AtomicU64::new(0));

        if !session.has(spec.required) {
            debug!(
                "Counter {} inactive: session lacks {}",
                spec.name, spec.required
            );
            state_tx.send_replace(CounterState::Ready(0));
            return Self {
                spec,
                state,
                last_count,
                signals: None,
                task: None,
            };
        }

        let subscription = match feed.subscribe(spec.change_filter()).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!("Counter {} has no live updates: {}", spec.name, e);
                None
            }
        };

        let (signals_tx, signals_rx) = mpsc::channel(8);
        let worker = Worker {
            name: spec.name.clone(),
            query: spec.query(),
            store,
            state: state_tx,
            last_count: last_count.clone(),
        };
        let task = tokio::spawn(worker.run(subscription, signals_rx));
        info!("Started counter {}", spec.name);

        Self {
            spec,
            state,
            last_count,
            signals: Some(signals_tx),
            task: Some(task),
        }
    }

    pub fn spec(&self) -> &CounterSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Whether the precondition held and the counter is live
    pub fn is_active(&self) -> bool {
        self.signals.is_some()
    }

    pub fn state(&self) -> CounterState {
        *self.state.borrow()
    }

    /// Most recent ready count; stays put while a re-fetch is loading
    pub fn count(&self) -> u64 {
        self.last_count.load(Ordering::SeqCst)
    }

    /// Receiver that observes every state transition
    pub fn watch(&self) -> watch::Receiver<CounterState> {
        self.state.clone()
    }

    /// Ask for a re-fetch; coalesced with any fetch already pending
    pub fn refresh(&self) {
        if let Some(signals) = &self.signals {
            // A full channel already holds a pending refresh.
            let _ = signals.try_send(Signal::Refresh);
        }
    }

    /// Wait until the counter reports a count other than a loading state
    pub async fn ready(&self) -> CounterState {
        let mut state = self.state.clone();
        let ready = state.wait_for(CounterState::is_ready).await.map(|s| *s);
        ready.unwrap_or_else(|_| self.state())
    }

    /// Shut the task down and release the subscription
    pub async fn stop(mut self) {
        if let Some(signals) = self.signals.take() {
            let _ = signals.send(Signal::Shutdown).await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Counter {} task ended abnormally: {}", self.spec.name, e);
            }
        }
        debug!("Stopped counter {}", self.spec.name);
    }
}

impl Drop for CounterSynchronizer {
    fn drop(&mut self) {
        // Aborting drops the task's subscription, which releases it.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for CounterSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterSynchronizer")
            .field("name", &self.spec.name)
            .field("state", &self.state())
            .field("active", &self.is_active())
            .finish()
    }
}

enum Wake {
    Change(ChangeEvent),
    Refresh,
    FeedClosed,
    Shutdown,
}

struct Worker {
    name: String,
    query: Query,
    store: Arc<dyn DataStore>,
    state: watch::Sender<CounterState>,
    last_count: Arc<AtomicU64>,
}

impl Worker {
    async fn run(self, mut subscription: Option<Subscription>, mut signals: mpsc::Receiver<Signal>) {
        self.fetch().await;

        loop {
            let wake = tokio::select! {
                change = next_change(&mut subscription) => match change {
                    Some(event) => Wake::Change(event),
                    None => Wake::FeedClosed,
                },
                signal = signals.recv() => match signal {
                    Some(Signal::Refresh) => Wake::Refresh,
                    Some(Signal::Shutdown) | None => Wake::Shutdown,
                },
            };

            match wake {
                Wake::Change(event) => {
                    let folded = drain(&mut subscription);
                    debug!(
                        "Counter {} saw {:?} on {} (+{} coalesced)",
                        self.name, event.kind, event.collection, folded
                    );
                }
                Wake::Refresh => debug!("Counter {} refresh requested", self.name),
                Wake::FeedClosed => {
                    warn!("Change feed closed for counter {}", self.name);
                    subscription = None;
                    continue;
                }
                Wake::Shutdown => break,
            }

            // Pending refreshes are satisfied by the fetch below.
            loop {
                match signals.try_recv() {
                    Ok(Signal::Refresh) => continue,
                    Ok(Signal::Shutdown) => return,
                    Err(_) => break,
                }
            }

            self.fetch().await;
        }

        if let Some(subscription) = subscription {
            debug!("Counter {} releasing subscription {}", self.name, subscription.id());
        }
    }

    async fn fetch(&self) {
        self.state.send_replace(CounterState::Loading);

        let count = match self.store.count(&self.query).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Counter {} fetch failed, showing 0: {}", self.name, e);
                0
            }
        };

        self.last_count.store(count, Ordering::SeqCst);
        self.state.send_replace(CounterState::Ready(count));
        debug!("Counter {} = {}", self.name, count);
    }
}

async fn next_change(subscription: &mut Option<Subscription>) -> Option<ChangeEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

fn drain(subscription: &mut Option<Subscription>) -> usize {
    let Some(subscription) = subscription else {
        return 0;
    };
    std::iter::from_fn(|| subscription.try_recv()).count()
}
