//! Record cache and synchronisation layer.
//!
//! The cache holds the latest user list and is the only writer of it. Every
//! successful mutation invalidates the list and refetches it; nothing is
//! patched optimistically. Refetches are serialised: while one `list()` is
//! outstanding, further invalidations coalesce into exactly one follow-up
//! fetch, and each caller waits until a fetch that started after its request
//! has been applied.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use mockable::Clock;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::mutation::{MutationIntent, MutationKind, MutationOutcome};
use super::ports::{DataAccessError, UserGateway};
use super::user::{User, UserId, UserPayload};

mod refetch;
mod runtime;
mod view;

use refetch::{RefetchDecision, RefetchState};
pub use runtime::{RecordCacheRuntime, RefetchSleeper, TokioSleeper};
pub use view::{CacheEntry, CacheStatus, CacheView, MutationStatus, MutationStatuses};

/// Cache configuration controlling list retries and staleness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCacheConfig {
    /// Extra `list()` attempts after the first failure.
    pub list_retries: u32,
    /// Initial retry backoff.
    pub retry_base_delay: Duration,
    /// Maximum retry backoff cap.
    pub retry_max_delay: Duration,
    /// Age after which a successful fetch counts as stale.
    pub stale_time: Duration,
}

impl Default for RecordCacheConfig {
    fn default() -> Self {
        Self {
            list_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            stale_time: Duration::from_secs(30),
        }
    }
}

/// Cache of the user list with coalescing refetch.
///
/// Construct one per backend and share it by reference or `Arc`.
pub struct RecordCache {
    gateway: Arc<dyn UserGateway>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RefetchSleeper>,
    config: RecordCacheConfig,
    refetch: Mutex<RefetchState>,
    view: watch::Sender<CacheView>,
}

impl RecordCache {
    /// Build an empty cache using default runtime dependencies.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn UserGateway>,
        clock: Arc<dyn Clock>,
        config: RecordCacheConfig,
    ) -> Self {
        Self::with_runtime(gateway, clock, RecordCacheRuntime::default(), config)
    }

    /// Build an empty cache with injected runtime abstractions.
    #[must_use]
    pub fn with_runtime(
        gateway: Arc<dyn UserGateway>,
        clock: Arc<dyn Clock>,
        runtime: RecordCacheRuntime,
        config: RecordCacheConfig,
    ) -> Self {
        let (view, _) = watch::channel(CacheView::default());
        Self {
            gateway,
            clock,
            sleeper: runtime.sleeper,
            config,
            refetch: Mutex::new(RefetchState::default()),
            view,
        }
    }

    /// Build a cache and perform the initial load.
    ///
    /// A failed load leaves the cache in the error state; the next
    /// successful refresh clears it.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use client::domain::ports::FixtureUserGateway;
    /// use client::domain::{CacheStatus, RecordCache, RecordCacheConfig};
    /// use mockable::DefaultClock;
    ///
    /// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
    /// let cache = RecordCache::load(
    ///     Arc::new(FixtureUserGateway::default()),
    ///     Arc::new(DefaultClock),
    ///     RecordCacheConfig::default(),
    /// )
    /// .await;
    /// assert_eq!(cache.status(), CacheStatus::Success);
    /// # });
    /// ```
    pub async fn load(
        gateway: Arc<dyn UserGateway>,
        clock: Arc<dyn Clock>,
        config: RecordCacheConfig,
    ) -> Self {
        let cache = Self::new(gateway, clock, config);
        if let Err(error) = cache.refresh().await {
            debug!(%error, "initial user list load failed");
        }
        cache
    }

    /// Current view of the cache.
    #[must_use]
    pub fn snapshot(&self) -> CacheView {
        self.view.borrow().clone()
    }

    /// Cached users in backend order.
    #[must_use]
    pub fn users(&self) -> Arc<[User]> {
        Arc::clone(self.view.borrow().entry().users())
    }

    /// Status tag of the cached list.
    #[must_use]
    pub fn status(&self) -> CacheStatus {
        self.view.borrow().entry().status().clone()
    }

    /// Receiver notified whenever the view changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CacheView> {
        self.view.subscribe()
    }

    /// Status of the most recent mutation of `kind`.
    #[must_use]
    pub fn mutation_status(&self, kind: MutationKind) -> MutationStatus {
        self.view.borrow().mutations().get(kind).clone()
    }

    /// Whether a mutation of `kind` is outstanding.
    #[must_use]
    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.view.borrow().mutations().is_pending(kind)
    }

    /// Refetch the list through the coalescing path.
    ///
    /// Resolves once a fetch that started after this call has been applied,
    /// returning that fetch's error if it failed.
    pub async fn refresh(&self) -> Result<(), DataAccessError> {
        self.invalidate().await
    }

    /// Refetch only when the list is older than the configured stale time.
    ///
    /// Returns whether a refetch ran.
    pub async fn refresh_if_stale(&self) -> Result<bool, DataAccessError> {
        if !self.is_stale() {
            return Ok(false);
        }
        self.invalidate().await.map(|()| true)
    }

    /// Fetch one user straight from the backend, bypassing the cache.
    pub async fn fetch_user(&self, id: UserId) -> Result<User, DataAccessError> {
        self.gateway.fetch(id).await.inspect_err(|error| {
            warn!(%id, %error, "user fetch failed");
        })
    }

    /// Create a user and refetch the list.
    pub async fn create(&self, payload: &UserPayload) -> Result<User, DataAccessError> {
        self.run_mutation(MutationKind::Create, self.gateway.create(payload))
            .await
    }

    /// Update a user and refetch the list.
    pub async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, DataAccessError> {
        self.run_mutation(MutationKind::Update, self.gateway.update(id, payload))
            .await
    }

    /// Delete a user and refetch the list.
    pub async fn delete(&self, id: UserId) -> Result<(), DataAccessError> {
        self.run_mutation(MutationKind::Delete, self.gateway.delete(id))
            .await
    }

    /// Run `intent` through the matching mutation.
    pub async fn execute(&self, intent: MutationIntent) -> Result<MutationOutcome, DataAccessError> {
        match intent {
            MutationIntent::Create { payload } => {
                self.create(&payload).await.map(MutationOutcome::Saved)
            }
            MutationIntent::Update { id, payload } => {
                self.update(id, &payload).await.map(MutationOutcome::Saved)
            }
            MutationIntent::Delete { id } => {
                self.delete(id).await.map(|()| MutationOutcome::Deleted(id))
            }
        }
    }

    fn is_stale(&self) -> bool {
        let Some(fetched_at) = self.view.borrow().entry().fetched_at() else {
            return true;
        };
        let stale_time = TimeDelta::from_std(self.config.stale_time).unwrap_or(TimeDelta::MAX);
        self.clock.utc().signed_duration_since(fetched_at) >= stale_time
    }

    async fn run_mutation<T, F>(&self, kind: MutationKind, operation: F) -> Result<T, DataAccessError>
    where
        F: Future<Output = Result<T, DataAccessError>>,
    {
        self.view
            .send_modify(|view| view.mutations_mut().begin(kind));

        let result = operation.await;
        let outcome = match &result {
            Ok(_) => {
                if let Err(error) = self.invalidate().await {
                    debug!(?kind, %error, "refetch after mutation failed");
                }
                MutationStatus::Success
            }
            Err(error) => {
                warn!(?kind, %error, "user mutation failed");
                MutationStatus::Error(error.clone())
            }
        };

        self.view
            .send_modify(|view| view.mutations_mut().finish(kind, outcome));
        result
    }

    async fn invalidate(&self) -> Result<(), DataAccessError> {
        let decision = self.lock_refetch().request();
        match decision {
            RefetchDecision::Start { covers } => self.drive(covers).await,
            RefetchDecision::Coalesced { ticket } => {
                debug!(ticket, "refetch coalesced into outstanding fetch");
                self.wait_for_coverage(ticket).await;
            }
        }

        match self.view.borrow().entry().status() {
            CacheStatus::Error(error) => Err(error.clone()),
            _ => Ok(()),
        }
    }

    async fn drive(&self, first: u64) {
        let mut guard = DriverGuard {
            cache: self,
            finished: false,
        };
        let mut covers = first;
        loop {
            self.view
                .send_modify(|view| view.entry_mut().begin_loading());
            let result = self.fetch_with_retry().await;
            let now = self.clock.utc();
            self.view.send_modify(|view| {
                view.entry_mut().apply(result, now);
                view.cover(covers);
            });

            match self.lock_refetch().finish() {
                Some(next) => covers = next,
                None => break,
            }
        }
        guard.finished = true;
    }

    async fn wait_for_coverage(&self, ticket: u64) {
        let mut receiver = self.view.subscribe();
        let released = receiver
            .wait_for(|view| view.covered() >= ticket)
            .await
            .is_ok();
        if !released {
            debug!(ticket, "cache view closed while waiting for refetch");
        }
    }

    async fn fetch_with_retry(&self) -> Result<Vec<User>, DataAccessError> {
        let max_attempts = self.config.list_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.gateway.list().await {
                Ok(users) => return Ok(users),
                Err(error) if attempt < max_attempts => {
                    let delay = self.retry_delay(attempt);
                    debug!(attempt, ?delay, %error, "user list fetch failed; retrying");
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(attempts = attempt, %error, "user list fetch failed");
                    return Err(error);
                }
            }
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.retry_base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.retry_max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }

    fn lock_refetch(&self) -> MutexGuard<'_, RefetchState> {
        self.refetch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the refetch slot if a driving future is dropped mid-fetch.
struct DriverGuard<'a> {
    cache: &'a RecordCache,
    finished: bool,
}

impl Drop for DriverGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let released = self.cache.lock_refetch().abandon();
        self.cache.view.send_modify(|view| {
            view.entry_mut().settle_abandoned();
            view.cover(released);
        });
    }
}
