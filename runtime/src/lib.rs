//! # Seatmap Runtime
//!
//! Runtime implementation for the seatmap reducer architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Task Registry**: Owns every task the store spawned, so timers can be
//!   cancelled by id and are always released when the store goes away
//!
//! ## Example
//!
//! ```ignore
//! use seatmap_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//!
//! // Stop all timers before discarding the model
//! store.shutdown(Duration::from_secs(1)).await?;
//! ```

use seatmap_core::effect::Effect;
use seatmap_core::reducer::Reducer;
use std::sync::Arc;
use tokio::sync::RwLock;

mod registry;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use seatmap_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_millis(500));
///
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of feedback actions buffered for observers
    pub broadcast_capacity: usize,
    /// Timeout used by [`Store::teardown`]
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects started by
/// that action. Cancelled effects count as complete.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of tracked effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Runs whether the effect finished, panicked or was aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::registry::TaskRegistry;
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
    };
    use seatmap_core::effect::EffectId;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Mutex, MutexGuard, PoisonError, Weak};
    use tokio::sync::broadcast;

    type BoxedWork<A> = Pin<Box<dyn Future<Output = Option<A>> + Send>>;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; the reducer runs under the write lock, so
    ///    actions are applied one at a time)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Cloning a store is cheap; all clones share the same state. Effect tasks
    /// only hold a weak reference back to it, and when the last clone is
    /// dropped every outstanding effect task is aborted.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<Shared<S, A, E, R>>,
    }

    struct Shared<S, A, E, R> {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        tasks: Mutex<TaskRegistry>,
        /// Actions produced by effects, for observers
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Shared<S, A, E, R> {
        fn registry(&self) -> MutexGuard<'_, TaskRegistry> {
            self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn cancel(&self, id: EffectId) {
            let cancelled = self.registry().cancel(id);
            if cancelled > 0 {
                tracing::trace!(effect_id = %id, cancelled, "Cancelled effect");
                metrics::counter!("store.effects.cancelled").increment(cancelled as u64);
            }
        }
    }

    impl<S, A, E, R> Drop for Shared<S, A, E, R> {
        fn drop(&mut self) {
            let registry = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
            let aborted = registry.abort_all();
            if aborted > 0 {
                tracing::debug!(aborted, "Store dropped, aborted outstanding effects");
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                inner: Arc::new(Shared {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    config,
                    shutdown: AtomicBool::new(false),
                    pending_effects: Arc::new(AtomicUsize::new(0)),
                    tasks: Mutex::new(TaskRegistry::new()),
                    action_broadcast,
                }),
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts the returned effects
        ///
        /// `send()` returns after starting effect execution, not completion.
        /// Use the returned [`EffectHandle`] to wait for the effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip_all, name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::debug!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let mut state = self.inner.state.write().await;
            Ok(self.apply(&mut state, action))
        }

        /// Run the reducer and start the effects it returns
        ///
        /// Called with the state write lock held. Effects start before the
        /// lock is released, so a `Cancel` takes hold before the next action
        /// is reduced.
        fn apply(&self, state: &mut S, action: A) -> EffectHandle {
            let (handle, tracking) = EffectHandle::new();

            let start = std::time::Instant::now();
            let effects = self
                .inner
                .reducer
                .reduce(state, action, &self.inner.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            tracing::trace!("Reducer completed, returned {} effects", effects.len());

            for effect in effects {
                self.execute(effect, None, &tracking);
            }

            handle
        }

        /// Send an action and wait for a matching action produced by its effects
        ///
        /// Subscribes before sending, so a fast effect cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.inner.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Actions passed to [`Store::send`] directly are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.inner.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let total = store.state(|s| s.inventory.total_price()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.inner.state.read().await;
            f(&*state)
        }

        /// Number of effect tasks currently registered with the store
        #[must_use]
        pub fn running_effects(&self) -> usize {
            self.inner.registry().len()
        }

        /// Whether an effect registered under `id` is still running
        #[must_use]
        pub fn is_running(&self, id: EffectId) -> bool {
            self.inner.registry().is_running(id)
        }

        /// Whether [`Store::shutdown`] has been called
        #[must_use]
        pub fn is_shut_down(&self) -> bool {
            self.inner.shutdown.load(Ordering::Acquire)
        }

        /// Shut the store down
        ///
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Aborts every running effect task (pending timers never fire)
        /// 3. Waits for aborted and in-flight tasks to unwind
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if tasks are still unwinding
        /// when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating store shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.inner.shutdown.store(true, Ordering::Release);

            let aborted = self.inner.registry().abort_all();
            tracing::debug!(aborted, "Aborted running effects");

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(5);

            loop {
                let pending = self.inner.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("Store shutdown complete");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using [`StoreConfig::default_shutdown_timeout`]
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn teardown(&self) -> Result<(), StoreError> {
            self.shutdown(self.inner.config.default_shutdown_timeout)
                .await
        }

        /// Execute an effect
        ///
        /// `scope` is the cancellation id inherited from an enclosing
        /// `Effect::Cancellable`.
        fn execute(&self, effect: Effect<A>, scope: Option<EffectId>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Cancel(id) => {
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                    self.inner.cancel(id);
                },
                Effect::Cancellable { id, effect } => {
                    // At most one live effect per id
                    self.inner.cancel(id);
                    self.execute(*effect, Some(id), tracking);
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute(effect, scope, tracking);
                    }
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Scheduling Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    self.spawn(scope, tracking, move |_| {
                        Box::pin(async move {
                            tokio::time::sleep(duration).await;
                            Some(*action)
                        })
                    });
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    self.spawn(scope, tracking, move |_| fut);
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    let weak = Arc::downgrade(&self.inner);
                    self.spawn(scope, tracking, move |key| {
                        Box::pin(async move {
                            for effect in effects {
                                Self::run_to_completion(weak.clone(), key, effect).await;
                            }
                            None
                        })
                    });
                },
            }
        }

        /// Spawn `work` as a registered task
        ///
        /// `work` receives the task's registry key. The task stays registered
        /// until its action has been applied and deregisters just before the
        /// reducer runs, so an effect that re-arms its own id does not abort
        /// itself. Nothing is spawned once shutdown has started.
        fn spawn<F>(&self, scope: Option<EffectId>, tracking: &EffectTracking, work: F)
        where
            F: FnOnce(u64) -> BoxedWork<A>,
        {
            // Held across spawn so the task cannot finish before it is tracked
            let mut registry = self.inner.registry();

            // `shutdown` sets the flag before taking the registry lock
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::debug!("Store is shutting down, effect not started");
                metrics::counter!("store.shutdown.rejected_effects").increment(1);
                return;
            }

            tracking.increment();
            let completion = DecrementGuard(tracking.clone());

            self.inner.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending = AtomicCounterGuard(Arc::clone(&self.inner.pending_effects));

            let weak = Arc::downgrade(&self.inner);
            let key = registry.next_key();
            let work = work(key);

            let task = tokio::spawn(async move {
                let _completion = completion;
                let _pending = pending;

                let produced = work.await;

                let Some(shared) = weak.upgrade() else {
                    tracing::trace!("Store dropped before effect completed");
                    return;
                };
                let store = Self { inner: shared };

                match produced {
                    Some(action) => store.feed_back(key, action, true).await,
                    None => {
                        store.inner.registry().finish(key);
                    },
                }
            });

            registry.track(key, scope, task.abort_handle());
        }

        /// Run an effect inside an already-spawned task
        fn run_to_completion(
            weak: Weak<Shared<S, A, E, R>>,
            key: u64,
            effect: Effect<A>,
        ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Delay { duration, action } => {
                        tokio::time::sleep(duration).await;
                        Self::dispatch(&weak, key, *action).await;
                    },
                    Effect::Future(fut) => {
                        if let Some(action) = fut.await {
                            Self::dispatch(&weak, key, action).await;
                        }
                    },
                    Effect::Sequential(effects) => {
                        for effect in effects {
                            Self::run_to_completion(weak.clone(), key, effect).await;
                        }
                    },
                    Effect::Parallel(effects) => {
                        futures::future::join_all(
                            effects
                                .into_iter()
                                .map(|effect| Self::run_to_completion(weak.clone(), key, effect)),
                        )
                        .await;
                    },
                    // Nested ids are covered by the enclosing task's registration
                    Effect::Cancellable { effect, .. } => {
                        Self::run_to_completion(weak, key, *effect).await;
                    },
                    Effect::Cancel(id) => {
                        if let Some(shared) = weak.upgrade() {
                            shared.cancel(id);
                        }
                    },
                }
            })
        }

        /// Feed back an intermediate action of a sequence
        async fn dispatch(weak: &Weak<Shared<S, A, E, R>>, key: u64, action: A) {
            if let Some(shared) = weak.upgrade() {
                Self { inner: shared }.feed_back(key, action, false).await;
            }
        }

        /// Apply an action produced by the task registered under `key`
        ///
        /// The action is dropped if the task was cancelled before the state
        /// lock was acquired. `last` marks the task's final action, which
        /// also deregisters it.
        async fn feed_back(&self, key: u64, action: A, last: bool) {
            if self.is_shut_down() {
                if last {
                    self.inner.registry().finish(key);
                }
                tracing::debug!("Dropped action produced by effect: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return;
            }

            let mut state = self.inner.state.write().await;

            let live = {
                let mut registry = self.inner.registry();
                if last {
                    registry.finish(key)
                } else {
                    registry.contains(key)
                }
            };
            if !live {
                tracing::trace!("Dropped action produced by a cancelled effect");
                metrics::counter!("store.effects.stale_actions").increment(1);
                return;
            }

            metrics::counter!("store.commands.total").increment(1);
            self.apply(&mut state, action.clone());

            // Observers see the action once it has been applied; no receivers is not an error
            let _ = self.inner.action_broadcast.send(action);
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("running_effects", &self.inner.registry().len())
                .field("shutdown", &self.inner.shutdown.load(Ordering::Acquire))
                .finish_non_exhaustive()
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seatmap_core::effect::EffectId;
    use seatmap_core::{smallvec, SmallVec};

    const TIMER: EffectId = EffectId::new("timer");

    #[derive(Debug, Clone)]
    struct TestState {
        value: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        NoOp,
        ProduceEffect,
        ProduceDelayedAction,
        ProduceParallelEffects,
        ProduceSequentialEffects,
        ArmTimer,
        DisarmTimer,
        ArmShortTimer,
        /// Holds the state lock for 60ms, then disarms
        SlowDisarm,
        /// Holds the state lock for 60ms, then arms
        SlowArm,
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::NoOp => smallvec![Effect::None],
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async {
                        Some(TestAction::Increment)
                    }))]
                },
                TestAction::ProduceDelayedAction => {
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(10),
                        action: Box::new(TestAction::Increment),
                    }]
                },
                TestAction::ProduceParallelEffects => {
                    smallvec![Effect::Parallel(vec![
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    ])]
                },
                TestAction::ProduceSequentialEffects => {
                    smallvec![Effect::Sequential(vec![
                        Effect::Delay {
                            duration: Duration::from_millis(5),
                            action: Box::new(TestAction::Increment),
                        },
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    ])]
                },
                TestAction::ArmTimer => smallvec![Effect::Delay {
                    duration: Duration::from_secs(60),
                    action: Box::new(TestAction::Increment),
                }
                .cancellable(TIMER)],
                TestAction::DisarmTimer => smallvec![Effect::Cancel(TIMER)],
                TestAction::ArmShortTimer => smallvec![Effect::Delay {
                    duration: Duration::from_millis(20),
                    action: Box::new(TestAction::Increment),
                }
                .cancellable(TIMER)],
                TestAction::SlowDisarm => {
                    std::thread::sleep(Duration::from_millis(60));
                    smallvec![Effect::Cancel(TIMER)]
                },
                TestAction::SlowArm => {
                    std::thread::sleep(Duration::from_millis(60));
                    smallvec![Effect::Delay {
                        duration: Duration::from_secs(60),
                        action: Box::new(TestAction::Increment),
                    }
                    .cancellable(TIMER)]
                },
            }
        }
    }

    fn store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState { value: 0 }, TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_send_action() {
        let store = store();

        let _ = store.send(TestAction::Increment).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_none() {
        let store = store();

        let handle = store.send(TestAction::NoOp).await.unwrap();
        assert_eq!(handle.pending(), 0);
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test]
    async fn test_effect_future() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceEffect).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 1);
        assert_eq!(store.running_effects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_effect_delay() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceDelayedAction).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 0);

        handle.wait().await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_parallel() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceParallelEffects).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_effect_sequential() {
        let store = store();

        let mut handle = store.send(TestAction::ProduceSequentialEffects).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_timer() {
        let store = store();

        let mut handle = store.send(TestAction::ArmTimer).await.unwrap();
        assert!(store.is_running(TIMER));

        let _ = store.send(TestAction::DisarmTimer).await;
        handle.wait().await;

        assert!(!store.is_running(TIMER));
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_replaces_timer() {
        let store = store();

        let _ = store.send(TestAction::ArmTimer).await;
        let _ = store.send(TestAction::ArmTimer).await;
        assert_eq!(store.running_effects(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_timers_and_rejects_actions() {
        let store = store();

        let _ = store.send(TestAction::ArmTimer).await;
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert!(store.is_shut_down());
        assert_eq!(store.running_effects(), 0);
        assert!(matches!(
            store.send(TestAction::Increment).await,
            Err(StoreError::ShutdownInProgress)
        ));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    /// A timer that expires while another action is being reduced must not
    /// deliver once that action has cancelled it
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_wins_over_expired_timer() {
        let store = store();

        store.send(TestAction::ArmShortTimer).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // The timer expires while this reducer holds the state lock
        store.send(TestAction::SlowDisarm).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.state(|s| s.value).await, 0);
        assert_eq!(store.running_effects(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_effects_start_after_shutdown() {
        let store = store();

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.send(TestAction::SlowArm).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The reducer is still running, and arms its timer after this returns
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        slow.await.unwrap().unwrap();

        assert_eq!(store.running_effects(), 0);
        assert!(!store.is_running(TIMER));
    }

    #[tokio::test]
    async fn test_send_and_wait_for() {
        let store = store();

        let action = store
            .send_and_wait_for(
                TestAction::ProduceEffect,
                |a| matches!(a, TestAction::Increment),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(action, TestAction::Increment);
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait_with_timeout(Duration::from_millis(10)).await.unwrap();
    }
}
