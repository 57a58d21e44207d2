//! Bookkeeping for the tasks a [`Store`](crate::Store) has spawned.
//!
//! Every effect task is registered under a monotonically increasing key and,
//! optionally, under the [`EffectId`] it was started with. The registry owns
//! the abort handles, so the store can cancel by id, abort everything on
//! shutdown, and release whatever is left when it is dropped. A task stays
//! registered until the action it produced has been applied, so a cancel
//! that lands first makes that action stale.

use seatmap_core::effect::EffectId;
use std::collections::HashMap;
use tokio::task::AbortHandle;

#[derive(Debug, Default)]
pub(crate) struct TaskRegistry {
    next_key: u64,
    running: HashMap<u64, (AbortHandle, Option<EffectId>)>,
    scopes: HashMap<EffectId, Vec<u64>>,
}

impl TaskRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve the key for a task about to be spawned
    pub(crate) const fn next_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    pub(crate) fn track(&mut self, key: u64, scope: Option<EffectId>, handle: AbortHandle) {
        if let Some(id) = scope {
            self.scopes.entry(id).or_default().push(key);
        }
        self.running.insert(key, (handle, scope));
    }

    /// Forget a task that ran to completion
    ///
    /// Returns `false` if the task had already been cancelled or aborted.
    pub(crate) fn finish(&mut self, key: u64) -> bool {
        match self.running.remove(&key) {
            Some((_, Some(id))) => {
                self.forget_scoped(id, key);
                true
            },
            Some((_, None)) => true,
            None => false,
        }
    }

    /// Whether the task under `key` is still registered
    pub(crate) fn contains(&self, key: u64) -> bool {
        self.running.contains_key(&key)
    }

    /// Abort every task registered under `id`, returning how many were aborted
    pub(crate) fn cancel(&mut self, id: EffectId) -> usize {
        let Some(keys) = self.scopes.remove(&id) else {
            return 0;
        };

        let mut aborted = 0;
        for key in keys {
            if let Some((handle, _)) = self.running.remove(&key) {
                handle.abort();
                aborted += 1;
            }
        }
        aborted
    }

    pub(crate) fn abort_all(&mut self) -> usize {
        self.scopes.clear();
        let aborted = self.running.len();
        for (handle, _) in self.running.drain().map(|(_, entry)| entry) {
            handle.abort();
        }
        aborted
    }

    pub(crate) fn len(&self) -> usize {
        self.running.len()
    }

    pub(crate) fn is_running(&self, id: EffectId) -> bool {
        self.scopes.get(&id).is_some_and(|keys| !keys.is_empty())
    }

    fn forget_scoped(&mut self, id: EffectId, key: u64) {
        if let Some(keys) = self.scopes.get_mut(&id) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.scopes.remove(&id);
            }
        }
    }
}
