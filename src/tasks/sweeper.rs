//! Background Sweeper Tasks
//!
//! Background tasks that reclaim expired cache entries: a staged sweeper
//! that visits a bounded batch of keys per tick, and a rule sweeper that
//! evaluates an eviction rule over the whole key set per tick.

use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Rule, RuleStore, StagedStore};

/// Spawns the background sweeper for a [`StagedStore`].
///
/// The task loops forever: sleep for the store's current sweep delay, then
/// take the write lock and run one sweep stage. Reading the delay fresh
/// each tick makes `configure_sweep` take effect from the next tick. When
/// the store carries a whole-cache deadline, the first tick at or past it
/// clears the store, marks it stopped, and exits the task.
///
/// # Arguments
/// * `store` - Shared reference to the store, also held by the cache handle
///
/// # Returns
/// A JoinHandle for the spawned task, used to abort the sweeper when the
/// owning cache is stopped or dropped.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(StagedStore::new()));
/// let sweeper = spawn_staged_sweeper(Arc::clone(&store));
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_staged_sweeper<K, V>(store: Arc<RwLock<StagedStore<K, V>>>) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let initial = { store.read().await.sweep_delay() };
        info!(
            "Starting staged sweeper with initial delay of {} ms",
            initial.as_millis()
        );

        loop {
            // Re-read the delay so runtime reconfiguration is picked up
            let delay = { store.read().await.sweep_delay() };
            tokio::time::sleep(delay).await;

            let mut guard = store.write().await;

            if guard.deadline_reached() {
                let cleared = guard.clear();
                guard.mark_stopped();
                drop(guard);
                info!(
                    "Cache deadline reached: cleared {} entries, sweeper exiting",
                    cleared
                );
                break;
            }

            let removed = guard.remove_expired_stage();
            drop(guard);

            if removed > 0 {
                debug!("Sweep stage: removed {} expired entries", removed);
            }
        }
    })
}

/// Spawns the background sweeper for a [`RuleStore`].
///
/// Same loop shape as the staged sweeper, but each tick evaluates the
/// eviction rule over every entry instead of walking a cursor. Whole-cache
/// deadlines are honored the same way.
///
/// # Arguments
/// * `store` - Shared reference to the store, also held by the cache handle
///
/// # Returns
/// A JoinHandle for the spawned task, used to abort the sweeper when the
/// owning cache is stopped or dropped.
pub fn spawn_rule_sweeper<K, V, R>(store: Arc<RwLock<RuleStore<K, V, R>>>) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    R: Rule<V> + 'static,
{
    tokio::spawn(async move {
        let initial = { store.read().await.sweep_delay() };
        info!(
            "Starting rule sweeper with initial delay of {} ms",
            initial.as_millis()
        );

        loop {
            let delay = { store.read().await.sweep_delay() };
            tokio::time::sleep(delay).await;

            let mut guard = store.write().await;

            if guard.deadline_reached() {
                let cleared = guard.clear();
                guard.mark_stopped();
                drop(guard);
                info!(
                    "Cache deadline reached: cleared {} entries, sweeper exiting",
                    cleared
                );
                break;
            }

            let removed = guard.remove_expired();
            drop(guard);

            if removed > 0 {
                info!("Rule sweep: removed {} entries", removed);
            } else {
                debug!("Rule sweep: no entries expired");
            }
        }
    })
}
