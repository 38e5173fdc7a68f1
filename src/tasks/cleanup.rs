//! Cache Cleanup Task
//!
//! Background task that periodically sweeps expired and over-capacity cache
//! entries and reclaims stale pending-request registrations.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, PendingRegistry};

/// Spawns the background cleanup task.
///
/// The task loops until its handle is aborted, sleeping `sweep_interval`
/// between runs. Each run sweeps the store (dropping expired entries and
/// evicting oldest-first once over capacity), then reclaims pending
/// registrations older than `pending_max_age`, so a request that never
/// settles cannot pin its registry slot forever. Reclamation does not cancel
/// the underlying request; joiners keep their shared future.
///
/// # Arguments
/// * `store` - Shared cache store to sweep
/// * `pending` - Pending-request registry to reclaim
/// * `sweep_interval` - Time between runs
/// * `pending_max_age` - Age past which a pending entry is reclaimed
///
/// # Returns
/// A JoinHandle for the spawned task; abort it during shutdown.
pub fn spawn_cleanup_task<V>(
    store: Arc<RwLock<CacheStore<V>>>,
    pending: Arc<PendingRegistry<V>>,
    sweep_interval: Duration,
    pending_max_age: Duration,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(?sweep_interval, ?pending_max_age, "starting cache cleanup task");

        loop {
            tokio::time::sleep(sweep_interval).await;

            let report = {
                let mut store = store.write().await;
                store.sweep()
            };
            let reclaimed = pending.reclaim_stale(pending_max_age);

            if report.expired > 0 || report.evicted > 0 || reclaimed > 0 {
                info!(
                    expired = report.expired,
                    evicted = report.evicted,
                    reclaimed,
                    "cleanup pass finished"
                );
            } else {
                debug!("cleanup pass found nothing to remove");
            }
        }
    })
}
