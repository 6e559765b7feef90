//! OrderStore — the merge and sync core
//!
//! Orchestrates [`LocalStore`] and a [`RemoteChannel`]. Every mutation
//! commits locally first, unconditionally; the remote mirror is
//! best-effort and its failure is reported, never propagated. Reads
//! merge the remote and local sets with the remote winning any id
//! collision.
//!
//! Operations are meant to be invoked and awaited sequentially by one
//! caller. The two pieces of shared state (`remote_usable` and the
//! merged-view cache) are owned here and mutated only by these
//! operations.

use serde::Serialize;
use shared::Order;
use shared::cloud::RemoteAction;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cloud::{RemoteChannel, RemoteError, RemoteGateway};
use crate::core::config::Config;
use crate::store::local::{LocalStore, StorageResult};

/// Default delay between reconciliation uploads
const DEFAULT_SYNC_PACING: Duration = Duration::from_millis(100);

/// Outcome of a write-through mutation.
///
/// `success` reflects the local result only. The cloud fields describe
/// the mirror attempt so a caller can render "saved, but not synced"
/// distinctly from "saved and synced" and from "not saved".
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub success: bool,
    /// The remote was not usable; the write exists only locally
    pub local_only: bool,
    /// The remote confirmed the mirrored call
    pub cloud_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_error: Option<String>,
}

impl MutationOutcome {
    fn local_only(success: bool) -> Self {
        Self {
            success,
            local_only: true,
            cloud_synced: false,
            cloud_error: None,
        }
    }

    fn synced(success: bool) -> Self {
        Self {
            success,
            local_only: false,
            cloud_synced: true,
            cloud_error: None,
        }
    }

    fn cloud_failed(success: bool, error: String) -> Self {
        Self {
            success,
            local_only: false,
            cloud_synced: false,
            cloud_error: Some(error),
        }
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Local-only orders pushed to the remote (attempt count; an
    /// individual cloud rejection is logged but still counted)
    pub uploaded: usize,
    /// Size of the merged view after the pass
    pub total: usize,
}

/// Outcome of a clear-all request
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cloud_cleared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_error: Option<String>,
}

/// Read-only aggregation over the current view and the local set
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub remote_usable: bool,
    pub view_total: usize,
    pub local_total: usize,
    /// Per-status counts over the last merged view (or the local set
    /// when nothing has been read yet)
    pub view_by_status: BTreeMap<String, usize>,
    /// Per-status counts over the local set alone
    pub local_by_status: BTreeMap<String, usize>,
}

/// Merge the remote and local order sets into one view.
///
/// Remote wins any id collision; local orders are pure additions on
/// top of the remote baseline. Tie-breaks inside a single list are
/// pinned: the last occurrence of a duplicated id wins within the
/// remote list, the first occurrence wins within the local list. The
/// asymmetry is intentional and covered by tests: the remote list
/// reads like a log where later entries supersede, while the first
/// local copy is the one reads have already served. Unifying the two
/// directions changes observable results either way.
/// Output is sorted newest-id-first and is a pure function of its
/// inputs.
pub fn merge(remote: &[Order], local: &[Order]) -> Vec<Order> {
    let mut by_id: BTreeMap<i64, Order> = BTreeMap::new();
    for order in remote {
        by_id.insert(order.id, order.clone());
    }
    for order in local {
        by_id.entry(order.id).or_insert_with(|| order.clone());
    }
    by_id.into_values().rev().collect()
}

/// The order store: local-first, remote-mirrored
pub struct OrderStore {
    local: LocalStore,
    remote: Option<Arc<dyn RemoteChannel>>,
    /// Starts at configuration validity, demoted once on a definitive
    /// failure, never promoted back within a session
    remote_usable: AtomicBool,
    /// Last computed merged view, empty until the first read
    cache: RwLock<Vec<Order>>,
    pacing: Duration,
}

impl OrderStore {
    /// Build a store over the given local storage and optional remote.
    ///
    /// The remote is considered usable from the start if present;
    /// callers that cannot tolerate mutations racing the startup probe
    /// should await [`OrderStore::init`] first.
    pub fn new(local: LocalStore, remote: Option<Arc<dyn RemoteChannel>>) -> Self {
        let remote_usable = remote.is_some();
        Self {
            local,
            remote,
            remote_usable: AtomicBool::new(remote_usable),
            cache: RwLock::new(Vec::new()),
            pacing: DEFAULT_SYNC_PACING,
        }
    }

    /// Build a store from configuration: open the database under
    /// `data_dir`, attach the HTTP gateway when the configured URL has
    /// a usable shape, and apply the reconciliation pacing.
    ///
    /// An absent or non-http(s) `remote_url` means local-only from the
    /// start. Actual reachability is still settled by
    /// [`OrderStore::init`].
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let local = LocalStore::open(std::path::Path::new(&config.data_dir).join("orders.redb"))?;

        let remote: Option<Arc<dyn RemoteChannel>> = match config.remote_url.as_deref() {
            Some(url) if config.remote_configured() => match RemoteGateway::new(url, config) {
                Ok(gateway) => Some(Arc::new(gateway)),
                Err(e) => {
                    tracing::warn!("Failed to build remote gateway, running local-only: {e}");
                    None
                }
            },
            _ => None,
        };

        Ok(Self::new(local, remote).with_pacing(Duration::from_millis(config.sync_pacing_ms)))
    }

    /// Override the reconciliation pacing delay
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Startup connectivity probe.
    ///
    /// Settles remote usability before the first mutation; a failed
    /// probe demotes the remote for the rest of the session.
    pub async fn init(&self) {
        let Some(remote) = self.usable_remote() else {
            tracing::info!("No usable remote configured, running local-only");
            return;
        };

        let outcome = remote.probe().await;
        if outcome.reachable {
            tracing::info!("Remote reachable: {}", outcome.message);
        } else {
            tracing::warn!(
                "Remote probe failed, disabling mirroring for this session: {}",
                outcome.message
            );
            self.remote_usable.store(false, Ordering::SeqCst);
        }
    }

    /// Stop mirroring and drop the cached view.
    ///
    /// The local set is already durable; there is nothing to flush.
    pub async fn shutdown(&self) {
        self.remote_usable.store(false, Ordering::SeqCst);
        self.cache.write().await.clear();
        tracing::info!("Order store shut down");
    }

    /// Whether the remote is currently considered usable
    pub fn remote_usable(&self) -> bool {
        self.remote.is_some() && self.remote_usable.load(Ordering::SeqCst)
    }

    fn usable_remote(&self) -> Option<Arc<dyn RemoteChannel>> {
        if self.remote_usable.load(Ordering::SeqCst) {
            self.remote.clone()
        } else {
            None
        }
    }

    /// Demote the remote on a definitive (transport) failure.
    ///
    /// A rejection means the remote is reachable and stays usable.
    fn note_remote_failure(&self, error: &RemoteError) {
        if error.is_transport() && self.remote_usable.swap(false, Ordering::SeqCst) {
            tracing::warn!("Remote unreachable, disabling mirroring for this session");
        }
    }

    /// Read the merged view.
    ///
    /// Local orders verbatim when the remote is unusable or the fetch
    /// soft-fails; otherwise the merged view is persisted back into
    /// local storage (converging it toward the remote-plus-local
    /// union), cached, and returned.
    pub async fn list(&self) -> StorageResult<Vec<Order>> {
        let local = self.local.load()?;

        let Some(remote) = self.usable_remote() else {
            return Ok(local);
        };

        let remote_orders = remote.fetch_all().await;
        if remote_orders.is_empty() {
            return Ok(local);
        }

        let merged = merge(&remote_orders, &local);
        self.local.save_all(&merged)?;
        *self.cache.write().await = merged.clone();
        Ok(merged)
    }

    /// Create an order: local write-through, then best-effort mirror.
    ///
    /// The outcome is a success as soon as the local write commits; a
    /// remote failure only annotates it.
    pub async fn create(&self, order: Order) -> StorageResult<MutationOutcome> {
        self.local.upsert(&order)?;

        let Some(remote) = self.usable_remote() else {
            return Ok(MutationOutcome::local_only(true));
        };

        let action = RemoteAction::AddOrder {
            order: order.clone(),
            timestamp: shared::util::now_iso8601(),
        };
        match remote.submit(action).await {
            Ok(()) => Ok(MutationOutcome::synced(true)),
            Err(e) => {
                tracing::warn!(order_id = order.id, "Cloud add failed, order kept locally: {e}");
                self.note_remote_failure(&e);
                Ok(MutationOutcome::cloud_failed(true, e.to_string()))
            }
        }
    }

    /// Update an order's status. `success` is `false` iff the id is
    /// absent locally; the mirrored call patches only the status.
    pub async fn update_status(
        &self,
        id: i64,
        status: impl Into<String>,
    ) -> StorageResult<MutationOutcome> {
        let status = status.into();
        let found = self.local.update_status(id, &status)?;

        let Some(remote) = self.usable_remote() else {
            return Ok(MutationOutcome::local_only(found));
        };

        let action = RemoteAction::UpdateStatus {
            order_id: id,
            status,
            timestamp: shared::util::now_iso8601(),
        };
        match remote.submit(action).await {
            Ok(()) => Ok(MutationOutcome::synced(found)),
            Err(e) => {
                tracing::warn!(order_id = id, "Cloud status update failed: {e}");
                self.note_remote_failure(&e);
                Ok(MutationOutcome::cloud_failed(found, e.to_string()))
            }
        }
    }

    /// Delete an order. `success` is `false` iff the id was absent
    /// locally; the remote deletion is still attempted either way.
    pub async fn delete(&self, id: i64) -> StorageResult<MutationOutcome> {
        let removed = self.local.delete(id)?;

        let Some(remote) = self.usable_remote() else {
            return Ok(MutationOutcome::local_only(removed));
        };

        let action = RemoteAction::DeleteOrder {
            order_id: id,
            timestamp: shared::util::now_iso8601(),
        };
        match remote.submit(action).await {
            Ok(()) => Ok(MutationOutcome::synced(removed)),
            Err(e) => {
                tracing::warn!(order_id = id, "Cloud delete failed: {e}");
                self.note_remote_failure(&e);
                Ok(MutationOutcome::cloud_failed(removed, e.to_string()))
            }
        }
    }

    /// Reconciliation pass: push every local order missing from the
    /// remote snapshot, then re-read.
    ///
    /// Uploads are serialized with a fixed pacing delay — a
    /// rate-limiting discipline, not an optimization target. A failure
    /// in one upload is logged and does not abort the rest.
    pub async fn sync(&self) -> StorageResult<SyncOutcome> {
        let Some(remote) = self.usable_remote() else {
            return Ok(SyncOutcome {
                success: false,
                reason: Some("cloud_disabled".to_string()),
                uploaded: 0,
                total: self.local.load()?.len(),
            });
        };

        // Snapshot the remote set once; everything missing from it
        // gets uploaded, whatever later fetches say.
        let remote_orders = remote.fetch_all().await;
        let local = self.local.load()?;

        if !remote_orders.is_empty() {
            let merged = merge(&remote_orders, &local);
            self.local.save_all(&merged)?;
            *self.cache.write().await = merged;
        }

        let remote_ids: HashSet<i64> = remote_orders.iter().map(|o| o.id).collect();
        let missing: Vec<Order> = local
            .into_iter()
            .filter(|o| !remote_ids.contains(&o.id))
            .collect();

        tracing::info!(count = missing.len(), "Reconciliation: uploading local-only orders");

        let mut uploaded = 0;
        for order in missing {
            let order_id = order.id;
            match self.create(order).await {
                Ok(outcome) => {
                    if let Some(err) = &outcome.cloud_error {
                        tracing::warn!(order_id, "Upload not confirmed by remote: {err}");
                    }
                    uploaded += 1;
                }
                Err(e) => {
                    tracing::error!(order_id, "Upload failed locally, skipping: {e}");
                }
            }
            tokio::time::sleep(self.pacing).await;
        }

        let total = self.list().await?.len();
        tracing::info!(uploaded, total, "Reconciliation finished");

        Ok(SyncOutcome {
            success: true,
            reason: None,
            uploaded,
            total,
        })
    }

    /// Clear everything, locally and best-effort remotely.
    ///
    /// Refuses without side effects unless `confirm` is set. The local
    /// clear is never rolled back when the remote call fails.
    pub async fn clear_all(&self, confirm: bool) -> StorageResult<ClearOutcome> {
        if !confirm {
            return Ok(ClearOutcome {
                success: false,
                message: Some("confirmation required".to_string()),
                cloud_cleared: false,
                cloud_error: None,
            });
        }

        self.local.clear()?;
        self.cache.write().await.clear();

        let Some(remote) = self.usable_remote() else {
            return Ok(ClearOutcome {
                success: true,
                message: None,
                cloud_cleared: false,
                cloud_error: None,
            });
        };

        match remote.submit(RemoteAction::ClearAll { confirm: true }).await {
            Ok(()) => Ok(ClearOutcome {
                success: true,
                message: None,
                cloud_cleared: true,
                cloud_error: None,
            }),
            Err(e) => {
                tracing::warn!("Cloud clear failed, local data already gone: {e}");
                self.note_remote_failure(&e);
                Ok(ClearOutcome {
                    success: true,
                    message: None,
                    cloud_cleared: false,
                    cloud_error: Some(e.to_string()),
                })
            }
        }
    }

    /// Per-status counts over the current view (cache, or the local
    /// set before the first read) and over the local set separately.
    /// Pure read-only aggregation.
    pub async fn statistics(&self) -> StorageResult<StatusReport> {
        let local = self.local.load()?;
        let cache = self.cache.read().await;
        let view: &[Order] = if cache.is_empty() { &local } else { &cache };

        Ok(StatusReport {
            remote_usable: self.remote_usable(),
            view_total: view.len(),
            local_total: local.len(),
            view_by_status: count_by_status(view),
            local_by_status: count_by_status(&local),
        })
    }
}

fn count_by_status(orders: &[Order]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for order in orders {
        *counts.entry(order.status.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, status: &str) -> Order {
        Order::new(id).with_status(status)
    }

    #[test]
    fn test_merge_disjoint_sets_is_the_union() {
        let remote = vec![order(3, "Shipped"), order(1, "Done")];
        let local = vec![order(2, "New"), order(4, "New")];

        let merged = merge(&remote, &local);

        assert_eq!(merged.len(), 4);
        let ids: Vec<i64> = merged.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_merge_remote_wins_id_collisions() {
        let remote = vec![order(2, "Shipped")];
        let local = vec![order(2, "New"), order(1, "New")];

        let merged = merge(&remote, &local);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, 2);
        assert_eq!(merged[0].status, "Shipped");
        assert_eq!(merged[1].id, 1);
    }

    #[test]
    fn test_merge_sorts_descending_by_id() {
        let remote = vec![order(10, "A"), order(30, "B")];
        let local = vec![order(20, "C")];

        let ids: Vec<i64> = merge(&remote, &local).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![30, 20, 10]);
    }

    #[test]
    fn test_merge_duplicate_ids_within_remote_last_wins() {
        let remote = vec![order(1, "first"), order(1, "second")];
        let merged = merge(&remote, &[]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status, "second");
    }

    #[test]
    fn test_merge_duplicate_ids_within_local_first_wins() {
        let local = vec![order(1, "first"), order(1, "second")];
        let merged = merge(&[], &local);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status, "first");
    }

    #[test]
    fn test_merge_is_deterministic() {
        let remote = vec![order(5, "R"), order(2, "R")];
        let local = vec![order(2, "L"), order(7, "L")];

        assert_eq!(merge(&remote, &local), merge(&remote, &local));
    }

    #[test]
    fn test_merge_of_empty_inputs() {
        assert!(merge(&[], &[]).is_empty());

        let local = vec![order(1, "New")];
        assert_eq!(merge(&[], &local), local);
    }

    #[test]
    fn test_from_config_without_remote_runs_local_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_overrides(None::<String>, dir.path().to_str().unwrap());

        let store = OrderStore::from_config(&config).unwrap();
        assert!(!store.remote_usable());
    }

    #[test]
    fn test_from_config_applies_pacing_and_url_shape_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut config =
            Config::with_overrides(Some("ftp://example.test"), dir.path().to_str().unwrap());
        config.sync_pacing_ms = 5_000;

        let store = OrderStore::from_config(&config).unwrap();

        // Non-http scheme never attaches a remote
        assert!(!store.remote_usable());
        assert_eq!(store.pacing, Duration::from_millis(5_000));
    }

    #[test]
    fn test_from_config_creates_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("relay").join("data");
        let config = Config::with_overrides(None::<String>, nested.to_str().unwrap());

        let store = OrderStore::from_config(&config).unwrap();
        assert!(nested.join("orders.redb").exists());
        drop(store);
    }

    #[test]
    fn test_count_by_status_buckets_distinct_strings() {
        let orders = vec![
            order(1, "New"),
            order(2, "New"),
            order(3, "Shipped"),
            order(4, "weird-tag"),
        ];

        let counts = count_by_status(&orders);
        assert_eq!(counts["New"], 2);
        assert_eq!(counts["Shipped"], 1);
        assert_eq!(counts["weird-tag"], 1);
        assert_eq!(counts.len(), 3);
    }
}
