use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{config::Config, store::RelayStore};

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Outcome of one maintenance sweep. The sweep is never fatal: failures are
/// folded into the report instead of propagating.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SweepReport {
    pub routes_deleted: u64,
    pub stale_blocks_deleted: u64,
    pub compacted: bool,
    pub error: Option<String>,
}

/// Roll the configured probability and run the sweep on a hit.
///
/// The host has no background scheduler, so retention cleanup is amortized
/// over webhook deliveries instead of running on a timer.
pub fn maybe_run(cfg: &Config, store: &dyn RelayStore, now_ms: i64) -> Option<SweepReport> {
    if rand::thread_rng().gen::<f64>() >= cfg.sweep_probability {
        return None;
    }
    debug!("probabilistic sweep triggered");
    Some(run(cfg, store, now_ms))
}

/// Delete routing entries older than the retention window, and when that
/// removed a large batch, also drop stale unblocked rows. Finishes with a
/// best-effort compaction.
pub fn run(cfg: &Config, store: &dyn RelayStore, now_ms: i64) -> SweepReport {
    let mut report = SweepReport::default();

    let route_cutoff = now_ms - cfg.retention_days * DAY_MS;
    match store.prune_routes_before(route_cutoff) {
        Ok(n) => report.routes_deleted = n,
        Err(e) => {
            warn!(error = %e, "route pruning failed");
            report.error = Some(e.to_string());
            return report;
        }
    }

    // Unblock hard-deletes its row today, so this normally finds nothing;
    // it stays for a future soft-delete block design.
    if report.routes_deleted > cfg.sweep_block_cleanup_threshold {
        let block_cutoff = now_ms - cfg.stale_block_days * DAY_MS;
        match store.prune_unblocked_before(block_cutoff) {
            Ok(n) => report.stale_blocks_deleted = n,
            Err(e) => {
                warn!(error = %e, "stale block pruning failed");
                report.error = Some(e.to_string());
            }
        }
    }

    // VACUUM is unavailable in some constrained environments.
    match store.compact() {
        Ok(()) => report.compacted = true,
        Err(e) => debug!(error = %e, "compaction skipped"),
    }

    info!(
        routes_deleted = report.routes_deleted,
        stale_blocks_deleted = report.stale_blocks_deleted,
        compacted = report.compacted,
        "maintenance sweep finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use crate::test_support::{test_config, MemoryStore};

    #[test]
    fn deletes_only_entries_strictly_older_than_retention() {
        let cfg = test_config();
        let store = MemoryStore::default();
        let now = 1_000 * DAY_MS;
        let cutoff = now - 30 * DAY_MS;

        store.record_route(MessageId(1), "old", cutoff - 1).unwrap();
        store.record_route(MessageId(2), "boundary", cutoff).unwrap();
        store.record_route(MessageId(3), "fresh", now).unwrap();

        let report = run(&cfg, &store, now);
        assert_eq!(report.routes_deleted, 1);
        assert!(store.lookup_route(MessageId(1)).unwrap().is_none());
        // Exactly at the threshold is retained.
        assert_eq!(
            store.lookup_route(MessageId(2)).unwrap().as_deref(),
            Some("boundary")
        );
        assert_eq!(
            store.lookup_route(MessageId(3)).unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn stale_block_pass_only_after_large_deletions() {
        let cfg = test_config();
        let store = MemoryStore::default();
        let now = 1_000 * DAY_MS;

        // A small sweep never reaches the stale-block pass.
        store.record_route(MessageId(1), "old", 0).unwrap();
        let report = run(&cfg, &store, now);
        assert_eq!(report.routes_deleted, 1);
        assert_eq!(report.stale_blocks_deleted, 0);

        // Above the threshold the pass runs (a no-op against the current
        // hard-delete unblock design, but exercised here via direct rows).
        for i in 0..150 {
            store.record_route(MessageId(100 + i), "old", 0).unwrap();
        }
        let report = run(&cfg, &store, now);
        assert_eq!(report.routes_deleted, 150);
        assert_eq!(report.stale_blocks_deleted, 0);
    }

    #[test]
    fn sweep_never_panics_on_store_failure() {
        let cfg = test_config();
        let store = MemoryStore::default();
        store
            .fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let report = run(&cfg, &store, 1_000 * DAY_MS);
        assert!(report.error.is_some());
        assert_eq!(report.routes_deleted, 0);
    }
}
