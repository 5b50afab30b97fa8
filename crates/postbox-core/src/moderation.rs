use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::{
    store::RelayStore,
    utils::unix_ms_now,
    Result,
};

/// Outcome of a block request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The target is the administrator's own identity; nothing was changed.
    RefusedSelf,
    /// Both sub-operations are best-effort; each flag reports whether it
    /// took effect (`fraud_added` is false when the record already existed).
    Applied { status_set: bool, fraud_added: bool },
}

/// Granular per-step outcomes of an unblock, so operators can diagnose
/// partial failure instead of getting a single boolean.
#[derive(Clone, Debug, Serialize)]
pub struct UnblockReport {
    pub status_deleted: bool,
    pub fraud_deleted: bool,
    /// `Some(outcome)` when residue forced a second batch-delete pass.
    pub forced: Option<bool>,
    /// Final verification: neither table contains the id.
    pub clean: bool,
}

/// Read-only presence report for one id.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StatusReport {
    pub in_block_table: bool,
    pub in_fraud_table: bool,
    pub is_blocked: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum BatchOutcome {
    AddedAndBlocked,
    Reasserted,
    Failed(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchEntry {
    pub user_id: String,
    pub outcome: BatchOutcome,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub details: Vec<BatchEntry>,
}

/// Trim an identifier into its stored text form; empty ids carry no meaning.
pub fn normalize_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Block/unblock/fraud-list operations over the store.
///
/// Mutations are best-effort and report granular outcomes; reads propagate
/// store failures as errors so "unavailable" is never mistaken for "absent".
#[derive(Clone)]
pub struct Moderation {
    store: Arc<dyn RelayStore>,
    admin_key: String,
}

impl Moderation {
    pub fn new(store: Arc<dyn RelayStore>, admin_key: String) -> Self {
        Self { store, admin_key }
    }

    /// Set block status and add a fraud record for the target.
    pub fn block(&self, target: &str) -> BlockOutcome {
        if target == self.admin_key {
            return BlockOutcome::RefusedSelf;
        }

        let now = unix_ms_now();
        let status_set = match self.store.set_blocked(target, true, now) {
            Ok(()) => true,
            Err(e) => {
                warn!(target_id = target, error = %e, "block status write failed");
                false
            }
        };
        let fraud_added = match self.store.add_fraud(target, now) {
            Ok(added) => added,
            Err(e) => {
                warn!(target_id = target, error = %e, "fraud record write failed");
                false
            }
        };

        BlockOutcome::Applied {
            status_set,
            fraud_added,
        }
    }

    /// Remove the target from both tables, leaving no trace.
    ///
    /// Delete, verify, and if residue remains run one forced batch-delete
    /// pass and re-verify. The store may suffer partial batch failures, so
    /// the final `clean` flag is what callers should trust.
    pub fn unblock(&self, target: &str) -> UnblockReport {
        let status_deleted = self.store.delete_block(target).unwrap_or_else(|e| {
            warn!(target_id = target, error = %e, "block row delete failed");
            false
        });
        let fraud_deleted = self.store.delete_fraud(target).unwrap_or_else(|e| {
            warn!(target_id = target, error = %e, "fraud row delete failed");
            false
        });

        let residue = self.store.in_block_table(target).unwrap_or(true)
            || self.store.in_fraud_table(target).unwrap_or(true);

        let forced = if residue {
            Some(self.store.purge_subject(target).unwrap_or_else(|e| {
                warn!(target_id = target, error = %e, "forced purge failed");
                false
            }))
        } else {
            None
        };

        let clean = !self.store.in_block_table(target).unwrap_or(true)
            && !self.store.in_fraud_table(target).unwrap_or(true);

        UnblockReport {
            status_deleted,
            fraud_deleted,
            forced,
            clean,
        }
    }

    /// Presence in each table plus the effective blocked flag.
    pub fn check_status(&self, target: &str) -> Result<StatusReport> {
        let in_block_table = self.store.in_block_table(target)?;
        let in_fraud_table = self.store.in_fraud_table(target)?;
        let is_blocked = if in_block_table {
            self.store.is_blocked(target)?
        } else {
            false
        };

        Ok(StatusReport {
            in_block_table,
            in_fraud_table,
            is_blocked,
        })
    }

    /// Add each id to the fraud list and block it; idempotent per id.
    ///
    /// Ids are processed in order, without deduplication: a repeated id is
    /// reported once as added and once as reasserted. Failure of one id
    /// never aborts the rest.
    pub fn add_fraud_batch(&self, ids: &[String]) -> BatchReport {
        let now = unix_ms_now();
        let mut details = Vec::new();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for raw in ids {
            let Some(id) = normalize_id(raw) else {
                continue;
            };

            let outcome = match self.store.in_fraud_table(&id) {
                Ok(false) => self
                    .store
                    .add_fraud(&id, now)
                    .and_then(|_| self.store.set_blocked(&id, true, now))
                    .map(|()| BatchOutcome::AddedAndBlocked)
                    .unwrap_or_else(|e| BatchOutcome::Failed(e.to_string())),
                Ok(true) => self
                    .store
                    .set_blocked(&id, true, now)
                    .map(|()| BatchOutcome::Reasserted)
                    .unwrap_or_else(|e| BatchOutcome::Failed(e.to_string())),
                Err(e) => BatchOutcome::Failed(e.to_string()),
            };

            match outcome {
                BatchOutcome::Failed(_) => failed += 1,
                _ => succeeded += 1,
            }
            details.push(BatchEntry {
                user_id: id,
                outcome,
            });
        }

        BatchReport {
            total: details.len(),
            succeeded,
            failed,
            details,
        }
    }
}
