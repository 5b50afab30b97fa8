use serde::Serialize;

use crate::{domain::MessageId, Result};

/// One fraud-list row as listed by the console, left-joined with block
/// status (`blocked` is false when no block row exists).
#[derive(Clone, Debug, Serialize)]
pub struct FraudUser {
    pub user_id: String,
    pub created_at: i64,
    pub blocked: bool,
}

/// Aggregate counters for the stats/debug endpoints.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StoreStats {
    pub fraud_users: u64,
    pub blocked_active: u64,
    pub blocked_total: u64,
    pub routes: u64,
    pub fraud_added_today: u64,
    pub oldest_route_ms: Option<i64>,
    pub newest_route_ms: Option<i64>,
}

/// Persistence port over the three relay tables.
///
/// All identifiers are text keys; all timestamps are unix milliseconds
/// supplied by the caller. Implementations must not cache: every read goes
/// to the store.
pub trait RelayStore: Send + Sync {
    // ---- routing table ----

    /// Insert-or-replace the mapping from a relayed message id to the
    /// originating chat key.
    fn record_route(&self, relayed: MessageId, origin_chat: &str, now_ms: i64) -> Result<()>;

    /// Originating chat key for a relayed message id, if tracked.
    fn lookup_route(&self, relayed: MessageId) -> Result<Option<String>>;

    /// Delete routing entries strictly older than the cutoff; returns the
    /// number of rows deleted. An entry exactly at the cutoff is retained.
    fn prune_routes_before(&self, cutoff_ms: i64) -> Result<u64>;

    // ---- block table ----

    /// `true` upserts an active block row; `false` removes the row entirely
    /// (absence means "not blocked", so there is nothing to keep).
    fn set_blocked(&self, chat_id: &str, blocked: bool, now_ms: i64) -> Result<()>;

    /// Effective blocked flag; false when no row exists.
    fn is_blocked(&self, chat_id: &str) -> Result<bool>;

    /// Row presence, regardless of the flag value.
    fn in_block_table(&self, chat_id: &str) -> Result<bool>;

    /// Delete the block row and verify it is gone. Returns true when the
    /// table no longer contains the id (including "was never there").
    fn delete_block(&self, chat_id: &str) -> Result<bool>;

    /// Delete rows with `is_blocked = 0` older than the cutoff.
    fn prune_unblocked_before(&self, cutoff_ms: i64) -> Result<u64>;

    // ---- fraud table ----

    /// Insert the id if absent. Returns true when a row was inserted.
    fn add_fraud(&self, user_id: &str, now_ms: i64) -> Result<bool>;

    fn in_fraud_table(&self, user_id: &str) -> Result<bool>;

    /// Delete the fraud row and verify it is gone (same contract as
    /// [`RelayStore::delete_block`]).
    fn delete_fraud(&self, user_id: &str) -> Result<bool>;

    /// Fraud rows newest first, left-joined with block status. The search
    /// term is matched as a substring, bound as a parameter.
    fn list_fraud(&self, search: Option<&str>, limit: u32) -> Result<Vec<FraudUser>>;

    /// All fraud ids newest first, for export.
    fn fraud_ids(&self) -> Result<Vec<String>>;

    // ---- cross-table ----

    /// Forced batch delete of both the block and fraud rows in one
    /// transaction, then verify. Returns true when both tables are clean.
    fn purge_subject(&self, user_id: &str) -> Result<bool>;

    fn stats(&self, now_ms: i64) -> Result<StoreStats>;

    /// Storage compaction (VACUUM). Callers tolerate failure.
    fn compact(&self) -> Result<()>;
}
