//! SQLite persistence for the relay bot: the routing table, the block
//! list and the fraud list, behind the `RelayStore` port.

mod blocks;
mod database;
mod fraud;
mod routing;
mod stats;

pub use database::Store;

use postbox_core::{
    domain::MessageId,
    store::{FraudUser, RelayStore, StoreStats},
    Result,
};

impl RelayStore for Store {
    fn record_route(&self, relayed: MessageId, origin_chat: &str, now_ms: i64) -> Result<()> {
        self.insert_route(relayed, origin_chat, now_ms)
    }

    fn lookup_route(&self, relayed: MessageId) -> Result<Option<String>> {
        self.select_route(relayed)
    }

    fn prune_routes_before(&self, cutoff_ms: i64) -> Result<u64> {
        self.delete_routes_before(cutoff_ms)
    }

    fn set_blocked(&self, chat_id: &str, blocked: bool, now_ms: i64) -> Result<()> {
        if blocked {
            self.upsert_block(chat_id, now_ms)
        } else {
            self.remove_block(chat_id).map(|_| ())
        }
    }

    fn is_blocked(&self, chat_id: &str) -> Result<bool> {
        self.block_flag(chat_id)
    }

    fn in_block_table(&self, chat_id: &str) -> Result<bool> {
        self.block_row_exists(chat_id)
    }

    fn delete_block(&self, chat_id: &str) -> Result<bool> {
        self.remove_block(chat_id)
    }

    fn prune_unblocked_before(&self, cutoff_ms: i64) -> Result<u64> {
        self.delete_unblocked_before(cutoff_ms)
    }

    fn add_fraud(&self, user_id: &str, now_ms: i64) -> Result<bool> {
        self.insert_fraud(user_id, now_ms)
    }

    fn in_fraud_table(&self, user_id: &str) -> Result<bool> {
        self.fraud_row_exists(user_id)
    }

    fn delete_fraud(&self, user_id: &str) -> Result<bool> {
        self.remove_fraud(user_id)
    }

    fn list_fraud(&self, search: Option<&str>, limit: u32) -> Result<Vec<FraudUser>> {
        self.select_fraud(search, limit)
    }

    fn fraud_ids(&self) -> Result<Vec<String>> {
        self.select_fraud_ids()
    }

    fn purge_subject(&self, user_id: &str) -> Result<bool> {
        self.purge_both_tables(user_id)
    }

    fn stats(&self, now_ms: i64) -> Result<StoreStats> {
        self.collect_stats(now_ms)
    }

    fn compact(&self) -> Result<()> {
        self.vacuum()
    }
}
