use rusqlite::{params, OptionalExtension};

use postbox_core::{domain::MessageId, Result};

use crate::database::{db_err, Store};

impl Store {
    pub(crate) fn insert_route(
        &self,
        relayed: MessageId,
        origin_chat: &str,
        now_ms: i64,
    ) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO msg_map (message_id, chat_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![relayed.0, origin_chat, now_ms],
            )
            .map_err(db_err)?;
        Ok(())
    }

    pub(crate) fn select_route(&self, relayed: MessageId) -> Result<Option<String>> {
        self.conn()
            .query_row(
                "SELECT chat_id FROM msg_map WHERE message_id = ?1",
                params![relayed.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
    }

    pub(crate) fn delete_routes_before(&self, cutoff_ms: i64) -> Result<u64> {
        let deleted = self
            .conn()
            .execute(
                "DELETE FROM msg_map WHERE created_at < ?1",
                params![cutoff_ms],
            )
            .map_err(db_err)?;
        Ok(deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_round_trip_replaces_on_conflict() {
        let store = Store::open_in_memory().unwrap();

        store.insert_route(MessageId(1), "111", 10).unwrap();
        store.insert_route(MessageId(1), "222", 20).unwrap();

        assert_eq!(
            store.select_route(MessageId(1)).unwrap().as_deref(),
            Some("222")
        );
        assert_eq!(store.select_route(MessageId(9)).unwrap(), None);
    }

    #[test]
    fn pruning_is_strictly_older_than_cutoff() {
        let store = Store::open_in_memory().unwrap();
        store.insert_route(MessageId(1), "a", 99).unwrap();
        store.insert_route(MessageId(2), "b", 100).unwrap();
        store.insert_route(MessageId(3), "c", 101).unwrap();

        assert_eq!(store.delete_routes_before(100).unwrap(), 1);
        assert_eq!(store.select_route(MessageId(1)).unwrap(), None);
        assert!(store.select_route(MessageId(2)).unwrap().is_some());
        assert!(store.select_route(MessageId(3)).unwrap().is_some());
    }
}
