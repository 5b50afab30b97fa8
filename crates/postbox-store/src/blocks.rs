use rusqlite::{params, OptionalExtension};

use postbox_core::Result;

use crate::database::{db_err, Store};

impl Store {
    pub(crate) fn upsert_block(&self, chat_id: &str, now_ms: i64) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO blocked_users (chat_id, is_blocked, updated_at)
                 VALUES (?1, 1, ?2)
                 ON CONFLICT(chat_id)
                 DO UPDATE SET is_blocked = 1, updated_at = excluded.updated_at",
                params![chat_id, now_ms],
            )
            .map_err(db_err)?;
        Ok(())
    }

    pub(crate) fn block_flag(&self, chat_id: &str) -> Result<bool> {
        let flag: Option<i64> = self
            .conn()
            .query_row(
                "SELECT is_blocked FROM blocked_users WHERE chat_id = ?1",
                params![chat_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(flag == Some(1))
    }

    pub(crate) fn block_row_exists(&self, chat_id: &str) -> Result<bool> {
        self.conn()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM blocked_users WHERE chat_id = ?1)",
                params![chat_id],
                |row| row.get(0),
            )
            .map_err(db_err)
    }

    /// Delete and confirm: true means the table no longer holds the id.
    pub(crate) fn remove_block(&self, chat_id: &str) -> Result<bool> {
        self.conn()
            .execute(
                "DELETE FROM blocked_users WHERE chat_id = ?1",
                params![chat_id],
            )
            .map_err(db_err)?;
        Ok(!self.block_row_exists(chat_id)?)
    }

    pub(crate) fn delete_unblocked_before(&self, cutoff_ms: i64) -> Result<u64> {
        let deleted = self
            .conn()
            .execute(
                "DELETE FROM blocked_users WHERE is_blocked = 0 AND updated_at < ?1",
                params![cutoff_ms],
            )
            .map_err(db_err)?;
        Ok(deleted as u64)
    }
}
