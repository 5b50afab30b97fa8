use rusqlite::params;

use postbox_core::{store::FraudUser, Result};

use crate::database::{db_err, Store};

/// Escape LIKE metacharacters so a search term only ever matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Store {
    pub(crate) fn insert_fraud(&self, user_id: &str, now_ms: i64) -> Result<bool> {
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO fraud_users (user_id, created_at) VALUES (?1, ?2)",
                params![user_id, now_ms],
            )
            .map_err(db_err)?;
        Ok(inserted == 1)
    }

    pub(crate) fn fraud_row_exists(&self, user_id: &str) -> Result<bool> {
        self.conn()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM fraud_users WHERE user_id = ?1)",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(db_err)
    }

    pub(crate) fn remove_fraud(&self, user_id: &str) -> Result<bool> {
        self.conn()
            .execute("DELETE FROM fraud_users WHERE user_id = ?1", params![user_id])
            .map_err(db_err)?;
        Ok(!self.fraud_row_exists(user_id)?)
    }

    /// Fraud rows newest first, left-joined with effective block status.
    /// The search term is bound as a parameter, never spliced into SQL.
    pub(crate) fn select_fraud(&self, search: Option<&str>, limit: u32) -> Result<Vec<FraudUser>> {
        let conn = self.conn();
        let mut out = Vec::new();

        let base = "SELECT f.user_id, f.created_at,
                           COALESCE(b.is_blocked, 0)
                    FROM fraud_users f
                    LEFT JOIN blocked_users b ON b.chat_id = f.user_id";
        let row_of = |row: &rusqlite::Row<'_>| {
            Ok(FraudUser {
                user_id: row.get(0)?,
                created_at: row.get(1)?,
                blocked: row.get::<_, i64>(2)? == 1,
            })
        };

        match search {
            Some(term) if !term.trim().is_empty() => {
                let pattern = format!("%{}%", escape_like(term.trim()));
                let sql = format!(
                    "{base} WHERE f.user_id LIKE ?1 ESCAPE '\\'
                     ORDER BY f.created_at DESC LIMIT ?2"
                );
                let mut stmt = conn.prepare(&sql).map_err(db_err)?;
                let rows = stmt
                    .query_map(params![pattern, limit], row_of)
                    .map_err(db_err)?;
                for row in rows {
                    out.push(row.map_err(db_err)?);
                }
            }
            _ => {
                let sql = format!("{base} ORDER BY f.created_at DESC LIMIT ?1");
                let mut stmt = conn.prepare(&sql).map_err(db_err)?;
                let rows = stmt.query_map(params![limit], row_of).map_err(db_err)?;
                for row in rows {
                    out.push(row.map_err(db_err)?);
                }
            }
        }
        Ok(out)
    }

    pub(crate) fn select_fraud_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT user_id FROM fraud_users ORDER BY created_at DESC")
            .map_err(db_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(db_err)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(db_err)?);
        }
        Ok(out)
    }

    /// Delete the block and fraud rows together, then verify both are gone.
    pub(crate) fn purge_both_tables(&self, user_id: &str) -> Result<bool> {
        {
            let mut conn = self.conn();
            let tx = conn.transaction().map_err(db_err)?;
            tx.execute(
                "DELETE FROM blocked_users WHERE chat_id = ?1",
                params![user_id],
            )
            .map_err(db_err)?;
            tx.execute(
                "DELETE FROM fraud_users WHERE user_id = ?1",
                params![user_id],
            )
            .map_err(db_err)?;
            tx.commit().map_err(db_err)?;
        }
        Ok(!self.block_row_exists(user_id)? && !self.fraud_row_exists(user_id)?)
    }
}
