use rusqlite::params;

use postbox_core::{store::StoreStats, Result};

use crate::database::{db_err, Store};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

impl Store {
    pub(crate) fn collect_stats(&self, now_ms: i64) -> Result<StoreStats> {
        let conn = self.conn();

        let count = |sql: &str| -> Result<u64> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
                .map_err(db_err)
        };

        let fraud_users = count("SELECT COUNT(*) FROM fraud_users")?;
        let blocked_total = count("SELECT COUNT(*) FROM blocked_users")?;
        let blocked_active =
            count("SELECT COUNT(*) FROM blocked_users WHERE is_blocked = 1")?;
        let routes = count("SELECT COUNT(*) FROM msg_map")?;

        let fraud_added_today: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM fraud_users WHERE created_at >= ?1",
                params![now_ms - DAY_MS],
                |row| row.get(0),
            )
            .map_err(db_err)?;

        let (oldest_route_ms, newest_route_ms): (Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT MIN(created_at), MAX(created_at) FROM msg_map",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(db_err)?;

        Ok(StoreStats {
            fraud_users,
            blocked_active,
            blocked_total,
            routes,
            fraud_added_today: fraud_added_today as u64,
            oldest_route_ms,
            newest_route_ms,
        })
    }

    pub(crate) fn vacuum(&self) -> Result<()> {
        self.conn().execute_batch("VACUUM").map_err(db_err)
    }
}
