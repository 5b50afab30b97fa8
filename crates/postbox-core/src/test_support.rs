//! In-memory doubles for the store and relay ports, shared by the unit
//! tests in this crate. The real SQLite store has its own tests in
//! `postbox-store`.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicI32, Ordering},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    relay::{port::RelayPort, types::OutboundPayload},
    store::{FraudUser, RelayStore, StoreStats},
    Error, Result,
};

#[derive(Default)]
pub struct MemoryStore {
    routes: Mutex<HashMap<i32, (String, i64)>>,
    blocks: Mutex<HashMap<String, (bool, i64)>>,
    fraud: Mutex<Vec<(String, i64)>>,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl MemoryStore {
    fn write_guard(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Store("simulated store failure".to_string()));
        }
        Ok(())
    }

    fn read_guard(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Store("simulated store failure".to_string()));
        }
        Ok(())
    }

    pub fn routes_len(&self) -> usize {
        self.routes.lock().unwrap().len()
    }
}

impl RelayStore for MemoryStore {
    fn record_route(&self, relayed: MessageId, origin_chat: &str, now_ms: i64) -> Result<()> {
        self.write_guard()?;
        self.routes
            .lock()
            .unwrap()
            .insert(relayed.0, (origin_chat.to_string(), now_ms));
        Ok(())
    }

    fn lookup_route(&self, relayed: MessageId) -> Result<Option<String>> {
        self.read_guard()?;
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&relayed.0)
            .map(|(chat, _)| chat.clone()))
    }

    fn prune_routes_before(&self, cutoff_ms: i64) -> Result<u64> {
        self.write_guard()?;
        let mut routes = self.routes.lock().unwrap();
        let before = routes.len();
        routes.retain(|_, (_, created)| *created >= cutoff_ms);
        Ok((before - routes.len()) as u64)
    }

    fn set_blocked(&self, chat_id: &str, blocked: bool, now_ms: i64) -> Result<()> {
        self.write_guard()?;
        let mut blocks = self.blocks.lock().unwrap();
        if blocked {
            blocks.insert(chat_id.to_string(), (true, now_ms));
        } else {
            blocks.remove(chat_id);
        }
        Ok(())
    }

    fn is_blocked(&self, chat_id: &str) -> Result<bool> {
        self.read_guard()?;
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .get(chat_id)
            .map(|(b, _)| *b)
            .unwrap_or(false))
    }

    fn in_block_table(&self, chat_id: &str) -> Result<bool> {
        Ok(self.blocks.lock().unwrap().contains_key(chat_id))
    }

    fn delete_block(&self, chat_id: &str) -> Result<bool> {
        self.write_guard()?;
        self.blocks.lock().unwrap().remove(chat_id);
        Ok(true)
    }

    fn prune_unblocked_before(&self, cutoff_ms: i64) -> Result<u64> {
        self.write_guard()?;
        let mut blocks = self.blocks.lock().unwrap();
        let before = blocks.len();
        blocks.retain(|_, (blocked, updated)| *blocked || *updated >= cutoff_ms);
        Ok((before - blocks.len()) as u64)
    }

    fn add_fraud(&self, user_id: &str, now_ms: i64) -> Result<bool> {
        self.write_guard()?;
        let mut fraud = self.fraud.lock().unwrap();
        if fraud.iter().any(|(id, _)| id == user_id) {
            return Ok(false);
        }
        fraud.push((user_id.to_string(), now_ms));
        Ok(true)
    }

    fn in_fraud_table(&self, user_id: &str) -> Result<bool> {
        Ok(self
            .fraud
            .lock()
            .unwrap()
            .iter()
            .any(|(id, _)| id == user_id))
    }

    fn delete_fraud(&self, user_id: &str) -> Result<bool> {
        self.write_guard()?;
        self.fraud.lock().unwrap().retain(|(id, _)| id != user_id);
        Ok(true)
    }

    fn list_fraud(&self, search: Option<&str>, limit: u32) -> Result<Vec<FraudUser>> {
        let blocks = self.blocks.lock().unwrap();
        let mut rows: Vec<FraudUser> = self
            .fraud
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| search.map(|s| id.contains(s)).unwrap_or(true))
            .map(|(id, created)| FraudUser {
                user_id: id.clone(),
                created_at: *created,
                blocked: blocks.get(id).map(|(b, _)| *b).unwrap_or(false),
            })
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    fn fraud_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .fraud
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn purge_subject(&self, user_id: &str) -> Result<bool> {
        self.write_guard()?;
        self.blocks.lock().unwrap().remove(user_id);
        self.fraud.lock().unwrap().retain(|(id, _)| id != user_id);
        Ok(true)
    }

    fn stats(&self, now_ms: i64) -> Result<StoreStats> {
        let day_start = now_ms - now_ms.rem_euclid(86_400_000);
        let routes = self.routes.lock().unwrap();
        let blocks = self.blocks.lock().unwrap();
        let fraud = self.fraud.lock().unwrap();

        Ok(StoreStats {
            fraud_users: fraud.len() as u64,
            blocked_active: blocks.values().filter(|(b, _)| *b).count() as u64,
            blocked_total: blocks.len() as u64,
            routes: routes.len() as u64,
            fraud_added_today: fraud.iter().filter(|(_, c)| *c >= day_start).count() as u64,
            oldest_route_ms: routes.values().map(|(_, c)| *c).min(),
            newest_route_ms: routes.values().map(|(_, c)| *c).max(),
        })
    }

    fn compact(&self) -> Result<()> {
        Ok(())
    }
}

/// What the mock relay was asked to do, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SentItem {
    Text { chat: i64, text: String },
    Forward { to: i64, from: i64, message_id: i32 },
    Deliver { chat: i64, kind: &'static str, text: Option<String> },
}

#[derive(Default)]
pub struct MockRelay {
    pub sent: Mutex<Vec<SentItem>>,
    next_id: AtomicI32,
    pub fail_forward: AtomicBool,
    pub fail_deliver: AtomicBool,
}

impl MockRelay {
    pub fn set_next_id(&self, id: i32) {
        self.next_id.store(id, Ordering::SeqCst);
    }

    fn assign_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn sent_items(&self) -> Vec<SentItem> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayPort for MockRelay {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.sent.lock().unwrap().push(SentItem::Text {
            chat: chat_id.0,
            text: text.to_string(),
        });
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(self.assign_id()),
        })
    }

    async fn forward(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef> {
        if self.fail_forward.load(Ordering::SeqCst) {
            return Err(Error::Platform("forward failed".to_string()));
        }
        self.sent.lock().unwrap().push(SentItem::Forward {
            to: to.0,
            from: from.0,
            message_id: message_id.0,
        });
        Ok(MessageRef {
            chat_id: to,
            message_id: MessageId(self.assign_id()),
        })
    }

    async fn deliver(&self, chat_id: ChatId, payload: &OutboundPayload) -> Result<MessageRef> {
        if self.fail_deliver.load(Ordering::SeqCst) {
            return Err(Error::Platform("delivery failed".to_string()));
        }
        self.sent.lock().unwrap().push(SentItem::Deliver {
            chat: chat_id.0,
            kind: payload.attachment.kind(),
            text: payload.text.clone(),
        });
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(self.assign_id()),
        })
    }

    async fn register_webhook(&self, _url: &str, _secret: &str) -> Result<()> {
        Ok(())
    }
}

/// A small, fully-populated configuration for unit tests.
pub fn test_config() -> crate::config::Config {
    crate::config::Config {
        bot_token: "123:test-token".to_string(),
        webhook_secret: "hook-secret".to_string(),
        admin_chat_id: 42,
        admin_password: "hunter2".to_string(),
        public_url: Some("https://relay.example".to_string()),
        bind_addr: ([127, 0, 0, 1], 0).into(),
        db_path: "/tmp/unused.db".into(),
        retention_days: 30,
        stale_block_days: 7,
        sweep_probability: 0.01,
        sweep_block_cleanup_threshold: 100,
        batch_limit: 1000,
        welcome_text: "Welcome! Send a message here and it will be relayed to the administrator."
            .to_string(),
        blocked_text: "You are blocked from contacting the administrator.".to_string(),
    }
}
