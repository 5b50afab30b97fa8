use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::Config,
    domain::ChatId,
    moderation::{BlockOutcome, Moderation},
    relay::{port::RelayPort, types::InboundMessage, types::OutboundPayload},
    store::RelayStore,
    utils::unix_ms_now,
    Result,
};

const USAGE_HINT: &str = "Reply to a relayed message to answer it, or reply with \
/block, /unblock or /checkblock to moderate its sender. /admin opens the console.";

/// Message dispatcher: decides, per inbound message, whether it is a
/// command, an admin reply to relay back, or a guest message to forward.
pub struct Router {
    cfg: Arc<Config>,
    store: Arc<dyn RelayStore>,
    relay: Arc<dyn RelayPort>,
    moderation: Moderation,
}

impl Router {
    pub fn new(cfg: Arc<Config>, store: Arc<dyn RelayStore>, relay: Arc<dyn RelayPort>) -> Self {
        let moderation = Moderation::new(store.clone(), cfg.admin_key());
        Self {
            cfg,
            store,
            relay,
            moderation,
        }
    }

    /// Handle one inbound message end to end.
    ///
    /// Errors returned here are delivery or store failures the caller may
    /// want to log; the decision itself never fails.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        // /start greets everyone, including the admin, before any other rule.
        if parse_command(msg.text.as_deref()) == Some(("start", "")) {
            self.relay
                .send_text(msg.chat_id, &self.cfg.welcome_text)
                .await?;
            return Ok(());
        }

        if msg.chat_id.0 == self.cfg.admin_chat_id {
            self.handle_admin(msg).await
        } else {
            self.handle_guest(msg).await
        }
    }

    async fn handle_admin(&self, msg: &InboundMessage) -> Result<()> {
        if let Some((command, _args)) = parse_command(msg.text.as_deref()) {
            match command {
                "admin" => return self.send_console_link(msg.chat_id).await,
                "cleanup" => return self.run_cleanup(msg.chat_id).await,
                "block" | "unblock" | "checkblock" => {
                    return self.moderate_reply_target(msg, command).await;
                }
                _ => {} // unknown commands fall through to the reply rules
            }
        }

        let Some(reply_to) = msg.reply_to else {
            self.relay.send_text(msg.chat_id, USAGE_HINT).await?;
            return Ok(());
        };

        let Some(guest_key) = self.store.lookup_route(reply_to)? else {
            self.relay
                .send_text(msg.chat_id, "User not found: this message can no longer be routed.")
                .await?;
            return Ok(());
        };
        let guest_chat = parse_chat_key(&guest_key)?;

        let payload = OutboundPayload::from(msg);
        if let Err(e) = self.relay.deliver(guest_chat, &payload).await {
            warn!(guest = %guest_key, error = %e, "reply delivery failed");
            self.relay
                .send_text(
                    msg.chat_id,
                    &format!("Failed to deliver the reply to {guest_key}: {e}"),
                )
                .await?;
        }
        Ok(())
    }

    async fn handle_guest(&self, msg: &InboundMessage) -> Result<()> {
        let guest_key = msg.chat_id.as_key();

        // A store outage must not let a blocked sender through.
        if self.store.is_blocked(&guest_key)? {
            self.relay
                .send_text(msg.chat_id, &self.cfg.blocked_text)
                .await?;
            return Ok(());
        }

        let relayed = self
            .relay
            .forward(ChatId(self.cfg.admin_chat_id), msg.chat_id, msg.message_id)
            .await?;
        self.store
            .record_route(relayed.message_id, &guest_key, unix_ms_now())?;
        info!(guest = %guest_key, relayed_id = relayed.message_id.0, "message forwarded");
        Ok(())
    }

    /// The console is unusable without the password, so the reply carries
    /// both, matching what the operator expects to paste into a browser.
    async fn send_console_link(&self, admin: ChatId) -> Result<()> {
        let text = match self.cfg.console_url() {
            Some(url) => format!(
                "Admin console: {url}\nPassword: {}",
                self.cfg.admin_password
            ),
            None => "Admin console unavailable: no public URL is configured.".to_string(),
        };
        self.relay.send_text(admin, &text).await?;
        Ok(())
    }

    async fn run_cleanup(&self, admin: ChatId) -> Result<()> {
        let now = unix_ms_now();
        let report = crate::sweep::run(&self.cfg, self.store.as_ref(), now);
        let text = match &report.error {
            Some(e) => format!("Cleanup failed: {e}"),
            None => match self.store.stats(now) {
                Ok(stats) => format!(
                    "Cleanup finished: {} routed messages and {} stale block entries removed.\n\
                     Remaining: {} routed messages, {} fraud users, {} blocked users.",
                    report.routes_deleted,
                    report.stale_blocks_deleted,
                    stats.routes,
                    stats.fraud_users,
                    stats.blocked_total
                ),
                Err(e) => format!(
                    "Cleanup finished: {} routed messages and {} stale block entries removed \
                     (stats unavailable: {e}).",
                    report.routes_deleted, report.stale_blocks_deleted
                ),
            },
        };
        self.relay.send_text(admin, &text).await?;
        Ok(())
    }

    /// Resolve the moderation target from the replied-to relayed message,
    /// run the command, and report the outcome back to the admin.
    async fn moderate_reply_target(&self, msg: &InboundMessage, command: &str) -> Result<()> {
        let Some(reply_to) = msg.reply_to else {
            self.relay
                .send_text(
                    msg.chat_id,
                    &format!("/{command} must be sent as a reply to a relayed message."),
                )
                .await?;
            return Ok(());
        };

        let Some(target) = self.store.lookup_route(reply_to)? else {
            self.relay
                .send_text(msg.chat_id, "User not found: this message can no longer be routed.")
                .await?;
            return Ok(());
        };

        let text = match command {
            "block" => match self.moderation.block(&target) {
                BlockOutcome::RefusedSelf => "You cannot block yourself.".to_string(),
                BlockOutcome::Applied { fraud_added, .. } if fraud_added => {
                    format!("User {target} is blocked and recorded on the fraud list.")
                }
                BlockOutcome::Applied { .. } => {
                    format!("User {target} is blocked (already on the fraud list).")
                }
            },
            "unblock" => {
                let report = self.moderation.unblock(&target);
                if report.clean {
                    format!("User {target} is unblocked and removed from the fraud list.")
                } else {
                    format!("User {target} could not be fully unblocked; residue remains.")
                }
            }
            "checkblock" => {
                let status = self.moderation.check_status(&target)?;
                if status.is_blocked {
                    format!("User {target} is currently blocked.")
                } else if status.in_fraud_table {
                    format!("User {target} is not blocked but is on the fraud list.")
                } else {
                    format!("User {target} is not blocked.")
                }
            }
            _ => unreachable!("caller filters commands"),
        };

        self.relay.send_text(msg.chat_id, &text).await?;
        Ok(())
    }
}

/// Split `"/cmd@bot args"` into `("cmd", "args")`. Returns `None` unless the
/// text starts with a slash.
fn parse_command(text: Option<&str>) -> Option<(&str, &str)> {
    let text = text?.trim();
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    // Telegram appends "@botname" in group-style mentions.
    let command = head.split('@').next().unwrap_or(head);
    if command.is_empty() {
        None
    } else {
        Some((command, args))
    }
}

fn parse_chat_key(key: &str) -> Result<ChatId> {
    key.parse::<i64>()
        .map(ChatId)
        .map_err(|_| crate::Error::Store(format!("corrupt chat key in route table: {key:?}")))
}
