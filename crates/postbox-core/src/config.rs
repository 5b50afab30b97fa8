use std::{env, fs, net::SocketAddr, path::Path, path::PathBuf};

use crate::{errors::Error, Result};

/// Typed configuration for the relay bot.
///
/// Constructed once in `main` and threaded as a parameter through every
/// operation; there are no hidden statics.
#[derive(Clone, Debug)]
pub struct Config {
    // Platform
    pub bot_token: String,
    pub webhook_secret: String,
    pub admin_chat_id: i64,

    // Admin console
    pub admin_password: String,
    pub public_url: Option<String>,

    // HTTP + storage
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,

    // Maintenance sweep
    pub retention_days: i64,
    pub stale_block_days: i64,
    pub sweep_probability: f64,
    pub sweep_block_cleanup_threshold: u64,

    // Admin API limits
    pub batch_limit: usize,

    // Canned user-facing texts
    pub welcome_text: String,
    pub blocked_text: String,
}

const DEFAULT_WELCOME: &str =
    "Welcome! Send a message here and it will be relayed to the administrator.";
const DEFAULT_BLOCKED: &str = "You are blocked from contacting the administrator.";

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let webhook_secret = env_str("BOT_SECRET").unwrap_or_default();
        if webhook_secret.trim().is_empty() {
            return Err(Error::Config(
                "BOT_SECRET environment variable is required".to_string(),
            ));
        }

        let admin_chat_id = env_str("ADMIN_UID")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                Error::Config("ADMIN_UID environment variable is required (numeric)".to_string())
            })?;

        let admin_password = env_str("ADMIN_PASSWORD").and_then(non_empty).ok_or_else(|| {
            Error::Config("ADMIN_PASSWORD environment variable is required".to_string())
        })?;

        let bind_addr = env_str("BIND_ADDR")
            .and_then(|s| s.trim().parse::<SocketAddr>().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let public_url = env_str("PUBLIC_URL")
            .and_then(non_empty)
            .map(|u| u.trim_end_matches('/').to_string());

        let db_path = env_path("DB_PATH").unwrap_or_else(|| PathBuf::from("postbox.db"));

        let retention_days = env_i64("RETENTION_DAYS").unwrap_or(30).max(1);
        let stale_block_days = env_i64("STALE_BLOCK_DAYS").unwrap_or(7).max(1);
        let sweep_probability = env_f64("SWEEP_PROBABILITY").unwrap_or(0.01).clamp(0.0, 1.0);
        let sweep_block_cleanup_threshold =
            env_u64("SWEEP_BLOCK_CLEANUP_THRESHOLD").unwrap_or(100);

        let batch_limit = env_usize("BATCH_LIMIT").unwrap_or(1000).max(1);

        let welcome_text = env_str("WELCOME_TEXT")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_WELCOME.to_string());
        let blocked_text = env_str("BLOCKED_TEXT")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_BLOCKED.to_string());

        Ok(Self {
            bot_token,
            webhook_secret,
            admin_chat_id,
            admin_password,
            public_url,
            bind_addr,
            db_path,
            retention_days,
            stale_block_days,
            sweep_probability,
            sweep_block_cleanup_threshold,
            batch_limit,
            welcome_text,
            blocked_text,
        })
    }

    /// The admin chat id in the text form used as a store key.
    pub fn admin_key(&self) -> String {
        self.admin_chat_id.to_string()
    }

    /// URL of the admin console, if a public URL is configured.
    pub fn console_url(&self) -> Option<String> {
        self.public_url.as_ref().map(|u| format!("{u}/admin"))
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    env_str(key).and_then(|s| s.trim().parse::<f64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
