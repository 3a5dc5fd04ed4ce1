use std::{collections::HashSet, num::NonZeroUsize, path::PathBuf, time::Duration};

use crate::{
    broadcast::{BroadcastOptions, Cadence},
    domain::ChatId,
    errors::Error,
    transport::throttled::ThrottleConfig,
    Result,
};

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub admin_ids: Vec<i64>,
    pub log_channel_id: ChatId,
    pub channel_username: String,
    pub welcome_image_file_id: Option<String>,

    // Storage
    pub db_path: PathBuf,

    // Broadcast
    pub progress_every: Cadence,
    pub broadcast_concurrency: NonZeroUsize,
    pub broadcast_timeout: Option<Duration>,
    pub broadcast_include_admins: bool,

    // Flood control
    pub throttle: ThrottleConfig,

    // Health check (`None` disables the endpoint)
    pub health_port: Option<u16>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Existing env vars win over `.env` entries.
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_str = |key: &str| lookup(key).map(|s| s.trim().to_string()).and_then(non_empty);

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;

        let admin_ids = parse_csv_i64(
            "ADMIN_IDS",
            env_str("ADMIN_IDS")
                .ok_or_else(|| Error::Config("ADMIN_IDS environment variable is required".to_string()))?,
        )?;
        if admin_ids.is_empty() {
            return Err(Error::Config("ADMIN_IDS must list at least one user id".to_string()));
        }

        let log_channel_id = env_str("LOG_CHANNEL_ID")
            .ok_or_else(|| Error::Config("LOG_CHANNEL_ID environment variable is required".to_string()))
            .and_then(|s| parse_num::<i64>("LOG_CHANNEL_ID", &s))
            .map(ChatId)?;

        let channel_username =
            env_str("CHANNEL_USERNAME").unwrap_or_else(|| "@your_channel".to_string());
        let welcome_image_file_id = env_str("WELCOME_IMAGE_FILE_ID");

        let db_path = PathBuf::from(env_str("DB_NAME").unwrap_or_else(|| "news_bot.db".to_string()));

        // Broadcast tuning
        let progress_every = match env_str("BROADCAST_PROGRESS_EVERY") {
            Some(s) => Cadence::new(parse_num("BROADCAST_PROGRESS_EVERY", &s)?).ok_or_else(|| {
                Error::Config("BROADCAST_PROGRESS_EVERY must be at least 1".to_string())
            })?,
            None => Cadence::default(),
        };
        let broadcast_concurrency = match env_str("BROADCAST_CONCURRENCY") {
            Some(s) => NonZeroUsize::new(parse_num("BROADCAST_CONCURRENCY", &s)?).ok_or_else(
                || Error::Config("BROADCAST_CONCURRENCY must be at least 1".to_string()),
            )?,
            None => NonZeroUsize::MIN,
        };
        let broadcast_timeout = env_str("BROADCAST_TIMEOUT_SECS")
            .map(|s| parse_num::<u64>("BROADCAST_TIMEOUT_SECS", &s))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let broadcast_include_admins = env_str("BROADCAST_INCLUDE_ADMINS")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        // Flood control
        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: env_str("THROTTLE_GLOBAL_MS")
                .map(|s| parse_num::<u64>("THROTTLE_GLOBAL_MS", &s))
                .transpose()?
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: env_str("THROTTLE_PER_CHAT_MS")
                .map(|s| parse_num::<u64>("THROTTLE_PER_CHAT_MS", &s))
                .transpose()?
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        let health_port = match env_str("HEALTH_PORT") {
            Some(s) => Some(parse_num::<u16>("HEALTH_PORT", &s)?),
            None => Some(8000),
        }
        .filter(|p| *p != 0);

        Ok(Self {
            telegram_bot_token,
            admin_ids,
            log_channel_id,
            channel_username,
            welcome_image_file_id,
            db_path,
            progress_every,
            broadcast_concurrency,
            broadcast_timeout,
            broadcast_include_admins,
            throttle,
            health_port,
        })
    }

    /// Options for a broadcast triggered by an admin.
    ///
    /// Admin private chats share the admin's user id, so excluding those ids keeps
    /// the operators from receiving their own posts.
    pub fn broadcast_options(&self) -> BroadcastOptions {
        let exclude: HashSet<ChatId> = if self.broadcast_include_admins {
            HashSet::new()
        } else {
            self.admin_ids.iter().copied().map(ChatId).collect()
        };
        BroadcastOptions {
            cadence: self.progress_every,
            concurrency: self.broadcast_concurrency,
            exclude,
            deadline: self.broadcast_timeout,
        }
    }

    /// `CHANNEL_USERNAME` without a leading `@`, for `t.me` links.
    pub fn channel_handle(&self) -> &str {
        self.channel_username.trim_start_matches('@')
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{key} is not a valid number: {raw:?}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv_i64(key: &str, v: String) -> Result<Vec<i64>> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| parse_num::<i64>(key, s))
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
