//! Process configuration, read once at startup and passed by reference.
//!
//! Every knob comes from the environment (after `dotenvy::dotenv()` in the
//! binary). Missing Telegram credentials are not an error here: the notifier
//! degrades to an explicit no-op so a run can still fetch and persist state.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

pub const DEFAULT_GIFT_API_URL: &str = "http://cdn.changes.tg/gifts";
pub const DEFAULT_TON_API_URL: &str = "https://tonapi.io";
const DEFAULT_FETCH_LIMIT: u32 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Which upstream feed this invocation watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Full gift catalog, diffed by key set.
    Catalog,
    /// Recent account transactions, diffed by last-seen hash.
    Transactions,
    /// Recent NFT transfers, diffed by timestamp watermark.
    NftTransfers,
}

impl FeedMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "catalog" | "gifts" => Some(Self::Catalog),
            "transactions" | "tx" => Some(Self::Transactions),
            "nft-transfers" | "nft_transfers" | "transfers" => Some(Self::NftTransfers),
            _ => None,
        }
    }

    /// State file used when `STATE_FILE` is not set. The catalog and
    /// transaction defaults match the files the original deployment wrote.
    pub fn default_state_file(self) -> &'static str {
        match self {
            Self::Catalog => "gifts_data.json",
            Self::Transactions => "last_checked_hash.txt",
            Self::NftTransfers => "last_transfer_ts.txt",
        }
    }
}

/// Telegram credentials; either may be absent.
#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    pub fn is_complete(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: FeedMode,
    pub gift_api_url: String,
    pub ton_api_url: String,
    pub ton_account: Option<String>,
    pub fetch_limit: u32,
    pub telegram: TelegramConfig,
    pub state_file: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let mode = match std::env::var("FEED_MODE") {
            Ok(raw) => FeedMode::parse(&raw).ok_or(Error::ConfigMissing(
                "FEED_MODE must be catalog, transactions, or nft-transfers",
            ))?,
            Err(_) => FeedMode::Catalog,
        };

        let ton_account = env_nonempty("TON_ACCOUNT_ADDRESS");
        if mode != FeedMode::Catalog && ton_account.is_none() {
            return Err(Error::ConfigMissing("TON_ACCOUNT_ADDRESS"));
        }

        let fetch_limit = std::env::var("TON_FETCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_FETCH_LIMIT);

        let timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let state_file = env_nonempty("STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(mode.default_state_file()));

        // Both historical spellings are accepted; the dedicated name wins.
        let telegram = TelegramConfig {
            token: env_nonempty("TELEGRAM_TOKEN").or_else(|| env_nonempty("BOT_TOKEN")),
            chat_id: env_nonempty("TELEGRAM_CHAT_ID").or_else(|| env_nonempty("CHAT_ID")),
        };

        Ok(Self {
            mode,
            gift_api_url: env_nonempty("GIFT_API_URL")
                .unwrap_or_else(|| DEFAULT_GIFT_API_URL.to_string()),
            ton_api_url: env_nonempty("TON_API_URL")
                .unwrap_or_else(|| DEFAULT_TON_API_URL.to_string()),
            ton_account,
            fetch_limit,
            telegram,
            state_file,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const ALL_VARS: &[&str] = &[
        "FEED_MODE",
        "GIFT_API_URL",
        "TON_API_URL",
        "TON_ACCOUNT_ADDRESS",
        "TON_FETCH_LIMIT",
        "TELEGRAM_TOKEN",
        "BOT_TOKEN",
        "TELEGRAM_CHAT_ID",
        "CHAT_ID",
        "STATE_FILE",
        "HTTP_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for k in ALL_VARS {
            env::remove_var(k);
        }
    }

    #[serial_test::serial]
    #[test]
    fn defaults_to_catalog_mode() {
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.mode, FeedMode::Catalog);
        assert_eq!(cfg.gift_api_url, DEFAULT_GIFT_API_URL);
        assert_eq!(cfg.state_file, PathBuf::from("gifts_data.json"));
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert!(!cfg.telegram.is_complete());
    }

    #[serial_test::serial]
    #[test]
    fn chain_modes_require_account() {
        clear_env();
        env::set_var("FEED_MODE", "transactions");
        assert!(matches!(
            Config::from_env(),
            Err(Error::ConfigMissing("TON_ACCOUNT_ADDRESS"))
        ));

        env::set_var("TON_ACCOUNT_ADDRESS", "EQCabc");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.mode, FeedMode::Transactions);
        assert_eq!(cfg.state_file, PathBuf::from("last_checked_hash.txt"));
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn accepts_both_credential_spellings() {
        clear_env();
        env::set_var("BOT_TOKEN", "t1");
        env::set_var("CHAT_ID", "c1");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.telegram.token.as_deref(), Some("t1"));
        assert_eq!(cfg.telegram.chat_id.as_deref(), Some("c1"));
        assert!(cfg.telegram.is_complete());

        // Dedicated names take precedence over the short ones.
        env::set_var("TELEGRAM_TOKEN", "t2");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.telegram.token.as_deref(), Some("t2"));
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn rejects_unknown_mode() {
        clear_env();
        env::set_var("FEED_MODE", "rss");
        assert!(matches!(Config::from_env(), Err(Error::ConfigMissing(_))));
        clear_env();
    }
}
