//! Telegram Bot API notifier. One form-encoded POST to `sendMessage` per
//! alert, MarkdownV2 formatting, no retry. Missing credentials degrade every
//! send to an explicit, logged no-op so the rest of the run is unaffected.

use std::time::Duration;

use chrono::DateTime;
use reqwest::Client;

use crate::config::TelegramConfig;
use crate::error::Error;
use crate::notify::{Alert, Delivery, Notify};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const TONSCAN_TX_BASE: &str = "https://tonscan.org/tx";

pub struct TelegramNotifier {
    /// `(token, chat_id)` when both are configured.
    credentials: Option<(String, String)>,
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            credentials: Some((token, chat_id)),
            client: Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Build from configuration; incomplete credentials yield a notifier
    /// whose sends are skipped.
    pub fn from_config(cfg: &TelegramConfig) -> Self {
        let credentials = match (&cfg.token, &cfg.chat_id) {
            (Some(t), Some(c)) => Some((t.clone(), c.clone())),
            _ => None,
        };
        Self {
            credentials,
            client: Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: String) -> Self {
        self.api_base = base;
        self
    }
}

#[async_trait::async_trait]
impl Notify for TelegramNotifier {
    async fn notify(&self, alert: &Alert) -> Result<Delivery, Error> {
        let Some((token, chat_id)) = &self.credentials else {
            tracing::error!("telegram credentials not set, notification skipped");
            return Ok(Delivery::Skipped);
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let text = render_alert(alert);
        let params = [
            ("chat_id", chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "MarkdownV2"),
        ];

        self.client
            .post(&url)
            .timeout(self.timeout)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Notify(format!("telegram request: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Notify(format!("telegram status: {e}")))?;

        tracing::info!("telegram notification sent");
        Ok(Delivery::Sent)
    }
}

/// Escape a string for MarkdownV2 plain text.
pub fn escape_markdown_v2(s: &str) -> String {
    const RESERVED: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
        '\\',
    ];
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape for the inside of a MarkdownV2 code entity (backtick span), where
/// only backtick and backslash are special.
fn escape_code(s: &str) -> String {
    s.replace('\\', "\\\\").replace('`', "\\`")
}

/// Escape for the URL part of a MarkdownV2 inline link.
fn escape_url(s: &str) -> String {
    s.replace('\\', "\\\\").replace(')', "\\)")
}

fn short(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Render an alert as MarkdownV2 text, matching the wording the deployed
/// trackers sent.
pub fn render_alert(alert: &Alert) -> String {
    match alert {
        Alert::Gift { id } => format!(
            "\u{1F389} *NEW TELEGRAM GIFT DETECTED* \u{1F389}\n\
             \u{2022} ID: `{}`\n\n\
             Check the repository for updated data\\.",
            escape_code(id)
        ),
        Alert::Transaction { hash, account } => format!(
            "\u{1F381} *NEW NFT GIFT ALERT\\!* \u{1F381}\n\n\
             *Item:* Telegram Collectible Gift \\(TX: {}\\.\\.\\.\\)\n\
             *Transaction:* [`{}`]({}/{})\n\
             *Account:* `{}\\.\\.\\.`\n\n\
             _Check the link above for details\\._",
            escape_markdown_v2(&short(hash, 6)),
            escape_code(hash),
            TONSCAN_TX_BASE,
            escape_url(hash),
            escape_code(&short(account, 8))
        ),
        Alert::Transfer {
            tx_hash,
            account,
            timestamp,
            nft,
        } => {
            let when = DateTime::from_timestamp(*timestamp as i64, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| timestamp.to_string());
            let item = match nft {
                Some(addr) => format!("`{}`", escape_code(addr)),
                None => "unknown".to_string(),
            };
            format!(
                "\u{1F381} *NEW NFT TRANSFER* \u{1F381}\n\n\
                 *Item:* {}\n\
                 *Transaction:* [`{}`]({}/{})\n\
                 *Account:* `{}\\.\\.\\.`\n\
                 *When:* {}",
                item,
                escape_code(tx_hash),
                TONSCAN_TX_BASE,
                escape_url(tx_hash),
                escape_code(&short(account, 8)),
                escape_markdown_v2(&when)
            )
        }
    }
}
