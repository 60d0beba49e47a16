pub mod telegram;

use crate::error::Error;

/// One detected addition, carrying only what message rendering needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// New key in the gift catalog.
    Gift { id: String },
    /// New transaction on the monitored account.
    Transaction { hash: String, account: String },
    /// New NFT transfer on the monitored account.
    Transfer {
        tx_hash: String,
        account: String,
        timestamp: u64,
        nft: Option<String>,
    },
}

/// Whether a notification actually went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Credentials missing: the explicit no-op branch, logged and skipped.
    Skipped,
}

#[async_trait::async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, alert: &Alert) -> Result<Delivery, Error>;
}
