//! tonapi v2 client for the monitored account: recent transactions and
//! recent NFT transfers. Both endpoints return a short newest-first window;
//! ordering is re-derived downstream, never trusted.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::Error;
use crate::feed::{TransactionFeed, TransferFeed};
use crate::reconcile::Ordered;

/// One account transaction from `blockchain/accounts/{account}/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxRecord {
    pub hash: String,
    /// Logical time, the chain's own ordering.
    #[serde(default)]
    pub lt: u64,
    /// Unix seconds; fallback ordering when `lt` is absent.
    #[serde(default)]
    pub utime: u64,
}

impl Ordered for TxRecord {
    fn order_key(&self) -> u64 {
        if self.lt > 0 {
            self.lt
        } else {
            self.utime
        }
    }

    fn id(&self) -> &str {
        &self.hash
    }
}

/// One NFT transfer from the account history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferRecord {
    #[serde(alias = "transaction_hash")]
    pub tx_hash: String,
    /// Unix seconds.
    #[serde(alias = "utime")]
    pub timestamp: u64,
    /// Address of the transferred NFT item, when the API reports it.
    #[serde(default, alias = "nft_address")]
    pub nft: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
}

impl Ordered for TransferRecord {
    fn order_key(&self) -> u64 {
        self.timestamp
    }

    fn id(&self) -> &str {
        &self.tx_hash
    }
}

#[derive(Debug, Deserialize)]
struct TxEnvelope {
    #[serde(default)]
    transactions: Vec<TxRecord>,
}

#[derive(Debug, Deserialize)]
struct TransferEnvelope {
    #[serde(default)]
    nft_transfers: Vec<TransferRecord>,
}

pub struct TonApiFeed {
    client: Client,
    base: String,
    account: String,
    limit: u32,
    timeout: Duration,
}

impl TonApiFeed {
    pub fn new(base: String, account: String, limit: u32, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            account,
            limit,
            timeout,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, Error> {
        self.client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("tonapi request: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Fetch(format!("tonapi status: {e}")))?
            .json::<T>()
            .await
            .map_err(|e| Error::Fetch(format!("tonapi decode: {e}")))
    }
}

#[async_trait::async_trait]
impl TransactionFeed for TonApiFeed {
    async fn fetch(&self) -> Result<Vec<TxRecord>, Error> {
        let url = format!(
            "{}/v2/blockchain/accounts/{}/transactions?limit={}",
            self.base, self.account, self.limit
        );
        let env: TxEnvelope = self.get_json(url).await?;
        Ok(env.transactions)
    }
}

#[async_trait::async_trait]
impl TransferFeed for TonApiFeed {
    async fn fetch(&self) -> Result<Vec<TransferRecord>, Error> {
        let url = format!(
            "{}/v2/accounts/{}/nfts/history?limit={}",
            self.base, self.account, self.limit
        );
        let env: TransferEnvelope = self.get_json(url).await?;
        Ok(env.nft_transfers)
    }
}
