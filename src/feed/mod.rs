//! Feed clients: one GET per run, typed results, no retries. A failed fetch
//! is a value (`Error::Fetch`), never a panic, and aborts the run before any
//! state is touched.

pub mod catalog;
pub mod chain;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Error;
use crate::feed::chain::{TransferRecord, TxRecord};

/// Full current gift catalog, keyed by stable gift id.
#[async_trait::async_trait]
pub trait CatalogFeed: Send + Sync {
    async fn fetch(&self) -> Result<BTreeMap<String, Value>, Error>;
}

/// Short window of recent account transactions, any order.
#[async_trait::async_trait]
pub trait TransactionFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<TxRecord>, Error>;
}

/// Short window of recent NFT transfers, any order.
#[async_trait::async_trait]
pub trait TransferFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<TransferRecord>, Error>;
}
