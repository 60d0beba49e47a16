//! One pass of the tracker: load cursor, fetch, reconcile, notify each new
//! item, persist. No business logic lives here and no loop: re-invocation is
//! the scheduler's job.
//!
//! Ordering of effects is the whole point:
//! - a fetch failure returns before any state mutation, so the previous
//!   cursor stays valid byte-for-byte;
//! - notifications go out before the cursor is saved, so a crash in between
//!   can re-alert (at-least-once) but never silently skip an item;
//! - a single failed notification is logged and the batch continues.

use crate::error::Error;
use crate::feed::{CatalogFeed, TransactionFeed, TransferFeed};
use crate::notify::{Alert, Notify};
use crate::reconcile;
use crate::state::StateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub new_items: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

async fn dispatch(notifier: &dyn Notify, alert: &Alert, summary: &mut RunSummary) {
    match notifier.notify(alert).await {
        Ok(crate::notify::Delivery::Sent) => summary.sent += 1,
        Ok(crate::notify::Delivery::Skipped) => summary.skipped += 1,
        Err(e) => {
            tracing::warn!(error = %e, "notification failed, continuing with remaining items");
            summary.failed += 1;
        }
    }
}

pub async fn run_catalog_once(
    feed: &dyn CatalogFeed,
    store: &StateStore,
    notifier: &dyn Notify,
) -> Result<RunSummary, Error> {
    let previous = store.load().await.into_keys();
    let snapshot = feed.fetch().await?;

    let outcome = reconcile::diff_key_set(&previous, &snapshot);
    let mut summary = RunSummary {
        new_items: outcome.new_keys.len(),
        ..RunSummary::default()
    };

    for key in &outcome.new_keys {
        let alert = Alert::Gift { id: key.clone() };
        dispatch(notifier, &alert, &mut summary).await;
    }

    tracing::info!(
        new = summary.new_items,
        sent = summary.sent,
        "catalog pass reconciled"
    );
    store.save(&outcome.cursor).await?;
    Ok(summary)
}

pub async fn run_transactions_once(
    feed: &dyn TransactionFeed,
    store: &StateStore,
    notifier: &dyn Notify,
    account: &str,
) -> Result<RunSummary, Error> {
    let last = store.load().await.into_hash();
    let records = feed.fetch().await?;

    let outcome = reconcile::diff_by_hash(last.as_deref(), records);
    let mut summary = RunSummary {
        new_items: outcome.new_records.len(),
        ..RunSummary::default()
    };

    for tx in &outcome.new_records {
        let alert = Alert::Transaction {
            hash: tx.hash.clone(),
            account: account.to_string(),
        };
        dispatch(notifier, &alert, &mut summary).await;
    }

    tracing::info!(
        new = summary.new_items,
        sent = summary.sent,
        "transaction pass reconciled"
    );
    store.save(&outcome.cursor).await?;
    Ok(summary)
}

pub async fn run_transfers_once(
    feed: &dyn TransferFeed,
    store: &StateStore,
    notifier: &dyn Notify,
    account: &str,
) -> Result<RunSummary, Error> {
    let watermark = store.load().await.into_watermark();
    let records = feed.fetch().await?;

    let outcome = reconcile::diff_by_watermark(watermark, records);
    let mut summary = RunSummary {
        new_items: outcome.new_records.len(),
        ..RunSummary::default()
    };

    for tr in &outcome.new_records {
        let alert = Alert::Transfer {
            tx_hash: tr.tx_hash.clone(),
            account: account.to_string(),
            timestamp: tr.timestamp,
            nft: tr.nft.clone(),
        };
        dispatch(notifier, &alert, &mut summary).await;
    }

    tracing::info!(
        new = summary.new_items,
        sent = summary.sent,
        "transfer pass reconciled"
    );
    store.save(&outcome.cursor).await?;
    Ok(summary)
}
