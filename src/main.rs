//! Gift tracker — binary entrypoint.
//! One pass per invocation: load cursor, fetch the configured feed, alert on
//! new items, persist the cursor, exit. Scheduling is external (cron).

use std::process::ExitCode;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tg_gift_tracker::config::{Config, FeedMode};
use tg_gift_tracker::error::Error;
use tg_gift_tracker::feed::catalog::HttpCatalogFeed;
use tg_gift_tracker::feed::chain::TonApiFeed;
use tg_gift_tracker::notify::telegram::TelegramNotifier;
use tg_gift_tracker::runner::{self, RunSummary};
use tg_gift_tracker::state::{CursorKind, StateStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

async fn run(cfg: &Config) -> Result<RunSummary, Error> {
    let notifier = TelegramNotifier::from_config(&cfg.telegram).with_timeout(cfg.http_timeout);

    match cfg.mode {
        FeedMode::Catalog => {
            let store = StateStore::new(&cfg.state_file, CursorKind::Keys);
            let feed = HttpCatalogFeed::new(cfg.gift_api_url.clone(), cfg.http_timeout);
            runner::run_catalog_once(&feed, &store, &notifier).await
        }
        FeedMode::Transactions => {
            let account = cfg
                .ton_account
                .clone()
                .ok_or(Error::ConfigMissing("TON_ACCOUNT_ADDRESS"))?;
            let store = StateStore::new(&cfg.state_file, CursorKind::Hash);
            let feed = TonApiFeed::new(
                cfg.ton_api_url.clone(),
                account.clone(),
                cfg.fetch_limit,
                cfg.http_timeout,
            );
            runner::run_transactions_once(&feed, &store, &notifier, &account).await
        }
        FeedMode::NftTransfers => {
            let account = cfg
                .ton_account
                .clone()
                .ok_or(Error::ConfigMissing("TON_ACCOUNT_ADDRESS"))?;
            let store = StateStore::new(&cfg.state_file, CursorKind::Watermark);
            let feed = TonApiFeed::new(
                cfg.ton_api_url.clone(),
                account.clone(),
                cfg.fetch_limit,
                cfg.http_timeout,
            );
            runner::run_transfers_once(&feed, &store, &notifier, &account).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op where the environment is injected.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(&cfg).await {
        Ok(summary) => {
            tracing::info!(
                new = summary.new_items,
                sent = summary.sent,
                skipped = summary.skipped,
                failed = summary.failed,
                "run complete"
            );
            ExitCode::SUCCESS
        }
        Err(Error::Fetch(reason)) => {
            // Soft failure: nothing was mutated, the previous cursor stays
            // valid for the next scheduled invocation.
            tracing::warn!(%reason, "fetch failed, nothing to do");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
