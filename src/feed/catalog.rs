//! HTTP client for the gift catalog endpoint. The endpoint returns one JSON
//! object mapping gift id to payload; the payloads are opaque here, only the
//! keys feed the diff.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::Error;
use crate::feed::CatalogFeed;

pub struct HttpCatalogFeed {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpCatalogFeed {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl CatalogFeed for HttpCatalogFeed {
    async fn fetch(&self) -> Result<BTreeMap<String, Value>, Error> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("catalog request: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Fetch(format!("catalog status: {e}")))?;

        // The CDN occasionally serves an HTML error page with a 200; a decode
        // failure is a fetch failure, not corrupt local state.
        resp.json::<BTreeMap<String, Value>>()
            .await
            .map_err(|e| Error::Fetch(format!("catalog decode: {e}")))
    }
}
