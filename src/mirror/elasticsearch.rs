//! A mirror that writes notifications to an Elasticsearch `_bulk` endpoint.

use crate::core::{Mirror, NotificationRequest};
use crate::event_log::EventLog;
use crate::mirror::{encoder::encode_bulk_payload, MirrorError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Posts bulk payloads to `<base url>/_bulk`.
pub struct ElasticsearchMirror {
    client: reqwest::Client,
    bulk_url: String,
    host: String,
    log: Arc<dyn EventLog>,
}

impl ElasticsearchMirror {
    /// Creates a new `ElasticsearchMirror`.
    ///
    /// # Arguments
    /// * `base_url` - The store's base URL; `/_bulk` is appended.
    /// * `host` - The relay's host identifier, used in document ids.
    /// * `timeout` - Bound on the whole request, including the response body.
    /// * `log` - Where request progress is reported.
    pub fn new(
        base_url: &str,
        host: impl Into<String>,
        timeout: Duration,
        log: Arc<dyn EventLog>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            bulk_url: format!("{}/_bulk", base_url.trim_end_matches('/')),
            host: host.into(),
            log,
        })
    }

    pub fn bulk_url(&self) -> &str {
        &self.bulk_url
    }
}

#[async_trait]
impl Mirror for ElasticsearchMirror {
    #[instrument(skip_all, fields(url = %self.bulk_url))]
    async fn mirror(
        &self,
        request: &NotificationRequest,
        moment: DateTime<FixedOffset>,
    ) -> Result<(), MirrorError> {
        let body = encode_bulk_payload(&self.host, request, &moment)?;
        self.log
            .info(&format!("Posting mirror record to {}", self.bulk_url));

        let response = self
            .client
            .post(&self.bulk_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(MirrorError::Transport)?;

        let status = response.status();
        let text = response.text().await.map_err(MirrorError::Body)?;
        if !status.is_success() {
            return Err(MirrorError::Status { status, body: text });
        }

        self.log.info(&format!("Mirror response body: {}", text));
        self.log.info("Notification successfully mirrored");
        Ok(())
    }
}
