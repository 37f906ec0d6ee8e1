//! A client for sending notifications through the Prowl public API.

use crate::core::{NotificationRequest, Notifier};
use crate::dispatch::DispatchError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The Prowl `add` endpoint.
pub const DEFAULT_PROWL_URL: &str = "https://api.prowlapp.com/publicapi/add";

/// Priority attached to every notification.
pub const PROWL_PRIORITY: &str = "1";

/// A client for the Prowl `add` endpoint.
pub struct ProwlClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ProwlClient {
    /// Creates a new `ProwlClient`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Notifier for ProwlClient {
    /// Sends the notification. Only transport failures are errors; the
    /// upstream's status and body are not inspected.
    #[instrument(skip(self, request), fields(application = %request.app_name, event = %request.event))]
    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("application", request.app_name.as_str()),
                ("event", request.event.as_str()),
                ("description", request.description.as_str()),
                ("priority", PROWL_PRIORITY),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Notification sent to Prowl.");
        } else {
            debug!(status = %status, "Prowl answered with a non-success status");
        }
        Ok(())
    }
}
