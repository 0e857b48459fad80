use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::{PasswordSyncSink, SyncError, SyncPayload};

const MAX_ERROR_BODY: usize = 512;

/// Posts sync payloads as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpPasswordSync {
    client: Client,
    endpoint: Url,
}

impl HttpPasswordSync {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("homeauth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PasswordSyncSink for HttpPasswordSync {
    async fn push(&self, payload: &SyncPayload) -> Result<(), SyncError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            debug!(status = status.as_u16(), "password sync accepted");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|idx| body.is_char_boundary(*idx))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(SyncError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
