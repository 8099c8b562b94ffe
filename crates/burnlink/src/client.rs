//! HTTP client for the secret API, used by the sender and receiver flows.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use burnlink_server::handlers::{CreateRequest, CreateResponse, GetResponse};
use burnlink_server::{ProtocolError, SecretChannel};

/// [`SecretChannel`] that talks to a burnlink server over HTTP.
#[derive(Clone)]
pub struct HttpChannel {
    client: Client,
    base: Url,
}

impl HttpChannel {
    /// `server` is the API base, e.g. `http://localhost:3001`.
    pub fn new(server: &str) -> Result<Self> {
        let base = Url::parse(server).with_context(|| format!("invalid server URL: {server}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("server URL cannot be used as a base: {server}");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build HTTP client")?;
        Ok(Self { client, base })
    }

    fn secret_url(&self, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "secret"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }
}

fn transport(e: reqwest::Error) -> ProtocolError {
    ProtocolError::Transport(e.to_string())
}

impl SecretChannel for HttpChannel {
    async fn store(&self, ciphertext: &str) -> Result<String, ProtocolError> {
        let resp = self
            .client
            .post(self.secret_url(None))
            .json(&CreateRequest {
                value: ciphertext.to_owned(),
            })
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProtocolError::Transport(format!(
                "server returned {status}: {text}"
            )));
        }

        let body: CreateResponse = resp.json().await.map_err(transport)?;
        debug!("ciphertext stored");
        Ok(body.id)
    }

    async fn take(&self, id: &str) -> Result<String, ProtocolError> {
        let resp = self
            .client
            .get(self.secret_url(Some(id)))
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(ProtocolError::NotFound),
            status if status.is_success() => {
                let body: GetResponse = resp.json().await.map_err(transport)?;
                Ok(body.value)
            }
            status => Err(ProtocolError::Transport(format!("server returned {status}"))),
        }
    }
}
