// HTTP implementation of the server API: basic-auth GETs returning JSON.

use reqwest::Client;
use reqwest::header::ACCEPT;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::FetchError;

use super::traits::{Query, SonarApi};

/// `SonarApi` over HTTP(S) with token authentication.
///
/// The token is sent as the basic-auth username with an empty password.
/// In-flight requests are capped by an internal semaphore.
pub struct HttpSonarClient {
    base_url: String,
    token: String,
    client: Client,
    permits: Semaphore,
}

impl std::fmt::Debug for HttpSonarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSonarClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl HttpSonarClient {
    pub fn new(host: &str, token: impl Into<String>, max_in_flight: usize) -> Self {
        // reqwest is built without a bundled provider; already-installed is fine
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        Self {
            base_url: host.trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
            permits: Semaphore::new(max_in_flight.max(1)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl SonarApi for HttpSonarClient {
    async fn get_json(
        &self,
        path: &str,
        query: &Query<'_>,
    ) -> crate::error::Result<serde_json::Value> {
        let url = format!("{}{path}", self.base_url);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let resp = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json")
            .basic_auth(&self.token, Some(""))
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        debug!(url = %url, status = status.as_u16(), "Server API request");

        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(url = %url, error = %e, "Failed to read error response body");
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                body,
            }
            .into());
        }

        resp.json().await.map_err(|e| {
            FetchError::Parse {
                endpoint: path.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}
