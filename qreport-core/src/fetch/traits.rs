/// Query string pairs for one API call, sent in order.
pub type Query<'a> = [(&'a str, String)];

/// Read-only access to the code-quality server's REST API.
///
/// `HttpSonarClient` talks to a real server; tests plug in an in-memory
/// implementation.
#[async_trait::async_trait]
pub trait SonarApi: Send + Sync {
    /// GET `path` with `query` and return the decoded JSON body.
    async fn get_json(&self, path: &str, query: &Query<'_>) -> crate::error::Result<serde_json::Value>;
}

/// Decode a JSON body into `T`, tagging failures with the endpoint.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    value: serde_json::Value,
) -> crate::error::Result<T> {
    serde_json::from_value(value).map_err(|e| {
        crate::error::FetchError::Parse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
