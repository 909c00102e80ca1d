use std::path::PathBuf;

/// Top-level qreport error type.
///
/// All fallible operations in `qreport-core` return [`Result<T, ReportError>`](Result).
/// Each variant wraps a stage-specific error enum, so callers can match on
/// the failing stage without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// Error talking to the code-quality server.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error producing charts or the HTML document.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Bad or unreadable `qreport.toml`.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the server API layer.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("Server API network error for {url}: {message}")]
    Network {
        /// Full request URL.
        url: String,
        /// Transport error description.
        message: String,
    },

    /// The server answered with a non-success HTTP status.
    #[error("Server API {status} for {url}: {body}")]
    Status {
        /// Full request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response body did not have the expected JSON shape.
    #[error("Server API response parse error ({endpoint}): {message}")]
    Parse {
        /// API path that produced the body.
        endpoint: String,
        /// Description of the decode failure.
        message: String,
    },
}

/// Errors while rendering charts or the report.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Filesystem I/O error writing an artifact.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path being created or written.
        path: PathBuf,
        source: std::io::Error,
    },

    /// Formatting into the output buffer failed.
    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Errors loading a report configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// A value is out of range or empty.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// The file is not valid TOML for [`crate::config::ReportConfig`].
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for `Result<T, ReportError>`.
pub type Result<T> = std::result::Result<T, ReportError>;
