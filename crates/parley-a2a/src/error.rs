//! Error type shared by the A2A client pieces

use thiserror::Error;

use crate::card::ValidationReport;

pub type Result<T> = std::result::Result<T, A2aError>;

#[derive(Debug, Error)]
pub enum A2aError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("failed to connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("invalid JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("agent returned JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("agent card failed validation ({} errors)", .0.len())]
    Validation(ValidationReport),

    #[error("could not fetch agent card from any of: {}", .tried.join(", "))]
    CardNotFound { tried: Vec<String> },

    #[error("agent offers no transport this client supports (JSONRPC)")]
    NoCompatibleTransport,

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl A2aError {
    /// Classify a reqwest transport failure against the URL it was aimed at
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Connection {
                url: url.to_string(),
                source: err,
            }
        }
    }

    /// Short name of the failure, shown next to unexpected errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientBuild(_) => "ClientBuild",
            Self::Timeout { .. } => "Timeout",
            Self::Connection { .. } => "Connection",
            Self::Http { .. } => "Http",
            Self::InvalidJson { .. } => "InvalidJson",
            Self::Rpc { .. } => "Rpc",
            Self::Validation(_) => "Validation",
            Self::CardNotFound { .. } => "CardNotFound",
            Self::NoCompatibleTransport => "NoCompatibleTransport",
            Self::UnexpectedResponse(_) => "UnexpectedResponse",
        }
    }
}
