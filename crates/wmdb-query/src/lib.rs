//! Free-text search query parsing.
//!
//! [`QueryParser`] extracts structured filters (brand, model, reference,
//! price range, condition floor) from queries like "rolex submariner under
//! $10k". When an OpenAI-compatible API key is configured the extraction is
//! delegated to a chat-completions call; on any failure — or with no key at
//! all — the deterministic [`fallback`] parser takes over, so parsing never
//! fails outright.

use thiserror::Error;

pub mod client;
pub mod fallback;
pub mod types;

pub use client::QueryParser;
pub use types::ParsedQuery;

/// Errors from the remote parsing path. The public [`QueryParser::parse`]
/// swallows these into the fallback; they surface only from
/// [`QueryParser::parse_remote`].
#[derive(Debug, Error)]
pub enum QueryError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No API key is configured; the remote path cannot run.
    #[error("no OpenAI API key configured")]
    MissingApiKey,

    /// The completions endpoint returned a non-2xx status.
    #[error("unexpected status {status} from completions endpoint")]
    UnexpectedStatus { status: u16 },

    /// The response body (or the model's JSON payload inside it) could not
    /// be deserialized.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The completions response carried no choices.
    #[error("completions response contained no choices")]
    EmptyResponse,
}
