//! Typed client for the eBay Browse API: OAuth2 client-credentials token
//! management, item-summary search, and retry with exponential back-off.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::EbayClient;
pub use error::EbayError;
pub use retry::{is_retriable, retry_with_backoff};
pub use types::{BrowseSearchPage, ItemSummary, Money, TokenResponse};
