//! eBay API response types.
//!
//! Models the JSON shapes returned by the OAuth token endpoint and the
//! Browse API `item_summary/search` endpoint. Field names on the wire are
//! camelCase; everything optional in practice is `Option` or defaulted so a
//! sparse row never fails the whole page.

use serde::Deserialize;

/// Response from `POST /identity/v1/oauth2/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime of the token in seconds (eBay issues ~7200).
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// One page of Browse API search results.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseSearchPage {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub item_summaries: Vec<ItemSummary>,
    #[serde(default)]
    pub next: Option<String>,
}

/// A single item row from `item_summary/search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: String,
    pub title: String,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub condition: Option<String>,
    pub item_web_url: String,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub seller: Option<Seller>,
    #[serde(default)]
    pub item_location: Option<ItemLocation>,
    /// RFC 3339 timestamp of when the listing was created.
    #[serde(default)]
    pub item_creation_date: Option<String>,
}

/// eBay serializes money as a decimal string plus a currency code.
#[derive(Debug, Deserialize)]
pub struct Money {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Seller {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemLocation {
    #[serde(default)]
    pub country: Option<String>,
}
