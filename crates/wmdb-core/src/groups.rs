use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::listing::Listing;

/// The set of listings sharing one normalized brand/reference key — the
/// "same watch, many sellers" comparison unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchGroup {
    /// Normalized grouping key, e.g. `"rolex:116610LN"`.
    pub key: String,
    pub brand: String,
    pub model: Option<String>,
    pub reference: Option<String>,
    pub lowest_price: Decimal,
    pub highest_price: Decimal,
    pub listing_count: usize,
    /// Distinct platform slugs contributing to this group, sorted.
    pub platforms: Vec<String>,
    /// Member listings, price-ascending.
    pub listings: Vec<Listing>,
}

impl WatchGroup {
    /// Difference between the highest and lowest asking price in the group.
    #[must_use]
    pub fn price_spread(&self) -> Decimal {
        self.highest_price - self.lowest_price
    }

    /// The cheapest listing. Members are price-ascending, so this is the
    /// first one.
    #[must_use]
    pub fn best_listing(&self) -> Option<&Listing> {
        self.listings.first()
    }

    /// Stable UUID-format identifier derived from the group key.
    ///
    /// SHA-256 of the key, first 16 bytes formatted 8-4-4-4-12, so the same
    /// watch gets the same public ID across searches and processes.
    #[must_use]
    pub fn public_id(&self) -> String {
        let hash = Sha256::digest(self.key.as_bytes());
        let b = &hash[..16];
        format!(
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3],
            b[4], b[5],
            b[6], b[7],
            b[8], b[9],
            b[10], b[11], b[12], b[13], b[14], b[15],
        )
    }
}
