use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Watch condition, ordered best to worst.
///
/// Marketplace vocabulary varies wildly ("mint", "pre-owned", "like new");
/// [`Condition::from_label`] folds the common labels into these six tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    Unworn,
    Excellent,
    VeryGood,
    Good,
    Fair,
}

impl Condition {
    /// Numeric rank for floor comparisons; higher is better.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Condition::New => 5,
            Condition::Unworn => 4,
            Condition::Excellent => 3,
            Condition::VeryGood => 2,
            Condition::Good => 1,
            Condition::Fair => 0,
        }
    }

    /// Returns `true` if `self` is at least as good as `floor`.
    #[must_use]
    pub fn at_least(self, floor: Condition) -> bool {
        self.rank() >= floor.rank()
    }

    /// Maps a raw marketplace condition label onto a tier.
    ///
    /// Checks run in priority order so "like new" lands on `Unworn` rather
    /// than `New`, and "pre-owned - very good" lands on `VeryGood` rather
    /// than `Good`. Unrecognized labels return `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Condition> {
        let s = label.trim().to_lowercase();
        if s.is_empty() {
            return None;
        }
        if s.contains("unworn") || s.contains("like new") || s.contains("mint") {
            Some(Condition::Unworn)
        } else if s.contains("new") {
            Some(Condition::New)
        } else if s.contains("excellent") {
            Some(Condition::Excellent)
        } else if s.contains("very good") {
            Some(Condition::VeryGood)
        } else if s.contains("good") {
            Some(Condition::Good)
        } else if s.contains("fair") || s.contains("poor") || s.contains("incomplete") {
            Some(Condition::Fair)
        } else if s.contains("pre-owned") || s.contains("preowned") || s.contains("used") {
            // Generic "used" with no further qualifier sits in the middle.
            Some(Condition::Good)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::New => write!(f, "new"),
            Condition::Unworn => write!(f, "unworn"),
            Condition::Excellent => write!(f, "excellent"),
            Condition::VeryGood => write!(f, "very_good"),
            Condition::Good => write!(f, "good"),
            Condition::Fair => write!(f, "fair"),
        }
    }
}

/// A single seller's offer for a specific watch, normalized across
/// marketplaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Marketplace-native listing ID, stored as a string to avoid precision
    /// loss on numeric IDs.
    pub source_listing_id: String,
    /// Slug of the platform the listing came from (e.g., `"ebay"`).
    pub platform: String,
    pub brand: String,
    pub model: Option<String>,
    /// Manufacturer reference number as printed by the seller,
    /// e.g. `"116610LN"` or `"311.30.42.30.01.005"`.
    pub reference: Option<String>,
    pub title: String,
    pub price: Decimal,
    /// ISO 4217 currency code (e.g., `"USD"`).
    pub currency: String,
    pub condition: Option<Condition>,
    pub year: Option<i32>,
    pub seller: Option<String>,
    pub seller_country: Option<String>,
    /// Canonical URL of the listing on the source marketplace.
    pub url: String,
    pub image_url: Option<String>,
    pub listed_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Derives the grouping key used to cluster "same watch, many sellers".
    ///
    /// Preference order:
    /// 1. `<brand-slug>:<REFERENCE>` — reference uppercased with everything
    ///    non-alphanumeric stripped, so `"16610 LN"`, `"16610-LN"` and
    ///    `"16610LN"` collide as intended.
    /// 2. `<brand-slug>:<model-slug>` when no reference is present.
    /// 3. `<brand-slug>:unspecified` when neither is present, so the listing
    ///    still appears in grouped output.
    #[must_use]
    pub fn group_key(&self) -> String {
        make_group_key(&self.brand, self.model.as_deref(), self.reference.as_deref())
    }
}

/// Derives a grouping key from raw brand/model/reference parts. Shared by
/// [`Listing::group_key`] and callers that only have the parts (e.g. price
/// alerts keyed on brand plus reference).
#[must_use]
pub fn make_group_key(brand: &str, model: Option<&str>, reference: Option<&str>) -> String {
    let brand_slug = slugify(brand);

    if let Some(reference) = reference {
        let normalized = normalize_reference(reference);
        if !normalized.is_empty() {
            return format!("{brand_slug}:{normalized}");
        }
    }

    if let Some(model) = model {
        let model_slug = slugify(model);
        if !model_slug.is_empty() {
            return format!("{brand_slug}:{model_slug}");
        }
    }

    format!("{brand_slug}:unspecified")
}

/// A parsed search request: free text plus any structured hints already
/// extracted from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub brand: Option<String>,
    pub reference: Option<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            brand: None,
            reference: None,
        }
    }
}

/// Post-hoc filters and fan-out controls for an aggregated search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Condition floor; listings below it (or with unknown condition) are
    /// dropped when set.
    pub min_condition: Option<Condition>,
    /// Restrict fan-out to these platform slugs. `None` means all enabled.
    pub platforms: Option<Vec<String>>,
    pub limit_per_platform: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_price: None,
            max_price: None,
            min_condition: None,
            platforms: None,
            limit_per_platform: 50,
        }
    }
}

impl SearchOptions {
    /// Per-platform result limit clamped to the supported range.
    #[must_use]
    pub fn normalized_limit(&self) -> u32 {
        self.limit_per_platform.clamp(1, 200)
    }
}

/// Generate a URL-safe slug: lowercase, ASCII alphanumerics and hyphens,
/// spaces collapsed to single hyphens, everything else stripped.
#[must_use]
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Uppercase a reference and strip everything non-alphanumeric.
fn normalize_reference(reference: &str) -> String {
    reference
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
