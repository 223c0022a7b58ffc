//! Mock adapter: compiled-in fixture listings for platforms without any
//! live or scraped source. Deterministic, used by unit tests and local
//! development.

use rust_decimal::Decimal;
use wmdb_core::{Condition, Listing, PlatformConfig, SearchOptions, SearchQuery};

struct Fixture {
    platform: &'static str,
    id: &'static str,
    brand: &'static str,
    model: &'static str,
    reference: &'static str,
    title: &'static str,
    /// Price in cents.
    price_cents: i64,
    condition: Condition,
    year: i32,
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        platform: "bobs-watches",
        id: "BW-154722",
        brand: "Rolex",
        model: "Submariner",
        reference: "116610LN",
        title: "Rolex Submariner Date 116610LN Black Ceramic Bezel",
        price_cents: 11_295_00,
        condition: Condition::Excellent,
        year: 2017,
    },
    Fixture {
        platform: "bobs-watches",
        id: "BW-160114",
        brand: "Rolex",
        model: "GMT-Master II",
        reference: "126710BLRO",
        title: "Rolex GMT-Master II 126710BLRO Pepsi Jubilee",
        price_cents: 19_850_00,
        condition: Condition::VeryGood,
        year: 2021,
    },
    Fixture {
        platform: "bobs-watches",
        id: "BW-158001",
        brand: "Rolex",
        model: "Datejust",
        reference: "126334",
        title: "Rolex Datejust 41 126334 Blue Dial Oyster",
        price_cents: 9_450_00,
        condition: Condition::Excellent,
        year: 2020,
    },
    Fixture {
        platform: "crown-and-caliber",
        id: "CC-88213",
        brand: "Omega",
        model: "Speedmaster",
        reference: "311.30.42.30.01.005",
        title: "Omega Speedmaster Professional Moonwatch 311.30.42.30.01.005",
        price_cents: 5_295_00,
        condition: Condition::VeryGood,
        year: 2018,
    },
    Fixture {
        platform: "crown-and-caliber",
        id: "CC-90457",
        brand: "Tudor",
        model: "Black Bay Fifty-Eight",
        reference: "79030N",
        title: "Tudor Black Bay Fifty-Eight 79030N Box and Papers",
        price_cents: 3_150_00,
        condition: Condition::Unworn,
        year: 2022,
    },
    Fixture {
        platform: "crown-and-caliber",
        id: "CC-87772",
        brand: "Omega",
        model: "Seamaster Diver 300M",
        reference: "210.30.42.20.03.001",
        title: "Omega Seamaster Diver 300M 210.30.42.20.03.001 Blue Wave",
        price_cents: 4_100_00,
        condition: Condition::Good,
        year: 2019,
    },
];

/// Returns fixture listings for the given mock platform whose searchable
/// text contains every query token (case-insensitive). An empty query
/// matches everything.
pub(super) fn search(
    platform: &PlatformConfig,
    query: &SearchQuery,
    options: &SearchOptions,
) -> Vec<Listing> {
    let slug = platform.slug();
    let text = super::query_text(query).to_lowercase();
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let limit = options.normalized_limit() as usize;

    FIXTURES
        .iter()
        .filter(|f| f.platform == slug)
        .filter(|f| {
            let haystack =
                format!("{} {} {} {}", f.brand, f.model, f.reference, f.title).to_lowercase();
            tokens.iter().all(|token| haystack.contains(token))
        })
        .take(limit)
        .map(|f| to_listing(&slug, f))
        .collect()
}

fn to_listing(slug: &str, f: &Fixture) -> Listing {
    Listing {
        source_listing_id: f.id.to_string(),
        platform: slug.to_string(),
        brand: f.brand.to_string(),
        model: Some(f.model.to_string()),
        reference: Some(f.reference.to_string()),
        title: f.title.to_string(),
        price: Decimal::new(f.price_cents, 2),
        currency: "USD".to_string(),
        condition: Some(f.condition),
        year: Some(f.year),
        seller: Some(slug.to_string()),
        seller_country: Some("US".to_string()),
        url: format!("https://www.{slug}.example.com/listing/{}", f.id),
        image_url: None,
        listed_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wmdb_core::PlatformKind;

    fn mock_platform(name: &str) -> PlatformConfig {
        PlatformConfig {
            name: name.to_string(),
            kind: PlatformKind::Mock,
            enabled: true,
            base_url: None,
            affiliate_tag: None,
            notes: None,
        }
    }

    #[test]
    fn matches_all_tokens_within_platform() {
        let platform = mock_platform("Bobs Watches");
        let query = SearchQuery::from_text("rolex submariner");
        let results = search(&platform, &query, &SearchOptions::default());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_listing_id, "BW-154722");
        assert_eq!(results[0].platform, "bobs-watches");
    }

    #[test]
    fn empty_query_returns_platform_catalog() {
        let platform = mock_platform("Crown and Caliber");
        let query = SearchQuery::from_text("");
        let results = search(&platform, &query, &SearchOptions::default());
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn no_cross_platform_leakage() {
        let platform = mock_platform("Bobs Watches");
        let query = SearchQuery::from_text("omega");
        let results = search(&platform, &query, &SearchOptions::default());
        assert!(results.is_empty());
    }

    #[test]
    fn respects_limit() {
        let platform = mock_platform("Crown and Caliber");
        let query = SearchQuery::from_text("");
        let options = SearchOptions {
            limit_per_platform: 1,
            ..SearchOptions::default()
        };
        let results = search(&platform, &query, &options);
        assert_eq!(results.len(), 1);
    }
}
