//! Live eBay Browse API adapter.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use wmdb_core::{Condition, Listing, PlatformConfig, SearchOptions, SearchQuery};
use wmdb_ebay::ItemSummary;

use super::{extract, SearchDeps};
use crate::AggregatorError;

pub(super) async fn search(
    deps: &SearchDeps,
    platform: &PlatformConfig,
    query: &SearchQuery,
    options: &SearchOptions,
) -> Result<Vec<Listing>, AggregatorError> {
    let slug = platform.slug();
    let client = deps
        .ebay
        .as_ref()
        .ok_or_else(|| AggregatorError::EbayUnavailable(slug.clone()))?;

    let text = super::query_text(query);
    let page = client
        .search_items(&text, options.normalized_limit(), 0)
        .await?;

    let listings: Vec<Listing> = page
        .item_summaries
        .into_iter()
        .filter_map(|item| map_item(&slug, query, item))
        .collect();

    tracing::debug!(platform = %slug, count = listings.len(), "mapped eBay results");
    Ok(listings)
}

/// Maps one Browse API row into a normalized [`Listing`].
///
/// Rows without a parsable price are skipped; everything else degrades
/// gracefully to `None` fields. The query's structured brand/reference win
/// over title extraction when present.
fn map_item(platform: &str, query: &SearchQuery, item: ItemSummary) -> Option<Listing> {
    let Some(money) = item.price else {
        tracing::debug!(item_id = %item.item_id, "skipping eBay item without price");
        return None;
    };
    let Ok(price) = Decimal::from_str(&money.value) else {
        tracing::debug!(
            item_id = %item.item_id,
            value = %money.value,
            "skipping eBay item with unparsable price"
        );
        return None;
    };

    let brand = query
        .brand
        .clone()
        .or_else(|| extract::extract_brand(&item.title))
        .unwrap_or_else(|| "Unknown".to_string());
    let reference = query
        .reference
        .clone()
        .or_else(|| extract::extract_reference(&item.title));

    let listed_at = item
        .item_creation_date
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Some(Listing {
        source_listing_id: item.item_id,
        platform: platform.to_string(),
        brand,
        model: None,
        reference,
        title: item.title,
        price,
        currency: money.currency,
        condition: item.condition.as_deref().and_then(Condition::from_label),
        year: None,
        seller: item.seller.and_then(|s| s.username),
        seller_country: item.item_location.and_then(|l| l.country),
        url: item.item_web_url,
        image_url: item.image.map(|i| i.image_url),
        listed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> ItemSummary {
        serde_json::from_str(json).expect("fixture item should parse")
    }

    #[test]
    fn maps_full_item_with_title_extraction() {
        let summary = item(
            r#"{
                "itemId": "v1|123|0",
                "title": "Rolex Submariner Date 116610LN Black Ceramic 2019",
                "price": { "value": "10500.00", "currency": "USD" },
                "condition": "Pre-owned - Excellent",
                "itemWebUrl": "https://www.ebay.com/itm/123",
                "seller": { "username": "watch-dealer" },
                "itemLocation": { "country": "US" },
                "itemCreationDate": "2025-06-01T12:00:00.000Z"
            }"#,
        );

        let query = SearchQuery::from_text("rolex submariner");
        let listing = map_item("ebay", &query, summary).expect("item should map");

        assert_eq!(listing.brand, "Rolex");
        assert_eq!(listing.reference.as_deref(), Some("116610LN"));
        assert_eq!(listing.price, Decimal::new(10_500_00, 2));
        assert_eq!(listing.condition, Some(Condition::Excellent));
        assert_eq!(listing.group_key(), "rolex:116610LN");
        assert!(listing.listed_at.is_some());
    }

    #[test]
    fn query_brand_wins_over_title() {
        let summary = item(
            r#"{
                "itemId": "v1|124|0",
                "title": "Submariner style homage diver",
                "price": { "value": "120.00", "currency": "USD" },
                "itemWebUrl": "https://www.ebay.com/itm/124"
            }"#,
        );

        let mut query = SearchQuery::from_text("");
        query.brand = Some("Rolex".to_string());
        let listing = map_item("ebay", &query, summary).expect("item should map");
        assert_eq!(listing.brand, "Rolex");
    }

    #[test]
    fn item_without_price_is_skipped() {
        let summary = item(
            r#"{
                "itemId": "v1|125|0",
                "title": "Omega Speedmaster",
                "itemWebUrl": "https://www.ebay.com/itm/125"
            }"#,
        );
        let query = SearchQuery::from_text("omega");
        assert!(map_item("ebay", &query, summary).is_none());
    }

    #[test]
    fn item_with_garbage_price_is_skipped() {
        let summary = item(
            r#"{
                "itemId": "v1|126|0",
                "title": "Omega Speedmaster",
                "price": { "value": "call for price", "currency": "USD" },
                "itemWebUrl": "https://www.ebay.com/itm/126"
            }"#,
        );
        let query = SearchQuery::from_text("omega");
        assert!(map_item("ebay", &query, summary).is_none());
    }
}
