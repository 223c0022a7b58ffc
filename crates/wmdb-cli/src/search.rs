//! `search` command: parse a free-text query and print grouped results.

use wmdb_aggregator::{search_all_platforms, SearchDeps, SearchOutcome};
use wmdb_core::{PlatformsFile, WatchGroup};
use wmdb_query::QueryParser;

/// Parse the query (AI-assisted when a key is configured, deterministic
/// fallback otherwise), fan out to every enabled platform, and print the
/// grouped outcome.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails; per-platform search
/// failures are part of the printed outcome.
pub(crate) async fn run_search(
    deps: &SearchDeps,
    registry: &PlatformsFile,
    parser: &QueryParser,
    text: &str,
    limit: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let parsed = parser.parse(text).await;
    let (query, mut options) = parsed.to_search();
    if let Some(limit) = limit {
        options.limit_per_platform = limit;
    }

    let outcome = search_all_platforms(deps, registry, &query, &options).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome) {
    if outcome.groups.is_empty() {
        println!("no listings matched");
    }

    for group in &outcome.groups {
        println!("{}", format_group_line(group));
        // Members are price-ascending; the head is the best current offer.
        if let Some(best) = group.listings.first() {
            println!(
                "  best: {} {} on {}: {}",
                best.price, best.currency, best.platform, best.url
            );
        }
    }

    println!(
        "{} listings in {} groups",
        outcome.listings_total,
        outcome.groups.len()
    );
    for failure in &outcome.failures {
        eprintln!("warning: {} failed: {}", failure.platform, failure.error);
    }
}

/// One-line group summary: key, listing count, platforms, price range.
fn format_group_line(group: &WatchGroup) -> String {
    let range = if group.lowest_price == group.highest_price {
        format!("{}", group.lowest_price)
    } else {
        format!("{}-{}", group.lowest_price, group.highest_price)
    };
    format!(
        "{}  [{} listings on {}]  {range}",
        group.key,
        group.listing_count,
        group.platforms.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn group(lowest: i64, highest: i64) -> WatchGroup {
        WatchGroup {
            key: "rolex:116610LN".to_string(),
            brand: "Rolex".to_string(),
            model: Some("Submariner".to_string()),
            reference: Some("116610LN".to_string()),
            lowest_price: Decimal::new(lowest, 0),
            highest_price: Decimal::new(highest, 0),
            listing_count: 3,
            platforms: vec!["bobs-watches".to_string(), "ebay".to_string()],
            listings: Vec::new(),
        }
    }

    #[test]
    fn group_line_shows_price_range() {
        let line = format_group_line(&group(9500, 11295));
        assert_eq!(
            line,
            "rolex:116610LN  [3 listings on bobs-watches, ebay]  9500-11295"
        );
    }

    #[test]
    fn group_line_collapses_single_price() {
        let line = format_group_line(&group(9500, 9500));
        assert!(
            line.ends_with("]  9500"),
            "single price must not render as a range: {line}"
        );
    }
}
