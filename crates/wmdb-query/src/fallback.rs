//! Deterministic free-text query parser.
//!
//! Used whenever the remote path is unavailable: no API key configured, the
//! call failed, or the model returned something unparsable. Extraction runs
//! in a fixed order — price phrases, condition vocabulary, brand, model,
//! reference — with each match consumed from the working text so later
//! stages never re-match the same tokens.

use regex::Regex;
use rust_decimal::Decimal;

use wmdb_core::Condition;

use crate::types::ParsedQuery;

/// Brands recognized without the remote model. Longest names first so
/// "grand seiko" wins over "seiko".
const KNOWN_BRANDS: &[&str] = &[
    "vacheron constantin",
    "jaeger-lecoultre",
    "audemars piguet",
    "patek philippe",
    "a lange sohne",
    "grand seiko",
    "tag heuer",
    "breitling",
    "longines",
    "panerai",
    "cartier",
    "hublot",
    "zenith",
    "omega",
    "rolex",
    "seiko",
    "tudor",
    "iwc",
];

/// Well-known model lines, checked after the brand so "submariner" in
/// "rolex submariner" lands in `model` rather than `keywords`.
const KNOWN_MODELS: &[&str] = &[
    "speedmaster professional",
    "royal oak offshore",
    "gmt-master ii",
    "gmt master ii",
    "black bay",
    "royal oak",
    "submariner",
    "speedmaster",
    "seamaster",
    "daytona",
    "datejust",
    "explorer",
    "nautilus",
    "aquanaut",
    "carrera",
    "santos",
    "reverso",
    "luminor",
];

/// Condition phrases in priority order; multi-word phrases first so
/// "like new" never matches as "new".
const CONDITION_PHRASES: &[(&str, Condition)] = &[
    ("like new", Condition::Unworn),
    ("brand new", Condition::New),
    ("very good", Condition::VeryGood),
    ("pre-owned", Condition::Good),
    ("preowned", Condition::Good),
    ("unworn", Condition::Unworn),
    ("mint", Condition::Unworn),
    ("excellent", Condition::Excellent),
    ("new", Condition::New),
    ("used", Condition::Good),
    ("good", Condition::Good),
    ("fair", Condition::Fair),
];

/// Filler words dropped from the keyword remainder.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "for", "with", "and", "or", "in", "of", "watch", "watches",
];

/// Parse a free-text query without any remote call.
///
/// Always succeeds; an unintelligible query simply produces keywords only.
#[must_use]
pub fn parse(text: &str) -> ParsedQuery {
    let mut working = text.to_lowercase();
    let mut parsed = ParsedQuery::default();

    extract_price_range(&mut working, &mut parsed);
    extract_condition(&mut working, &mut parsed);
    extract_brand(&mut working, &mut parsed);
    extract_model(&mut working, &mut parsed);
    extract_reference(&mut working, &mut parsed);

    parsed.keywords = working
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .filter(|w| !STOPWORDS.contains(w))
        .map(ToOwned::to_owned)
        .collect();

    parsed
}

/// Parses a money amount like `5000`, `5,000`, `$5000`, `5k`, or `$12.5k`.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    if let Some(thousands) = cleaned.strip_suffix(['k', 'K']) {
        let base: Decimal = thousands.parse().ok()?;
        return Some(base * Decimal::new(1_000, 0));
    }
    cleaned.parse().ok()
}

fn extract_price_range(working: &mut String, parsed: &mut ParsedQuery) {
    // "between $2,000 and $4k"
    let between = Regex::new(
        r"between\s+(\$?[\d,]+(?:\.\d+)?[kK]?)\s+and\s+(\$?[\d,]+(?:\.\d+)?[kK]?)",
    )
    .expect("between regex is valid");
    if let Some(caps) = between.captures(working) {
        let lo = parse_amount(&caps[1]);
        let hi = parse_amount(&caps[2]);
        if let (Some(lo), Some(hi)) = (lo, hi) {
            parsed.min_price = Some(lo.min(hi));
            parsed.max_price = Some(lo.max(hi));
            let span = caps.get(0).expect("whole match").range();
            working.replace_range(span, "");
            return;
        }
    }

    let upper = Regex::new(r"(?:under|below|less than|up to|max)\s+(\$?[\d,]+(?:\.\d+)?[kK]?)")
        .expect("upper-bound regex is valid");
    if let Some(caps) = upper.captures(working) {
        if let Some(amount) = parse_amount(&caps[1]) {
            parsed.max_price = Some(amount);
            let span = caps.get(0).expect("whole match").range();
            working.replace_range(span, "");
        }
    }

    let lower = Regex::new(r"(?:over|above|more than|at least|min)\s+(\$?[\d,]+(?:\.\d+)?[kK]?)")
        .expect("lower-bound regex is valid");
    if let Some(caps) = lower.captures(working) {
        if let Some(amount) = parse_amount(&caps[1]) {
            parsed.min_price = Some(amount);
            let span = caps.get(0).expect("whole match").range();
            working.replace_range(span, "");
        }
    }
}

fn extract_condition(working: &mut String, parsed: &mut ParsedQuery) {
    for &(phrase, condition) in CONDITION_PHRASES {
        if let Some(pos) = find_phrase(working, phrase) {
            parsed.min_condition = Some(condition);
            working.replace_range(pos..pos + phrase.len(), "");
            return;
        }
    }
}

fn extract_brand(working: &mut String, parsed: &mut ParsedQuery) {
    for &brand in KNOWN_BRANDS {
        if let Some(pos) = find_phrase(working, brand) {
            parsed.brand = Some(title_case(brand));
            working.replace_range(pos..pos + brand.len(), "");
            return;
        }
    }
}

fn extract_model(working: &mut String, parsed: &mut ParsedQuery) {
    for &model in KNOWN_MODELS {
        if let Some(pos) = find_phrase(working, model) {
            parsed.model = Some(title_case(model));
            working.replace_range(pos..pos + model.len(), "");
            return;
        }
    }
}

fn extract_reference(working: &mut String, parsed: &mut ParsedQuery) {
    // A reference token mixes digits with optional letters and ./- or /
    // separators: 116610LN, 311.30.42.30.01.005, 5711/1A. Plain 4-digit
    // years (19xx/20xx) are excluded.
    let reference = Regex::new(r"\b([a-zA-Z]{0,3}\d[\da-zA-Z]*(?:[./-][\da-zA-Z]+)*)\b")
        .expect("reference regex is valid");

    let mut found: Option<(std::ops::Range<usize>, String)> = None;
    for caps in reference.captures_iter(working) {
        let token = &caps[1];
        let digits = token.chars().filter(char::is_ascii_digit).count();
        if digits < 3 {
            continue;
        }
        if is_year(token) {
            continue;
        }
        let span = caps.get(0).expect("whole match").range();
        found = Some((span, token.to_uppercase()));
        break;
    }

    if let Some((span, token)) = found {
        parsed.reference = Some(token);
        working.replace_range(span, "");
    }
}

fn is_year(token: &str) -> bool {
    token.len() == 4
        && token.chars().all(|c| c.is_ascii_digit())
        && (token.starts_with("19") || token.starts_with("20"))
}

/// Finds `phrase` in `haystack` on word boundaries.
fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(rel) = haystack[start..].find(phrase) {
        let pos = start + rel;
        let before_ok = pos == 0
            || !haystack[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let end = pos + phrase.len();
        let after_ok = end >= haystack.len()
            || !haystack[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(pos);
        }
        start = end;
    }
    None
}

fn title_case(phrase: &str) -> String {
    phrase
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_brand_model_and_reference() {
        let parsed = parse("Rolex Submariner 116610LN");
        assert_eq!(parsed.brand.as_deref(), Some("Rolex"));
        assert_eq!(parsed.model.as_deref(), Some("Submariner"));
        assert_eq!(parsed.reference.as_deref(), Some("116610LN"));
        assert!(parsed.keywords.is_empty());
    }

    #[test]
    fn parses_dotted_reference() {
        let parsed = parse("omega 311.30.42.30.01.005");
        assert_eq!(parsed.brand.as_deref(), Some("Omega"));
        assert_eq!(parsed.reference.as_deref(), Some("311.30.42.30.01.005"));
    }

    #[test]
    fn parses_under_price_phrase() {
        let parsed = parse("rolex submariner under $10,000");
        assert_eq!(parsed.max_price, Some(Decimal::new(10_000, 0)));
        assert!(parsed.min_price.is_none());
    }

    #[test]
    fn parses_k_suffix_amounts() {
        let parsed = parse("patek philippe nautilus under 80k");
        assert_eq!(parsed.brand.as_deref(), Some("Patek Philippe"));
        assert_eq!(parsed.model.as_deref(), Some("Nautilus"));
        assert_eq!(parsed.max_price, Some(Decimal::new(80_000, 0)));
    }

    #[test]
    fn parses_between_price_range() {
        let parsed = parse("omega speedmaster between 2000 and 4000");
        assert_eq!(parsed.min_price, Some(Decimal::new(2_000, 0)));
        assert_eq!(parsed.max_price, Some(Decimal::new(4_000, 0)));
    }

    #[test]
    fn between_range_swaps_reversed_bounds() {
        let parsed = parse("tudor between 4000 and 2000");
        assert_eq!(parsed.min_price, Some(Decimal::new(2_000, 0)));
        assert_eq!(parsed.max_price, Some(Decimal::new(4_000, 0)));
    }

    #[test]
    fn parses_over_price_phrase() {
        let parsed = parse("vintage rolex over 10k");
        assert_eq!(parsed.min_price, Some(Decimal::new(10_000, 0)));
        assert_eq!(parsed.keywords, vec!["vintage"]);
    }

    #[test]
    fn parses_condition_vocabulary() {
        assert_eq!(
            parse("unworn rolex daytona").min_condition,
            Some(Condition::Unworn)
        );
        assert_eq!(
            parse("rolex like new").min_condition,
            Some(Condition::Unworn)
        );
        assert_eq!(
            parse("omega excellent condition").min_condition,
            Some(Condition::Excellent)
        );
    }

    #[test]
    fn like_new_does_not_match_as_new() {
        let parsed = parse("seamaster like new");
        assert_eq!(parsed.min_condition, Some(Condition::Unworn));
    }

    #[test]
    fn longest_brand_wins() {
        let parsed = parse("grand seiko snowflake");
        assert_eq!(parsed.brand.as_deref(), Some("Grand Seiko"));
        assert_eq!(parsed.keywords, vec!["snowflake"]);
    }

    #[test]
    fn year_is_not_mistaken_for_reference() {
        let parsed = parse("rolex submariner 2019");
        assert_eq!(parsed.brand.as_deref(), Some("Rolex"));
        assert!(parsed.reference.is_none());
        assert_eq!(parsed.keywords, vec!["2019"]);
    }

    #[test]
    fn unknown_text_yields_keywords_only() {
        let parsed = parse("blue dial dive watch");
        assert!(parsed.brand.is_none());
        assert!(parsed.reference.is_none());
        assert_eq!(parsed.keywords, vec!["blue", "dial", "dive"]);
    }

    #[test]
    fn empty_input_yields_default() {
        assert_eq!(parse(""), ParsedQuery::default());
        assert_eq!(parse("   "), ParsedQuery::default());
    }

    #[test]
    fn full_query_combines_everything() {
        let parsed = parse("unworn Rolex Submariner 116610LN under $12.5k ceramic");
        assert_eq!(parsed.brand.as_deref(), Some("Rolex"));
        assert_eq!(parsed.model.as_deref(), Some("Submariner"));
        assert_eq!(parsed.reference.as_deref(), Some("116610LN"));
        assert_eq!(parsed.min_condition, Some(Condition::Unworn));
        assert_eq!(parsed.max_price, Some(Decimal::new(12_500, 0)));
        assert_eq!(parsed.keywords, vec!["ceramic"]);
    }
}
