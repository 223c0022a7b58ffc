//! Brand and reference extraction from marketplace listing titles.
//!
//! Live sources like eBay return a free-text title and nothing structured,
//! so the adapter pulls out what it can: a known brand name, and the first
//! token that looks like a manufacturer reference number.

/// Recognized brands, longest name first so "Grand Seiko" wins over "Seiko"
/// and "Tudor" never shadows anything.
const KNOWN_BRANDS: &[&str] = &[
    "Audemars Piguet",
    "Vacheron Constantin",
    "Jaeger-LeCoultre",
    "A. Lange & Söhne",
    "Patek Philippe",
    "Grand Seiko",
    "Blancpain",
    "Breitling",
    "Cartier",
    "Longines",
    "Panerai",
    "Zenith",
    "Hublot",
    "Omega",
    "Rolex",
    "Seiko",
    "Tudor",
    "IWC",
];

/// Finds the first known brand mentioned in a title, case-insensitively.
pub(crate) fn extract_brand(title: &str) -> Option<String> {
    let haystack = title.to_lowercase();
    KNOWN_BRANDS
        .iter()
        .find(|brand| haystack.contains(&brand.to_lowercase()))
        .map(|brand| (*brand).to_string())
}

/// Finds the first title token that looks like a reference number: up to
/// three leading letters, at least three digits, alphanumerics joined by
/// `.`, `/`, or `-`. Plain four-digit years are skipped.
pub(crate) fn extract_reference(title: &str) -> Option<String> {
    title
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|token| looks_like_reference(token))
        .map(ToString::to_string)
}

fn looks_like_reference(token: &str) -> bool {
    if token.len() < 4 || token.len() > 24 {
        return false;
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '-'))
    {
        return false;
    }
    let digits = token.chars().filter(char::is_ascii_digit).count();
    if digits < 3 {
        return false;
    }
    // Leading letters cap: "ref" prefixes are fine, whole words are not.
    let leading_letters = token.chars().take_while(char::is_ascii_alphabetic).count();
    if leading_letters > 3 {
        return false;
    }
    !is_year(token)
}

fn is_year(token: &str) -> bool {
    token.len() == 4
        && token.chars().all(|c| c.is_ascii_digit())
        && (token.starts_with("19") || token.starts_with("20"))
}
