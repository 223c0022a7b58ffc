use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wmdb_core::{Condition, SearchOptions, SearchQuery};

/// Structured filters extracted from a free-text search query.
///
/// Every field is optional: a query like "dive watch" yields nothing but
/// keywords, while "rolex 116610LN under $12k unworn" fills most of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub min_condition: Option<Condition>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ParsedQuery {
    /// Converts the parsed filters into the aggregator's query + options pair.
    ///
    /// The search text is rebuilt from the structured parts (brand, model,
    /// reference, keywords) rather than the raw input, so price/condition
    /// phrases don't leak into marketplace text matching.
    #[must_use]
    pub fn to_search(&self) -> (SearchQuery, SearchOptions) {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(brand) = &self.brand {
            parts.push(brand);
        }
        if let Some(model) = &self.model {
            parts.push(model);
        }
        if let Some(reference) = &self.reference {
            parts.push(reference);
        }
        for kw in &self.keywords {
            parts.push(kw);
        }

        let query = SearchQuery {
            text: parts.join(" "),
            brand: self.brand.clone(),
            reference: self.reference.clone(),
        };
        let options = SearchOptions {
            min_price: self.min_price,
            max_price: self.max_price,
            min_condition: self.min_condition,
            ..SearchOptions::default()
        };
        (query, options)
    }
}
