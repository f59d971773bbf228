// Data source identifiers, request parameters and raw payloads
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_NEWS_CATEGORY: &str = "business";
pub const DEFAULT_STOCK_SYMBOL: &str = "IBM";
pub const DEFAULT_CURRENCY: &str = "usd";
pub const DEFAULT_COINS: [&str; 3] = ["bitcoin", "ethereum", "solana"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    News,
    Stock,
    Crypto,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::News => "news",
            SourceKind::Stock => "stock",
            SourceKind::Crypto => "crypto",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters selecting a variant of a data source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceParams {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub coins: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
}

impl SourceParams {
    pub fn symbol_or_default(&self) -> String {
        self.symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STOCK_SYMBOL)
            .to_uppercase()
    }

    pub fn category_or_default(&self) -> String {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_NEWS_CATEGORY)
            .to_lowercase()
    }

    pub fn coin_list(&self) -> Vec<String> {
        let coins = clean_list(&self.coins, &[]);
        if coins.is_empty() {
            DEFAULT_COINS.iter().map(|c| c.to_string()).collect()
        } else {
            coins
        }
    }

    /// Requested quote currencies, lowercased and deduplicated.
    /// `name` is reserved for the coin column of the normalized table.
    pub fn currency_list(&self) -> Vec<String> {
        let currencies = clean_list(&self.currencies, &["name"]);
        if currencies.is_empty() {
            vec![DEFAULT_CURRENCY.to_string()]
        } else {
            currencies
        }
    }

    /// Apply user-selected overrides relevant to the given source
    pub fn apply(&self, source: SourceKind, overrides: &ParamOverrides) -> SourceParams {
        let mut next = self.clone();
        match source {
            SourceKind::Stock => {
                if let Some(symbol) = &overrides.symbol {
                    next.symbol = Some(symbol.trim().to_uppercase());
                }
            }
            SourceKind::News => {
                if let Some(category) = &overrides.category {
                    next.category = Some(category.trim().to_lowercase());
                }
            }
            SourceKind::Crypto => {
                if let Some(coins) = &overrides.coins {
                    next.coins = split_list(coins);
                }
                if let Some(currencies) = &overrides.currencies {
                    next.currencies = split_list(currencies);
                }
            }
        }
        next
    }

    /// Variables available to `${var}` placeholders in panel titles
    pub fn template_vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("symbol".to_string(), self.symbol_or_default());
        vars.insert("category".to_string(), self.category_or_default());
        vars.insert("coins".to_string(), self.coin_list().join(", "));
        vars.insert("currency".to_string(), self.currency_list()[0].clone());
        vars.insert(
            "currencies".to_string(),
            self.currency_list()
                .iter()
                .map(|c| c.to_uppercase())
                .collect::<Vec<_>>()
                .join(", "),
        );
        vars
    }
}

/// Query-string selections coming from the dashboard page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParamOverrides {
    pub symbol: Option<String>,
    pub category: Option<String>,
    pub coins: Option<String>,
    pub currencies: Option<String>,
}

impl ParamOverrides {
    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
            && self.category.is_none()
            && self.coins.is_none()
            && self.currencies.is_none()
    }
}

/// Raw payload from one fetch call
#[derive(Debug, Clone)]
pub struct ExternalResponse {
    pub source: SourceKind,
    pub body: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl ExternalResponse {
    pub fn new(source: SourceKind, body: serde_json::Value) -> Self {
        Self {
            source,
            body,
            received_at: Utc::now(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn clean_list(items: &[String], reserved: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim().to_lowercase();
        if item.is_empty() || reserved.contains(&item.as_str()) || out.contains(&item) {
            continue;
        }
        out.push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_list_is_cleaned() {
        let params = SourceParams {
            currencies: vec![" USD".into(), "eur".into(), "usd".into(), "name".into(), "".into()],
            ..Default::default()
        };
        assert_eq!(params.currency_list(), vec!["usd", "eur"]);
        assert_eq!(SourceParams::default().currency_list(), vec!["usd"]);
    }

    #[test]
    fn test_apply_only_touches_relevant_source() {
        let overrides = ParamOverrides {
            symbol: Some("msft".into()),
            category: Some("Technology".into()),
            coins: Some("bitcoin, dogecoin".into()),
            currencies: None,
        };
        let base = SourceParams::default();

        let stock = base.apply(SourceKind::Stock, &overrides);
        assert_eq!(stock.symbol.as_deref(), Some("MSFT"));
        assert_eq!(stock.category, None);

        let news = base.apply(SourceKind::News, &overrides);
        assert_eq!(news.category.as_deref(), Some("technology"));
        assert_eq!(news.symbol, None);

        let crypto = base.apply(SourceKind::Crypto, &overrides);
        assert_eq!(crypto.coin_list(), vec!["bitcoin", "dogecoin"]);
        assert!(crypto.currencies.is_empty());
    }

    #[test]
    fn test_template_vars_use_defaults() {
        let vars = SourceParams::default().template_vars();
        assert_eq!(vars["symbol"], "IBM");
        assert_eq!(vars["category"], "business");
        assert_eq!(vars["currencies"], "USD");
        assert_eq!(vars["currency"], "usd");
    }
}
