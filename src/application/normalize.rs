// Normalization - raw upstream payloads into fixed-schema tables
use crate::domain::source::{ExternalResponse, SourceKind, SourceParams};
use crate::domain::table::{Row, Table};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

pub const NEWS_SCHEMA: [&str; 5] = ["title", "source", "url", "published_at", "description"];
pub const STOCK_SCHEMA: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

const DAILY_SERIES_KEY: &str = "Time Series (Daily)";
const REMOVED_ARTICLE_TITLE: &str = "[Removed]";

/// Schema of the table a source normalizes to
pub fn schema_for(source: SourceKind, params: &SourceParams) -> Vec<String> {
    match source {
        SourceKind::News => NEWS_SCHEMA.iter().map(|c| c.to_string()).collect(),
        SourceKind::Stock => STOCK_SCHEMA.iter().map(|c| c.to_string()).collect(),
        SourceKind::Crypto => {
            let mut schema = vec!["name".to_string()];
            schema.extend(params.currency_list());
            schema
        }
    }
}

/// Deterministic and infallible: anything unexpected is dropped row by row,
/// and a payload of the wrong shape yields an empty table.
pub fn normalize(response: &ExternalResponse, params: &SourceParams) -> Table {
    let mut table = Table::empty(&schema_for(response.source, params));
    let rows = match response.source {
        SourceKind::News => news_rows(&response.body),
        SourceKind::Stock => stock_rows(&response.body),
        SourceKind::Crypto => crypto_rows(&response.body, &params.currency_list()),
    };

    for row in rows {
        if let Err(e) = table.push(row) {
            tracing::debug!("Dropping {} row: {}", response.source, e);
        }
    }

    table
}

fn crypto_rows(body: &Value, currencies: &[String]) -> Vec<Row> {
    let Some(coins) = body.as_object() else {
        return Vec::new();
    };

    let mut names: Vec<&String> = coins.keys().collect();
    names.sort();

    names
        .into_iter()
        .filter_map(|name| {
            let prices = coins.get(name)?.as_object()?;
            let mut row = Row::new().with("name", name.as_str());
            for currency in currencies {
                let price = prices.get(currency)?.as_f64()?;
                row = row.with(currency, price);
            }
            Some(row)
        })
        .collect()
}

fn news_rows(body: &Value) -> Vec<Row> {
    let Some(articles) = body.get("articles").and_then(Value::as_array) else {
        return Vec::new();
    };

    articles
        .iter()
        .filter_map(|article| {
            let title = non_empty_str(article.get("title"))?;
            if title == REMOVED_ARTICLE_TITLE {
                return None;
            }
            let url = non_empty_str(article.get("url"))?;
            let source = article
                .get("source")
                .and_then(|s| s.get("name"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let description = article
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let published_at = article
                .get("publishedAt")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            Some(
                Row::new()
                    .with("title", title)
                    .with("source", source)
                    .with("url", url)
                    .with("published_at", published_at)
                    .with("description", description),
            )
        })
        .collect()
}

fn stock_rows(body: &Value) -> Vec<Row> {
    let Some(series) = body.get(DAILY_SERIES_KEY).and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut dated: Vec<(DateTime<Utc>, Row)> = series
        .iter()
        .filter_map(|(date, values)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)?
                .and_utc();
            let row = Row::new()
                .with("date", date)
                .with("open", numeric_field(values, "1. open")?)
                .with("high", numeric_field(values, "2. high")?)
                .with("low", numeric_field(values, "3. low")?)
                .with("close", numeric_field(values, "4. close")?)
                .with("volume", numeric_field(values, "5. volume")?);
            Some((date, row))
        })
        .collect();

    dated.sort_by_key(|(date, _)| *date);
    dated.into_iter().map(|(_, row)| row).collect()
}

/// Alpha Vantage quotes numbers as strings. "NaN" and "inf" parse but are not prices.
fn numeric_field(values: &Value, key: &str) -> Option<f64> {
    let value = match values.get(key)? {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Scalar;
    use serde_json::json;

    fn crypto_params(currencies: &[&str]) -> SourceParams {
        SourceParams {
            currencies: currencies.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_crypto_prices() {
        let response = ExternalResponse::new(
            SourceKind::Crypto,
            json!({"bitcoin": {"usd": 45000}, "ethereum": {"usd": 3200}}),
        );
        let table = normalize(&response, &crypto_params(&["usd"]));

        assert_eq!(table.schema(), ["name", "usd"]);
        assert_eq!(table.len(), 2);
        let rows = table.rows();
        assert_eq!(rows[0].get("name"), Some(&Scalar::Text("bitcoin".into())));
        assert_eq!(rows[0].get("usd"), Some(&Scalar::Number(45000.0)));
        assert_eq!(rows[1].get("name"), Some(&Scalar::Text("ethereum".into())));
        assert_eq!(rows[1].get("usd"), Some(&Scalar::Number(3200.0)));
    }

    #[test]
    fn test_crypto_omits_coins_missing_a_currency() {
        let response = ExternalResponse::new(
            SourceKind::Crypto,
            json!({
                "bitcoin": {"usd": 45000, "eur": 41000},
                "ethereum": {"usd": 3200},
                "status": {"error_code": 429}
            }),
        );
        let table = normalize(&response, &crypto_params(&["usd", "eur"]));

        assert_eq!(table.schema(), ["name", "usd", "eur"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("eur"), Some(&Scalar::Number(41000.0)));
    }

    #[test]
    fn test_news_articles() {
        let response = ExternalResponse::new(
            SourceKind::News,
            json!({
                "status": "ok",
                "totalResults": 4,
                "articles": [
                    {
                        "source": {"id": null, "name": "Reuters"},
                        "title": "Markets rally",
                        "url": "https://example.com/a",
                        "publishedAt": "2024-03-01T12:30:00Z",
                        "description": "Stocks rose."
                    },
                    {
                        "title": "No source or date",
                        "url": "https://example.com/b"
                    },
                    {"title": "[Removed]", "url": "https://removed.com"},
                    {"title": "Missing url"}
                ]
            }),
        );
        let table = normalize(&response, &SourceParams::default());

        assert_eq!(table.len(), 2);
        for row in table.rows() {
            assert!(row.matches_schema(table.schema()));
        }
        let second = &table.rows()[1];
        assert_eq!(second.get("source"), Some(&Scalar::Text(String::new())));
        assert_eq!(
            second.get("published_at"),
            Some(&Scalar::Timestamp(DateTime::<Utc>::UNIX_EPOCH))
        );
    }

    #[test]
    fn test_stock_series_sorted_ascending() {
        let response = ExternalResponse::new(
            SourceKind::Stock,
            json!({
                "Meta Data": {"2. Symbol": "IBM"},
                "Time Series (Daily)": {
                    "2024-01-05": {"1. open": "160.0", "2. high": "161.0", "3. low": "159.0", "4. close": "160.5", "5. volume": "1000"},
                    "2024-01-03": {"1. open": "158.0", "2. high": "159.0", "3. low": "157.0", "4. close": "158.5", "5. volume": "900"},
                    "2024-01-04": {"1. open": "bad", "2. high": "159.0", "3. low": "157.0", "4. close": "158.5", "5. volume": "900"},
                    "not-a-date": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}
                }
            }),
        );
        let table = normalize(&response, &SourceParams::default());

        assert_eq!(table.len(), 2);
        let labels: Vec<String> = table
            .rows()
            .iter()
            .map(|r| r.get("date").unwrap().label())
            .collect();
        assert_eq!(labels, vec!["2024-01-03", "2024-01-05"]);
        assert_eq!(table.rows()[1].get("close"), Some(&Scalar::Number(160.5)));
    }

    #[test]
    fn test_stock_omits_non_finite_values() {
        let response = ExternalResponse::new(
            SourceKind::Stock,
            json!({
                "Time Series (Daily)": {
                    "2024-01-02": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "NaN", "5. volume": "1"},
                    "2024-01-03": {"1. open": "1", "2. high": "inf", "3. low": "1", "4. close": "1", "5. volume": "1"},
                    "2024-01-04": {"1. open": "1", "2. high": "2", "3. low": "1", "4. close": "-infinity", "5. volume": "1"},
                    "2024-01-05": {"1. open": "1", "2. high": "2", "3. low": "1", "4. close": "2", "5. volume": "10"}
                }
            }),
        );
        let table = normalize(&response, &SourceParams::default());

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("close"), Some(&Scalar::Number(2.0)));
    }

    #[test]
    fn test_malformed_payloads_yield_empty_tables() {
        let payloads = [
            json!(null),
            json!([]),
            json!("oops"),
            json!({}),
            json!({"articles": "nope"}),
            json!({"Time Series (Daily)": [1, 2]}),
            json!({"Note": "Thank you for using Alpha Vantage!"}),
        ];

        for source in [SourceKind::News, SourceKind::Stock, SourceKind::Crypto] {
            for payload in &payloads {
                let response = ExternalResponse::new(source, payload.clone());
                let params = SourceParams::default();
                let table = normalize(&response, &params);
                assert!(table.is_empty(), "{source} accepted {payload}");
                assert_eq!(table.schema(), schema_for(source, &params));
            }
        }
    }
}
