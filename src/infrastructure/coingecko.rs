// CoinGecko simple price source
use crate::application::data_source::DataSource;
use crate::domain::error::PipelineError;
use crate::domain::source::{ExternalResponse, SourceKind, SourceParams};
use crate::infrastructure::config::SourceSettings;
use crate::infrastructure::http_json::{build_client, get_json, require_success, JsonReply};
use async_trait::async_trait;
use serde_json::Value;

pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoSource {
    pub fn new(settings: &SourceSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout())?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key().map(str::to_string),
        })
    }

    fn query(params: &SourceParams) -> Vec<(&'static str, String)> {
        vec![
            ("ids", params.coin_list().join(",")),
            ("vs_currencies", params.currency_list().join(",")),
        ]
    }

    /// Throttled requests sometimes come back as 200 with a `status.error_code` body
    fn check_reply(reply: JsonReply) -> Result<Value, PipelineError> {
        if let Some(status) = reply.body.get("status") {
            let code = status.get("error_code").and_then(Value::as_u64);
            let message = status
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match code {
                Some(429) => return Err(PipelineError::RateLimited(message)),
                Some(code) => {
                    return Err(PipelineError::InvalidResponse(format!("error {}: {}", code, message)))
                }
                None => {}
            }
        }
        require_success(reply)
    }
}

#[async_trait]
impl DataSource for CoinGeckoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Crypto
    }

    async fn fetch(&self, params: &SourceParams) -> Result<ExternalResponse, PipelineError> {
        let url = format!("{}/api/v3/simple/price", self.base_url);
        tracing::debug!("Fetching prices for {:?}", params.coin_list());
        let mut request = self.client.get(&url).query(&Self::query(params));
        // Public endpoint; a demo key only raises the quota
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let body = Self::check_reply(get_json(request).await?)?;
        Ok(ExternalResponse::new(SourceKind::Crypto, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_query_joins_lists() {
        let params = SourceParams {
            coins: vec!["bitcoin".into(), "ethereum".into()],
            currencies: vec!["USD".into(), "eur".into()],
            ..Default::default()
        };
        let query = CoinGeckoSource::query(&params);
        assert_eq!(query[0], ("ids", "bitcoin,ethereum".to_string()));
        assert_eq!(query[1], ("vs_currencies", "usd,eur".to_string()));
    }

    #[test]
    fn test_check_reply_classifies_errors() {
        let throttled = JsonReply {
            status: StatusCode::OK,
            body: json!({"status": {"error_code": 429, "error_message": "You've exceeded the Rate Limit."}}),
        };
        assert!(matches!(
            CoinGeckoSource::check_reply(throttled),
            Err(PipelineError::RateLimited(_))
        ));

        let ok = JsonReply {
            status: StatusCode::OK,
            body: json!({"bitcoin": {"usd": 45000}}),
        };
        assert_eq!(
            CoinGeckoSource::check_reply(ok).unwrap(),
            json!({"bitcoin": {"usd": 45000}})
        );
    }
}
