// Alpha Vantage daily stock series source
use crate::application::data_source::DataSource;
use crate::domain::error::PipelineError;
use crate::domain::source::{ExternalResponse, SourceKind, SourceParams};
use crate::infrastructure::config::SourceSettings;
use crate::infrastructure::http_json::{build_client, get_json, require_success, JsonReply};
use async_trait::async_trait;
use serde_json::Value;

const DAILY_FUNCTION: &str = "TIME_SERIES_DAILY";

pub struct AlphaVantageSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageSource {
    pub fn new(settings: &SourceSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout())?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key().map(str::to_string),
        })
    }

    fn query(params: &SourceParams, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("function", DAILY_FUNCTION.to_string()),
            ("symbol", params.symbol_or_default()),
            ("apikey", api_key.to_string()),
        ]
    }

    /// Alpha Vantage answers 200 for everything; quota and lookup errors
    /// arrive as top-level `Note` / `Information` / `Error Message` keys.
    fn check_reply(reply: JsonReply) -> Result<Value, PipelineError> {
        for key in ["Note", "Information"] {
            if let Some(message) = reply.body.get(key).and_then(Value::as_str) {
                return Err(PipelineError::RateLimited(message.to_string()));
            }
        }
        if let Some(message) = reply.body.get("Error Message").and_then(Value::as_str) {
            return Err(PipelineError::InvalidResponse(message.to_string()));
        }
        require_success(reply)
    }
}

#[async_trait]
impl DataSource for AlphaVantageSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Stock
    }

    async fn fetch(&self, params: &SourceParams) -> Result<ExternalResponse, PipelineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PipelineError::SourceUnavailable("no Alpha Vantage key configured".to_string())
        })?;

        let url = format!("{}/query", self.base_url);
        tracing::debug!("Fetching daily series for {}", params.symbol_or_default());
        let request = self.client.get(&url).query(&Self::query(params, api_key));

        let body = Self::check_reply(get_json(request).await?)?;
        Ok(ExternalResponse::new(SourceKind::Stock, body))
    }
}
