// NewsAPI top-headlines source
use crate::application::data_source::DataSource;
use crate::domain::error::PipelineError;
use crate::domain::source::{ExternalResponse, SourceKind, SourceParams};
use crate::infrastructure::config::SourceSettings;
use crate::infrastructure::http_json::{build_client, get_json, require_success, JsonReply};
use async_trait::async_trait;
use serde_json::Value;

const LANGUAGE: &str = "en";
const COUNTRY: &str = "us";

pub struct NewsApiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsApiSource {
    pub fn new(settings: &SourceSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout())?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key().map(str::to_string),
        })
    }

    fn query(params: &SourceParams) -> Vec<(&'static str, String)> {
        vec![
            ("category", params.category_or_default()),
            ("language", LANGUAGE.to_string()),
            ("country", COUNTRY.to_string()),
        ]
    }

    /// NewsAPI reports failures as `{"status": "error", "code": ..., "message": ...}`
    fn check_reply(reply: JsonReply) -> Result<Value, PipelineError> {
        if reply.body.get("status").and_then(Value::as_str) == Some("error") {
            let code = reply.body.get("code").and_then(Value::as_str).unwrap_or("unknown");
            let message = reply
                .body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(if code == "rateLimited" {
                PipelineError::RateLimited(message.to_string())
            } else {
                PipelineError::InvalidResponse(format!("{}: {}", code, message))
            });
        }
        require_success(reply)
    }
}

#[async_trait]
impl DataSource for NewsApiSource {
    fn kind(&self) -> SourceKind {
        SourceKind::News
    }

    async fn fetch(&self, params: &SourceParams) -> Result<ExternalResponse, PipelineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PipelineError::SourceUnavailable("no NewsAPI key configured".to_string())
        })?;

        let url = format!("{}/v2/top-headlines", self.base_url);
        tracing::debug!("Fetching headlines for {}", params.category_or_default());
        let request = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .query(&Self::query(params));

        let body = Self::check_reply(get_json(request).await?)?;
        Ok(ExternalResponse::new(SourceKind::News, body))
    }
}
