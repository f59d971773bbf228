// Shared HTTP plumbing for the upstream JSON APIs
use crate::domain::error::PipelineError;
use anyhow::Context;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JsonReply {
    pub status: StatusCode,
    pub body: Value,
}

pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("market-dashboard/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Send a request and decode its JSON body.
///
/// Transport failures, 429 and 5xx are classified here; anything else is
/// handed back for the source to inspect, since several APIs report errors
/// inside a JSON body.
pub async fn get_json(request: reqwest::RequestBuilder) -> Result<JsonReply, PipelineError> {
    let response = request.send().await.map_err(transport_error)?;

    let status = response.status();
    check_status(status)?;

    let text = response.text().await.map_err(transport_error)?;
    let body = serde_json::from_str(&text)
        .map_err(|e| PipelineError::InvalidResponse(format!("body is not JSON: {}", e)))?;

    Ok(JsonReply { status, body })
}

fn check_status(status: StatusCode) -> Result<(), PipelineError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(PipelineError::RateLimited(format!("upstream returned {}", status)));
    }
    if status.is_server_error() {
        return Err(PipelineError::SourceUnavailable(format!(
            "upstream returned {}",
            status
        )));
    }
    Ok(())
}

fn transport_error(err: reqwest::Error) -> PipelineError {
    if err.is_timeout() {
        PipelineError::SourceUnavailable("request timed out".to_string())
    } else if err.is_decode() {
        PipelineError::InvalidResponse(err.to_string())
    } else {
        PipelineError::SourceUnavailable(err.to_string())
    }
}

/// Common tail of every source check: a non-success status that carried no
/// recognizable error body
pub fn require_success(reply: JsonReply) -> Result<Value, PipelineError> {
    if !reply.status.is_success() {
        return Err(PipelineError::InvalidResponse(format!(
            "unexpected status {}",
            reply.status
        )));
    }
    Ok(reply.body)
}
