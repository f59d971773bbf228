// HTTP request handlers
use crate::application::refresh::RefreshState;
use crate::domain::artifact::ViewArtifact;
use crate::domain::source::ParamOverrides;
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use crate::presentation::html::{self, NEWS_CATEGORIES};
use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    Json,
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

const MAX_SYMBOL_LEN: usize = 10;
const MAX_LIST_ITEMS: usize = 10;

#[derive(Serialize)]
pub struct PanelView {
    pub state: RefreshState,
    pub artifact: ViewArtifact,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Render the whole dashboard, applying any selections from the query string
pub async fn dashboard_page(
    Query(query): Query<ParamOverrides>,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    let overrides = validate_overrides(query)?;
    if !overrides.is_empty() {
        tracing::info!("Applying dashboard selection {:?}", overrides);
    }

    let artifacts = state.dashboard.apply_overrides(&overrides).await;
    let selection = state.dashboard.selection();
    Ok(Html(html::render_page(&artifacts, &selection)))
}

/// Current artifact of one panel as JSON
pub async fn panel_artifact(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PanelView>, ApiError> {
    let panel = state
        .dashboard
        .panel(&id)
        .ok_or_else(|| ApiError::UnknownPanel(id.clone()))?;

    Ok(Json(PanelView {
        state: panel.state(),
        artifact: panel.current().as_ref().clone(),
    }))
}

/// Push the panel's HTML fragment every time a new artifact is published
pub async fn panel_events(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let panel = state
        .dashboard
        .panel(&id)
        .ok_or_else(|| ApiError::UnknownPanel(id.clone()))?;
    let mut rx = panel.subscribe();

    let stream = async_stream::stream! {
        loop {
            let artifact = rx.borrow_and_update().clone();
            yield Ok(Event::default()
                .event("artifact")
                .data(html::render_panel_fragment(&artifact)));
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Drop blank form fields and reject values that cannot be a valid selection
fn validate_overrides(query: ParamOverrides) -> Result<ParamOverrides, ApiError> {
    let overrides = ParamOverrides {
        symbol: non_blank(query.symbol),
        category: non_blank(query.category),
        coins: non_blank(query.coins),
        currencies: non_blank(query.currencies),
    };

    if let Some(symbol) = &overrides.symbol {
        let valid_chars = symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if symbol.len() > MAX_SYMBOL_LEN || !valid_chars {
            return Err(invalid("symbol", format!("'{}' is not a ticker symbol", symbol)));
        }
    }

    if let Some(category) = &overrides.category {
        if !NEWS_CATEGORIES.contains(&category.to_lowercase().as_str()) {
            return Err(invalid(
                "category",
                format!("expected one of {}", NEWS_CATEGORIES.join(", ")),
            ));
        }
    }

    if let Some(coins) = &overrides.coins {
        check_list("coins", coins, |c| c.is_ascii_alphanumeric() || c == '-')?;
    }

    if let Some(currencies) = &overrides.currencies {
        check_list("currencies", currencies, |c| c.is_ascii_alphabetic())?;
    }

    Ok(overrides)
}

fn check_list(name: &'static str, raw: &str, allowed: impl Fn(char) -> bool) -> Result<(), ApiError> {
    let items: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if items.is_empty() || items.len() > MAX_LIST_ITEMS {
        return Err(invalid(
            name,
            format!("expected 1 to {} comma separated values", MAX_LIST_ITEMS),
        ));
    }
    if let Some(bad) = items.iter().find(|item| !item.chars().all(&allowed)) {
        return Err(invalid(name, format!("'{}' is not allowed", bad)));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn invalid(name: &'static str, reason: String) -> ApiError {
    ApiError::InvalidParameter { name, reason }
}
