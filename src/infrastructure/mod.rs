// Infrastructure layer - External dependencies and adapters
pub mod alpha_vantage;
pub mod coingecko;
pub mod config;
pub mod http_json;
pub mod news_api;

use crate::application::data_source::{DataSource, SourceRegistry};
use crate::infrastructure::alpha_vantage::AlphaVantageSource;
use crate::infrastructure::coingecko::CoinGeckoSource;
use crate::infrastructure::config::SourcesSettings;
use crate::infrastructure::news_api::NewsApiSource;
use std::sync::Arc;

/// Build one client per upstream API from configuration
pub fn build_sources(settings: &SourcesSettings) -> anyhow::Result<SourceRegistry> {
    let sources: Vec<Arc<dyn DataSource>> = vec![
        Arc::new(NewsApiSource::new(&settings.news)?),
        Arc::new(AlphaVantageSource::new(&settings.stock)?),
        Arc::new(CoinGeckoSource::new(&settings.crypto)?),
    ];

    Ok(sources.into_iter().map(|s| (s.kind(), s)).collect())
}
