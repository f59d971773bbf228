// Data source trait for the fetch step
use crate::domain::error::PipelineError;
use crate::domain::source::{ExternalResponse, SourceKind, SourceParams};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Perform a single upstream call. No retries.
    async fn fetch(&self, params: &SourceParams) -> Result<ExternalResponse, PipelineError>;
}

/// Sources available to panels, keyed by kind
pub type SourceRegistry = HashMap<SourceKind, Arc<dyn DataSource>>;
