// Panel domain model
use super::artifact::ViewSpec;
use super::source::{SourceKind, SourceParams};
use std::time::Duration;

/// A named dashboard region bound to one data source and one view
#[derive(Debug, Clone)]
pub struct PanelDefinition {
    pub id: String,
    /// Title template, `${var}` placeholders are filled from the current params
    pub title: String,
    pub source: SourceKind,
    pub params: SourceParams,
    pub refresh_interval: Duration,
    pub view: ViewSpec,
}
