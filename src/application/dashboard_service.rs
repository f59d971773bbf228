// Dashboard service - Owns the running panels and applies user selections
use crate::application::data_source::SourceRegistry;
use crate::application::refresh::{spawn_panel, PanelHandle};
use crate::domain::artifact::ViewArtifact;
use crate::domain::panel::PanelDefinition;
use crate::domain::source::{ParamOverrides, SourceKind};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct DashboardService {
    panels: Arc<Vec<PanelHandle>>,
    refresh_wait: Duration,
}

impl DashboardService {
    /// Spawn one refresh worker per panel, in declaration order
    pub fn start(
        definitions: Vec<PanelDefinition>,
        sources: &SourceRegistry,
        refresh_wait: Duration,
    ) -> anyhow::Result<Self> {
        let mut panels = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let source = sources.get(&definition.source).cloned().ok_or_else(|| {
                anyhow::anyhow!(
                    "panel {} uses source {} which is not configured",
                    definition.id,
                    definition.source
                )
            })?;
            panels.push(spawn_panel(definition, source));
        }

        Ok(Self {
            panels: Arc::new(panels),
            refresh_wait,
        })
    }

    pub fn panel(&self, id: &str) -> Option<&PanelHandle> {
        self.panels.iter().find(|p| p.id() == id)
    }

    /// Current artifacts of every panel
    pub fn artifacts(&self) -> Vec<Arc<ViewArtifact>> {
        self.panels.iter().map(PanelHandle::current).collect()
    }

    /// Trigger every panel whose parameters change under `overrides`, wait
    /// (bounded) for their fresh artifacts, and return all current artifacts.
    pub async fn apply_overrides(&self, overrides: &ParamOverrides) -> Vec<Arc<ViewArtifact>> {
        if overrides.is_empty() {
            return self.artifacts();
        }

        let waits = self.panels.iter().map(|panel| async move {
            let current = panel.params();
            let next = current.apply(panel.definition().source, overrides);
            if next == current {
                return panel.current();
            }
            let generation = panel.trigger(Some(next));
            panel.wait_for_generation(generation, self.refresh_wait).await
        });

        join_all(waits).await
    }

    /// The selections currently in effect, for pre-filling the page form
    pub fn selection(&self) -> ParamOverrides {
        let mut selection = ParamOverrides::default();
        for panel in self.panels.iter() {
            let params = panel.params();
            match panel.definition().source {
                SourceKind::Stock if selection.symbol.is_none() => {
                    selection.symbol = Some(params.symbol_or_default());
                }
                SourceKind::News if selection.category.is_none() => {
                    selection.category = Some(params.category_or_default());
                }
                SourceKind::Crypto if selection.coins.is_none() => {
                    selection.coins = Some(params.coin_list().join(","));
                    selection.currencies = Some(params.currency_list().join(","));
                }
                _ => {}
            }
        }
        selection
    }
}
