// Refresh worker - drives one panel through fetch, normalize, render, publish
//
// Each panel owns two watch channels. Triggers flow in through the first one,
// so a burst of triggers collapses to the latest parameters. Artifacts flow
// out through the second, where every publish atomically replaces the
// previous `Arc<ViewArtifact>`.
use crate::application::data_source::DataSource;
use crate::application::normalize::normalize;
use crate::application::render::render_or_placeholder;
use crate::domain::artifact::{ArtifactBody, ViewArtifact, ViewSpec};
use crate::domain::error::PipelineError;
use crate::domain::panel::PanelDefinition;
use crate::domain::source::{ExternalResponse, SourceParams};
use crate::infrastructure::config::prepare_template;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    Idle,
    Fetching,
    Rendering,
}

#[derive(Debug, Clone)]
struct TriggerRequest {
    generation: u64,
    params: SourceParams,
}

/// Cheap, cloneable view of a running panel
#[derive(Clone)]
pub struct PanelHandle {
    definition: Arc<PanelDefinition>,
    trigger_tx: Arc<watch::Sender<TriggerRequest>>,
    artifact_rx: watch::Receiver<Arc<ViewArtifact>>,
    state_rx: watch::Receiver<RefreshState>,
}

impl PanelHandle {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn definition(&self) -> &PanelDefinition {
        &self.definition
    }

    /// Parameters of the most recent trigger
    pub fn params(&self) -> SourceParams {
        self.trigger_tx.borrow().params.clone()
    }

    pub fn state(&self) -> RefreshState {
        *self.state_rx.borrow()
    }

    pub fn current(&self) -> Arc<ViewArtifact> {
        self.artifact_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewArtifact>> {
        self.artifact_rx.clone()
    }

    /// Request a refresh, optionally with new parameters.
    /// Returns the generation the resulting artifact will carry.
    pub fn trigger(&self, params: Option<SourceParams>) -> u64 {
        let mut generation = 0;
        self.trigger_tx.send_modify(|request| {
            request.generation += 1;
            if let Some(params) = params {
                request.params = params;
            }
            generation = request.generation;
        });
        tracing::debug!("Panel {} triggered (generation {})", self.id(), generation);
        generation
    }

    /// Wait until an artifact of at least `generation` is published, falling
    /// back to whatever is current once `timeout` elapses.
    pub async fn wait_for_generation(&self, generation: u64, timeout: Duration) -> Arc<ViewArtifact> {
        let mut rx = self.artifact_rx.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|a| a.generation >= generation)).await {
            Ok(Ok(artifact)) => artifact.clone(),
            _ => {
                tracing::debug!(
                    "Panel {} did not publish generation {} within {:?}",
                    self.id(),
                    generation,
                    timeout
                );
                self.current()
            }
        }
    }
}

pub struct PanelWorker {
    definition: Arc<PanelDefinition>,
    source: Arc<dyn DataSource>,
    trigger_rx: watch::Receiver<TriggerRequest>,
    artifact_tx: watch::Sender<Arc<ViewArtifact>>,
    state_tx: watch::Sender<RefreshState>,
}

/// Spawn the worker task for a panel. The task ends once every handle is dropped.
pub fn spawn_panel(definition: PanelDefinition, source: Arc<dyn DataSource>) -> PanelHandle {
    let definition = Arc::new(definition);

    let (trigger_tx, trigger_rx) = watch::channel(TriggerRequest {
        generation: 0,
        params: definition.params.clone(),
    });
    let loading = ViewArtifact::new(
        definition.id.clone(),
        panel_title(&definition, &definition.params),
        0,
        ArtifactBody::placeholder("Loading", "Waiting for the first refresh"),
    );
    let (artifact_tx, artifact_rx) = watch::channel(Arc::new(loading));
    let (state_tx, state_rx) = watch::channel(RefreshState::Idle);

    let worker = PanelWorker {
        definition: definition.clone(),
        source,
        trigger_rx,
        artifact_tx,
        state_tx,
    };
    tokio::spawn(worker.run());

    PanelHandle {
        definition,
        trigger_tx: Arc::new(trigger_tx),
        artifact_rx,
        state_rx,
    }
}

impl PanelWorker {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.definition.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Panel {} refreshing from {} every {:?}",
            self.definition.id,
            self.definition.source,
            self.definition.refresh_interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = self.trigger_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            self.refresh().await;
        }

        tracing::debug!("Panel {} worker stopped", self.definition.id);
    }

    /// One pass through the pipeline. A result that comes back after a newer
    /// trigger is discarded and the newer trigger is served instead.
    async fn refresh(&mut self) {
        loop {
            let request = self.trigger_rx.borrow_and_update().clone();

            self.state_tx.send_replace(RefreshState::Fetching);
            let fetched = self.source.fetch(&request.params).await;

            if self.trigger_rx.has_changed().unwrap_or(false) {
                tracing::debug!(
                    "Panel {} discarding stale result of generation {}",
                    self.definition.id,
                    request.generation
                );
                // Triggers arriving faster than the source answers keep the
                // previous artifact on screen until they stop.
                continue;
            }

            self.state_tx.send_replace(RefreshState::Rendering);
            let artifact = build_artifact(&self.definition, &request.params, request.generation, fetched);
            if artifact.is_placeholder() {
                tracing::debug!("Panel {} published a placeholder", self.definition.id);
            }
            self.artifact_tx.send_replace(Arc::new(artifact));
            self.state_tx.send_replace(RefreshState::Idle);
            return;
        }
    }
}

fn build_artifact(
    definition: &PanelDefinition,
    params: &SourceParams,
    generation: u64,
    fetched: Result<ExternalResponse, PipelineError>,
) -> ViewArtifact {
    let vars = params.template_vars();
    let body = match fetched {
        Ok(response) => {
            let table = normalize(&response, params);
            tracing::debug!(
                "Panel {} normalized {} rows from response received at {}",
                definition.id,
                table.len(),
                response.received_at
            );
            render_or_placeholder(&bind_view(&definition.view, &vars), &table)
        }
        Err(e) => {
            tracing::warn!("Panel {} fetch failed: {}", definition.id, e);
            ArtifactBody::placeholder(e.headline(), e.to_string())
        }
    };

    ViewArtifact::new(
        definition.id.clone(),
        prepare_template(&definition.title, &vars),
        generation,
        body,
    )
}

/// Column bindings may name a parameter, e.g. `y_field = "${currency}"`
fn bind_view(view: &ViewSpec, vars: &HashMap<String, String>) -> ViewSpec {
    let bind = |field: &Option<String>| field.as_deref().map(|f| prepare_template(f, vars));
    ViewSpec {
        x_field: bind(&view.x_field),
        y_field: bind(&view.y_field),
        label_field: bind(&view.label_field),
        link_field: bind(&view.link_field),
        detail_field: bind(&view.detail_field),
        unit: bind(&view.unit),
        ..view.clone()
    }
}

fn panel_title(definition: &PanelDefinition, params: &SourceParams) -> String {
    prepare_template(&definition.title, &params.template_vars())
}
