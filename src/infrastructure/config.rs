use crate::domain::artifact::{ViewKind, ViewSpec};
use crate::domain::panel::PanelDefinition;
use crate::domain::source::{SourceKind, SourceParams};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub sources: SourcesSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// How long the page handler waits for panels re-triggered by a selection
    pub refresh_wait_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesSettings {
    pub news: SourceSettings,
    pub stock: SourceSettings,
    pub crypto: SourceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl SourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured key, ignoring blanks left by empty env vars
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelsConfig {
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelConfig {
    pub id: String,
    pub title: String,
    pub source: SourceKind,
    pub refresh_secs: u64,
    #[serde(default)]
    pub params: SourceParams,
    pub view: ViewSpec,
}

impl PanelsConfig {
    /// Validate and convert into panel definitions, keeping declaration order
    pub fn into_definitions(self) -> anyhow::Result<Vec<PanelDefinition>> {
        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(self.panels.len());

        for panel in self.panels {
            if panel.id.trim().is_empty() {
                anyhow::bail!("panel id must not be empty");
            }
            if !seen.insert(panel.id.clone()) {
                anyhow::bail!("duplicate panel id {}", panel.id);
            }
            if panel.refresh_secs == 0 {
                anyhow::bail!("panel {}: refresh_secs must be positive", panel.id);
            }
            check_view(&panel.id, &panel.view)?;

            definitions.push(PanelDefinition {
                id: panel.id,
                title: panel.title,
                source: panel.source,
                params: panel.params,
                refresh_interval: Duration::from_secs(panel.refresh_secs),
                view: panel.view,
            });
        }

        Ok(definitions)
    }
}

fn check_view(panel_id: &str, view: &ViewSpec) -> anyhow::Result<()> {
    let missing = match view.kind {
        ViewKind::Bar | ViewKind::Line if view.x_field.is_none() => Some("x_field"),
        ViewKind::Bar | ViewKind::Line if view.y_field.is_none() => Some("y_field"),
        ViewKind::List if view.label_field.is_none() => Some("label_field"),
        _ => None,
    };
    if let Some(field) = missing {
        anyhow::bail!("panel {}: {:?} view requires {}", panel_id, view.kind, field);
    }
    Ok(())
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_panels_config() -> anyhow::Result<PanelsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/panels"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace template variables in a title string
pub fn prepare_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse_panels(toml: &str) -> anyhow::Result<PanelsConfig> {
        Ok(Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }

    #[test]
    fn test_prepare_template() {
        let mut vars = HashMap::new();
        vars.insert("symbol".to_string(), "MSFT".to_string());
        vars.insert("category".to_string(), "technology".to_string());

        let result = prepare_template("${symbol} daily close (${category}, ${unknown})", &vars);

        assert_eq!(result, "MSFT daily close (technology, ${unknown})");
    }

    #[test]
    fn test_panels_config() {
        let panels = parse_panels(
            r#"
            [[panels]]
            id = "crypto"
            title = "Crypto prices (${currencies})"
            source = "crypto"
            refresh_secs = 60
            params = { coins = ["bitcoin", "ethereum"], currencies = ["usd"] }
            view = { kind = "bar", x_field = "name", y_field = "usd" }

            [[panels]]
            id = "headlines"
            title = "Top ${category} headlines"
            source = "news"
            refresh_secs = 300
            view = { kind = "list", label_field = "title", link_field = "url", max_items = 10 }
            "#,
        )
        .unwrap()
        .into_definitions()
        .unwrap();

        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].source, SourceKind::Crypto);
        assert_eq!(panels[0].params.coin_list(), vec!["bitcoin", "ethereum"]);
        assert_eq!(panels[0].view, ViewSpec::bar("name", "usd"));
        assert_eq!(panels[1].refresh_interval, Duration::from_secs(300));
        assert_eq!(panels[1].view.max_items, Some(10));
    }

    #[test]
    fn test_panels_config_rejects_bad_declarations() {
        let duplicate = r#"
            [[panels]]
            id = "a"
            title = "A"
            source = "crypto"
            refresh_secs = 60
            view = { kind = "bar", x_field = "name", y_field = "usd" }

            [[panels]]
            id = "a"
            title = "B"
            source = "crypto"
            refresh_secs = 60
            view = { kind = "bar", x_field = "name", y_field = "usd" }
        "#;
        assert!(parse_panels(duplicate).unwrap().into_definitions().is_err());

        let unbound = r#"
            [[panels]]
            id = "a"
            title = "A"
            source = "stock"
            refresh_secs = 60
            view = { kind = "line", x_field = "date" }
        "#;
        assert!(parse_panels(unbound).unwrap().into_definitions().is_err());

        let zero_interval = r#"
            [[panels]]
            id = "a"
            title = "A"
            source = "news"
            refresh_secs = 0
            view = { kind = "list", label_field = "title" }
        "#;
        assert!(parse_panels(zero_interval).unwrap().into_definitions().is_err());

        let unknown_source = r#"
            [[panels]]
            id = "a"
            title = "A"
            source = "weather"
            refresh_secs = 60
            view = { kind = "list", label_field = "title" }
        "#;
        assert!(parse_panels(unknown_source).is_err());
    }
}
