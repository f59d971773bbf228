// View declarations and the rendered artifacts bound to panels
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Bar,
    Line,
    List,
}

/// How a panel turns its table into an artifact
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewSpec {
    pub kind: ViewKind,
    pub x_field: Option<String>,
    pub y_field: Option<String>,
    pub label_field: Option<String>,
    pub link_field: Option<String>,
    pub detail_field: Option<String>,
    pub max_points: Option<usize>,
    pub max_items: Option<usize>,
    pub unit: Option<String>,
    pub fraction_digits: Option<usize>,
}

#[cfg(test)]
impl ViewSpec {
    pub fn bar(x_field: &str, y_field: &str) -> Self {
        Self::chart(ViewKind::Bar, x_field, y_field)
    }

    pub fn line(x_field: &str, y_field: &str) -> Self {
        Self::chart(ViewKind::Line, x_field, y_field)
    }

    pub fn list(label_field: &str) -> Self {
        Self {
            label_field: Some(label_field.to_string()),
            ..Self::empty(ViewKind::List)
        }
    }

    fn chart(kind: ViewKind, x_field: &str, y_field: &str) -> Self {
        Self {
            x_field: Some(x_field.to_string()),
            y_field: Some(y_field.to_string()),
            ..Self::empty(kind)
        }
    }

    fn empty(kind: ViewKind) -> Self {
        Self {
            kind,
            x_field: None,
            y_field: None,
            label_field: None,
            link_field: None,
            detail_field: None,
            max_points: None,
            max_items: None,
            unit: None,
            fraction_digits: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub title: String,
    pub link: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactBody {
    Chart {
        kind: ViewKind,
        x_field: String,
        y_field: String,
        unit: Option<String>,
        fraction_digits: usize,
        points: Vec<ChartPoint>,
    },
    List {
        items: Vec<ListItem>,
    },
    Placeholder {
        headline: String,
        reason: String,
    },
}

impl ArtifactBody {
    pub fn placeholder(headline: impl Into<String>, reason: impl Into<String>) -> Self {
        ArtifactBody::Placeholder {
            headline: headline.into(),
            reason: reason.into(),
        }
    }
}

/// Latest rendering of one panel. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewArtifact {
    pub panel_id: String,
    pub title: String,
    /// Trigger generation whose parameters produced this artifact
    pub generation: u64,
    pub generated_at: DateTime<Utc>,
    pub body: ArtifactBody,
}

impl ViewArtifact {
    pub fn new(panel_id: String, title: String, generation: u64, body: ArtifactBody) -> Self {
        Self {
            panel_id,
            title,
            generation,
            generated_at: Utc::now(),
            body,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, ArtifactBody::Placeholder { .. })
    }
}
