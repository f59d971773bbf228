// Render step - tables into chart or list artifacts
use crate::domain::artifact::{ArtifactBody, ChartPoint, ListItem, ViewKind, ViewSpec};
use crate::domain::error::PipelineError;
use crate::domain::table::Table;

const DEFAULT_FRACTION_DIGITS: usize = 2;
pub const NO_DATA_HEADLINE: &str = "No data";

pub fn render(spec: &ViewSpec, table: &Table) -> Result<ArtifactBody, PipelineError> {
    match spec.kind {
        ViewKind::Bar | ViewKind::Line => render_chart(spec, table),
        ViewKind::List => render_list(spec, table),
    }
}

/// Render, degrading every failure to a placeholder
pub fn render_or_placeholder(spec: &ViewSpec, table: &Table) -> ArtifactBody {
    render(spec, table).unwrap_or_else(|e| {
        tracing::warn!("Render failed: {}", e);
        ArtifactBody::placeholder(e.headline(), e.to_string())
    })
}

fn render_chart(spec: &ViewSpec, table: &Table) -> Result<ArtifactBody, PipelineError> {
    let x_field = binding(table, "x_field", spec.x_field.as_deref())?;
    let y_field = binding(table, "y_field", spec.y_field.as_deref())?;

    if table.is_empty() {
        return Ok(no_data());
    }

    let mut points = Vec::with_capacity(table.len());
    for row in table.rows() {
        let label = row.get(x_field).map(|s| s.label()).unwrap_or_default();
        let value = row.get(y_field).and_then(|s| s.as_f64()).ok_or_else(|| {
            PipelineError::RenderFailure(format!("column '{}' is not numeric", y_field))
        })?;
        points.push(ChartPoint::new(label, value));
    }

    if let Some(max_points) = spec.max_points {
        points = downsample_points(points, max_points);
    }

    Ok(ArtifactBody::Chart {
        kind: spec.kind,
        x_field: x_field.to_string(),
        y_field: y_field.to_string(),
        unit: spec.unit.clone(),
        fraction_digits: spec.fraction_digits.unwrap_or(DEFAULT_FRACTION_DIGITS),
        points,
    })
}

fn render_list(spec: &ViewSpec, table: &Table) -> Result<ArtifactBody, PipelineError> {
    let label_field = binding(table, "label_field", spec.label_field.as_deref())?;
    let link_field = optional_binding(table, "link_field", spec.link_field.as_deref())?;
    let detail_field = optional_binding(table, "detail_field", spec.detail_field.as_deref())?;

    if table.is_empty() {
        return Ok(no_data());
    }

    let limit = spec.max_items.unwrap_or(usize::MAX);
    let items = table
        .rows()
        .iter()
        .take(limit)
        .map(|row| ListItem {
            title: row.get(label_field).map(|s| s.label()).unwrap_or_default(),
            link: link_field
                .and_then(|f| row.get(f))
                .map(|s| s.label())
                .filter(|s| !s.is_empty()),
            detail: detail_field
                .and_then(|f| row.get(f))
                .map(|s| s.label())
                .filter(|s| !s.is_empty()),
        })
        .collect();

    Ok(ArtifactBody::List { items })
}

fn no_data() -> ArtifactBody {
    ArtifactBody::placeholder(NO_DATA_HEADLINE, "The source returned no rows")
}

fn binding<'a>(
    table: &Table,
    role: &str,
    field: Option<&'a str>,
) -> Result<&'a str, PipelineError> {
    let field = field
        .ok_or_else(|| PipelineError::RenderFailure(format!("view declares no {}", role)))?;
    if !table.has_column(field) {
        return Err(PipelineError::RenderFailure(format!(
            "{} '{}' is not in table schema {:?}",
            role,
            field,
            table.schema()
        )));
    }
    Ok(field)
}

fn optional_binding<'a>(
    table: &Table,
    role: &str,
    field: Option<&'a str>,
) -> Result<Option<&'a str>, PipelineError> {
    match field {
        Some(f) => binding(table, role, Some(f)).map(Some),
        None => Ok(None),
    }
}

/// Downsample chart points using bucket averaging
fn downsample_points(points: Vec<ChartPoint>, max_points: usize) -> Vec<ChartPoint> {
    if max_points == 0 || points.len() <= max_points {
        return points;
    }

    let bucket_size = (points.len() as f64 / max_points as f64).ceil() as usize;
    let mut downsampled = Vec::with_capacity(max_points);

    for chunk in points.chunks(bucket_size) {
        // Middle point's label, average value
        let mid_idx = chunk.len() / 2;
        let avg_value = chunk.iter().map(|p| p.value).sum::<f64>() / chunk.len() as f64;
        downsampled.push(ChartPoint::new(chunk[mid_idx].label.clone(), avg_value));
    }

    downsampled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Row;

    fn crypto_table() -> Table {
        let mut table = Table::empty(&["name", "usd"]);
        table
            .push(Row::new().with("name", "bitcoin").with("usd", 45000.0))
            .unwrap();
        table
            .push(Row::new().with("name", "ethereum").with("usd", 3200.0))
            .unwrap();
        table
    }

    #[test]
    fn test_two_bar_chart_labeled_by_name() {
        let body = render(&ViewSpec::bar("name", "usd"), &crypto_table()).unwrap();

        match body {
            ArtifactBody::Chart { kind, points, .. } => {
                assert_eq!(kind, ViewKind::Bar);
                assert_eq!(
                    points,
                    vec![
                        ChartPoint::new("bitcoin", 45000.0),
                        ChartPoint::new("ethereum", 3200.0)
                    ]
                );
            }
            other => panic!("expected chart, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_table_renders_placeholder() {
        let empty = Table::empty(&["name", "usd"]);
        for spec in [ViewSpec::bar("name", "usd"), ViewSpec::line("name", "usd"), ViewSpec::list("name")] {
            let body = render(&spec, &empty).unwrap();
            assert!(matches!(body, ArtifactBody::Placeholder { .. }));
        }
    }

    #[test]
    fn test_bad_binding_is_render_failure() {
        let err = render(&ViewSpec::bar("symbol", "usd"), &crypto_table()).unwrap_err();
        assert!(matches!(err, PipelineError::RenderFailure(_)));

        // Text column bound as a value
        let err = render(&ViewSpec::bar("usd", "name"), &crypto_table()).unwrap_err();
        assert!(matches!(err, PipelineError::RenderFailure(_)));

        let mut spec = ViewSpec::list("name");
        spec.link_field = Some("url".into());
        let err = render(&spec, &crypto_table()).unwrap_err();
        assert!(matches!(err, PipelineError::RenderFailure(_)));
    }

    #[test]
    fn test_render_or_placeholder_degrades() {
        let body = render_or_placeholder(&ViewSpec::line("date", "close"), &crypto_table());
        match body {
            ArtifactBody::Placeholder { headline, .. } => {
                assert_eq!(headline, "Panel could not be rendered")
            }
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_list_truncates_and_binds_optional_fields() {
        let mut table = Table::empty(&["title", "url", "description"]);
        for i in 0..5 {
            table
                .push(
                    Row::new()
                        .with("title", format!("Headline {}", i))
                        .with("url", format!("https://example.com/{}", i))
                        .with("description", ""),
                )
                .unwrap();
        }

        let mut spec = ViewSpec::list("title");
        spec.link_field = Some("url".into());
        spec.detail_field = Some("description".into());
        spec.max_items = Some(3);

        match render(&spec, &table).unwrap() {
            ArtifactBody::List { items } => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[0].title, "Headline 0");
                assert_eq!(items[0].link.as_deref(), Some("https://example.com/0"));
                assert_eq!(items[0].detail, None);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_downsample_points() {
        let points: Vec<ChartPoint> = (0..10)
            .map(|i| ChartPoint::new(i.to_string(), i as f64))
            .collect();

        let downsampled = downsample_points(points.clone(), 5);
        assert_eq!(downsampled.len(), 5);
        assert_eq!(downsampled[0], ChartPoint::new("1", 0.5));
        assert_eq!(downsampled[4], ChartPoint::new("9", 8.5));

        assert_eq!(downsample_points(points.clone(), 20), points);
    }
}
