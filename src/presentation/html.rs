// HTML rendering of panel artifacts
//
// The page is built from the current artifacts on every request; nothing is
// patched in place server side. In the browser, each panel section swaps its
// contents when its event stream publishes a new fragment.
use crate::domain::artifact::{ArtifactBody, ChartPoint, ListItem, ViewArtifact, ViewKind};
use crate::domain::source::ParamOverrides;
use std::fmt::Write;
use std::sync::Arc;

pub const NEWS_CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 240.0;
const LABEL_BAND: f64 = 28.0;
const MAX_BAR_LABELS: usize = 16;

pub fn render_page(artifacts: &[Arc<ViewArtifact>], selection: &ParamOverrides) -> String {
    let mut panels = String::new();
    for artifact in artifacts {
        let _ = write!(
            panels,
            r#"<section class="panel" data-panel="{id}">{body}</section>"#,
            id = escape(&artifact.panel_id),
            body = render_panel_fragment(artifact),
        );
    }

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Market Dashboard</title>
    <style>
      body {{ margin: 0; font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; }}
      header {{ padding: 16px 24px; border-bottom: 1px solid #1e293b; }}
      form {{ display: flex; flex-wrap: wrap; gap: 12px; align-items: end; }}
      label {{ display: flex; flex-direction: column; font-size: 12px; color: #94a3b8; }}
      input, select, button {{ background: #1e293b; color: #e2e8f0; border: 1px solid #334155; border-radius: 6px; padding: 6px 8px; }}
      main {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(420px, 1fr)); gap: 16px; padding: 24px; }}
      .panel {{ background: #111c31; border: 1px solid #1e293b; border-radius: 12px; padding: 16px; }}
      .panel h2 {{ margin: 0 0 12px; font-size: 16px; }}
      .panel ul {{ margin: 0; padding-left: 18px; }}
      .panel li {{ margin-bottom: 8px; }}
      .panel a {{ color: #7dd3fc; }}
      .detail, .meta {{ color: #94a3b8; font-size: 12px; }}
      .placeholder {{ color: #fbbf24; }}
      svg text {{ fill: #94a3b8; font-size: 10px; }}
      .bar {{ fill: #38bdf8; }}
      .line {{ fill: none; stroke: #38bdf8; stroke-width: 2; }}
    </style>
  </head>
  <body>
    <header>
      <form method="get" action="/">
        <label>News category<select name="category">{categories}</select></label>
        <label>Stock symbol<input name="symbol" value="{symbol}" maxlength="10" /></label>
        <label>Coins<input name="coins" value="{coins}" /></label>
        <label>Currencies<input name="currencies" value="{currencies}" /></label>
        <button type="submit">Update</button>
      </form>
    </header>
    <main>{panels}</main>
    <script>
      document.querySelectorAll("section[data-panel]").forEach(function (section) {{
        var events = new EventSource("/panels/" + encodeURIComponent(section.dataset.panel) + "/events");
        events.addEventListener("artifact", function (e) {{ section.innerHTML = e.data; }});
      }});
    </script>
  </body>
</html>
"#,
        categories = category_options(selection.category.as_deref()),
        symbol = escape(selection.symbol.as_deref().unwrap_or_default()),
        coins = escape(selection.coins.as_deref().unwrap_or_default()),
        currencies = escape(selection.currencies.as_deref().unwrap_or_default()),
        panels = panels,
    )
}

/// Inner markup of one panel section, also pushed over the event stream
pub fn render_panel_fragment(artifact: &ViewArtifact) -> String {
    let body = match &artifact.body {
        ArtifactBody::Chart {
            kind,
            unit,
            fraction_digits,
            points,
            ..
        } => render_chart(*kind, points, unit.as_deref(), *fraction_digits),
        ArtifactBody::List { items } => render_list(items),
        ArtifactBody::Placeholder { headline, reason } => format!(
            r#"<p class="placeholder"><strong>{}</strong></p><p class="detail">{}</p>"#,
            escape(headline),
            escape(reason)
        ),
    };

    format!(
        r#"<h2>{title}</h2>{body}<p class="meta">Updated {updated} &middot; <a href="/panels/{json_id}">json</a></p>"#,
        title = escape(&artifact.title),
        body = body,
        updated = artifact.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        json_id = urlencoding::encode(&artifact.panel_id),
    )
}

fn render_list(items: &[ListItem]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str("<li>");
        match &item.link {
            Some(link) if is_http_link(link) => {
                let _ = write!(
                    out,
                    r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
                    escape(link),
                    escape(&item.title)
                );
            }
            _ => out.push_str(&escape(&item.title)),
        }
        if let Some(detail) = &item.detail {
            let _ = write!(out, r#"<div class="detail">{}</div>"#, escape(detail));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn render_chart(kind: ViewKind, points: &[ChartPoint], unit: Option<&str>, digits: usize) -> String {
    let plot_height = CHART_HEIGHT - LABEL_BAND;
    let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
    let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    // Bars grow from zero; lines use the data range
    let (low, high) = match kind {
        ViewKind::Bar => (min.min(0.0), max.max(0.0)),
        _ => (min, max),
    };
    let range = if high > low { high - low } else { 1.0 };
    let y_of = |value: f64| plot_height - (value - low) / range * plot_height;

    let mut svg = format!(
        r#"<svg viewBox="0 0 {w} {h}" width="100%" role="img">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );

    match kind {
        ViewKind::Bar => {
            let slot = CHART_WIDTH / points.len().max(1) as f64;
            for (i, point) in points.iter().enumerate() {
                let top = y_of(point.value.max(0.0));
                let bottom = y_of(point.value.min(0.0));
                let x = i as f64 * slot + slot * 0.15;
                let _ = write!(
                    svg,
                    r#"<rect class="bar" x="{x:.1}" y="{y:.1}" width="{bw:.1}" height="{bh:.1}"><title>{tip}</title></rect>"#,
                    x = x,
                    y = top,
                    bw = slot * 0.7,
                    bh = (bottom - top).max(1.0),
                    tip = escape(&tooltip(point, unit, digits)),
                );
                if points.len() <= MAX_BAR_LABELS {
                    let _ = write!(
                        svg,
                        r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle">{label}</text>"#,
                        x = i as f64 * slot + slot / 2.0,
                        y = CHART_HEIGHT - 8.0,
                        label = escape(&point.label),
                    );
                }
            }
        }
        _ => {
            let step = if points.len() > 1 {
                CHART_WIDTH / (points.len() - 1) as f64
            } else {
                0.0
            };
            let coords: Vec<String> = points
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{:.1},{:.1}", i as f64 * step, y_of(p.value)))
                .collect();
            let _ = write!(svg, r#"<polyline class="line" points="{}" />"#, coords.join(" "));

            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                let _ = write!(
                    svg,
                    r#"<text x="0" y="{y}" text-anchor="start">{first}</text><text x="{w}" y="{y}" text-anchor="end">{last}</text>"#,
                    y = CHART_HEIGHT - 8.0,
                    w = CHART_WIDTH,
                    first = escape(&tooltip(first, unit, digits)),
                    last = escape(&tooltip(last, unit, digits)),
                );
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

fn tooltip(point: &ChartPoint, unit: Option<&str>, digits: usize) -> String {
    match unit {
        Some(unit) => format!("{}: {:.*} {}", point.label, digits, point.value, unit),
        None => format!("{}: {:.*}", point.label, digits, point.value),
    }
}

fn category_options(selected: Option<&str>) -> String {
    NEWS_CATEGORIES
        .iter()
        .map(|c| {
            let marker = if Some(*c) == selected { " selected" } else { "" };
            format!(r#"<option value="{c}"{marker}>{c}</option>"#)
        })
        .collect()
}

fn is_http_link(link: &str) -> bool {
    link.starts_with("https://") || link.starts_with("http://")
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
