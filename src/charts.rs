//! Chart specifications.
//!
//! Charts are plain Plotly figures (`data` traces plus a `layout`) so the
//! JSON export can be handed to plotly.js as is, and the HTML page in
//! `output` needs no extra translation.

use crate::types::{AgeDistributionRecord, CountryVisitorSummary};
use serde::Serialize;
use serde_json::{json, Value};

/// Qualitative palette cycled across the lodging trend charts.
pub const SET1: [&str; 9] = [
    "#E41A1C", "#377EB8", "#4DAF4A", "#984EA3", "#FF7F00", "#FFFF33", "#A65628", "#F781BF",
    "#999999",
];

const PLASMA: [&str; 10] = [
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a",
    "#fdca26", "#f0f921",
];

/// Colour-bar ticks for `log10(visitors + 1)`, labelled with approximate
/// visitor counts.
pub const LOG_TICK_VALUES: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
pub const LOG_TICK_LABELS: [&str; 4] = ["1", "10", "100", "1000+"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Choropleth,
    StackedBar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub data: Vec<Value>,
    pub layout: Value,
}

pub fn palette_color(idx: usize) -> &'static str {
    SET1[idx % SET1.len()]
}

/// Single-series bar chart, one bar per `(label, value)` point.
pub fn bar_chart(title: &str, points: &[(String, f64)], color: &str, x_label: &str, y_label: &str) -> ChartSpec {
    let x: Vec<&str> = points.iter().map(|(label, _)| label.as_str()).collect();
    let y: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    ChartSpec {
        kind: ChartKind::Bar,
        title: title.to_string(),
        data: vec![json!({
            "type": "bar",
            "name": title,
            "x": x,
            "y": y,
            "marker": { "color": color },
        })],
        layout: json!({
            "title": { "text": title },
            "xaxis": { "title": { "text": x_label }, "type": "category" },
            "yaxis": { "title": { "text": y_label } },
        }),
    }
}

/// Europe-scoped choropleth coloured by `visitors_log`. The colour bar is
/// relabelled with real counts; the `z` values stay on the log scale.
pub fn visitors_choropleth(title: &str, summary: &[CountryVisitorSummary]) -> ChartSpec {
    let mapped: Vec<&CountryVisitorSummary> = summary.iter().filter(|s| s.country.is_some()).collect();
    let locations: Vec<&str> = mapped.iter().filter_map(|s| s.country.as_deref()).collect();
    let z: Vec<f64> = mapped.iter().map(|s| s.visitors_log).collect();
    let visitors: Vec<f64> = mapped.iter().map(|s| s.visitors).collect();

    let last = (PLASMA.len() - 1) as f64;
    let colorscale: Vec<Value> = PLASMA
        .iter()
        .enumerate()
        .map(|(i, c)| json!([i as f64 / last, c]))
        .collect();

    ChartSpec {
        kind: ChartKind::Choropleth,
        title: title.to_string(),
        data: vec![json!({
            "type": "choropleth",
            "locationmode": "country names",
            "locations": locations,
            "z": z,
            "customdata": visitors,
            "coloraxis": "coloraxis",
            "hovertemplate": "<b>%{location}</b><br>visitors=%{customdata}<extra></extra>",
        })],
        layout: json!({
            "title": { "text": title },
            "geo": { "scope": "europe" },
            "coloraxis": {
                "colorscale": colorscale,
                "colorbar": {
                    "title": { "text": "Escala log. de visitantes" },
                    "tickvals": LOG_TICK_VALUES,
                    "ticktext": LOG_TICK_LABELS,
                },
            },
        }),
    }
}

/// Stacked bars: one bar per lodging type, one segment per age bracket.
/// A lodging type without a given bracket gets no segment for it.
pub fn age_stacked_bar(title: &str, records: &[AgeDistributionRecord]) -> ChartSpec {
    let mut lodgings: Vec<&str> = Vec::new();
    let mut brackets: Vec<&str> = Vec::new();
    for r in records {
        if !lodgings.contains(&r.lodging_type.as_str()) {
            lodgings.push(&r.lodging_type);
        }
        if !brackets.contains(&r.age_bracket.as_str()) {
            brackets.push(&r.age_bracket);
        }
    }

    let data: Vec<Value> = brackets
        .iter()
        .map(|bracket| {
            let y: Vec<Option<f64>> = lodgings
                .iter()
                .map(|lodging| {
                    let matching: Vec<f64> = records
                        .iter()
                        .filter(|r| r.lodging_type == *lodging && r.age_bracket == *bracket)
                        .map(|r| r.count)
                        .collect();
                    if matching.is_empty() {
                        None
                    } else {
                        Some(matching.iter().sum())
                    }
                })
                .collect();
            json!({
                "type": "bar",
                "name": bracket,
                "x": lodgings,
                "y": y,
            })
        })
        .collect();

    ChartSpec {
        kind: ChartKind::StackedBar,
        title: title.to_string(),
        data,
        layout: json!({
            "title": { "text": title },
            "barmode": "stack",
            "xaxis": { "title": { "text": "ALOJAMIENTO" } },
            "yaxis": { "title": { "text": "Clientes" } },
            "legend": { "title": { "text": "Edad" } },
        }),
    }
}
