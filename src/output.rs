use crate::ages::age_rows;
use crate::nationalities::country_rows;
use crate::reservations::{lodging_totals, ranking_rows};
use crate::views::{Block, Section, TableData, View};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn write_table_csv(path: &Path, table: &TableData) -> Result<()> {
    match table {
        TableData::Kpis(rows) => write_csv(path, rows),
        TableData::Reservations(rows) => write_csv(path, rows),
        TableData::Countries(rows) => write_csv(path, rows),
        TableData::Ages(rows) => write_csv(path, rows),
    }
}

/// Files written for one rendered section.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Write the CSV table, JSON view and HTML page of a section into `dir`.
pub fn export_view(dir: &Path, view: &View) -> Result<ExportPaths> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let stem = view.section.slug();
    let paths = ExportPaths {
        csv: dir.join(format!("{stem}.csv")),
        json: dir.join(format!("{stem}.json")),
        html: dir.join(format!("{stem}.html")),
    };
    write_table_csv(&paths.csv, &view.table)?;
    write_json(&paths.json, view)?;
    fs::write(&paths.html, render_html(view))
        .with_context(|| format!("writing {}", paths.html.display()))?;
    Ok(paths)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Print the section's table the way it reads best on a console: reservation
/// records collapse into the lodging ranking.
pub fn preview_table(table: &TableData, max_rows: usize) {
    match table {
        TableData::Kpis(rows) => preview_table_rows(rows, max_rows),
        TableData::Reservations(rows) => {
            preview_table_rows(&ranking_rows(&lodging_totals(rows), max_rows), max_rows)
        }
        TableData::Countries(rows) => preview_table_rows(&country_rows(rows), max_rows),
        TableData::Ages(rows) => preview_table_rows(&age_rows(rows), max_rows),
    }
}

/// Print headings, markdown and captions. Charts are only named; they live
/// in the exported files.
pub fn print_view(view: &View) {
    println!("# {}\n", view.title);
    for block in &view.blocks {
        match block {
            Block::Heading(h) => println!("## {}\n", h),
            Block::Markdown(m) => println!("{}", m),
            Block::Chart(c) => println!("\n[chart] {}", c.title),
            Block::Caption(c) => println!("_{}_\n", c),
            Block::Rule => println!("\n---\n"),
        }
    }
    println!();
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `**bold**` to `<strong>`, on already-escaped text.
fn inline_markdown(s: &str) -> String {
    let mut out = String::new();
    for (i, part) in escape_html(s).split("**").enumerate() {
        if i % 2 == 1 {
            let _ = write!(out, "<strong>{}</strong>", part);
        } else {
            out.push_str(part);
        }
    }
    out
}

fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

/// Standalone page: a sidebar linking the four sections and the section's
/// content drawn with plotly.js.
pub fn render_html(view: &View) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>{} - {}</title>", escape_html(&view.title), view.section.label());
    let _ = writeln!(html, "<script src=\"{}\"></script>", PLOTLY_CDN);
    html.push_str(
        "<style>body{display:flex;font-family:sans-serif;margin:0}nav{width:14rem;padding:1rem;background:#f0f2f6}\
         main{flex:1;padding:1rem 2rem}.caption{color:#666;font-size:.9rem}nav a.active{font-weight:bold}</style>\n",
    );
    html.push_str("</head>\n<body>\n<nav>\n<h3>Filtros</h3>\n<ul>\n");
    for section in Section::ALL {
        let class = if section == view.section { " class=\"active\"" } else { "" };
        let _ = writeln!(
            html,
            "<li><a href=\"{}.html\"{}>{}</a></li>",
            section.slug(),
            class,
            section.label()
        );
    }
    html.push_str("</ul>\n</nav>\n<main>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(&view.title));

    let mut in_list = false;
    let mut chart_idx = 0usize;
    for block in &view.blocks {
        let is_item = matches!(block, Block::Markdown(m) if m.starts_with("- "));
        if in_list && !is_item {
            html.push_str("</ul>\n");
            in_list = false;
        }
        match block {
            Block::Heading(h) => {
                let _ = writeln!(html, "<h2>{}</h2>", escape_html(h));
            }
            Block::Markdown(m) if is_item => {
                if !in_list {
                    html.push_str("<ul>\n");
                    in_list = true;
                }
                let _ = writeln!(html, "<li>{}</li>", inline_markdown(&m[2..]));
            }
            Block::Markdown(m) => {
                let _ = writeln!(html, "<p>{}</p>", inline_markdown(m));
            }
            Block::Chart(chart) => {
                let _ = writeln!(
                    html,
                    "<div id=\"chart-{id}\"></div>\n<script>Plotly.newPlot(\"chart-{id}\", {data}, {layout}, {{responsive: true}});</script>",
                    id = chart_idx,
                    data = script_json(&chart.data),
                    layout = script_json(&chart.layout),
                );
                chart_idx += 1;
            }
            Block::Caption(c) => {
                let _ = writeln!(html, "<p class=\"caption\">{}</p>", escape_html(c));
            }
            Block::Rule => html.push_str("<hr>\n"),
        }
    }
    if in_list {
        html.push_str("</ul>\n");
    }
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::bar_chart;
    use crate::types::KpiRow;

    fn sample_view() -> View {
        View {
            section: Section::GeneralSummary,
            title: "Camping <Nerpio>".to_string(),
            blocks: vec![
                Block::Heading("Perfil".to_string()),
                Block::Markdown("- Alojamiento más usado: **Parcela**.".to_string()),
                Block::Markdown("- Mes: **abril 2025**.".to_string()),
                Block::Chart(bar_chart(
                    "Parcela",
                    &[("2025-04".to_string(), 1.0)],
                    "#E41A1C",
                    "Mes",
                    "Cantidad",
                )),
                Block::Caption("nota".to_string()),
                Block::Rule,
            ],
            table: TableData::Kpis(vec![KpiRow {
                indicator: "Reservas totales".to_string(),
                value: "1".to_string(),
            }]),
        }
    }

    #[test]
    fn html_escapes_text_and_groups_list_items() {
        let html = render_html(&sample_view());
        assert!(html.contains("<h1>Camping &lt;Nerpio&gt;</h1>"));
        assert!(html.contains(
            "<li>Alojamiento más usado: <strong>Parcela</strong>.</li>\n<li>Mes: <strong>abril 2025</strong>.</li>\n</ul>"
        ));
        assert!(html.contains("Plotly.newPlot(\"chart-0\""));
        assert!(html.contains("<a href=\"resumen_general.html\" class=\"active\">"));
        assert!(html.contains("<a href=\"nacionalidades.html\">"));
    }

    #[test]
    fn export_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = export_view(dir.path(), &sample_view()).unwrap();
        let csv = fs::read_to_string(&paths.csv).unwrap();
        assert!(csv.starts_with("Indicador,Valor"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json["section"], "general_summary");
        assert_eq!(json["blocks"][3]["type"], "chart");
        assert!(paths.html.exists());
    }

    #[test]
    fn script_json_cannot_close_the_script_tag() {
        assert_eq!(script_json(&"</script>"), "\"<\\/script>\"");
    }
}
