use crate::ages::normalize_workbook;
use crate::charts::{age_stacked_bar, bar_chart, palette_color, visitors_choropleth, ChartSpec};
use crate::config::DashboardConfig;
use crate::loader::WorkbookCache;
use crate::nationalities::{extract_nationalities, summarize_countries};
use crate::reservations::{extract_reservations, monthly_trend, top_lodging_types};
use crate::scanner::BlockScanner;
use crate::summary::build_profile;
use crate::types::{
    AgeDistributionRecord, CountryVisitorSummary, KpiRow, ReservationRecord, Workbook,
};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

const PROFILE_CAPTION: &str =
    "Este perfil permite adaptar la oferta a las necesidades de un público familiar y nacional.";
const MAP_CAPTION: &str = "El mapa representa el volumen total de llegadas desde distintos países europeos durante el periodo analizado.";
const AGE_CAPTION: &str = "Este gráfico muestra qué edades se concentran más en cada tipo de alojamiento. Ayuda a perfilar mejor las preferencias de cada grupo.";

/// The four mutually exclusive dashboard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    GeneralSummary,
    MonthlyReservations,
    Nationalities,
    AgeByLodging,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::GeneralSummary,
        Section::MonthlyReservations,
        Section::Nationalities,
        Section::AgeByLodging,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::GeneralSummary => "Resumen general",
            Section::MonthlyReservations => "Reservas mensuales",
            Section::Nationalities => "Nacionalidades",
            Section::AgeByLodging => "Edad por alojamiento",
        }
    }

    /// File stem for the section's exports.
    pub fn slug(self) -> &'static str {
        match self {
            Section::GeneralSummary => "resumen_general",
            Section::MonthlyReservations => "reservas_mensuales",
            Section::Nationalities => "nacionalidades",
            Section::AgeByLodging => "edad_por_alojamiento",
        }
    }

    /// Menu choice `"1"`..`"4"` to section.
    pub fn from_choice(choice: &str) -> Option<Section> {
        let idx: usize = choice.trim().parse().ok()?;
        idx.checked_sub(1).and_then(|i| Section::ALL.get(i).copied())
    }
}

/// One piece of rendered content, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Block {
    Heading(String),
    Markdown(String),
    Chart(ChartSpec),
    Caption(String),
    Rule,
}

/// The normalized table behind a section, exported alongside the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum TableData {
    Kpis(Vec<KpiRow>),
    Reservations(Vec<ReservationRecord>),
    Countries(Vec<CountryVisitorSummary>),
    Ages(Vec<AgeDistributionRecord>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub section: Section,
    pub title: String,
    pub blocks: Vec<Block>,
    pub table: TableData,
}

impl View {
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart(c) => Some(c),
            _ => None,
        })
    }

    pub fn captions(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Caption(c) => Some(c.as_str()),
            _ => None,
        })
    }
}

/// Run one section end to end: fetch its workbooks from the cache, extract,
/// aggregate and build the view. Nothing is carried between calls.
pub fn render(section: Section, cache: &mut WorkbookCache, config: &DashboardConfig) -> Result<View> {
    info!(section = section.label(), "rendering section");
    match section {
        Section::GeneralSummary => {
            let reservations = cache
                .get(&config.reservations_path)
                .context("loading reservations workbook")?;
            let nationalities = cache
                .get(&config.nationalities_path)
                .context("loading nationalities workbook")?;
            let ages = cache.get(&config.ages_path).context("loading ages workbook")?;
            summary_view(&reservations, &nationalities, &ages, config)
        }
        Section::MonthlyReservations => {
            let workbook = cache
                .get(&config.reservations_path)
                .context("loading reservations workbook")?;
            reservations_view(&workbook, config)
        }
        Section::Nationalities => {
            let workbook = cache
                .get(&config.nationalities_path)
                .context("loading nationalities workbook")?;
            Ok(nationalities_view(&workbook, config))
        }
        Section::AgeByLodging => {
            let workbook = cache.get(&config.ages_path).context("loading ages workbook")?;
            Ok(ages_view(&workbook, config))
        }
    }
}

pub fn summary_view(
    reservations: &Workbook,
    nationalities: &Workbook,
    ages: &Workbook,
    config: &DashboardConfig,
) -> Result<View> {
    let scanner = BlockScanner::new(&config.block_markers).context("building block scanner")?;
    let profile = build_profile(
        &extract_reservations(reservations, &scanner),
        &extract_nationalities(nationalities),
        &normalize_workbook(ages),
        &config.country_names,
    );

    let mut blocks = vec![Block::Heading("Perfil general del cliente".to_string())];
    blocks.extend(profile.markdown().into_iter().map(Block::Markdown));
    blocks.push(Block::Caption(PROFILE_CAPTION.to_string()));

    Ok(View {
        section: Section::GeneralSummary,
        title: config.dashboard_title.clone(),
        blocks,
        table: TableData::Kpis(profile.kpi_rows()),
    })
}

pub fn reservations_view(workbook: &Workbook, config: &DashboardConfig) -> Result<View> {
    let scanner = BlockScanner::new(&config.block_markers).context("building block scanner")?;
    let records = extract_reservations(workbook, &scanner);
    if records.is_empty() {
        warn!("no stay-period blocks found in reservations workbook");
    }

    let mut blocks = vec![Block::Heading(
        "Evolución mensual de reservas por alojamiento".to_string(),
    )];
    for (idx, lodging) in top_lodging_types(&records, config.top_lodging_types)
        .iter()
        .enumerate()
    {
        let trend = monthly_trend(&records, lodging);
        blocks.push(Block::Chart(bar_chart(
            lodging,
            &trend,
            palette_color(idx),
            "Mes",
            "Cantidad",
        )));
        blocks.push(Block::Caption(config.lodging_caption(lodging).to_string()));
    }
    blocks.push(Block::Rule);
    blocks.push(Block::Heading("Conclusión general".to_string()));
    blocks.push(Block::Markdown(config.reservations_conclusion.clone()));

    Ok(View {
        section: Section::MonthlyReservations,
        title: config.dashboard_title.clone(),
        blocks,
        table: TableData::Reservations(records),
    })
}

pub fn nationalities_view(workbook: &Workbook, config: &DashboardConfig) -> View {
    let records = extract_nationalities(workbook);
    let summary = summarize_countries(&records, &config.country_names);

    View {
        section: Section::Nationalities,
        title: config.dashboard_title.clone(),
        blocks: vec![
            Block::Chart(visitors_choropleth("Visitantes por país (Europa)", &summary)),
            Block::Caption(MAP_CAPTION.to_string()),
        ],
        table: TableData::Countries(summary),
    }
}

pub fn ages_view(workbook: &Workbook, config: &DashboardConfig) -> View {
    let records = normalize_workbook(workbook);

    View {
        section: Section::AgeByLodging,
        title: config.dashboard_title.clone(),
        blocks: vec![
            Block::Heading("Distribución de edad por alojamiento".to_string()),
            Block::Chart(age_stacked_bar(
                "Clientes por tramo de edad y alojamiento",
                &records,
            )),
            Block::Caption(AGE_CAPTION.to_string()),
        ],
        table: TableData::Ages(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartKind;
    use crate::types::{Cell, RawSheet};

    fn text(s: &str) -> Cell {
        Cell::from(s)
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    fn reservations_workbook() -> Workbook {
        let block = |range: &str, rows: &[(&str, f64)]| {
            let mut out = vec![
                vec![text(&format!("FECHAS DE ESTANCIA ({range})"))],
                vec![text("sub")],
                vec![text("sub")],
            ];
            out.extend(
                rows.iter()
                    .map(|(l, c)| vec![Cell::Empty, text(l), num(*c)]),
            );
            out.push(vec![text("TOTALES")]);
            out
        };
        let mut rows = block(
            "01/04/25 AL 10/04/25",
            &[
                ("Parcela", 5.0),
                ("Casa Rural 4 Pax", 3.0),
                ("Bungalow", 2.0),
            ],
        );
        rows.extend(block(
            "02/05/25 AL 09/05/25",
            &[
                ("Parcela", 9.0),
                ("Casas Alpinas", 4.0),
                ("MH - 6 Pax", 1.0),
                ("Tienda", 0.5),
            ],
        ));
        Workbook {
            sheets: vec![RawSheet::new("2025", rows)],
        }
    }

    #[test]
    fn sections_map_from_menu_choices() {
        assert_eq!(Section::from_choice("1"), Some(Section::GeneralSummary));
        assert_eq!(Section::from_choice(" 4 "), Some(Section::AgeByLodging));
        assert_eq!(Section::from_choice("0"), None);
        assert_eq!(Section::from_choice("5"), None);
        assert_eq!(Section::from_choice("x"), None);
    }

    #[test]
    fn reservations_view_charts_top_five_with_captions() {
        let config = DashboardConfig::default();
        let view = reservations_view(&reservations_workbook(), &config).unwrap();

        let titles: Vec<_> = view.charts().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Parcela",
                "Casas Alpinas",
                "Casa Rural 4 Pax",
                "Bungalow",
                "MH - 6 Pax"
            ]
        );
        assert!(view.charts().all(|c| c.kind == ChartKind::Bar));

        let captions: Vec<_> = view.captions().collect();
        assert_eq!(captions.len(), 5);
        assert_eq!(captions[0], config.lodging_caption("Parcela"));
        assert_eq!(captions[3], config.default_lodging_caption);
        assert_eq!(view.blocks.last(), Some(&Block::Markdown(config.reservations_conclusion.clone())));

        let TableData::Reservations(records) = &view.table else {
            panic!("expected reservation rows");
        };
        assert_eq!(records.len(), 7);
    }

    #[test]
    fn rendering_twice_is_identical() {
        let config = DashboardConfig::default();
        let workbook = reservations_workbook();
        assert_eq!(
            reservations_view(&workbook, &config).unwrap(),
            reservations_view(&workbook, &config).unwrap()
        );
    }

    #[test]
    fn nationalities_view_drops_unmapped_buckets() {
        let sheet = RawSheet::new(
            "ABRIL",
            vec![
                vec![text("TITULO")],
                vec![text("NACIONALIDAD"), text("LLEGADAS"), text("PERNOCT"), text("EMPLAZA")],
                vec![text("España"), num(10.0), num(20.0), num(5.0)],
                vec![text("Otros paises"), num(3.0), num(3.0), num(1.0)],
                vec![text("TOTAL"), num(13.0), num(23.0), num(6.0)],
            ],
        );
        let view = nationalities_view(&Workbook { sheets: vec![sheet] }, &DashboardConfig::default());
        let TableData::Countries(summary) = &view.table else {
            panic!("expected country rows");
        };
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].country.as_deref(), Some("Spain"));
        assert_eq!(view.charts().next().map(|c| c.kind), Some(ChartKind::Choropleth));
    }

    #[test]
    fn ages_view_is_one_stacked_chart() {
        let sheet = RawSheet::new(
            "Parcela",
            vec![
                vec![text("T")],
                vec![Cell::Empty, text("0-18"), text("19-40")],
                vec![Cell::Empty, num(2.0), num(3.0)],
            ],
        );
        let view = ages_view(&Workbook { sheets: vec![sheet] }, &DashboardConfig::default());
        let charts: Vec<_> = view.charts().collect();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].kind, ChartKind::StackedBar);
    }
}
