use serde::Serialize;
use tabled::Tabled;

/// One spreadsheet cell, reduced to the value kinds the pipelines care about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// A worksheet grid anchored at A1, exactly as read from the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Number of columns of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at (row, col); out-of-range positions read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// All sheets of one workbook, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<RawSheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&RawSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationRecord {
    #[serde(rename = "Mes")]
    pub period: String,
    #[serde(rename = "Alojamiento")]
    pub lodging_type: String,
    #[serde(rename = "Cantidad")]
    pub count: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalityRecord {
    #[serde(rename = "Periodo")]
    pub period: String,
    #[serde(rename = "NACIONALIDAD")]
    pub nationality: String,
    #[serde(rename = "LLEGADA")]
    pub arrivals: Option<f64>,
    #[serde(rename = "PERNOCT")]
    pub overnights: Option<f64>,
    #[serde(rename = "EMPLAZA")]
    pub pitches: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryVisitorSummary {
    pub country: Option<String>,
    pub visitors: f64,
    pub visitors_log: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeDistributionRecord {
    #[serde(rename = "ALOJAMIENTO")]
    pub lodging_type: String,
    #[serde(rename = "TRAMO_EDAD")]
    pub age_bracket: String,
    #[serde(rename = "CANTIDAD")]
    pub count: f64,
}

// Console preview rows. Values are pre-formatted strings like the CSV
// exports so the markdown tables line up.

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct LodgingTotalRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Alojamiento")]
    #[tabled(rename = "Alojamiento")]
    pub lodging_type: String,
    #[serde(rename = "Reservas")]
    #[tabled(rename = "Reservas")]
    pub total: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CountryRow {
    #[serde(rename = "country")]
    #[tabled(rename = "country")]
    pub country: String,
    #[serde(rename = "visitors")]
    #[tabled(rename = "visitors")]
    pub visitors: String,
    #[serde(rename = "visitors_log")]
    #[tabled(rename = "visitors_log")]
    pub visitors_log: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct AgeRow {
    #[serde(rename = "ALOJAMIENTO")]
    #[tabled(rename = "ALOJAMIENTO")]
    pub lodging_type: String,
    #[serde(rename = "TRAMO_EDAD")]
    #[tabled(rename = "TRAMO_EDAD")]
    pub age_bracket: String,
    #[serde(rename = "CANTIDAD")]
    #[tabled(rename = "CANTIDAD")]
    pub count: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct KpiRow {
    #[serde(rename = "Indicador")]
    #[tabled(rename = "Indicador")]
    pub indicator: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub value: String,
}
