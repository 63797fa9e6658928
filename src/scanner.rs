//! Stay-period block scanner for the reservations workbook.
//!
//! A reservations sheet repeats the same layout once per stay period:
//!
//! ```text
//! FECHAS DE ESTANCIA (01/04/25 AL 10/04/25)   <- marker row
//! <sub-header>
//! <sub-header>
//! <ref> | Parcela          | 5                <- data rows
//! <ref> | Casa Rural 4 Pax | 3
//! TOTALES                                     <- sentinel
//! ```
//!
//! The scanner walks the rows once as a small state machine and yields one
//! [`StayBlock`] per marker whose date range parses.

use crate::config::BlockMarkers;
use crate::types::{Cell, RawSheet, ReservationRecord};
use crate::util::{cell_text, coerce_number, is_blank_row, row_text};
use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

/// Rows between a marker row and the first data row.
const HEADER_ROWS: usize = 2;

const LODGING_COL: usize = 1;
const COUNT_COL: usize = 2;

/// One stay-period block: the month it belongs to and the rows it listed.
#[derive(Debug, Clone, PartialEq)]
pub struct StayBlock {
    pub period: String,
    /// Zero-based index of the marker row in the sheet.
    pub marker_row: usize,
    pub records: Vec<ReservationRecord>,
}

#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    SeekingMarker,
    SkippingHeader { remaining: usize },
    ReadingBlock,
}

pub struct BlockScanner {
    marker: String,
    sentinel: String,
    date_range: Regex,
}

impl BlockScanner {
    pub fn new(markers: &BlockMarkers) -> Result<Self, regex::Error> {
        let date_range = Regex::new(&format!(
            r"\((\d{{2}}/\d{{2}}/\d{{2}}) {} (\d{{2}}/\d{{2}}/\d{{2}})\)",
            regex::escape(&markers.range_word)
        ))?;
        Ok(Self {
            marker: markers.marker.clone(),
            sentinel: markers.sentinel.trim().to_uppercase(),
            date_range,
        })
    }

    /// Canonical `YYYY-MM` key of a marker row's text, taken from the first
    /// date of the range. `None` when the text has no marker, no date range
    /// or the first date is not a real `dd/mm/yy` date.
    pub fn period_of(&self, text: &str) -> Option<String> {
        if !text.contains(&self.marker) {
            return None;
        }
        let caps = self.date_range.captures(text)?;
        let start = NaiveDate::parse_from_str(&caps[1], "%d/%m/%y").ok()?;
        Some(start.format("%Y-%m").to_string())
    }

    pub fn scan(&self, sheet: &RawSheet) -> Vec<StayBlock> {
        let mut blocks: Vec<StayBlock> = Vec::new();
        let mut state = ScanState::SeekingMarker;

        for (idx, row) in sheet.rows.iter().enumerate() {
            state = match state {
                ScanState::SeekingMarker => self.seek(&sheet.name, idx, row, &mut blocks),
                ScanState::SkippingHeader { remaining } if remaining > 1 => {
                    ScanState::SkippingHeader {
                        remaining: remaining - 1,
                    }
                }
                ScanState::SkippingHeader { .. } => ScanState::ReadingBlock,
                ScanState::ReadingBlock => {
                    if self.is_sentinel(row) {
                        // The sentinel row may itself open the next block.
                        self.seek(&sheet.name, idx, row, &mut blocks)
                    } else {
                        if let Some(block) = blocks.last_mut() {
                            read_data_row(row, block);
                        }
                        ScanState::ReadingBlock
                    }
                }
            };
        }

        blocks
    }

    /// All reservation records of a sheet, block after block.
    pub fn records(&self, sheet: &RawSheet) -> Vec<ReservationRecord> {
        self.scan(sheet)
            .into_iter()
            .flat_map(|b| b.records)
            .collect()
    }

    fn seek(
        &self,
        sheet_name: &str,
        idx: usize,
        row: &[Cell],
        blocks: &mut Vec<StayBlock>,
    ) -> ScanState {
        let text = row_text(row);
        if !text.contains(&self.marker) {
            return ScanState::SeekingMarker;
        }
        match self.period_of(&text) {
            Some(period) => {
                debug!(sheet = sheet_name, row = idx, %period, "stay block");
                blocks.push(StayBlock {
                    period,
                    marker_row: idx,
                    records: Vec::new(),
                });
                ScanState::SkippingHeader {
                    remaining: HEADER_ROWS,
                }
            }
            None => {
                debug!(sheet = sheet_name, row = idx, "marker row without a date range, skipped");
                ScanState::SeekingMarker
            }
        }
    }

    fn is_sentinel(&self, row: &[Cell]) -> bool {
        row.first()
            .and_then(Cell::as_text)
            .map(|s| s.trim().to_uppercase() == self.sentinel)
            .unwrap_or(false)
    }
}

fn read_data_row(row: &[Cell], block: &mut StayBlock) {
    if is_blank_row(row) {
        return;
    }
    let Some(lodging_type) = row.get(LODGING_COL).and_then(cell_text) else {
        return;
    };
    block.records.push(ReservationRecord {
        period: block.period.clone(),
        lodging_type,
        count: row.get(COUNT_COL).and_then(coerce_number),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> BlockScanner {
        BlockScanner::new(&BlockMarkers::default()).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell::from(s)
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    fn data(lodging: &str, count: Cell) -> Vec<Cell> {
        vec![Cell::Empty, text(lodging), count]
    }

    fn header() -> Vec<Cell> {
        vec![text("REF"), text("ALOJAMIENTO"), text("RESERVAS")]
    }

    fn marker(range: &str) -> Vec<Cell> {
        vec![text(&format!("FECHAS DE ESTANCIA ({range})"))]
    }

    fn totals() -> Vec<Cell> {
        vec![text(" totales "), Cell::Empty, num(99.0)]
    }

    #[test]
    fn period_is_month_of_first_date() {
        let s = scanner();
        assert_eq!(
            s.period_of("FECHAS DE ESTANCIA (01/04/25 AL 10/04/25)").as_deref(),
            Some("2025-04")
        );
        assert_eq!(
            s.period_of("FECHAS DE ESTANCIA (28/12/24 AL 03/01/25)").as_deref(),
            Some("2024-12")
        );
        assert_eq!(s.period_of("FECHAS DE ESTANCIA (1/4/25 AL 10/4/25)"), None);
        assert_eq!(s.period_of("FECHAS DE ESTANCIA (31/02/25 AL 03/03/25)"), None);
        assert_eq!(s.period_of("(01/04/25 AL 10/04/25)"), None);
    }

    #[test]
    fn single_block_yields_rows_before_sentinel() {
        let sheet = RawSheet::new(
            "ABRIL",
            vec![
                marker("01/04/25 AL 10/04/25"),
                header(),
                header(),
                data("Parcela", num(5.0)),
                data("Casa Rural 4 Pax", num(3.0)),
                totals(),
                data("Ignored", num(1.0)),
            ],
        );
        let records = scanner().records(&sheet);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.period == "2025-04"));
        assert_eq!(records[0].lodging_type, "Parcela");
        assert_eq!(records[0].count, Some(5.0));
        assert_eq!(records[1].lodging_type, "Casa Rural 4 Pax");
        assert_eq!(records[1].count, Some(3.0));
    }

    #[test]
    fn malformed_marker_rows_are_skipped() {
        let sheet = RawSheet::new(
            "MAYO",
            vec![
                marker("sin fechas"),
                header(),
                header(),
                data("Orphan", num(7.0)),
                marker("02/05/25 AL 09/05/25"),
                header(),
                header(),
                data("Parcela", num(4.0)),
                totals(),
                marker("10/05/25 - 15/05/25"),
                marker("16/06/25 AL 20/06/25"),
                header(),
                header(),
                data("Parcela", num(2.0)),
                totals(),
            ],
        );
        let blocks = scanner().scan(&sheet);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].period, "2025-05");
        assert_eq!(blocks[0].marker_row, 4);
        assert_eq!(blocks[1].period, "2025-06");
        let lodgings: Vec<_> = blocks
            .iter()
            .flat_map(|b| b.records.iter().map(|r| r.lodging_type.as_str()))
            .collect();
        assert_eq!(lodgings, vec!["Parcela", "Parcela"]);
    }

    #[test]
    fn blank_rows_inside_a_block_do_not_end_it() {
        let sheet = RawSheet::new(
            "JULIO",
            vec![
                marker("05/07/25 AL 12/07/25"),
                header(),
                header(),
                data("Parcela", num(5.0)),
                vec![],
                vec![Cell::Empty, Cell::Empty, Cell::Empty],
                data("MH - 6 Pax", num(1.0)),
                totals(),
            ],
        );
        let records = scanner().records(&sheet);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].lodging_type, "MH - 6 Pax");
    }

    #[test]
    fn non_numeric_counts_become_missing_and_unlabelled_rows_are_dropped() {
        let sheet = RawSheet::new(
            "AGOSTO",
            vec![
                marker("01/08/25 AL 31/08/25"),
                header(),
                header(),
                data("Parcela", text("n/d")),
                vec![text("note"), Cell::Empty, num(3.0)],
                data("Casas Alpinas", text("6")),
                totals(),
            ],
        );
        let records = scanner().records(&sheet);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].count, None);
        assert_eq!(records[1].count, Some(6.0));
    }

    #[test]
    fn block_without_sentinel_runs_to_end_of_sheet() {
        let sheet = RawSheet::new(
            "SEPT",
            vec![
                marker("01/09/25 AL 07/09/25"),
                header(),
                header(),
                data("Parcela", num(1.0)),
                data("Parcela", num(2.0)),
            ],
        );
        let blocks = scanner().scan(&sheet);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].records.len(), 2);
    }

    #[test]
    fn marker_split_across_cells_still_matches() {
        let sheet = RawSheet::new(
            "OCT",
            vec![
                vec![text("FECHAS DE ESTANCIA"), num(2025.0), text("(03/10/25 AL 05/10/25)")],
                header(),
                header(),
                data("Parcela", num(1.0)),
                totals(),
            ],
        );
        let records = scanner().records(&sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period, "2025-10");
    }

    #[test]
    fn custom_markers_are_honoured() {
        let markers = BlockMarkers {
            marker: "STAY DATES".to_string(),
            range_word: "TO".to_string(),
            sentinel: "TOTALS".to_string(),
        };
        let s = BlockScanner::new(&markers).unwrap();
        let sheet = RawSheet::new(
            "APR",
            vec![
                vec![text("STAY DATES (01/04/25 TO 10/04/25)")],
                header(),
                header(),
                data("Pitch", num(5.0)),
                vec![text("Totals")],
            ],
        );
        let records = s.records(&sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period, "2025-04");
    }
}
