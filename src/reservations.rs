use crate::scanner::BlockScanner;
use crate::types::{LodgingTotalRow, ReservationRecord, Workbook};
use crate::util::{format_number, sum_present};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::info;

/// Run the block scanner over every period sheet, in workbook order.
pub fn extract_reservations(workbook: &Workbook, scanner: &BlockScanner) -> Vec<ReservationRecord> {
    let records: Vec<ReservationRecord> = workbook
        .sheets
        .iter()
        .flat_map(|sheet| scanner.records(sheet))
        .collect();
    info!(
        sheets = workbook.sheets.len(),
        records = records.len(),
        "extracted reservation records"
    );
    records
}

/// Total reservations per lodging type, largest first. Missing counts are
/// left out of the sum; equal totals are ordered by name.
pub fn lodging_totals(records: &[ReservationRecord]) -> Vec<(String, f64)> {
    let mut map: HashMap<&str, Vec<Option<f64>>> = HashMap::new();
    for r in records {
        map.entry(r.lodging_type.as_str()).or_default().push(r.count);
    }
    let mut totals: Vec<(String, f64)> = map
        .into_iter()
        .map(|(k, v)| (k.to_string(), sum_present(v)))
        .collect();
    totals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    totals
}

pub fn top_lodging_types(records: &[ReservationRecord], n: usize) -> Vec<String> {
    lodging_totals(records)
        .into_iter()
        .take(n)
        .map(|(name, _)| name)
        .collect()
}

/// Per-month totals for one lodging type, in month order.
pub fn monthly_trend(records: &[ReservationRecord], lodging_type: &str) -> Vec<(String, f64)> {
    month_totals(records.iter().filter(|r| r.lodging_type == lodging_type))
}

/// Per-month totals across all lodging types, in month order.
pub fn monthly_totals(records: &[ReservationRecord]) -> Vec<(String, f64)> {
    month_totals(records.iter())
}

fn month_totals<'a, I>(records: I) -> Vec<(String, f64)>
where
    I: Iterator<Item = &'a ReservationRecord>,
{
    let mut map: HashMap<&str, f64> = HashMap::new();
    for r in records {
        *map.entry(r.period.as_str()).or_insert(0.0) += r.count.unwrap_or(0.0);
    }
    let mut months: Vec<(String, f64)> = map.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    months.sort_by(|a, b| a.0.cmp(&b.0));
    months
}

pub fn ranking_rows(totals: &[(String, f64)], n: usize) -> Vec<LodgingTotalRow> {
    totals
        .iter()
        .take(n)
        .enumerate()
        .map(|(idx, (name, total))| LodgingTotalRow {
            rank: idx + 1,
            lodging_type: name.clone(),
            total: format_number(*total, 0),
        })
        .collect()
}
