use crate::types::{AgeDistributionRecord, AgeRow, RawSheet, Workbook};
use crate::util::{cell_text, coerce_number, format_number, is_blank_row};
use tracing::{debug, info};

/// Sum one lodging type's sheet into a count per age bracket.
///
/// After blank rows are dropped, the second row carries the bracket labels
/// (first column excluded) and every later row is an observation. Cells that
/// are not numbers count as zero. Columns without a label are ignored. The
/// bracket set comes from this sheet alone, so lodging types may differ.
pub fn normalize_sheet(sheet: &RawSheet) -> Vec<AgeDistributionRecord> {
    let rows: Vec<&Vec<_>> = sheet.rows.iter().filter(|r| !is_blank_row(r)).collect();
    let Some(labels) = rows.get(1) else {
        debug!(sheet = %sheet.name, "no bracket label row");
        return Vec::new();
    };

    (1..sheet.width())
        .filter_map(|col| {
            let bracket = labels.get(col).and_then(cell_text)?;
            let count: f64 = rows
                .iter()
                .skip(2)
                .map(|row| row.get(col).and_then(coerce_number).unwrap_or(0.0))
                .sum();
            Some(AgeDistributionRecord {
                lodging_type: sheet.name.clone(),
                age_bracket: bracket,
                count,
            })
        })
        .collect()
}

/// One sheet per lodging type, in workbook order.
pub fn normalize_workbook(workbook: &Workbook) -> Vec<AgeDistributionRecord> {
    let records: Vec<AgeDistributionRecord> =
        workbook.sheets.iter().flat_map(normalize_sheet).collect();
    info!(
        lodging_types = workbook.sheets.len(),
        records = records.len(),
        "normalized age distribution"
    );
    records
}

/// Customers per bracket across every lodging type, brackets in the order
/// they first appear.
pub fn bracket_totals(records: &[AgeDistributionRecord]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for r in records {
        match totals.iter().position(|(b, _)| *b == r.age_bracket) {
            Some(idx) => totals[idx].1 += r.count,
            None => totals.push((r.age_bracket.clone(), r.count)),
        }
    }
    totals
}

pub fn age_rows(records: &[AgeDistributionRecord]) -> Vec<AgeRow> {
    records
        .iter()
        .map(|r| AgeRow {
            lodging_type: r.lodging_type.clone(),
            age_bracket: r.age_bracket.clone(),
            count: format_number(r.count, 0),
        })
        .collect()
}
