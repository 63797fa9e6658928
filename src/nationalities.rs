use crate::types::{Cell, CountryRow, CountryVisitorSummary, NationalityRecord, RawSheet, Workbook};
use crate::util::{cell_text, coerce_number, format_number, is_blank_row, sum_present};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Reshape one period sheet into nationality rows.
///
/// Layout after blank rows are dropped: a title row, a header row, then one
/// row per nationality keyed by its first cell. Arrivals, overnight stays
/// and pitches are the last three columns of the sheet, by position.
/// Subtotal rows (any key containing `TOTAL`) are left out.
pub fn reshape_period(sheet: &RawSheet) -> Vec<NationalityRecord> {
    let width = sheet.width();
    if width < 4 {
        debug!(sheet = %sheet.name, width, "too few columns for nationality data");
        return Vec::new();
    }
    let (arrivals_col, overnights_col, pitches_col) = (width - 3, width - 2, width - 1);

    let value = |row: &[Cell], col: usize| row.get(col).and_then(coerce_number);

    sheet
        .rows
        .iter()
        .filter(|row| !is_blank_row(row))
        .skip(2)
        .filter_map(|row| {
            let row = row.as_slice();
            let nationality = row.first().and_then(cell_text)?.trim().to_string();
            if nationality.is_empty() || nationality.to_uppercase().contains("TOTAL") {
                return None;
            }
            Some(NationalityRecord {
                period: sheet.name.clone(),
                nationality,
                arrivals: value(row, arrivals_col),
                overnights: value(row, overnights_col),
                pitches: value(row, pitches_col),
            })
        })
        .collect()
}

pub fn extract_nationalities(workbook: &Workbook) -> Vec<NationalityRecord> {
    let records: Vec<NationalityRecord> = workbook.sheets.iter().flat_map(reshape_period).collect();
    info!(
        periods = workbook.sheets.len(),
        records = records.len(),
        "extracted nationality records"
    );
    records
}

/// Arrivals summed per nationality across all periods, most visitors first.
pub fn arrivals_by_nationality(records: &[NationalityRecord]) -> Vec<(String, f64)> {
    let mut map: HashMap<&str, Vec<Option<f64>>> = HashMap::new();
    for r in records {
        map.entry(r.nationality.as_str()).or_default().push(r.arrivals);
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

/// Translate a nationality label through the lookup table. Labels the table
/// does not know keep their own name; labels mapped to `null` have none.
pub fn canonical_country(
    nationality: &str,
    country_names: &BTreeMap<String, Option<String>>,
) -> Option<String> {
    match country_names.get(nationality) {
        Some(mapped) => mapped.clone(),
        None => Some(nationality.to_string()),
    }
}

/// Visitors per canonical country, ready for the choropleth. Rows without a
/// country are removed.
pub fn summarize_countries(
    records: &[NationalityRecord],
    country_names: &BTreeMap<String, Option<String>>,
) -> Vec<CountryVisitorSummary> {
    let summary: Vec<CountryVisitorSummary> = arrivals_by_nationality(records)
        .into_iter()
        .map(|(nationality, visitors)| CountryVisitorSummary {
            country: canonical_country(&nationality, country_names),
            visitors,
            visitors_log: (visitors + 1.0).log10(),
        })
        .filter(|s| s.country.is_some())
        .collect();
    debug!(countries = summary.len(), "country summary");
    summary
}

pub fn country_rows(summary: &[CountryVisitorSummary]) -> Vec<CountryRow> {
    summary
        .iter()
        .map(|s| CountryRow {
            country: s.country.clone().unwrap_or_default(),
            visitors: format_number(s.visitors, 0),
            visitors_log: format_number(s.visitors_log, 3),
        })
        .collect()
}
