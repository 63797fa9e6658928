// Utility helpers for cell coercion and number formatting.
//
// Spreadsheet cells arrive in whatever shape the source workbook used, so
// every pipeline goes through these helpers instead of matching on `Cell`
// directly.
use crate::types::Cell;
use num_format::{Locale, ToFormattedString};

/// Coerce a cell into a number, the way a permissive spreadsheet reader
/// would.
///
/// - Numbers pass through.
/// - Text is trimmed and parsed; anything unparseable becomes `None`.
/// - Booleans count as 1/0.
/// - Blanks are `None`.
pub fn coerce_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) => None,
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Cell::Empty => None,
    }
}

/// Render a cell as a label. Whole numbers lose their `.0` so a numeric
/// header like `18` reads as `"18"`.
pub fn cell_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{n}"))
            }
        }
        Cell::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
    }
}

/// A row counts as blank only when every cell is missing. Whitespace-only
/// text is data.
pub fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_empty)
}

/// Join the text cells of a row with single spaces, ignoring numbers.
pub fn row_text(row: &[Cell]) -> String {
    row.iter()
        .filter_map(Cell::as_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sum the present values, skipping missing ones. An all-missing input sums
/// to zero.
pub fn sum_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().sum()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators
    // (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}
