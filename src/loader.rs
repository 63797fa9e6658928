use crate::error::DashboardError;
use crate::types::{Cell, RawSheet, Workbook};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Read every sheet of an Excel workbook into memory, in workbook order.
pub fn load_workbook(path: &Path) -> Result<Workbook, DashboardError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| DashboardError::OpenWorkbook {
        path: path.to_path_buf(),
        source,
    })?;

    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(DashboardError::EmptyWorkbook(path.to_path_buf()));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|source| DashboardError::ReadSheet {
                path: path.to_path_buf(),
                sheet: name.clone(),
                source,
            })?;
        let sheet = sheet_from_range(&name, &range);
        debug!(sheet = %name, rows = sheet.rows.len(), "read sheet");
        sheets.push(sheet);
    }

    info!(
        path = %path.display(),
        sheets = sheets.len(),
        "loaded workbook"
    );
    Ok(Workbook { sheets })
}

/// Convert a calamine range into a grid anchored at A1. A used range that
/// starts further down or right is padded with empty cells so column
/// positions match the spreadsheet.
fn sheet_from_range(name: &str, range: &Range<Data>) -> RawSheet {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(row_offset + range.height());
    rows.extend(std::iter::repeat_with(Vec::new).take(row_offset));
    for row in range.rows() {
        let mut cells = Vec::with_capacity(col_offset + row.len());
        cells.extend(std::iter::repeat(Cell::Empty).take(col_offset));
        cells.extend(row.iter().map(to_cell));
        rows.push(cells);
    }
    RawSheet::new(name, rows)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

struct CachedWorkbook {
    modified: Option<SystemTime>,
    workbook: Arc<Workbook>,
}

/// Memoized workbook loads keyed by path and modification time.
///
/// An entry is served while the file's mtime matches the one seen at load
/// time. A changed mtime, `invalidate` or `clear` forces a fresh read.
#[derive(Default)]
pub struct WorkbookCache {
    entries: HashMap<PathBuf, CachedWorkbook>,
}

impl WorkbookCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &Path) -> Result<Arc<Workbook>, DashboardError> {
        let modified = modified_time(path);
        if let Some(entry) = self.entries.get(path) {
            if modified.is_some() && entry.modified == modified {
                debug!(path = %path.display(), "workbook cache hit");
                return Ok(Arc::clone(&entry.workbook));
            }
            debug!(path = %path.display(), "workbook changed on disk, reloading");
        }

        let workbook = Arc::new(load_workbook(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedWorkbook {
                modified,
                workbook: Arc::clone(&workbook),
            },
        );
        Ok(workbook)
    }

    /// Drop the cached copy of `path`. Returns whether one was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
