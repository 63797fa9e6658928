use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("failed to open workbook {}: {source}", .path.display())]
    OpenWorkbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to read sheet '{sheet}' of {}: {source}", .path.display())]
    ReadSheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {} has no sheets", .0.display())]
    EmptyWorkbook(PathBuf),
    #[error("failed to read config {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
