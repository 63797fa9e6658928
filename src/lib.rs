//! Campsite booking statistics dashboard.
//!
//! Three spreadsheet workbooks (reservations, nationalities, ages by lodging
//! type) are parsed into flat records, aggregated and turned into four
//! dashboard sections. See [`views::render`] for the entry point.

pub mod ages;
pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod nationalities;
pub mod output;
pub mod reservations;
pub mod scanner;
pub mod summary;
pub mod types;
pub mod util;
pub mod views;
