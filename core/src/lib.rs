//! Core of Sheetgate: the fingerprint gate, the spreadsheet loader and the
//! table model the GTK front end renders.
//!
//! - `auth`: sensor check, fingerprint prompt and [`AuthState`]
//! - `fprintd`: async helpers for the fprintd D-Bus interface
//! - `fetch`: document download and the load sequence
//! - `workbook`: XLSX decoding into positional rows
//! - `table`: cell values, column widths and [`TableData`]
//! - `state`: the screen's [`ViewState`]

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fprintd;
pub mod state;
pub mod table;
pub mod workbook;

#[cfg(test)]
mod testutil;

// Re-export commonly used items
pub use auth::{
    authenticate, AuthState, BiometricSensor, FprintdSensor, PromptCancel, PromptResult,
    SensorInfo,
};
pub use error::{BiometricError, FetchError, FetchRejected, LoadError, WorkbookError};
pub use fetch::{load_tables, DocumentSource, HttpSource};
pub use state::ViewState;
pub use table::{compute_column_widths, CellValue, Row, SheetTable, TableData};
pub use workbook::{Sheet, Workbook};
