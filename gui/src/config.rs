//! Centralized configuration and constants for the application.

/// Application information constants.
pub mod app_info {
    pub const NAME: &str = "Sheetgate";
    pub const ID: &str = "io.github.sheetgate";
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Main window geometry.
pub mod window {
    pub const DEFAULT_WIDTH: i32 = 900;
    pub const DEFAULT_HEIGHT: i32 = 640;
}

/// Compiled GResource bundle and the paths inside it.
pub mod resources {
    pub const STYLESHEET: &str = "/io/github/sheetgate/css/style.css";
}

/// CSS classes used by the table primitives.
pub mod css {
    pub const TABLE: &str = "sg-table";
    pub const ROW: &str = "sg-row";
    pub const ROW_FIRST: &str = "sg-row-first";
    pub const ROW_HEADER: &str = "sg-row-header";
    pub const CELL: &str = "sg-cell";
    pub const CELL_FIRST: &str = "sg-cell-first";
    pub const STATUS_LINE: &str = "status-line";
    pub const SHEET_TITLE: &str = "sheet-title";
}
