//! User Interface handling functionality.
//!
//! - `app`: window construction and startup
//! - `auth_ui`: fingerprint gate flow
//! - `table_ui`: download flow and sheet rendering
//! - `alerts`: modal error dialogs

pub mod alerts;
pub mod app;
pub mod auth_ui;
pub mod table_ui;

// Re-export commonly used items
pub use app::setup_application_ui;
