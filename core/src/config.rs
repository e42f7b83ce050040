//! Compile-time constants shared by the gate, the loader and the table model.

use std::time::Duration;

/// The one spreadsheet this application downloads.
pub const DOWNLOAD_URL: &str =
    "https://www.dropbox.com/scl/fi/sheetgate/sheetgate-table.xlsx?dl=1";

/// Message shown while the fingerprint reader waits for a finger.
pub const PROMPT_MESSAGE: &str = "Confirm your fingerprint to unlock the table";

/// Finger selector passed to `VerifyStart`; fprintd picks any enrolled finger.
pub const VERIFY_ANY_FINGER: &str = "any";

/// How long the reader waits for a finger before the prompt counts as failed.
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Column width formula: `WIDTH_BASE + WIDTH_PER_CHAR * len`.
pub mod width {
    pub const WIDTH_BASE: u32 = 10;
    pub const WIDTH_PER_CHAR: u32 = 10;
}
