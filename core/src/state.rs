//! View state owned by the main screen.

use log::{error, info};

use crate::auth::AuthState;
use crate::error::{FetchRejected, LoadError};
use crate::table::TableData;

/// Everything the screen renders from. Mutated only on the UI thread.
#[derive(Debug, Default)]
pub struct ViewState {
    auth_state: AuthState,
    loading: bool,
    tables: TableData,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth_state
    }

    pub fn set_auth_state(&mut self, state: AuthState) {
        info!("Auth state: {} -> {}", self.auth_state, state);
        self.auth_state = state;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn tables(&self) -> &TableData {
        &self.tables
    }

    /// Check the gate and enter the loading state.
    ///
    /// On success the previous tables are cleared and `loading` is set; the
    /// caller then performs the download and reports back through
    /// [`finish_fetch`](Self::finish_fetch).
    pub fn begin_fetch(&mut self) -> Result<(), FetchRejected> {
        if !self.auth_state.allows_fetch() {
            return Err(FetchRejected::NotAuthenticated(self.auth_state));
        }
        if self.loading {
            return Err(FetchRejected::AlreadyLoading);
        }

        self.tables = TableData::new();
        self.loading = true;
        Ok(())
    }

    /// Leave the loading state, committing the snapshot on success.
    ///
    /// Failures leave the tables empty and are handed back for the alert.
    pub fn finish_fetch(&mut self, outcome: Result<TableData, LoadError>) -> Result<(), LoadError> {
        self.loading = false;
        match outcome {
            Ok(tables) => {
                info!("Committing {} sheet(s)", tables.len());
                self.tables = tables;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load table: {}", e);
                Err(e)
            }
        }
    }
}
