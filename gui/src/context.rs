//! Shared context for the main screen.

use gtk4::prelude::*;
use gtk4::{ApplicationWindow, Box as GtkBox, Button, Label, Spinner};
use sheetgate_core::{AuthState, PromptCancel, ViewState};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Main application context with UI elements, view state and runtime.
#[derive(Clone)]
pub struct AppContext {
    pub rt: Arc<Runtime>,
    pub ui: UiComponents,
    pub state: Rc<RefCell<ViewState>>,
    /// Cancel handle of the fingerprint prompt in flight, if any
    pub prompt: Rc<RefCell<Option<PromptCancel>>>,
}

/// UI components grouped by functionality.
#[derive(Clone)]
pub struct UiComponents {
    pub window: ApplicationWindow,
    pub status: Label,
    pub spinner: Spinner,
    pub buttons: ActionButtons,
    /// Holds one section per rendered sheet
    pub sheets: GtkBox,
}

/// The actions of the screen.
#[derive(Clone)]
pub struct ActionButtons {
    pub authenticate: Button,
    pub cancel: Button,
    pub load: Button,
}

impl ActionButtons {
    pub fn new(authenticate: Button, cancel: Button, load: Button) -> Self {
        Self {
            authenticate,
            cancel,
            load,
        }
    }
}

impl AppContext {
    pub fn new(rt: Arc<Runtime>, ui: UiComponents) -> Self {
        Self {
            rt,
            ui,
            state: Rc::new(RefCell::new(ViewState::new())),
            prompt: Rc::new(RefCell::new(None)),
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.borrow().auth_state()
    }

    /// Store the new auth state and show it in the status line.
    pub fn set_auth_state(&self, auth: AuthState) {
        self.state.borrow_mut().set_auth_state(auth);
        self.show_auth_state();
    }

    pub fn show_auth_state(&self) {
        self.ui
            .status
            .set_label(&format!("Auth state: {}", self.auth_state()));
    }

    /// Show a transient message in the status line.
    pub fn show_status(&self, message: &str) {
        self.ui.status.set_label(message);
    }

    /// Lock the Authenticate button while a check is running; only then can it be cancelled.
    pub fn set_auth_busy(&self, busy: bool) {
        self.ui.buttons.authenticate.set_sensitive(!busy);
        self.ui.buttons.cancel.set_sensitive(busy);
    }

    /// Abort the fingerprint prompt in flight, if any.
    pub fn cancel_prompt(&self) {
        if let Some(cancel) = self.prompt.borrow().as_ref() {
            cancel.cancel();
        }
    }

    /// Reflect the loading flag in the spinner and the Load button.
    pub fn show_loading(&self) {
        let loading = self.state.borrow().is_loading();
        self.ui.spinner.set_visible(loading);
        self.ui.spinner.set_spinning(loading);
        self.ui.buttons.load.set_sensitive(!loading);
    }

    /// Remove every rendered sheet.
    pub fn clear_sheets(&self) {
        while let Some(child) = self.ui.sheets.first_child() {
            self.ui.sheets.remove(&child);
        }
    }
}
