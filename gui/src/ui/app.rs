//! Application setup and initialization functionality.

use crate::config::{app_info, css, resources, window};
use crate::context::{ActionButtons, AppContext, UiComponents};
use crate::ui::{auth_ui, table_ui};
use gtk4::prelude::*;
use gtk4::{
    gio, Align, Application, ApplicationWindow, Box as GtkBox, Button, CssProvider, Label,
    Orientation, PolicyType, ScrolledWindow, Spinner,
};
use log::{error, info, warn};

use std::sync::Arc;
use tokio::runtime::Runtime;

/// Initialize and set up main application UI.
pub fn setup_application_ui(app: &Application, rt: Arc<Runtime>) {
    info!("Initializing application components");

    setup_resources_and_theme();

    let ctx = build_main_window(app, rt);
    setup_button_handlers(&ctx);

    ctx.show_auth_state();
    ctx.show_loading();
    ctx.ui.window.present();

    info!("Running startup fingerprint check");
    auth_ui::start_authentication(ctx);
    info!("{} startup complete", app_info::NAME);
}

/// Set up resources and theme.
fn setup_resources_and_theme() {
    if let Err(e) = gio::resources_register_include!("sheetgate.gresource") {
        error!("Failed to register gresources: {}", e);
        return;
    }

    if let Some(display) = gtk4::gdk::Display::default() {
        info!("Setting up UI theme and styling");
        let css_provider = CssProvider::new();
        css_provider.load_from_resource(resources::STYLESHEET);
        gtk4::style_context_add_provider_for_display(
            &display,
            &css_provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
        info!("UI theme and styling loaded successfully");
    } else {
        warn!("No default display found - UI theming may not work properly");
    }
}

/// Create the main window and return the application context.
fn build_main_window(app: &Application, rt: Arc<Runtime>) -> AppContext {
    let window = ApplicationWindow::builder()
        .application(app)
        .title(app_info::NAME)
        .default_width(window::DEFAULT_WIDTH)
        .default_height(window::DEFAULT_HEIGHT)
        .build();

    let root = GtkBox::new(Orientation::Vertical, 8);
    root.set_margin_top(12);
    root.set_margin_bottom(12);
    root.set_margin_start(12);
    root.set_margin_end(12);

    let authenticate = Button::with_label("Authenticate");
    let cancel = Button::with_label("Cancel");
    cancel.set_sensitive(false);
    let load = Button::with_label("Load table");
    let spinner = Spinner::new();

    let actions = GtkBox::new(Orientation::Horizontal, 8);
    actions.set_halign(Align::Center);
    actions.append(&authenticate);
    actions.append(&cancel);
    actions.append(&load);
    actions.append(&spinner);

    let status = Label::new(None);
    status.add_css_class(css::STATUS_LINE);

    let sheets = GtkBox::new(Orientation::Vertical, 8);
    sheets.set_halign(Align::Center);

    let scroller = ScrolledWindow::builder()
        .hscrollbar_policy(PolicyType::Automatic)
        .vscrollbar_policy(PolicyType::Automatic)
        .vexpand(true)
        .hexpand(true)
        .child(&sheets)
        .build();

    root.append(&actions);
    root.append(&status);
    root.append(&scroller);
    window.set_child(Some(&root));

    let ui = UiComponents {
        window,
        status,
        spinner,
        buttons: ActionButtons::new(authenticate, cancel, load),
        sheets,
    };

    AppContext::new(rt, ui)
}

/// Set up button handlers.
fn setup_button_handlers(ctx: &AppContext) {
    {
        let ctx = ctx.clone();
        let button = ctx.ui.buttons.authenticate.clone();
        button.connect_clicked(move |_| {
            info!("User clicked 'Authenticate'");
            auth_ui::start_authentication(ctx.clone());
        });
    }

    {
        let ctx = ctx.clone();
        let button = ctx.ui.buttons.cancel.clone();
        button.connect_clicked(move |_| {
            info!("User clicked 'Cancel'");
            ctx.cancel_prompt();
        });
    }

    {
        let ctx = ctx.clone();
        let button = ctx.ui.buttons.load.clone();
        button.connect_clicked(move |_| {
            info!("User clicked 'Load table'");
            table_ui::start_loading(ctx.clone());
        });
    }
}
