//! Download flow and sheet rendering.

use crate::config::css;
use crate::context::AppContext;
use crate::table;
use crate::ui::alerts;
use gtk4::prelude::*;
use gtk4::{glib, Align, Box as GtkBox, Label, Orientation};
use log::{info, warn};
use sheetgate_core::config::DOWNLOAD_URL;
use sheetgate_core::{load_tables, FetchRejected, HttpSource, LoadError, SheetTable, TableData};
use std::sync::mpsc::{self, TryRecvError};

/// Start downloading the table if the gate allows it.
pub fn start_loading(ctx: AppContext) {
    let started = ctx.state.borrow_mut().begin_fetch();
    match started {
        Ok(()) => {}
        Err(rejected @ FetchRejected::NotAuthenticated(_)) => {
            warn!("Refusing to load table: {}", rejected);
            alerts::show_alert(&ctx.ui.window, "Not authenticated", &rejected.to_string());
            return;
        }
        Err(FetchRejected::AlreadyLoading) => {
            info!("Table download already in progress, ignoring");
            return;
        }
    }

    ctx.clear_sheets();
    ctx.show_loading();

    let (tx, rx) = mpsc::channel::<Result<TableData, LoadError>>();
    setup_load_listener(rx, ctx.clone());
    spawn_load_task(tx, &ctx);
}

/// Set up UI listener for the download result.
fn setup_load_listener(rx: mpsc::Receiver<Result<TableData, LoadError>>, ctx: AppContext) {
    glib::idle_add_local(move || match rx.try_recv() {
        Ok(outcome) => {
            let committed = ctx.state.borrow_mut().finish_fetch(outcome);
            ctx.show_loading();
            match committed {
                Ok(()) => render_tables(&ctx),
                Err(e) => alerts::show_alert(&ctx.ui.window, "Could not load table", &e.to_string()),
            }
            glib::ControlFlow::Break
        }
        Err(TryRecvError::Empty) => glib::ControlFlow::Continue,
        Err(TryRecvError::Disconnected) => glib::ControlFlow::Break,
    });
}

/// Spawn async download task.
fn spawn_load_task(tx: mpsc::Sender<Result<TableData, LoadError>>, ctx: &AppContext) {
    ctx.rt.spawn(async move {
        let source = HttpSource::new();
        let outcome = load_tables(&source, DOWNLOAD_URL).await;
        let _ = tx.send(outcome);
    });
}

/// Render every sheet of the committed snapshot.
fn render_tables(ctx: &AppContext) {
    ctx.clear_sheets();

    let state = ctx.state.borrow();
    for sheet in state.tables().iter() {
        ctx.ui.sheets.append(&sheet_section(sheet));
    }
    info!("Rendered {} sheet(s)", state.tables().len());
}

/// Sheet title, header table from row 0, data table from the remaining rows.
fn sheet_section(sheet: &SheetTable) -> GtkBox {
    let section = GtkBox::new(Orientation::Vertical, 4);
    section.set_halign(Align::Center);

    let title = Label::new(Some(&sheet.name));
    title.add_css_class(css::SHEET_TITLE);
    title.set_halign(Align::Start);
    section.append(&title);

    if let Some(header) = sheet.header() {
        section.append(&table::build(sheet, [header], true));
    }
    section.append(&table::build(sheet, sheet.data_rows(), false));

    section
}
