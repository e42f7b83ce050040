use gtk4::prelude::*;
use gtk4::{glib, Application};
use log::{error, info, LevelFilter};
use std::sync::Arc;

mod config;
mod context;
mod table;
mod ui;

use config::app_info;

fn main() -> glib::ExitCode {
    // Initialize logger
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
    {
        eprintln!("Failed to initialize logger: {}", e);
    }

    info!("Starting {} v{}", app_info::NAME, app_info::VERSION);
    info!("Application ID: {}", app_info::ID);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => Arc::new(rt),
        Err(e) => {
            error!("Failed to build Tokio runtime: {}", e);
            return glib::ExitCode::FAILURE;
        }
    };
    info!("Tokio async runtime initialized");

    let app = Application::builder().application_id(app_info::ID).build();

    app.connect_activate(move |app| ui::setup_application_ui(app, rt.clone()));

    app.run()
}
