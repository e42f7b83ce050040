//! Modal error dialogs.

use gtk4::prelude::*;
use gtk4::{ApplicationWindow, ButtonsType, MessageDialog, MessageType};
use log::info;

/// Show a modal alert with an OK button over the main window.
pub fn show_alert(parent: &ApplicationWindow, title: &str, message: &str) {
    info!("Showing alert: {}: {}", title, message);

    let dialog = MessageDialog::builder()
        .transient_for(parent)
        .modal(true)
        .message_type(MessageType::Error)
        .buttons(ButtonsType::Ok)
        .text(title)
        .secondary_text(message)
        .build();

    dialog.connect_response(|dialog, _| {
        dialog.close();
    });

    dialog.present();
}
