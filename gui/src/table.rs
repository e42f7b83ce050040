//! Table, row and cell primitives composed from plain GTK boxes.
//!
//! GTK4 has no lightweight static table, so each table is a vertical box of
//! horizontal row boxes, each holding fixed-minimum-width cell boxes.

use gtk4::prelude::*;
use gtk4::{pango, Align, Box as GtkBox, Label, Orientation};
use sheetgate_core::{Row, SheetTable};

use crate::config::css;

/// Table container: centred, children stretched.
pub fn table() -> GtkBox {
    let table = GtkBox::new(Orientation::Vertical, 0);
    table.set_halign(Align::Center);
    table.set_valign(Align::Start);
    table.add_css_class(css::TABLE);
    table
}

/// Row primitive: horizontal, bottom border, top border when first.
pub fn row(first: bool, header: bool) -> GtkBox {
    let row = GtkBox::new(Orientation::Horizontal, 0);
    row.set_hexpand(true);
    row.add_css_class(css::ROW);
    if first {
        row.add_css_class(css::ROW_FIRST);
    }
    if header {
        row.add_css_class(css::ROW_HEADER);
    }
    row
}

/// Cell primitive: minimum width, right border, left border when first,
/// single-line text truncated with an ellipsis.
pub fn cell(text: &str, width: u32, first: bool) -> GtkBox {
    let cell = GtkBox::new(Orientation::Horizontal, 0);
    cell.set_vexpand(true);
    cell.set_size_request(i32::try_from(width).unwrap_or(i32::MAX), -1);
    cell.add_css_class(css::CELL);
    if first {
        cell.add_css_class(css::CELL_FIRST);
    }

    let label = Label::new(Some(text));
    label.set_single_line_mode(true);
    label.set_ellipsize(pango::EllipsizeMode::End);
    label.set_xalign(0.0);
    label.set_hexpand(true);
    label.set_tooltip_text(Some(text));
    cell.append(&label);

    cell
}

/// Build one table of `sheet` from the given rows, all sharing its column widths.
pub fn build<'a>(
    sheet: &'a SheetTable,
    rows: impl IntoIterator<Item = &'a Row>,
    header: bool,
) -> GtkBox {
    let container = table();

    for (i, values) in rows.into_iter().enumerate() {
        let row_box = row(i == 0, header);
        for (col, (text, width)) in sheet.padded_cells(values).enumerate() {
            row_box.append(&cell(&text, width, col == 0));
        }
        container.append(&row_box);
    }

    container
}
