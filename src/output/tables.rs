use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::Status;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn color_coded_success_cell(rate: u32) -> Cell {
    let text = format!("{rate}%");
    if rate > 80 {
        Cell::new(text).fg(TableColor::Green)
    } else if rate >= 50 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}

pub fn status_cell(status: Option<Status>) -> Cell {
    match status {
        Some(status) => {
            let color = match status {
                Status::Success => TableColor::Green,
                Status::Failed => TableColor::Red,
                Status::Running => TableColor::Cyan,
                Status::Pending => TableColor::Yellow,
                Status::Canceled | Status::Skipped => TableColor::DarkGrey,
            };
            Cell::new(status).fg(color)
        }
        None => Cell::new("n/a").fg(TableColor::DarkGrey),
    }
}
