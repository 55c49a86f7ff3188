pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Result};
pub use colored::Colorize;
pub use std::format as f;

/// A borderless table whose first row is the bold cyan `headers`.
pub fn new_table(headers: &[&str]) -> prettytable::Table {
    let mut table = prettytable::Table::new();
    table.set_format(
        prettytable::format::FormatBuilder::new()
            .padding(1, 1)
            .column_separator(' ')
            .build(),
    );

    let cells = headers
        .iter()
        .map(|h| prettytable::Cell::new(&h.bold().cyan().to_string()))
        .collect();
    table.add_row(prettytable::Row::new(cells));
    table
}
