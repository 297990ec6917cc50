// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Plain text grid preview.
//!
//! Draws a grid the way a contribution graph looks: one column per week, one
//! row per weekday starting at Sunday, and a month label row on top. Padding
//! cells are left blank.

use crate::{
    calendar::DAYS_PER_WEEK,
    grid::{Cell, Grid},
};

/// Glyph for each intensity level, from none to maximum.
pub const GLYPHS: [char; 5] = ['.', '░', '▒', '▓', '█'];

const GUTTER: usize = 4;
const COLUMN_WIDTH: usize = 2;
const WEEKDAYS: [&str; DAYS_PER_WEEK] = ["", "Mon", "", "Wed", "", "Fri", ""];

/// Render grid as text.
pub fn render(grid: &Grid) -> String {
    let width = GUTTER + grid.weeks() * COLUMN_WIDTH;
    let mut header = vec![' '; width];
    for slot in grid.label_slots() {
        let Some(column) = slot.column else {
            continue;
        };

        let start = GUTTER + column * COLUMN_WIDTH;
        let end = start + slot.abbreviation().len();
        if end > width || header[start..end].iter().any(|ch| *ch != ' ') {
            continue;
        }
        for (offset, ch) in slot.abbreviation().chars().enumerate() {
            header[start + offset] = ch;
        }
    }

    let mut rows = vec![vec![' '; grid.weeks()]; DAYS_PER_WEEK];
    for (index, cell) in grid.cells().iter().enumerate() {
        if !cell.is_out_of_range {
            rows[Cell::row(index)][Cell::column(index)] =
                GLYPHS[usize::from(cell.intensity.get())];
        }
    }

    let mut lines = vec![header.into_iter().collect::<String>()];
    for (weekday, row) in WEEKDAYS.iter().zip(rows) {
        let mut line = format!("{weekday:<width$}", width = GUTTER);
        for glyph in row {
            line.push(glyph);
            line.push(' ');
        }
        lines.push(line);
    }

    let mut text = lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    text.push('\n');
    text
}
