// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Month label placement.
//!
//! Month labels sit above the week column where the month's first Sunday
//! lands, so they line up with the column that visually starts the month.
//!
//! The locator records the raw column of the first Sunday of each month over
//! every cell, padding included. Rendering slots are layered on top of it, and
//! only anchor a label on a Sunday that is in range and belongs to the slot's
//! own month of the right year. Otherwise a December padding column would
//! steal the December label of the year.

use crate::{
    calendar::{day_of_week, DAYS_PER_WEEK},
    grid::{Cell, YearKey},
};

use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;

/// Month index (`0..12`) to week column.
pub type MonthLabels = BTreeMap<u32, usize>;

/// Number of label slots rendered for an explicit year.
pub const YEAR_LABEL_SLOTS: usize = 12;

/// Number of label slots rendered for the rolling window.
pub const ROLLING_LABEL_SLOTS: usize = 13;

/// Label slot in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSlot {
    /// Month index, January being zero.
    pub month: u32,

    /// Week column to anchor label at, if the month has a Sunday in range.
    pub column: Option<usize>,
}

impl LabelSlot {
    /// Three letter English month abbreviation.
    pub fn abbreviation(&self) -> &'static str {
        const NAMES: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        NAMES[self.month as usize % NAMES.len()]
    }
}

/// Locate week column of each month label.
///
/// Scans every cell in order and records the column of the first Sunday of
/// every month. Later Sundays of the same month never move its label.
pub fn locate_month_labels(cells: &[Cell]) -> MonthLabels {
    let mut labels = MonthLabels::new();
    for (index, cell) in cells.iter().enumerate() {
        if day_of_week(cell.date) != 0 {
            continue;
        }

        labels
            .entry(cell.date.month0())
            .or_insert(Cell::column(index));
    }

    labels
}

/// Order month labels for rendering.
///
/// Explicit years render January through December. The rolling window starts
/// at the month of its first in-range day and wraps through thirteen slots, so
/// that month shows up twice: once as the leading partial month, and once a
/// year later at the trailing edge.
pub fn label_slots(key: YearKey, cells: &[Cell], labels: &MonthLabels) -> Vec<LabelSlot> {
    let (start, count) = match key {
        YearKey::Year(year) => (
            NaiveDate::from_ymd_opt(i32::from(year), 1, 1),
            YEAR_LABEL_SLOTS,
        ),
        YearKey::Current => (
            cells
                .iter()
                .find(|cell| !cell.is_out_of_range)
                .and_then(|cell| cell.date.with_day(1)),
            ROLLING_LABEL_SLOTS,
        ),
    };
    let Some(mut cursor) = start else {
        return Vec::new();
    };

    let mut slots = Vec::with_capacity(count);
    for _ in 0..count {
        slots.push(LabelSlot {
            month: cursor.month0(),
            column: anchor_column(cells, labels, cursor),
        });

        cursor = match cursor.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    slots
}

// Keep the located column when it is a usable anchor for this exact month,
// otherwise look for the month's first in-range Sunday.
fn anchor_column(cells: &[Cell], labels: &MonthLabels, month: NaiveDate) -> Option<usize> {
    let located = labels.get(&month.month0()).copied().filter(|column| {
        cells
            .get(column * DAYS_PER_WEEK)
            .is_some_and(|cell| is_anchor(cell, month))
    });

    located.or_else(|| {
        cells
            .iter()
            .position(|cell| is_anchor(cell, month))
            .map(Cell::column)
    })
}

fn is_anchor(cell: &Cell, month: NaiveDate) -> bool {
    !cell.is_out_of_range
        && day_of_week(cell.date) == 0
        && cell.date.year() == month.year()
        && cell.date.month() == month.month()
}
