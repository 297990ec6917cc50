// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Calendar grid representation.
//!
//! A __grid__ is one year-window worth of calendar cells laid out the same way
//! GitHub lays out its contribution graph: one column per week, one row per
//! weekday, Sunday on top. Cell `i` lives at column `i / 7` and row `i % 7`.
//!
//! # Year Windows
//!
//! Each grid is selected through a [`YearKey`]. An explicit year covers
//! January 1 through December 31 of that year. The special `current` key
//! covers a rolling window that ends today and starts one calendar year
//! earlier, which is exactly what a profile page shows by default. Because the
//! rolling window overlaps up to two explicit years, the same calendar day can
//! appear in several grids at once. Keeping those copies in agreement is the
//! job of the [`GridStore`](crate::store::GridStore).
//!
//! # Padding
//!
//! Grids always start on the Sunday on or before the window start, always span
//! whole weeks, and always span at least 53 weeks so the rendered width never
//! changes. Cells that only exist for that alignment are marked
//! __out of range__. So are cells of the `current` window that lie in the
//! future. Out-of-range cells never carry a non-zero intensity.

pub mod labels;

use crate::{
    calendar::{day_of_week, days_between, sunday_on_or_before, DAYS_PER_WEEK, MIN_WEEKS},
    grid::labels::{label_slots, locate_month_labels, LabelSlot, MonthLabels},
};

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Painted contribution density of a single day.
///
/// Always within `0..=4`, where zero means no contribution at all.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    /// No contribution.
    pub const NONE: Self = Self(0);

    /// Densest contribution level.
    pub const MAX: Self = Self(4);

    /// Number of distinct intensity levels.
    pub const LEVELS: usize = Self::MAX.0 as usize + 1;

    /// Raw level.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Check if intensity means "no contribution".
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for Intensity {
    type Error = GridError;

    fn try_from(level: u8) -> Result<Self> {
        if level > Self::MAX.0 {
            return Err(GridError::IntensityOutOfRange(level));
        }

        Ok(Self(level))
    }
}

impl From<Intensity> for u8 {
    fn from(intensity: Intensity) -> Self {
        intensity.0
    }
}

impl FromStr for Intensity {
    type Err = GridError;

    fn from_str(data: &str) -> Result<Self> {
        let level = data
            .trim()
            .parse::<u8>()
            .map_err(|_| GridError::InvalidIntensity(data.into()))?;
        Self::try_from(level)
    }
}

impl Display for Intensity {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}", self.0)
    }
}

/// Selector for a grid's year window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum YearKey {
    /// Rolling window ending today.
    Current,

    /// Explicit calendar year.
    Year(u16),
}

impl YearKey {
    /// Determine logical start and end day of the window.
    ///
    /// # Errors
    ///
    /// - Return [`GridError::CalendarOverflow`] if the window cannot be
    ///   represented on the calendar.
    pub fn bounds(self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let overflow = || GridError::CalendarOverflow(self);
        match self {
            Self::Current => {
                let start = today.checked_sub_months(Months::new(12)).ok_or_else(overflow)?;
                Ok((start, today))
            }
            Self::Year(year) => {
                let start = NaiveDate::from_ymd_opt(i32::from(year), 1, 1).ok_or_else(overflow)?;
                let end = NaiveDate::from_ymd_opt(i32::from(year), 12, 31).ok_or_else(overflow)?;
                Ok((start, end))
            }
        }
    }

    /// Check if this is the rolling `current` window.
    pub fn is_current(self) -> bool {
        matches!(self, Self::Current)
    }
}

impl FromStr for YearKey {
    type Err = GridError;

    fn from_str(data: &str) -> Result<Self> {
        if data == "current" {
            return Ok(Self::Current);
        }

        if data.len() == 4 && data.bytes().all(|byte| byte.is_ascii_digit()) {
            let year = data
                .parse()
                .map_err(|_| GridError::InvalidYearKey(data.into()))?;
            return Ok(Self::Year(year));
        }

        Err(GridError::InvalidYearKey(data.into()))
    }
}

impl TryFrom<String> for YearKey {
    type Error = GridError;

    fn try_from(data: String) -> Result<Self> {
        data.parse()
    }
}

impl From<YearKey> for String {
    fn from(key: YearKey) -> Self {
        key.to_string()
    }
}

impl Display for YearKey {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Current => fmt.write_str("current"),
            Self::Year(year) => write!(fmt, "{year:04}"),
        }
    }
}

/// One slot of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// UTC calendar day this slot represents.
    pub date: NaiveDate,

    /// Painted intensity of the day.
    pub intensity: Intensity,

    /// Slot only exists for alignment, or lies in the future.
    pub is_out_of_range: bool,
}

impl Cell {
    /// Column of a cell index in the rendered grid.
    pub fn column(index: usize) -> usize {
        index / DAYS_PER_WEEK
    }

    /// Row of a cell index in the rendered grid, Sunday being row zero.
    pub fn row(index: usize) -> usize {
        index % DAYS_PER_WEEK
    }
}

/// One year-window worth of cells.
///
/// Grids are only mutated through the grid store so intensities stay
/// synchronized across overlapping windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    key: YearKey,
    cells: Vec<Cell>,
    year_start: NaiveDate,
    year_end: NaiveDate,
    month_labels: MonthLabels,
}

impl Grid {
    /// Build a blank grid for a year window.
    ///
    /// The grid starts on the Sunday on or before the window start, covers
    /// whole weeks through the window end, and always spans at least 53 weeks.
    /// Every cell starts with zero intensity.
    ///
    /// # Errors
    ///
    /// - Return [`GridError::CalendarOverflow`] if the window or its padding
    ///   falls off the representable calendar.
    pub fn build(key: YearKey, today: NaiveDate) -> Result<Self> {
        let (year_start, year_end) = key.bounds(today)?;
        let grid_start = sunday_on_or_before(year_start);
        let span = usize::try_from(days_between(grid_start, year_end) + 1)
            .map_err(|_| GridError::CalendarOverflow(key))?;
        let total = span.div_ceil(DAYS_PER_WEEK).max(MIN_WEEKS) * DAYS_PER_WEEK;

        let cells = grid_start
            .iter_days()
            .take(total)
            .map(|date| Cell {
                date,
                intensity: Intensity::NONE,
                is_out_of_range: date < year_start
                    || date > year_end
                    || (key.is_current() && date > today),
            })
            .collect::<Vec<_>>();

        // INVARIANT: Padding must not run past the end of the calendar.
        if cells.len() != total {
            return Err(GridError::CalendarOverflow(key));
        }

        Ok(Self::from_parts(key, cells, year_start, year_end))
    }

    /// Assemble grid from already validated parts.
    ///
    /// Month labels are always derived from the cells.
    pub(crate) fn from_parts(
        key: YearKey,
        cells: Vec<Cell>,
        year_start: NaiveDate,
        year_end: NaiveDate,
    ) -> Self {
        let month_labels = locate_month_labels(&cells);
        Self {
            key,
            cells,
            year_start,
            year_end,
            month_labels,
        }
    }

    pub fn key(&self) -> YearKey {
        self.key
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// First day of the logical window.
    pub fn year_start(&self) -> NaiveDate {
        self.year_start
    }

    /// Last day of the logical window.
    pub fn year_end(&self) -> NaiveDate {
        self.year_end
    }

    /// Month index (`0..12`) to week column of its label.
    pub fn month_labels(&self) -> &MonthLabels {
        &self.month_labels
    }

    /// Month labels in rendering order.
    ///
    /// Explicit years render January through December. The rolling window
    /// starts at its first month and wraps through thirteen slots so the
    /// leading partial month gets a label too.
    pub fn label_slots(&self) -> Vec<LabelSlot> {
        label_slots(self.key, &self.cells, &self.month_labels)
    }

    /// Number of week columns.
    pub fn weeks(&self) -> usize {
        self.cells.len() / DAYS_PER_WEEK
    }

    /// Locate cell index of a calendar day.
    ///
    /// Returns `None` if the day lies outside the grid, padding included.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let first = self.cells.first()?;
        let offset = usize::try_from(days_between(first.date, date)).ok()?;
        (offset < self.cells.len()).then_some(offset)
    }

    /// Locate in-range cell index of a calendar day.
    pub fn in_range_index_of(&self, date: NaiveDate) -> Option<usize> {
        self.index_of(date)
            .filter(|index| !self.cells[*index].is_out_of_range)
    }

    /// Iterate over all cells that may carry an intensity.
    pub fn in_range_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(|cell| !cell.is_out_of_range)
    }

    /// Check if no in-range cell carries an intensity.
    pub fn is_blank(&self) -> bool {
        self.in_range_cells().all(|cell| cell.intensity.is_none())
    }

    /// Set intensity of a cell in place.
    ///
    /// Out-of-range cells are immutable. Returns whether the cell changed.
    pub(crate) fn set_intensity(&mut self, index: usize, intensity: Intensity) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) if !cell.is_out_of_range && cell.intensity != intensity => {
                cell.intensity = intensity;
                true
            }
            _ => false,
        }
    }

    /// Set intensity of the in-range cell for a calendar day, if any.
    pub(crate) fn set_intensity_on(&mut self, date: NaiveDate, intensity: Intensity) -> bool {
        match self.in_range_index_of(date) {
            Some(index) => self.set_intensity(index, intensity),
            None => false,
        }
    }

    /// Check alignment invariant of a raw cell sequence.
    ///
    /// Cells must cover whole weeks of consecutive days, at least 53 of them,
    /// starting on a Sunday.
    pub(crate) fn check_alignment(cells: &[Cell]) -> bool {
        if cells.len() < MIN_WEEKS * DAYS_PER_WEEK || cells.len() % DAYS_PER_WEEK != 0 {
            return false;
        }

        cells
            .windows(2)
            .all(|pair| days_between(pair[0].date, pair[1].date) == 1)
            && cells
                .iter()
                .enumerate()
                .all(|(index, cell)| day_of_week(cell.date) as usize == Cell::row(index))
    }
}

/// Grid construction error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Year selector is neither "current" nor a four digit year.
    #[error("invalid year selector {0:?}, expected \"current\" or a four digit year")]
    InvalidYearKey(String),

    /// Intensity text is not a number.
    #[error("invalid intensity {0:?}")]
    InvalidIntensity(String),

    /// Intensity level is above the maximum.
    #[error("intensity {0} is out of range 0..=4")]
    IntensityOutOfRange(u8),

    /// Year window cannot be represented on the calendar.
    #[error("year window {0} falls outside the supported calendar")]
    CalendarOverflow(YearKey),
}

/// Friendly result alias :3
type Result<T, E = GridError> = std::result::Result<T, E>;
