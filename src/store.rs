// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Grid store management and manipulation.
//!
//! Arcadia keeps every selected year window together in one place called the
//! __grid store__. The store owns the grids, and it is the only thing allowed
//! to change their intensities.
//!
//! # Date Keyed Intensities
//!
//! Intensity belongs to a calendar day, not to a slot of some particular grid.
//! The rolling `current` window overlaps explicit calendar years, so the same
//! day can be visible in several grids at once. Painting a day in one grid
//! paints that same day in every other grid that holds it in range. Clearing
//! works the same way. Each mutation runs to completion before the next one
//! can be observed, because every mutating method takes `&mut self`.
//!
//! # Seeding
//!
//! When a year window is selected for the first time, its fresh grid is seeded
//! from what is already loaded: an explicit year copies from the `current`
//! grid, and the `current` grid takes the highest intensity any loaded year
//! holds for each day. Seeding is skipped entirely once the store holds
//! imported data, so an import is never silently blended with anything else.

use crate::grid::{Grid, GridError, Intensity, YearKey};

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// All selected grids of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStore {
    today: NaiveDate,
    grids: BTreeMap<YearKey, Grid>,
    imported: bool,
}

impl GridStore {
    /// Construct new empty grid store.
    ///
    /// The given day is used as "today" for every grid the store builds.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            grids: BTreeMap::new(),
            imported: false,
        }
    }

    /// Reopen a previously saved store.
    ///
    /// Unlike [`GridStore::import`], the saved import state is kept as is.
    pub fn restore(today: NaiveDate, grids: BTreeMap<YearKey, Grid>, imported: bool) -> Self {
        Self {
            today,
            imported: imported && !grids.is_empty(),
            grids,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn grids(&self) -> &BTreeMap<YearKey, Grid> {
        &self.grids
    }

    pub fn grid(&self, key: YearKey) -> Option<&Grid> {
        self.grids.get(&key)
    }

    /// Selected year windows in ascending order, `current` first.
    pub fn keys(&self) -> impl Iterator<Item = YearKey> + '_ {
        self.grids.keys().copied()
    }

    /// Check if store holds imported data that disables seeding.
    pub fn is_imported(&self) -> bool {
        self.imported
    }

    /// Select a year window.
    ///
    /// Builds and seeds the grid on first selection. Selecting an already
    /// selected window leaves it untouched. Mutates the store in place.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Grid`] if the grid cannot be built.
    #[instrument(skip(self), level = "debug")]
    pub fn select_year(&mut self, key: YearKey) -> Result<&Grid> {
        if !self.grids.contains_key(&key) {
            let mut grid = Grid::build(key, self.today)?;
            if self.imported {
                debug!("store holds imported data, skip seeding {key}");
            } else {
                let seeded = self.seed(&mut grid);
                debug!("seeded {seeded} cells of {key}");
            }
            info!("select year {key}");
            self.grids.insert(key, grid);
        }

        self.grids.get(&key).ok_or(StoreError::UnknownYear(key))
    }

    /// Deselect a year window, handing back its grid.
    ///
    /// Mutates the store in place.
    #[instrument(skip(self), level = "debug")]
    pub fn deselect_year(&mut self, key: YearKey) -> Option<Grid> {
        let removed = self.grids.remove(&key);
        match removed {
            Some(_) => info!("deselect year {key}"),
            None => warn!("year {key} is not selected"),
        }

        if self.grids.is_empty() {
            self.imported = false;
        }

        removed
    }

    /// Paint a cell, and the same day in every other grid.
    ///
    /// Does nothing if the target cell is out of range or already holds the
    /// intensity. Mutates the store in place. Returns the number of grids whose
    /// cell changed.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::UnknownYear`] if the year is not selected.
    /// - Return [`StoreError::CellOutOfBounds`] if the index is past the grid.
    #[instrument(skip(self), level = "debug")]
    pub fn paint_cell(&mut self, key: YearKey, index: usize, intensity: Intensity) -> Result<usize> {
        let grid = self.grids.get(&key).ok_or(StoreError::UnknownYear(key))?;
        let cell = grid.cell(index).ok_or(StoreError::CellOutOfBounds {
            key,
            index,
            len: grid.cells().len(),
        })?;

        if cell.is_out_of_range {
            warn!("cell {index} of {key} ({}) is out of range", cell.date);
            return Ok(0);
        }

        if cell.intensity == intensity {
            return Ok(0);
        }

        let date = cell.date;
        let changed = self.propagate(date, intensity);
        debug!("paint {date} with intensity {intensity} across {changed} grids");

        Ok(changed)
    }

    /// Paint a calendar day through whichever grid holds it in range.
    ///
    /// Mutates the store in place. Returns the number of grids whose cell
    /// changed.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::DateNotCovered`] if no selected grid holds the
    ///   day in range.
    pub fn paint_date(&mut self, date: NaiveDate, intensity: Intensity) -> Result<usize> {
        let (key, index) = self
            .grids
            .iter()
            .find_map(|(key, grid)| grid.in_range_index_of(date).map(|index| (*key, index)))
            .ok_or(StoreError::DateNotCovered(date))?;

        self.paint_cell(key, index, intensity)
    }

    /// Clear every day of a year window, in every grid that holds it.
    ///
    /// Mutates the store in place. Returns the number of cells that changed.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::UnknownYear`] if the year is not selected.
    #[instrument(skip(self), level = "debug")]
    pub fn clear_year(&mut self, key: YearKey) -> Result<usize> {
        let dates = self
            .grids
            .get(&key)
            .ok_or(StoreError::UnknownYear(key))?
            .in_range_cells()
            .map(|cell| cell.date)
            .collect::<Vec<_>>();

        let changed = dates
            .into_iter()
            .map(|date| self.propagate(date, Intensity::NONE))
            .sum();
        info!("clear {changed} cells covered by {key}");

        Ok(changed)
    }

    /// Clear every cell of every grid.
    ///
    /// Mutates the store in place. Returns the number of cells that changed.
    #[instrument(skip(self), level = "debug")]
    pub fn clear_all(&mut self) -> usize {
        let mut changed = 0;
        for grid in self.grids.values_mut() {
            for index in 0..grid.cells().len() {
                if grid.set_intensity(index, Intensity::NONE) {
                    changed += 1;
                }
            }
        }

        // INVARIANT: Nothing imported survives a full clear.
        self.imported = false;
        info!("clear {changed} cells across all grids");

        changed
    }

    /// Replace every grid with imported ones.
    ///
    /// Grids must be fully built before calling, so a failed import never
    /// reaches the store. Disables seeding if any imported cell is painted.
    /// Mutates the store in place.
    #[instrument(skip(self, grids), level = "debug")]
    pub fn import(&mut self, grids: BTreeMap<YearKey, Grid>) {
        self.imported = grids.values().any(|grid| !grid.is_blank());
        self.grids = grids;
        info!(
            "import {} grids (seeding {})",
            self.grids.len(),
            if self.imported { "disabled" } else { "enabled" }
        );
    }

    fn propagate(&mut self, date: NaiveDate, intensity: Intensity) -> usize {
        self.grids
            .values_mut()
            .map(|grid| grid.set_intensity_on(date, intensity))
            .filter(|changed| *changed)
            .count()
    }

    fn seed(&self, grid: &mut Grid) -> usize {
        let mut seeded = 0;
        if grid.key().is_current() {
            // INVARIANT: Highest intensity wins when loaded years disagree.
            for other in self.grids.values() {
                for cell in other.in_range_cells() {
                    let Some(index) = grid.in_range_index_of(cell.date) else {
                        continue;
                    };
                    let held = grid.cells()[index].intensity;
                    if cell.intensity > held && grid.set_intensity(index, cell.intensity) {
                        seeded += 1;
                    }
                }
            }
        } else if let Some(current) = self.grids.get(&YearKey::Current) {
            for cell in current.in_range_cells() {
                if grid.set_intensity_on(cell.date, cell.intensity) {
                    seeded += 1;
                }
            }
        }

        seeded
    }
}

/// All possible error types for grid store interaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Year window is not selected.
    #[error("year {0} is not selected")]
    UnknownYear(YearKey),

    /// Cell index is past the end of the grid.
    #[error("cell {index} is out of bounds for {key} which holds {len} cells")]
    CellOutOfBounds {
        key: YearKey,
        index: usize,
        len: usize,
    },

    /// No selected grid holds the day in range.
    #[error("no selected year covers {0}")]
    DateNotCovered(NaiveDate),

    /// Grid cannot be built.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Friendly result alias :3
type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    fn level(value: u8) -> Intensity {
        Intensity::try_from(value).unwrap()
    }

    fn intensity_on(store: &GridStore, key: YearKey, date: &str) -> Option<Intensity> {
        let grid = store.grid(key)?;
        let index = grid.in_range_index_of(day(date))?;
        Some(grid.cells()[index].intensity)
    }

    #[test]
    fn paint_propagates_to_overlapping_grids() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Current)?;
        store.select_year(YearKey::Year(2023))?;

        let index = store
            .grid(YearKey::Year(2023))
            .and_then(|grid| grid.index_of(day("2023-12-25")))
            .unwrap_or_default();
        let changed = store.paint_cell(YearKey::Year(2023), index, level(4))?;

        assert_eq!(changed, 2);
        assert_eq!(
            intensity_on(&store, YearKey::Current, "2023-12-25"),
            Some(level(4))
        );
        assert_eq!(
            intensity_on(&store, YearKey::Year(2023), "2023-12-25"),
            Some(level(4))
        );

        Ok(())
    }

    #[test]
    fn paint_outside_overlap_touches_one_grid() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Current)?;
        store.select_year(YearKey::Year(2023))?;

        assert_eq!(store.paint_date(day("2023-02-14"), level(2))?, 1);
        assert_eq!(intensity_on(&store, YearKey::Current, "2023-02-14"), None);

        Ok(())
    }

    #[test]
    fn paint_out_of_range_or_unchanged_is_noop() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2024))?;

        // Index 0 is the 2023-12-31 padding cell.
        assert_eq!(store.paint_cell(YearKey::Year(2024), 0, level(3))?, 0);
        assert_eq!(store.paint_cell(YearKey::Year(2024), 5, level(0))?, 0);
        assert!(store.grid(YearKey::Year(2024)).is_some_and(Grid::is_blank));

        Ok(())
    }

    #[test]
    fn paint_rejects_bad_targets() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2024))?;

        assert_eq!(
            store.paint_cell(YearKey::Year(2020), 0, level(1)),
            Err(StoreError::UnknownYear(YearKey::Year(2020)))
        );
        assert_eq!(
            store.paint_cell(YearKey::Year(2024), 371, level(1)),
            Err(StoreError::CellOutOfBounds {
                key: YearKey::Year(2024),
                index: 371,
                len: 371,
            })
        );
        assert_eq!(
            store.paint_date(day("2019-01-01"), level(1)),
            Err(StoreError::DateNotCovered(day("2019-01-01")))
        );

        Ok(())
    }

    #[test]
    fn explicit_year_seeds_from_current() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Current)?;
        store.paint_date(day("2024-01-10"), level(3))?;
        store.paint_date(day("2023-08-01"), level(1))?;

        store.select_year(YearKey::Year(2024))?;
        assert_eq!(
            intensity_on(&store, YearKey::Year(2024), "2024-01-10"),
            Some(level(3))
        );

        store.select_year(YearKey::Year(2023))?;
        assert_eq!(
            intensity_on(&store, YearKey::Year(2023), "2023-08-01"),
            Some(level(1))
        );

        Ok(())
    }

    #[test]
    fn current_seeds_from_every_loaded_year() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2023))?;
        store.select_year(YearKey::Year(2024))?;
        store.paint_date(day("2023-07-04"), level(2))?;
        store.paint_date(day("2024-02-01"), level(4))?;
        store.paint_date(day("2023-01-05"), level(1))?;

        store.select_year(YearKey::Current)?;
        assert_eq!(
            intensity_on(&store, YearKey::Current, "2023-07-04"),
            Some(level(2))
        );
        assert_eq!(
            intensity_on(&store, YearKey::Current, "2024-02-01"),
            Some(level(4))
        );

        Ok(())
    }

    #[test]
    fn reselecting_keeps_existing_grid() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2024))?;
        store.paint_date(day("2024-03-15"), level(2))?;
        store.select_year(YearKey::Year(2024))?;

        assert_eq!(
            intensity_on(&store, YearKey::Year(2024), "2024-03-15"),
            Some(level(2))
        );

        Ok(())
    }

    #[test]
    fn import_disables_seeding() -> anyhow::Result<()> {
        let mut source = GridStore::new(day("2024-06-01"));
        source.select_year(YearKey::Year(2024))?;
        source.paint_date(day("2024-03-15"), level(2))?;

        let mut store = GridStore::new(day("2024-06-01"));
        store.import(source.grids().clone());
        assert!(store.is_imported());

        store.select_year(YearKey::Current)?;
        assert_eq!(
            intensity_on(&store, YearKey::Current, "2024-03-15"),
            Some(Intensity::NONE)
        );

        // Painting still synchronizes, only seeding is off.
        store.paint_date(day("2024-03-16"), level(1))?;
        assert_eq!(
            intensity_on(&store, YearKey::Current, "2024-03-16"),
            Some(level(1))
        );
        assert_eq!(
            intensity_on(&store, YearKey::Year(2024), "2024-03-16"),
            Some(level(1))
        );

        Ok(())
    }

    #[test]
    fn clear_year_reaches_days_painted_elsewhere() -> anyhow::Result<()> {
        let mut source = GridStore::new(day("2024-06-01"));
        source.select_year(YearKey::Year(2024))?;
        source.paint_date(day("2024-03-15"), level(2))?;

        let mut store = GridStore::new(day("2024-06-01"));
        store.import(source.grids().clone());
        store.select_year(YearKey::Current)?;
        assert_eq!(
            intensity_on(&store, YearKey::Current, "2024-03-15"),
            Some(Intensity::NONE)
        );

        // The blank current grid still clears every day it covers.
        assert_eq!(store.clear_year(YearKey::Current)?, 1);
        assert_eq!(
            intensity_on(&store, YearKey::Year(2024), "2024-03-15"),
            Some(Intensity::NONE)
        );

        Ok(())
    }

    #[test]
    fn blank_import_keeps_seeding() -> anyhow::Result<()> {
        let mut source = GridStore::new(day("2024-06-01"));
        source.select_year(YearKey::Year(2024))?;

        let mut store = GridStore::new(day("2024-06-01"));
        store.import(source.grids().clone());
        assert!(!store.is_imported());

        Ok(())
    }

    #[test]
    fn clear_year_propagates() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Current)?;
        store.select_year(YearKey::Year(2024))?;
        store.select_year(YearKey::Year(2023))?;
        store.paint_date(day("2024-03-15"), level(2))?;
        store.paint_date(day("2023-02-01"), level(3))?;

        // One day in 2024 and current, so two cells.
        assert_eq!(store.clear_year(YearKey::Year(2024))?, 2);
        assert_eq!(
            intensity_on(&store, YearKey::Current, "2024-03-15"),
            Some(Intensity::NONE)
        );
        assert_eq!(
            intensity_on(&store, YearKey::Year(2023), "2023-02-01"),
            Some(level(3))
        );

        Ok(())
    }

    #[test]
    fn clear_all_resets_everything() -> anyhow::Result<()> {
        let mut source = GridStore::new(day("2024-06-01"));
        source.select_year(YearKey::Year(2024))?;
        source.paint_date(day("2024-03-15"), level(2))?;

        let mut store = GridStore::new(day("2024-06-01"));
        store.import(source.grids().clone());
        store.select_year(YearKey::Year(2023))?;
        store.paint_date(day("2023-03-15"), level(4))?;

        assert_eq!(store.clear_all(), 2);
        assert!(!store.is_imported());
        assert!(store.grids().values().all(Grid::is_blank));

        Ok(())
    }

    #[test]
    fn deselect_removes_grid() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2024))?;

        assert!(store.deselect_year(YearKey::Year(2024)).is_some());
        assert!(store.deselect_year(YearKey::Year(2024)).is_none());
        assert_eq!(store.keys().count(), 0);

        Ok(())
    }
}
