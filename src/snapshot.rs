// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pattern snapshot layout.
//!
//! Specify the JSON layout that painted grids are saved to and loaded from.
//! File I/O is left to the caller to figure out.
//!
//! # Format Versions
//!
//! Every snapshot carries a `"version"` tag, and decoding only accepts the
//! versions listed in [`Snapshot`]. Anything else is rejected as an invalid
//! file format instead of being guessed at.
//!
//! - Version `"1"` holds nothing but the grids, keyed by year selector.
//! - Version `"2"` adds [`Metadata`] about the last generation target, and
//!   whether the grids came from a bulk import.
//!
//! Dates are written as ISO-8601 UTC midnight timestamps such as
//! `2024-03-15T00:00:00.000Z`. Bare `2024-03-15` dates are accepted on read.
//! Month labels are derived data and never stored.

use crate::{
    grid::{Cell, Grid, Intensity, YearKey},
    store::GridStore,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Saved pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "version")]
pub enum Snapshot {
    /// Grids only.
    #[serde(rename = "1")]
    V1 { graphs: BTreeMap<YearKey, GridRecord> },

    /// Grids with metadata.
    #[serde(rename = "2")]
    V2 {
        graphs: BTreeMap<YearKey, GridRecord>,
        metadata: Metadata,
    },
}

impl Snapshot {
    /// Capture every grid of a store in the latest format version.
    pub fn capture(store: &GridStore, metadata: Metadata) -> Self {
        let graphs = store
            .grids()
            .iter()
            .map(|(key, grid)| (*key, GridRecord::from(grid)))
            .collect();

        Self::V2 {
            graphs,
            metadata: Metadata {
                imported: store.is_imported(),
                ..metadata
            },
        }
    }

    /// Decode snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// - Return [`SnapshotError::InvalidFormat`] if the text does not match
    ///   any known format version.
    pub fn decode(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(SnapshotError::InvalidFormat)
    }

    /// Encode snapshot as pretty printed JSON text.
    ///
    /// # Errors
    ///
    /// - Return [`SnapshotError::Serialize`] if encoding fails.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Serialize)
    }

    pub fn graphs(&self) -> &BTreeMap<YearKey, GridRecord> {
        match self {
            Self::V1 { graphs } | Self::V2 { graphs, .. } => graphs,
        }
    }

    /// Metadata, which version 1 snapshots lack.
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Self::V1 { .. } => None,
            Self::V2 { metadata, .. } => Some(metadata),
        }
    }

    /// Restore every grid.
    ///
    /// Either every grid restores, or none does.
    ///
    /// # Errors
    ///
    /// - Return [`SnapshotError::Misaligned`] if a grid's cells do not form
    ///   a calendar aligned grid.
    /// - Return [`SnapshotError::WindowMismatch`] if a grid's window disagrees
    ///   with its year selector or with its cells.
    /// - Return [`SnapshotError::PaintedPadding`] if an out-of-range cell
    ///   carries an intensity.
    pub fn into_grids(self) -> Result<BTreeMap<YearKey, Grid>> {
        let graphs = match self {
            Self::V1 { graphs } | Self::V2 { graphs, .. } => graphs,
        };

        graphs
            .into_iter()
            .map(|(key, record)| Ok((key, record.restore(key)?)))
            .collect()
    }
}

impl FromStr for Snapshot {
    type Err = SnapshotError;

    fn from_str(data: &str) -> Result<Self> {
        Self::decode(data)
    }
}

impl Display for Snapshot {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.encode()?.as_str())
    }
}

/// Extra information saved alongside grids.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// GitHub username of the last generation target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Repository of the last generation target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Branch of the last generation target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Grids came from a bulk import, which disables seeding.
    #[serde(default)]
    pub imported: bool,
}

/// Saved grid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRecord {
    pub cells: Vec<CellRecord>,

    #[serde(with = "iso_day")]
    pub year_start: NaiveDate,

    #[serde(with = "iso_day")]
    pub year_end: NaiveDate,
}

impl GridRecord {
    /// Restore grid after checking every invariant a built grid upholds.
    ///
    /// # Errors
    ///
    /// - Return [`SnapshotError::Misaligned`] if cells are not calendar aligned.
    /// - Return [`SnapshotError::WindowMismatch`] if the window disagrees with
    ///   the year selector or with the out-of-range flags.
    /// - Return [`SnapshotError::PaintedPadding`] if an out-of-range cell
    ///   carries an intensity.
    pub fn restore(self, key: YearKey) -> Result<Grid> {
        let cells = self.cells.into_iter().map(Cell::from).collect::<Vec<_>>();
        if !Grid::check_alignment(&cells) {
            return Err(SnapshotError::Misaligned(key));
        }

        let window_ok = self.year_start <= self.year_end
            && match key {
                YearKey::Current => true,
                YearKey::Year(_) => key
                    .bounds(self.year_start)
                    .is_ok_and(|bounds| bounds == (self.year_start, self.year_end)),
            };
        if !window_ok {
            return Err(SnapshotError::WindowMismatch(key));
        }

        for cell in &cells {
            let inside = cell.date >= self.year_start && cell.date <= self.year_end;

            // INVARIANT: Padding is always out of range, and explicit years
            // have no other kind of out-of-range cell.
            if (!inside || !key.is_current()) && cell.is_out_of_range == inside {
                return Err(SnapshotError::WindowMismatch(key));
            }

            if cell.is_out_of_range && !cell.intensity.is_none() {
                return Err(SnapshotError::PaintedPadding {
                    key,
                    date: cell.date,
                });
            }
        }

        Ok(Grid::from_parts(key, cells, self.year_start, self.year_end))
    }
}

impl From<&Grid> for GridRecord {
    fn from(grid: &Grid) -> Self {
        Self {
            cells: grid.cells().iter().copied().map(CellRecord::from).collect(),
            year_start: grid.year_start(),
            year_end: grid.year_end(),
        }
    }
}

/// Saved cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    #[serde(with = "iso_day")]
    pub date: NaiveDate,

    pub intensity: Intensity,

    pub is_out_of_range: bool,
}

impl From<Cell> for CellRecord {
    fn from(cell: Cell) -> Self {
        Self {
            date: cell.date,
            intensity: cell.intensity,
            is_out_of_range: cell.is_out_of_range,
        }
    }
}

impl From<CellRecord> for Cell {
    fn from(record: CellRecord) -> Self {
        Self {
            date: record.date,
            intensity: record.intensity,
            is_out_of_range: record.is_out_of_range,
        }
    }
}

mod iso_day {
    use chrono::{DateTime, NaiveDate};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%dT00:00:00.000Z"))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        if let Ok(instant) = DateTime::parse_from_rfc3339(&text) {
            return Ok(crate::calendar::utc_day(&instant));
        }

        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map_err(|_| D::Error::custom(format!("invalid ISO-8601 date {text:?}")))
    }
}

/// Snapshot error types.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Data does not match any known format version.
    #[error("invalid file format")]
    InvalidFormat(#[source] serde_json::Error),

    /// Snapshot cannot be encoded.
    #[error(transparent)]
    Serialize(serde_json::Error),

    /// Grid cells are not calendar aligned.
    #[error("grid {0} is not aligned to whole calendar weeks")]
    Misaligned(YearKey),

    /// Grid window disagrees with its selector or its cells.
    #[error("grid {0} has an inconsistent year window")]
    WindowMismatch(YearKey),

    /// Out-of-range cell carries an intensity.
    #[error("grid {key} paints out-of-range day {date}")]
    PaintedPadding { key: YearKey, date: NaiveDate },
}

impl From<SnapshotError> for FmtError {
    fn from(_: SnapshotError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = SnapshotError> = std::result::Result<T, E>;
