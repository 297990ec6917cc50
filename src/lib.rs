// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Paint a contribution graph, then make it real.
//!
//! Arcadia lets a user paint an intensity pattern onto GitHub style
//! contribution grids, one grid per year window, and compiles the painted
//! pattern into a shell script. Running that script creates the right number
//! of back-dated commits on each painted day and pushes them to a target
//! repository, so the pattern shows up on the user's profile.
//!
//! # Pipeline
//!
//! 1. [`grid`] builds calendar aligned grids for a [`YearKey`].
//! 2. [`store`] keeps every selected grid and paints days across all of them.
//! 3. [`script`] flattens painted days into a [`CommitPlan`] and emits the
//!    shell script.
//! 4. [`snapshot`] saves and loads patterns as versioned JSON.
//!
//! Around that core, [`config`] reads user settings, [`remote`] checks that a
//! target repository exists before a script is handed out, and [`replay`]
//! applies a commit plan to a local repository directly.

pub mod calendar;
pub mod config;
pub mod grid;
pub mod path;
pub mod preview;
pub mod remote;
pub mod replay;
pub mod script;
pub mod snapshot;
pub mod store;

pub use grid::{Cell, Grid, Intensity, YearKey};
pub use script::{CommitPlan, ScriptCompiler, Target};
pub use snapshot::Snapshot;
pub use store::GridStore;
