// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit density and commit message tables.

use crate::{grid::Intensity, script::ScriptError};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Built-in pool of human looking commit messages.
pub const DEFAULT_MESSAGES: &[&str] = &[
    "Fix typo in documentation",
    "Update README",
    "Refactor helper functions",
    "Add missing tests",
    "Clean up imports",
    "Improve error messages",
    "Bump dependencies",
    "Fix off by one error",
    "Tidy formatting",
    "Rename variables for clarity",
    "Simplify control flow",
    "Add logging",
    "Remove dead code",
    "Update configuration defaults",
    "Fix flaky test",
    "Document public API",
    "Extract shared module",
    "Handle empty input",
    "Polish command line output",
    "Speed up build",
    "Fix edge case in parser",
    "Add example usage",
    "Update changelog",
    "Guard against missing values",
    "Improve naming",
    "Split large function",
    "Fix broken link",
    "Adjust timeouts",
    "Add comments",
    "Minor cleanup",
];

/// Number of commits made per intensity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CommitScale([u32; Intensity::LEVELS]);

impl CommitScale {
    /// Construct new commit scale from a per-level table.
    pub fn new(counts: [u32; Intensity::LEVELS]) -> Self {
        Self(counts)
    }

    /// Commits to make for a day of the given intensity.
    pub fn commits(&self, intensity: Intensity) -> u32 {
        self.0[usize::from(intensity.get())]
    }

    pub fn as_array(&self) -> &[u32; Intensity::LEVELS] {
        &self.0
    }
}

impl Default for CommitScale {
    fn default() -> Self {
        Self([0, 10, 20, 30, 40])
    }
}

/// Non-empty pool of commit messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePool(Vec<String>);

impl MessagePool {
    /// Construct new message pool.
    ///
    /// Messages are trimmed, and blank or multi-line messages are dropped.
    ///
    /// # Errors
    ///
    /// - Return [`ScriptError::EmptyMessagePool`] if no usable message is left.
    pub fn new(messages: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, ScriptError> {
        let messages = messages
            .into_iter()
            .map(Into::into)
            .map(|message| message.trim().to_owned())
            .filter(|message| !message.is_empty() && !message.contains(['\n', '\r']))
            .collect::<Vec<_>>();

        if messages.is_empty() {
            return Err(ScriptError::EmptyMessagePool);
        }

        Ok(Self(messages))
    }

    /// Pick a message uniformly at random.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> &str {
        // INVARIANT: Pool is never empty.
        &self.0[rng.gen_range(0..self.0.len())]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl Default for MessagePool {
    fn default() -> Self {
        Self(DEFAULT_MESSAGES.iter().map(|message| (*message).to_owned()).collect())
    }
}
