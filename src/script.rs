// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit script compilation.
//!
//! Turns the painted grids of a [`GridStore`](crate::store::GridStore) into a
//! POSIX shell script that recreates the pattern as real, back-dated commits.
//!
//! # Compilation Stages
//!
//! 1. Flatten every grid into one map of calendar day to intensity. Grids are
//!    kept in agreement by the grid store, so this only removes duplicates.
//!    Out-of-range and blank cells never make it into the map.
//! 2. Order days from oldest to newest, so commit history is built in the
//!    same order git walks parent chains.
//! 3. Look up how many commits each day needs through a [`CommitScale`].
//! 4. Unroll every commit into a [`ScheduledCommit`] stamped at noon UTC of its
//!    day, and pick a cosmetic message for it from a [`MessagePool`].
//! 5. Emit the shell script.
//!
//! Commits land at noon UTC so that no timezone GitHub might attribute the
//! commit in can push it onto a neighbouring day.
//!
//! Message selection draws from a caller supplied random number generator.
//! Seed it, and the same pattern always compiles to the same script.

pub mod messages;
pub mod shell;

pub use messages::{CommitScale, MessagePool, DEFAULT_MESSAGES};

use crate::grid::{Grid, Intensity};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Hour of day, in UTC, that every synthetic commit is stamped with.
pub const COMMIT_HOUR: u32 = 12;

/// Default name of the scratch working directory the script operates in.
pub const DEFAULT_WORK_DIR: &str = "arcadia";

/// Validated destination of a generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    username: String,
    repository: String,
    branch: String,
}

impl Target {
    /// Construct new validated target.
    ///
    /// # Errors
    ///
    /// - Return [`ScriptError::MissingField`] if any field is blank.
    /// - Return [`ScriptError::InvalidField`] if the username or repository
    ///   contains a path separator or whitespace.
    pub fn new(
        username: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Result<Self> {
        let username = required("username", username.into())?;
        let repository = required("repository", repository.into())?;
        let branch = required("branch", branch.into())?;

        for (field, value) in [("username", &username), ("repository", &repository)] {
            if value.contains(|ch: char| ch == '/' || ch.is_whitespace()) {
                return Err(ScriptError::InvalidField {
                    field,
                    value: value.clone(),
                });
            }
        }

        Ok(Self {
            username,
            repository,
            branch,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Short `username/repository` form.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.username, self.repository)
    }

    /// HTTPS clone URL on GitHub.
    pub fn remote_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.username, self.repository)
    }
}

fn required(field: &'static str, value: String) -> Result<String> {
    let value = value.trim().to_owned();
    if value.is_empty() {
        return Err(ScriptError::MissingField(field));
    }

    Ok(value)
}

/// Day of the plan with its commit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedDay {
    pub date: NaiveDate,
    pub intensity: Intensity,
    pub commits: u32,
}

/// One unrolled commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledCommit<'a> {
    /// Author and committer time.
    pub timestamp: DateTime<Utc>,

    /// Cosmetic commit message.
    pub message: &'a str,
}

/// Chronological list of painted days.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    days: Vec<PlannedDay>,
}

impl CommitPlan {
    /// Flatten grids into a plan.
    ///
    /// Keeps one entry per calendar day, skipping blank and out-of-range
    /// cells. Later grids overwrite earlier ones for the same day.
    pub fn from_grids<'a>(grids: impl IntoIterator<Item = &'a Grid>, scale: &CommitScale) -> Self {
        let mut date_map = BTreeMap::new();
        for grid in grids {
            for cell in grid.in_range_cells() {
                if !cell.intensity.is_none() {
                    date_map.insert(cell.date, cell.intensity);
                }
            }
        }

        // INVARIANT: BTreeMap iteration yields days oldest first.
        let days = date_map
            .into_iter()
            .map(|(date, intensity)| PlannedDay {
                date,
                intensity,
                commits: scale.commits(intensity),
            })
            .collect();

        Self { days }
    }

    pub fn days(&self) -> &[PlannedDay] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Calendar day to intensity for every painted day.
    pub fn date_map(&self) -> BTreeMap<NaiveDate, Intensity> {
        self.days
            .iter()
            .map(|day| (day.date, day.intensity))
            .collect()
    }

    /// Total number of synthetic commits.
    pub fn total_commits(&self) -> u64 {
        self.days.iter().map(|day| u64::from(day.commits)).sum()
    }

    /// Unroll every commit in chronological order.
    pub fn schedule<'p, R: Rng>(
        &self,
        messages: &'p MessagePool,
        rng: &mut R,
    ) -> Vec<ScheduledCommit<'p>> {
        let mut commits = Vec::new();
        for day in &self.days {
            let timestamp = commit_timestamp(day.date);
            for _ in 0..day.commits {
                commits.push(ScheduledCommit {
                    timestamp,
                    message: messages.pick(rng),
                });
            }
        }

        commits
    }
}

/// Noon UTC of a calendar day.
pub fn commit_timestamp(date: NaiveDate) -> DateTime<Utc> {
    let noon = NaiveTime::from_hms_opt(COMMIT_HOUR, 0, 0).unwrap_or_default();
    date.and_time(noon).and_utc()
}

/// Shell script compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCompiler {
    scale: CommitScale,
    messages: MessagePool,
    work_dir: String,
}

impl ScriptCompiler {
    /// Construct new script compiler.
    ///
    /// # Errors
    ///
    /// - Return [`ScriptError::InvalidWorkDir`] if the working directory is
    ///   not a single plain directory name.
    pub fn new(scale: CommitScale, messages: MessagePool, work_dir: impl Into<String>) -> Result<Self> {
        let work_dir = work_dir.into();
        if work_dir.is_empty()
            || work_dir == "."
            || work_dir == ".."
            || work_dir.contains(['/', '\\', '\n', '\r'])
        {
            return Err(ScriptError::InvalidWorkDir(work_dir));
        }

        Ok(Self {
            scale,
            messages,
            work_dir,
        })
    }

    pub fn scale(&self) -> &CommitScale {
        &self.scale
    }

    pub fn messages(&self) -> &MessagePool {
        &self.messages
    }

    pub fn work_dir(&self) -> &str {
        &self.work_dir
    }

    /// Flatten grids into a commit plan using this compiler's scale.
    pub fn plan<'a>(&self, grids: impl IntoIterator<Item = &'a Grid>) -> CommitPlan {
        CommitPlan::from_grids(grids, &self.scale)
    }

    /// Compile grids into a shell script.
    ///
    /// Never fails. The target is already validated, and everything else is
    /// plain string building.
    #[instrument(skip(self, grids, rng), fields(repo = %target.slug()), level = "debug")]
    pub fn compile<'a, R: Rng>(
        &self,
        grids: impl IntoIterator<Item = &'a Grid>,
        target: &Target,
        rng: &mut R,
    ) -> String {
        let plan = self.plan(grids);
        self.compile_plan(&plan, target, rng)
    }

    /// Compile an existing commit plan into a shell script.
    pub fn compile_plan<R: Rng>(&self, plan: &CommitPlan, target: &Target, rng: &mut R) -> String {
        let commits = plan.schedule(&self.messages, rng);
        debug!(
            "scheduled {} commits across {} days",
            commits.len(),
            plan.days().len()
        );

        let script = shell::render(target, &self.work_dir, &commits);
        info!(
            "compiled script for {} with {} commits",
            target.slug(),
            commits.len()
        );

        script
    }
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self {
            scale: CommitScale::default(),
            messages: MessagePool::default(),
            work_dir: DEFAULT_WORK_DIR.into(),
        }
    }
}

/// Script compilation error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// Required target field is blank.
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Target field cannot be used in a GitHub URL.
    #[error("invalid {field} {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Message pool has no usable message.
    #[error("commit message pool is empty")]
    EmptyMessagePool,

    /// Working directory is not a plain directory name.
    #[error("invalid working directory name {0:?}")]
    InvalidWorkDir(String),
}

/// Friendly result alias :3
type Result<T, E = ScriptError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grid::YearKey, store::GridStore};
    use indoc::indoc;
    use rand::{rngs::StdRng, SeedableRng};
    use simple_test_case::test_case;

    fn day(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    fn level(value: u8) -> Intensity {
        Intensity::try_from(value).unwrap()
    }

    fn target() -> Target {
        Target::new("octocat", "pixel-art", "main").unwrap()
    }

    fn commit_lines(script: &str) -> Vec<&str> {
        script
            .lines()
            .filter(|line| line.contains("git commit"))
            .collect()
    }

    fn author_dates(script: &str) -> Vec<&str> {
        script
            .lines()
            .filter_map(|line| line.strip_prefix("GIT_AUTHOR_DATE='"))
            .filter_map(|rest| rest.split('\'').next())
            .collect()
    }

    #[test]
    fn single_painted_cell() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2024))?;
        store.paint_date(day("2024-03-15"), level(2))?;

        let compiler = ScriptCompiler::default();
        let plan = compiler.plan(store.grids().values());
        assert_eq!(
            plan.date_map(),
            BTreeMap::from([(day("2024-03-15"), level(2))])
        );
        assert_eq!(plan.total_commits(), 20);

        let script = compiler.compile(
            store.grids().values(),
            &target(),
            &mut StdRng::seed_from_u64(1),
        );
        let dates = author_dates(&script);
        assert_eq!(dates.len(), 20);
        assert!(dates.iter().all(|date| *date == "2024-03-15T12:00:00 UTC"));

        Ok(())
    }

    #[test]
    fn empty_pattern_only_bootstraps() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Current)?;
        store.select_year(YearKey::Year(2023))?;

        let compiler = ScriptCompiler::default();
        assert!(compiler.plan(store.grids().values()).is_empty());

        let script = compiler.compile(
            store.grids().values(),
            &target(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(commit_lines(&script), vec!["  git commit -m 'Initial commit'"]);

        Ok(())
    }

    #[test]
    fn overlapping_grids_are_deduplicated() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Current)?;
        store.select_year(YearKey::Year(2023))?;
        store.select_year(YearKey::Year(2024))?;
        store.paint_date(day("2023-12-25"), level(1))?;
        store.paint_date(day("2024-01-02"), level(1))?;

        let plan = ScriptCompiler::default().plan(store.grids().values());
        assert_eq!(plan.days().len(), 2);
        assert_eq!(plan.total_commits(), 20);

        Ok(())
    }

    #[test]
    fn commits_are_chronological() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2024))?;
        store.select_year(YearKey::Year(2022))?;
        store.paint_date(day("2024-05-01"), level(1))?;
        store.paint_date(day("2022-11-11"), level(1))?;
        store.paint_date(day("2024-01-01"), level(1))?;

        let script = ScriptCompiler::default().compile(
            store.grids().values(),
            &target(),
            &mut StdRng::seed_from_u64(3),
        );
        let dates = author_dates(&script);
        assert_eq!(dates.len(), 30);
        assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(dates.first(), Some(&"2022-11-11T12:00:00 UTC"));
        assert_eq!(dates.last(), Some(&"2024-05-01T12:00:00 UTC"));

        Ok(())
    }

    #[test]
    fn seeded_compilation_is_deterministic() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Current)?;
        store.paint_date(day("2023-09-01"), level(3))?;
        store.paint_date(day("2024-02-29"), level(4))?;

        let compiler = ScriptCompiler::default();
        let first = compiler.compile(
            store.grids().values(),
            &target(),
            &mut StdRng::seed_from_u64(42),
        );
        let second = compiler.compile(
            store.grids().values(),
            &target(),
            &mut StdRng::seed_from_u64(42),
        );
        let other_seed = compiler.compile(
            store.grids().values(),
            &target(),
            &mut StdRng::seed_from_u64(43),
        );

        assert_eq!(first, second);
        assert_eq!(commit_lines(&first).len(), commit_lines(&other_seed).len());
        assert_eq!(author_dates(&first), author_dates(&other_seed));

        Ok(())
    }

    #[test]
    fn full_script_layout() -> anyhow::Result<()> {
        let mut store = GridStore::new(day("2024-06-01"));
        store.select_year(YearKey::Year(2024))?;
        store.paint_date(day("2024-03-15"), level(2))?;
        store.paint_date(day("2024-03-14"), level(1))?;

        let compiler = ScriptCompiler::new(
            CommitScale::new([0, 1, 2, 3, 4]),
            MessagePool::new(["Update log"])?,
            "arcadia",
        )?;
        let result = compiler.compile(
            store.grids().values(),
            &Target::new("octocat", "pixel-art", "main")?,
            &mut StdRng::seed_from_u64(0),
        );

        let expect = indoc! {r#"
            #!/bin/sh
            set -e

            if git clone 'https://github.com/octocat/pixel-art.git' 'arcadia'; then
              cd 'arcadia'
            else
              mkdir 'arcadia'
              cd 'arcadia'
              git init
              printf '# %s\n' 'pixel-art' > README.md
              git add README.md
              git commit -m 'Initial commit'
            fi

            touch log.txt

            printf '%s\n' 'Update log' >> log.txt
            git add log.txt
            GIT_AUTHOR_DATE='2024-03-14T12:00:00 UTC' GIT_COMMITTER_DATE='2024-03-14T12:00:00 UTC' git commit -q -m 'Update log'

            printf '%s\n' 'Update log' >> log.txt
            git add log.txt
            GIT_AUTHOR_DATE='2024-03-15T12:00:00 UTC' GIT_COMMITTER_DATE='2024-03-15T12:00:00 UTC' git commit -q -m 'Update log'

            printf '%s\n' 'Update log' >> log.txt
            git add log.txt
            GIT_AUTHOR_DATE='2024-03-15T12:00:00 UTC' GIT_COMMITTER_DATE='2024-03-15T12:00:00 UTC' git commit -q -m 'Update log'

            git remote remove origin 2>/dev/null || true
            git remote add origin 'https://github.com/octocat/pixel-art.git'
            git branch -M 'main'
            git push -u origin 'main'

            cd ..
            rm -rf 'arcadia'
        "#};
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn branch_is_quoted() -> anyhow::Result<()> {
        let script = ScriptCompiler::default().compile(
            std::iter::empty::<&Grid>(),
            &Target::new("octocat", "art", "it's; rm -rf ~")?,
            &mut StdRng::seed_from_u64(0),
        );
        assert!(script.contains("git push -u origin 'it'\\''s; rm -rf ~'"));

        Ok(())
    }

    #[test_case("", "repo", "main", ScriptError::MissingField("username"); "blank username")]
    #[test_case("user", "  ", "main", ScriptError::MissingField("repository"); "blank repository")]
    #[test_case("user", "repo", "", ScriptError::MissingField("branch"); "blank branch")]
    #[test_case(
        "user",
        "a/b",
        "main",
        ScriptError::InvalidField { field: "repository", value: "a/b".into() };
        "slash in repository"
    )]
    #[test]
    fn target_validation(username: &str, repository: &str, branch: &str, expect: ScriptError) {
        assert_eq!(Target::new(username, repository, branch), Err(expect));
    }

    #[test_case(""; "empty")]
    #[test_case(".."; "parent")]
    #[test_case("a/b"; "nested")]
    #[test]
    fn work_dir_must_be_plain_name(work_dir: &str) {
        assert_eq!(
            ScriptCompiler::new(CommitScale::default(), MessagePool::default(), work_dir),
            Err(ScriptError::InvalidWorkDir(work_dir.into()))
        );
    }
}
