// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local commit replay.
//!
//! Apply a commit schedule straight to a local repository through libgit2,
//! without going through a generated shell script. Every scheduled commit
//! appends its message to the log file and is committed with author and
//! committer time set to its scheduled timestamp. Pushing the result is left
//! to the user.

use crate::script::{shell::LOG_FILE, ScheduledCommit};

use git2::{
    build::CheckoutBuilder, ErrorCode, FileMode, Repository, RepositoryInitOptions, Signature,
    Time,
};
use indicatif::ProgressBar;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Replays commit schedules into a repository.
pub struct Replayer {
    repository: Repository,
}

impl Replayer {
    /// Open repository at path, or initialize it if there is none.
    ///
    /// A freshly initialized repository starts on `branch`.
    ///
    /// # Errors
    ///
    /// - Return [`ReplayError::CreateDir`] if the directory cannot be made.
    /// - Return [`ReplayError::Git2`] if libgit2 operations fail.
    #[instrument(skip(path), level = "debug")]
    pub fn open_or_init(path: impl AsRef<Path>, branch: &str) -> Result<Self> {
        let path = path.as_ref();
        let repository = match Repository::open(path) {
            Ok(repository) => {
                debug!("open repository at {:?}", path.display());
                repository
            }
            Err(error) if error.code() == ErrorCode::NotFound => {
                info!("initialize new repository at {:?}", path.display());
                mkdirp::mkdirp(path).map_err(|source| ReplayError::CreateDir {
                    source,
                    path: path.display().to_string(),
                })?;
                let mut options = RepositoryInitOptions::new();
                options.initial_head(branch);
                Repository::init_opts(path, &options)?
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Self { repository })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Commit every scheduled commit on top of HEAD.
    ///
    /// Returns the number of commits made. Mutates the repository's history,
    /// and forcefully checks out the new HEAD afterwards.
    ///
    /// # Errors
    ///
    /// - Return [`ReplayError::Git2`] if the repository has no configured
    ///   signature, or any other libgit2 operation fails.
    #[instrument(skip(self, commits, bar), level = "debug")]
    pub fn replay(&self, commits: &[ScheduledCommit<'_>], bar: &ProgressBar) -> Result<usize> {
        let identity = self.repository.signature()?;
        let name = String::from_utf8_lossy(identity.name_bytes()).into_owned();
        let email = String::from_utf8_lossy(identity.email_bytes()).into_owned();

        let mut parent = self
            .repository
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let mut log = match &parent {
            Some(commit) => self.read_log(commit)?,
            None => Vec::new(),
        };

        bar.set_length(commits.len() as u64);
        for scheduled in commits {
            log.extend_from_slice(scheduled.message.as_bytes());
            log.push(b'\n');
            let blob = self.repository.blob(&log)?;

            let base = parent.as_ref().map(|commit| commit.tree()).transpose()?;
            let mut builder = self.repository.treebuilder(base.as_ref())?;
            builder.insert(LOG_FILE, blob, FileMode::Blob.into())?;
            let tree = self.repository.find_tree(builder.write()?)?;

            let time = Time::new(scheduled.timestamp.timestamp(), 0);
            let signature = Signature::new(&name, &email, &time)?;
            let parents = parent.iter().collect::<Vec<_>>();
            let oid = self.repository.commit(
                Some("HEAD"),
                &signature,
                &signature,
                scheduled.message,
                &tree,
                &parents,
            )?;

            parent = Some(self.repository.find_commit(oid)?);
            bar.inc(1);
        }
        bar.finish_and_clear();

        // INVARIANT: Working tree matches the replayed history.
        if !commits.is_empty() {
            self.repository
                .checkout_head(Some(CheckoutBuilder::new().force()))?;
        }
        info!("replayed {} commits", commits.len());

        Ok(commits.len())
    }

    fn read_log(&self, commit: &git2::Commit<'_>) -> Result<Vec<u8>> {
        let tree = commit.tree()?;
        let Some(entry) = tree.get_name(LOG_FILE) else {
            return Ok(Vec::new());
        };
        let blob = entry.to_object(&self.repository)?.peel_to_blob()?;

        Ok(blob.content().to_vec())
    }
}

impl std::fmt::Debug for Replayer {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Replayer")
            .field("path", &self.repository.path())
            .finish()
    }
}

/// Local replay error types.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Repository directory cannot be created.
    #[error("failed to create directory {path}")]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: String,
    },

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
type Result<T, E = ReplayError> = std::result::Result<T, E>;
