// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pre-flight remote check.
//!
//! Before a script is handed out, make sure its target repository can be
//! reached at all. A script pointed at a repository that does not exist would
//! only fail at its very last step, after every synthetic commit was made.
//!
//! The check connects to the remote over the git protocol and lists its
//! references, the same thing `git ls-remote` does. Nothing is fetched. If the
//! remote wants credentials, the user is prompted for them.

use crate::script::Target;

use auth_git2::{GitAuthenticator, Prompter};
use git2::{Config, Direction, Remote, RemoteCallbacks};
use indicatif::ProgressBar;
use inquire::{Password, Text};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Check that target repository exists and can be reached.
///
/// Returns the number of references the remote advertises.
///
/// # Errors
///
/// - Return [`RemoteError::NotFound`] if the remote cannot be reached.
#[instrument(skip(target, bar), fields(repo = %target.slug()), level = "debug")]
pub fn check(target: &Target, bar: &ProgressBar) -> Result<usize> {
    bar.set_message(format!("checking {}", target.slug()));
    let heads = list_heads(&target.remote_url(), bar).map_err(|source| RemoteError::NotFound {
        username: target.username().into(),
        repository: target.repository().into(),
        source,
    })?;
    info!("{} is reachable", target.slug());

    Ok(heads)
}

/// Check target repository on a blocking task.
///
/// # Errors
///
/// - Return [`RemoteError::NotFound`] if the remote cannot be reached.
/// - Return [`RemoteError::Join`] if the blocking task panics.
pub async fn check_in_background(target: Target, bar: ProgressBar) -> Result<usize> {
    tokio::task::spawn_blocking(move || check(&target, &bar)).await?
}

/// List references advertised at a remote URL.
///
/// # Errors
///
/// - Return [`git2::Error`] if connecting to or listing the remote fails.
pub fn list_heads(url: &str, bar: &ProgressBar) -> Result<usize, git2::Error> {
    let prompter = InquirePrompter::new(bar.clone());
    let authenticator = GitAuthenticator::default().set_prompter(prompter);
    let config = Config::open_default()?;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(authenticator.credentials(&config));

    let mut remote = Remote::create_detached(url)?;
    let connection = remote.connect_auth(Direction::Fetch, Some(callbacks), None)?;
    let heads = connection.list()?.len();
    debug!("{url} advertises {heads} references");

    Ok(heads)
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct InquirePrompter {
    bar: ProgressBar,
}

impl InquirePrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for InquirePrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Remote check error types.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Target repository does not exist or cannot be reached.
    #[error("repository {username}/{repository} not found or not reachable")]
    NotFound {
        username: String,
        repository: String,
        #[source]
        source: git2::Error,
    },

    /// Blocking task failed to complete.
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Friendly result alias :3
type Result<T, E = RemoteError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use sealed_test::prelude::*;

    #[sealed_test]
    fn list_heads_of_local_repository() -> anyhow::Result<()> {
        let repo = Repository::init("remote")?;
        let signature = Signature::now("Arcadia Test", "test@example.com")?;
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])?;

        let url = std::env::current_dir()?.join("remote");
        let heads = list_heads(&url.to_string_lossy(), &ProgressBar::hidden())?;
        assert!(heads >= 1);

        Ok(())
    }

    #[sealed_test]
    fn list_heads_of_missing_repository() -> anyhow::Result<()> {
        let url = std::env::current_dir()?.join("does-not-exist");
        assert!(list_heads(&url.to_string_lossy(), &ProgressBar::hidden()).is_err());

        Ok(())
    }

    #[test]
    fn not_found_names_repository() -> anyhow::Result<()> {
        let error = RemoteError::NotFound {
            username: "octocat".into(),
            repository: "pixel-art".into(),
            source: git2::Error::from_str("boom"),
        };
        assert!(error.to_string().contains("octocat/pixel-art"));

        Ok(())
    }
}
