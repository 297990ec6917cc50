// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that Arcadia uses to simplify
//! the process of serialization and deserialization. Every section and every
//! field is optional, so an empty file is a valid configuration.
//!
//! # General Layout
//!
//! The configuration is composed of three sections. The target section holds
//! the default GitHub destination of generated scripts. The script section
//! tunes script compilation: the scratch working directory name, how many
//! commits each intensity level is worth, and the commit message pool. The
//! output section says where generated scripts are written to.

use crate::script::{CommitScale, MessagePool, ScriptCompiler, ScriptError, DEFAULT_WORK_DIR};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Arcadia configuration layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Default generation target.
    pub target: TargetSettings,

    /// Script compilation settings.
    pub script: ScriptSettings,

    /// Output settings.
    pub output: OutputSettings,
}

impl Config {
    /// Load configuration file.
    ///
    /// A missing file is treated as an empty configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file exists but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if the file is not valid.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(data) => {
                debug!("load configuration from {:?}", path.display());
                data.parse()
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no configuration at {:?}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Read {
                source: err,
                path: path.to_path_buf(),
            }),
        }
    }

    /// Build script compiler from script settings.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Script`] if the message pool is empty or the
    ///   working directory name is not usable.
    pub fn compiler(&self) -> Result<ScriptCompiler> {
        let messages = match &self.script.messages {
            Some(messages) => MessagePool::new(messages)?,
            None => MessagePool::default(),
        };

        Ok(ScriptCompiler::new(
            self.script.commit_counts,
            messages,
            self.script.work_dir.as_str(),
        )?)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on output directory field.
        if let Some(directory) = config.output.directory.take() {
            config.output.directory = Some(OutputDirectory::new(
                shellexpand::full(directory.to_string().as_str())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Default generation target.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetSettings {
    /// GitHub username owning the target repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Target repository name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Branch to push to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Script compilation settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Scratch directory the script clones into.
    pub work_dir: String,

    /// Commits per intensity level, from zero to four.
    pub commit_counts: CommitScale,

    /// Commit message pool, the built-in pool if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            work_dir: DEFAULT_WORK_DIR.into(),
            commit_counts: CommitScale::default(),
            messages: None,
        }
    }
}

/// Output settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory generated scripts are written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<OutputDirectory>,
}

/// Directory generated scripts are written to.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct OutputDirectory(PathBuf);

impl OutputDirectory {
    /// Construct new output directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Treat output directory as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }
}

impl Display for OutputDirectory {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Script settings cannot be used.
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Intensity;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("ARCADIA_OUT", "/home/blah/out")])]
    fn deserialize_config() -> anyhow::Result<()> {
        let result: Config = r#"
            [target]
            username = "octocat"
            repository = "pixel-art"
            branch = "main"

            [script]
            work_dir = "scratch"
            commit_counts = [0, 1, 2, 3, 4]
            messages = ["Fix typo", "Update docs"]

            [output]
            directory = "$ARCADIA_OUT/scripts"
        "#
        .parse()?;

        let expect = Config {
            target: TargetSettings {
                username: Some("octocat".into()),
                repository: Some("pixel-art".into()),
                branch: Some("main".into()),
            },
            script: ScriptSettings {
                work_dir: "scratch".into(),
                commit_counts: CommitScale::new([0, 1, 2, 3, 4]),
                messages: Some(vec!["Fix typo".into(), "Update docs".into()]),
            },
            output: OutputSettings {
                directory: Some(OutputDirectory::new("/home/blah/out/scripts")),
            },
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn empty_config_uses_defaults() -> anyhow::Result<()> {
        let result: Config = "".parse()?;
        assert_eq!(result, Config::default());

        let compiler = result.compiler()?;
        assert_eq!(compiler.work_dir(), "arcadia");
        assert_eq!(compiler.scale().commits(Intensity::MAX), 40);
        assert_eq!(compiler.messages(), &MessagePool::default());

        Ok(())
    }

    #[test]
    fn reject_short_commit_table() {
        let result = r#"
            [script]
            commit_counts = [0, 1, 2]
        "#
        .parse::<Config>();

        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn reject_empty_message_pool() -> anyhow::Result<()> {
        let config: Config = r#"
            [script]
            messages = []
        "#
        .parse()?;

        assert!(matches!(
            config.compiler(),
            Err(ConfigError::Script(ScriptError::EmptyMessagePool))
        ));

        Ok(())
    }

    #[test]
    fn serialize_config() {
        let result = Config {
            target: TargetSettings {
                username: Some("octocat".into()),
                repository: Some("pixel-art".into()),
                branch: Some("main".into()),
            },
            script: ScriptSettings {
                work_dir: "arcadia".into(),
                commit_counts: CommitScale::default(),
                messages: Some(vec!["Fix typo".into(), "Update docs".into()]),
            },
            output: OutputSettings {
                directory: Some(OutputDirectory::new("/home/blah/scripts")),
            },
        }
        .to_string();

        let expect = indoc! {r#"
            [target]
            username = "octocat"
            repository = "pixel-art"
            branch = "main"

            [script]
            work_dir = "arcadia"
            commit_counts = [
                0,
                10,
                20,
                30,
                40,
            ]
            messages = [
                "Fix typo",
                "Update docs",
            ]

            [output]
            directory = "/home/blah/scripts"
        "#};

        assert_eq!(result, expect);
    }

    #[sealed_test]
    fn load_missing_file_is_default() -> anyhow::Result<()> {
        let result = Config::load("does-not-exist.toml")?;
        assert_eq!(result, Config::default());

        Ok(())
    }

    #[sealed_test]
    fn load_file_from_disk() -> anyhow::Result<()> {
        std::fs::write("config.toml", "[target]\nusername = \"octocat\"\n")?;
        let result = Config::load("config.toml")?;
        assert_eq!(result.target.username.as_deref(), Some("octocat"));

        Ok(())
    }
}
