// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! POSIX shell emission.
//!
//! The emitted script is a flat, fully unrolled list of commands. It has no
//! loops, and its only conditional decides between cloning the target
//! repository and bootstrapping a fresh one. Every interpolated value is
//! single-quoted.

use crate::script::{ScheduledCommit, Target};

/// Timestamp layout handed to `GIT_AUTHOR_DATE` and `GIT_COMMITTER_DATE`.
pub const GIT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S UTC";

/// File appended to by every synthetic commit.
pub const LOG_FILE: &str = "log.txt";

/// Quote text as a single POSIX shell word.
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// Render the replay script for a schedule of commits.
pub(crate) fn render(target: &Target, work_dir: &str, commits: &[ScheduledCommit<'_>]) -> String {
    let url = quote(&target.remote_url());
    let dir = quote(work_dir);
    let branch = quote(target.branch());
    let mut lines = vec![
        "#!/bin/sh".to_owned(),
        "set -e".to_owned(),
        String::new(),
        format!("if git clone {url} {dir}; then"),
        format!("  cd {dir}"),
        "else".to_owned(),
        format!("  mkdir {dir}"),
        format!("  cd {dir}"),
        "  git init".to_owned(),
        format!("  printf '# %s\\n' {} > README.md", quote(target.repository())),
        "  git add README.md".to_owned(),
        "  git commit -m 'Initial commit'".to_owned(),
        "fi".to_owned(),
        String::new(),
        format!("touch {LOG_FILE}"),
    ];

    for commit in commits {
        let date = quote(&commit.timestamp.format(GIT_DATE_FORMAT).to_string());
        let message = quote(commit.message);
        lines.push(String::new());
        lines.push(format!("printf '%s\\n' {message} >> {LOG_FILE}"));
        lines.push(format!("git add {LOG_FILE}"));
        lines.push(format!(
            "GIT_AUTHOR_DATE={date} GIT_COMMITTER_DATE={date} git commit -q -m {message}"
        ));
    }

    lines.extend([
        String::new(),
        "git remote remove origin 2>/dev/null || true".to_owned(),
        format!("git remote add origin {url}"),
        format!("git branch -M {branch}"),
        format!("git push -u origin {branch}"),
        String::new(),
        "cd ..".to_owned(),
        format!("rm -rf {dir}"),
    ]);

    // INVARIANT: Script always ends with a newline.
    let mut script = lines.join("\n");
    script.push('\n');
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("plain", "'plain'"; "plain word")]
    #[test_case("with space", "'with space'"; "space")]
    #[test_case("it's", "'it'\\''s'"; "embedded quote")]
    #[test_case("$(rm -rf /)", "'$(rm -rf /)'"; "command substitution")]
    #[test_case("", "''"; "empty")]
    #[test]
    fn quote_shell_words(input: &str, expect: &str) {
        assert_eq!(quote(input), expect);
    }
}
