// chipmunk-itest: Integration checks for the Chipmunk build CLI.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

//! Checks that `chipmunk clean` removes the generated build artifacts.

use std::{fmt, path::PathBuf};

use tracing::{debug, info};

use crate::{
    command::Command,
    render,
    root::ChipmunkRoot,
    runner::{CommandRunner, RunError},
    target::{PATHS_TO_CHECK, PathEntry, Target},
};

/// How many leftover paths to collect before failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Stop at the first path that still exists.
    #[default]
    FailFast,
    /// Check every path and report all of them.
    All,
}

/// A path that still exists after the clean command succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualPath {
    pub entry: PathEntry,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualPaths(pub Vec<ResidualPath>);

impl ResidualPaths {
    pub fn paths(&self) -> impl Iterator<Item = &ResidualPath> {
        self.0.iter()
    }
}

impl fmt::Display for ResidualPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(
                f,
                "path exists after clean: {} ({})",
                single.entry.relative,
                single.path.display()
            ),
            many => {
                write!(f, "{} paths exist after clean:", many.len())?;
                for residual in many {
                    write!(
                        f,
                        "\n  {} ({})",
                        residual.entry.relative,
                        residual.path.display()
                    )?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("refusing to clean `cli`: the build CLI cannot remove its own binary")]
    SelfTarget,
    #[error("clean command failed")]
    Run(#[from] RunError),
    #[error("{0}")]
    Residual(ResidualPaths),
    #[error("cannot tell whether `{}` was removed", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct CleanVerifier {
    root: ChipmunkRoot,
    targets: Vec<Target>,
    report: ReportMode,
}

impl CleanVerifier {
    /// Verifies a clean of every cleanable target.
    pub fn new(root: ChipmunkRoot) -> Self {
        Self {
            root,
            targets: Target::cleanable().to_vec(),
            report: ReportMode::default(),
        }
    }

    /// Restricts the clean to `targets`. An empty selection keeps every
    /// cleanable target.
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = Target>) -> Self {
        let mut targets: Vec<_> = targets.into_iter().collect();
        if targets.is_empty() {
            targets = Target::cleanable().to_vec();
        }
        targets.sort();
        targets.dedup();
        self.targets = targets;
        self
    }

    pub fn with_report(mut self, report: ReportMode) -> Self {
        self.report = report;
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// `cargo run -r -- chipmunk clean <targets>...`
    pub fn command(&self) -> Result<Command, CleanError> {
        if self.targets.iter().any(|t| !t.is_cleanable()) {
            return Err(CleanError::SelfTarget);
        }
        Ok(Command::chipmunk(
            std::iter::once("clean").chain(self.targets.iter().map(|t| t.arg_name())),
        ))
    }

    /// The artifacts of the selected targets resolved against the root, in
    /// fixture order.
    pub fn removed_paths(&self) -> Vec<(PathEntry, PathBuf)> {
        let application_dir = self.root.application_dir();
        PATHS_TO_CHECK
            .iter()
            .filter(|e| self.targets.contains(&e.target))
            .map(|e| (*e, e.resolve(&application_dir)))
            .collect()
    }

    /// Checks the filesystem without running anything. Only `NotFound`
    /// counts as removed; any other error fails the check.
    pub fn check(&self) -> Result<(), CleanError> {
        let mut residual = Vec::new();
        for (entry, path) in self.removed_paths() {
            // symlink_metadata so a dangling link still counts as leftover
            match path.symlink_metadata() {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(CleanError::Inspect { path, source }),
            }
            debug!("{} still exists", path.display());
            residual.push(ResidualPath { entry, path });
            if self.report == ReportMode::FailFast {
                break;
            }
        }
        if residual.is_empty() {
            Ok(())
        } else {
            Err(CleanError::Residual(ResidualPaths(residual)))
        }
    }

    pub fn run(&self, runner: &impl CommandRunner) -> Result<(), CleanError> {
        let command = self.command()?;
        render::running("Running clean command...");
        runner.run(&command, &self.root.cli_dir())?;

        info!(
            "checking {} paths under {}",
            self.removed_paths().len(),
            self.root.application_dir().display()
        );
        self.check()?;

        render::succeeded("*** Check for Clean Command Succeeded ***");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CLEAN_COMMAND;
    use chipmunk_itest_util::TestDir;

    fn verifier(dir: &TestDir) -> CleanVerifier {
        CleanVerifier::new(ChipmunkRoot::from_dir(dir.as_ref()).unwrap())
    }

    fn residual(res: Result<(), CleanError>) -> ResidualPaths {
        match res {
            Err(CleanError::Residual(r)) => r,
            other => panic!("expected leftover paths, got {other:?}"),
        }
    }

    #[test]
    fn test_default_command_is_clean_command() {
        let dir = TestDir::chipmunk_tree().unwrap();
        assert_eq!(
            verifier(&dir).command().unwrap(),
            Command::from_tokens(CLEAN_COMMAND)
        );
    }

    #[test]
    fn test_subset_command_uses_canonical_order() {
        let dir = TestDir::chipmunk_tree().unwrap();
        let v = verifier(&dir).with_targets([Target::Client, Target::Core, Target::Client]);
        assert_eq!(
            v.command().unwrap().cmdline(),
            "cargo run -r -- chipmunk clean core client"
        );
    }

    #[test]
    fn test_empty_selection_means_all() {
        let dir = TestDir::chipmunk_tree().unwrap();
        let v = verifier(&dir).with_targets(Vec::new());
        assert_eq!(v.targets(), Target::cleanable());
        assert_eq!(v.removed_paths().len(), PATHS_TO_CHECK.len());
    }

    #[test]
    fn test_cli_target_rejected() {
        let dir = TestDir::chipmunk_tree().unwrap();
        let v = verifier(&dir).with_targets([Target::Cli, Target::Core]);
        assert!(matches!(v.command(), Err(CleanError::SelfTarget)));
    }

    #[test]
    fn test_removed_paths_follow_targets() {
        let dir = TestDir::chipmunk_tree().unwrap();
        let v = verifier(&dir).with_targets([Target::Client]);
        let relative: Vec<_> = v.removed_paths().iter().map(|(e, _)| e.relative).collect();
        assert_eq!(relative, ["client/dist", "client/node_modules"]);
    }

    #[test]
    fn test_check_fail_fast_reports_first() {
        let dir = TestDir::chipmunk_tree().unwrap();
        dir.mkdir("application/client/dist").unwrap();
        dir.mkdir("application/holder/dist").unwrap();

        let err = residual(verifier(&dir).check());
        assert_eq!(err.0.len(), 1);
        assert_eq!(err.0[0].entry.relative, "client/dist");
        assert!(err.to_string().contains("client/dist"));
    }

    #[test]
    fn test_check_report_all() {
        let dir = TestDir::chipmunk_tree().unwrap();
        dir.mkdir("application/client/dist").unwrap();
        dir.touch("application/apps/rustcore/ts-bindings/src/native/index.node")
            .unwrap();

        let err = residual(verifier(&dir).with_report(ReportMode::All).check());
        let relative: Vec<_> = err.paths().map(|r| r.entry.relative).collect();
        assert_eq!(
            relative,
            [
                "apps/rustcore/ts-bindings/src/native/index.node",
                "client/dist"
            ]
        );
        assert!(err.to_string().starts_with("2 paths exist after clean:"));
    }

    #[test]
    fn test_check_ignores_unselected_targets() {
        let dir = TestDir::chipmunk_tree().unwrap();
        dir.mkdir("application/holder/node_modules").unwrap();
        verifier(&dir).with_targets([Target::Core]).check().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_check_counts_dangling_symlink() {
        let dir = TestDir::chipmunk_tree().unwrap();
        dir.mkdir("application/platform").unwrap();
        std::os::unix::fs::symlink(
            dir.join("missing"),
            dir.join("application/platform/node_modules"),
        )
        .unwrap();
        let err = residual(verifier(&dir).check());
        assert_eq!(err.0[0].entry.relative, "platform/node_modules");
    }

    #[cfg(unix)]
    #[test]
    fn test_check_unreadable_parent_is_not_removed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TestDir::chipmunk_tree().unwrap();
        let client = dir.mkdir("application/client").unwrap();
        dir.mkdir("application/client/dist").unwrap();
        std::fs::set_permissions(&client, std::fs::Permissions::from_mode(0o000)).unwrap();

        let res = verifier(&dir).with_targets([Target::Client]).check();
        std::fs::set_permissions(&client, std::fs::Permissions::from_mode(0o755)).unwrap();

        // root ignores the mode bits and sees the leftover directory
        match res {
            Err(CleanError::Inspect { path, .. }) => assert!(path.ends_with("client/dist")),
            Err(CleanError::Residual(r)) => assert_eq!(r.0[0].entry.relative, "client/dist"),
            other => panic!("unreadable leftover passed the check: {other:?}"),
        }
    }
}
