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

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::target::APPLICATION_DIR;

/// Environment variable that overrides root discovery.
pub const ROOT_ENV: &str = "CHIPMUNK_ROOT";

/// Directory holding the build CLI's Cargo package. Commands run from here.
pub const CLI_DIR: &str = "cli";

#[derive(Debug, thiserror::Error)]
pub enum RootError {
    #[error("failed to get current directory")]
    CurrentDir(#[source] std::io::Error),
    #[error("failed to access `{}`", path.display())]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{}` is not a Chipmunk checkout: missing `application` directory", .0.display())]
    NotARoot(PathBuf),
    #[error(
        "could not find a Chipmunk checkout in `{}` or its ancestors, pass `--root` or set `CHIPMUNK_ROOT`",
        .0.display()
    )]
    NotFound(PathBuf),
}

/// The root directory of a Chipmunk checkout, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipmunkRoot {
    path: PathBuf,
}

fn canonicalize(path: &Path) -> Result<PathBuf, RootError> {
    dunce::canonicalize(path).map_err(|source| RootError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}

fn looks_like_root(dir: &Path) -> bool {
    dir.join(APPLICATION_DIR).is_dir() && dir.join(CLI_DIR).is_dir()
}

impl ChipmunkRoot {
    /// Uses `explicit` when given, otherwise searches upwards from the current
    /// directory.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, RootError> {
        match explicit {
            Some(dir) => Self::from_dir(dir),
            None => {
                let cwd = std::env::current_dir().map_err(RootError::CurrentDir)?;
                Self::find_from(&cwd)
            }
        }
    }

    /// Accepts `dir` as the root as long as it has an `application` directory.
    pub fn from_dir(dir: &Path) -> Result<Self, RootError> {
        let path = canonicalize(dir)?;
        if !path.join(APPLICATION_DIR).is_dir() {
            return Err(RootError::NotARoot(path));
        }
        debug!("using chipmunk root {}", path.display());
        Ok(Self { path })
    }

    /// Finds the closest ancestor of `start` (itself included) containing
    /// both `application` and `cli`.
    pub fn find_from(start: &Path) -> Result<Self, RootError> {
        let start = canonicalize(start)?;
        match start.ancestors().find(|dir| looks_like_root(dir)) {
            Some(dir) => {
                debug!("discovered chipmunk root {}", dir.display());
                Ok(Self {
                    path: dir.to_path_buf(),
                })
            }
            None => Err(RootError::NotFound(start)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn application_dir(&self) -> PathBuf {
        self.path.join(APPLICATION_DIR)
    }

    pub fn cli_dir(&self) -> PathBuf {
        self.path.join(CLI_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipmunk_itest_util::TestDir;

    #[test]
    fn test_find_from_nested_dir() {
        let dir = TestDir::chipmunk_tree().unwrap();
        let nested = dir.join("cli/integration_tests");
        std::fs::create_dir_all(&nested).unwrap();

        let root = ChipmunkRoot::find_from(&nested).unwrap();
        assert_eq!(root.path(), dunce::canonicalize(&dir).unwrap());
        assert_eq!(root.cli_dir(), root.path().join("cli"));
    }

    #[test]
    fn test_find_from_requires_cli_dir() {
        let dir = TestDir::new_empty().unwrap();
        std::fs::create_dir_all(dir.join("application")).unwrap();

        let err = ChipmunkRoot::find_from(dir.as_ref()).unwrap_err();
        assert!(matches!(err, RootError::NotFound(_)), "{err:?}");
    }

    #[test]
    fn test_from_dir_rejects_non_root() {
        let dir = TestDir::new_empty().unwrap();
        let err = ChipmunkRoot::from_dir(dir.as_ref()).unwrap_err();
        assert!(matches!(err, RootError::NotARoot(_)), "{err:?}");
        assert!(err.to_string().contains("missing `application` directory"));
    }

    #[test]
    fn test_from_dir_missing_path() {
        let dir = TestDir::new_empty().unwrap();
        let err = ChipmunkRoot::from_dir(&dir.join("nope")).unwrap_err();
        assert!(matches!(err, RootError::Canonicalize { .. }), "{err:?}");
    }

    #[test]
    fn test_discover_prefers_explicit() {
        let dir = TestDir::chipmunk_tree().unwrap();
        let root = ChipmunkRoot::discover(Some(dir.as_ref())).unwrap();
        assert_eq!(
            root.application_dir(),
            dunce::canonicalize(dir.join("application")).unwrap()
        );
    }
}
