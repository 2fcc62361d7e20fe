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

/// A temporary directory, optionally laid out like a Chipmunk checkout.
pub struct TestDir {
    // tempfile::TempDir has a drop implementation that will remove the directory
    path: tempfile::TempDir,
}

impl TestDir {
    pub fn new_empty() -> anyhow::Result<Self> {
        let path = tempfile::TempDir::new()?;
        Ok(Self { path })
    }

    /// An empty checkout: just the `application` and `cli` directories.
    pub fn chipmunk_tree() -> anyhow::Result<Self> {
        let dir = Self::new_empty()?;
        dir.mkdir("application")?;
        dir.mkdir("cli")?;
        Ok(dir)
    }

    pub fn join(&self, sub: impl AsRef<Path>) -> PathBuf {
        self.path.path().join(sub.as_ref())
    }

    /// Creates `sub` and all of its parents.
    pub fn mkdir(&self, sub: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let dir = self.join(sub);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Creates an empty file at `sub`, creating its parents as needed.
    pub fn touch(&self, sub: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let file = self.join(sub);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, "")?;
        Ok(file)
    }
}

impl AsRef<Path> for TestDir {
    fn as_ref(&self) -> &Path {
        self.path.path()
    }
}
