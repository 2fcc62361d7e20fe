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

//! Build targets of the Chipmunk checkout and the artifacts a clean must
//! remove for each of them.

use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Directory under the root that holds every cleanable target.
pub const APPLICATION_DIR: &str = "application";

/// The order of the variants is the canonical order in which targets are
/// passed to the build CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Target {
    /// `application/apps/indexer`
    Core,
    /// `application/platform`
    Shared,
    /// `application/apps/rustcore/rs-bindings`
    Binding,
    /// `application/apps/rustcore/ts-bindings`
    Wrapper,
    /// `application/apps/rustcore/wasm-bindings`
    Wasm,
    /// `application/client`
    Client,
    /// `application/apps/precompiled/updater`
    Updater,
    /// `application/holder`
    App,
    /// `cli`, the build CLI itself
    Cli,
}

impl Target {
    pub fn all() -> &'static [Target] {
        &[
            Target::Core,
            Target::Shared,
            Target::Binding,
            Target::Wrapper,
            Target::Wasm,
            Target::Client,
            Target::Updater,
            Target::App,
            Target::Cli,
        ]
    }

    /// Every target except [`Target::Cli`], whose output contains the
    /// running build CLI binary.
    pub fn cleanable() -> &'static [Target] {
        &Self::all()[..Self::all().len() - 1]
    }

    pub fn is_cleanable(self) -> bool {
        self != Target::Cli
    }

    /// Name accepted by the build CLI on its command line.
    pub fn arg_name(self) -> &'static str {
        match self {
            Target::Core => "core",
            Target::Shared => "shared",
            Target::Binding => "binding",
            Target::Wrapper => "wrapper",
            Target::Wasm => "wasm",
            Target::Client => "client",
            Target::Updater => "updater",
            Target::App => "app",
            Target::Cli => "cli",
        }
    }

    /// Directory of the target relative to the Chipmunk root.
    pub fn relative_dir(self) -> PathBuf {
        let parts: &[&str] = match self {
            Target::Core => &[APPLICATION_DIR, "apps", "indexer"],
            Target::Shared => &[APPLICATION_DIR, "platform"],
            Target::Binding => &[APPLICATION_DIR, "apps", "rustcore", "rs-bindings"],
            Target::Wrapper => &[APPLICATION_DIR, "apps", "rustcore", "ts-bindings"],
            Target::Wasm => &[APPLICATION_DIR, "apps", "rustcore", "wasm-bindings"],
            Target::Client => &[APPLICATION_DIR, "client"],
            Target::Updater => &[APPLICATION_DIR, "apps", "precompiled", "updater"],
            Target::App => &[APPLICATION_DIR, "holder"],
            Target::Cli => &["cli"],
        };
        parts.iter().collect()
    }

    /// Entries of [`PATHS_TO_CHECK`] owned by this target.
    pub fn artifacts(self) -> impl Iterator<Item = &'static PathEntry> {
        PATHS_TO_CHECK.iter().filter(move |e| e.target == self)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arg_name())
    }
}

/// A generated file or directory that must not exist after its target has
/// been cleaned. The path is relative to [`APPLICATION_DIR`] and always uses
/// `/` as separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEntry {
    pub target: Target,
    pub relative: &'static str,
}

impl PathEntry {
    pub const fn new(target: Target, relative: &'static str) -> Self {
        Self { target, relative }
    }

    pub fn resolve(&self, application_dir: &Path) -> PathBuf {
        let mut path = application_dir.to_path_buf();
        path.extend(self.relative.split('/'));
        path
    }
}

pub const PATHS_TO_CHECK: &[PathEntry] = &[
    // Core
    PathEntry::new(Target::Core, "apps/indexer/target"),
    // Shared
    PathEntry::new(Target::Shared, "platform/dist"),
    PathEntry::new(Target::Shared, "platform/node_modules"),
    // Binding
    PathEntry::new(Target::Binding, "apps/rustcore/rs-bindings/dist"),
    PathEntry::new(Target::Binding, "apps/rustcore/rs-bindings/target"),
    // Wrapper
    PathEntry::new(Target::Wrapper, "apps/rustcore/ts-bindings/dist"),
    PathEntry::new(Target::Wrapper, "apps/rustcore/ts-bindings/node_modules"),
    PathEntry::new(Target::Wrapper, "apps/rustcore/ts-bindings/spec/build"),
    PathEntry::new(Target::Wrapper, "apps/rustcore/ts-bindings/src/native/index.node"),
    // Wasm
    PathEntry::new(Target::Wasm, "apps/rustcore/wasm-bindings/pkg"),
    PathEntry::new(Target::Wasm, "apps/rustcore/wasm-bindings/node_modules"),
    PathEntry::new(Target::Wasm, "apps/rustcore/wasm-bindings/test_output"),
    // Client
    PathEntry::new(Target::Client, "client/dist"),
    PathEntry::new(Target::Client, "client/node_modules"),
    // Updater
    PathEntry::new(Target::Updater, "apps/precompiled/updater/target"),
    // App
    PathEntry::new(Target::App, "holder/dist"),
    PathEntry::new(Target::App, "holder/node_modules"),
];
