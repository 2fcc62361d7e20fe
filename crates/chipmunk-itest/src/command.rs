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

//! Subprocess invocations of the Chipmunk build CLI.

use std::fmt;

/// Every invocation goes through `cargo run` in release mode so the build CLI
/// is rebuilt from the checkout under test.
pub const CHIPMUNK_PREFIX: &[&str] = &["cargo", "run", "-r", "--", "chipmunk"];

// Targets are listed explicitly so that the build CLI's own binaries are left
// alone. On Windows the tool cannot remove the executable it is running from.
pub const CLEAN_COMMAND: &[&str] = &[
    "cargo", "run", "-r", "--", "chipmunk", "clean", "core", "shared", "binding", "wrapper",
    "wasm", "client", "updater", "app",
];

pub const PRINT_DOT_COMMAND: &[&str] = &["cargo", "run", "-r", "--", "chipmunk", "print-dot"];

pub const PRINT_DOT_ALL_COMMAND: &[&str] =
    &["cargo", "run", "-r", "--", "chipmunk", "print-dot", "-a"];

/// A program together with its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a command from a token table where the first token is the
    /// program. An empty table yields a command with an empty program name,
    /// which fails to launch.
    pub fn from_tokens(tokens: &[&str]) -> Self {
        match tokens.split_first() {
            Some((program, args)) => Self::new(*program, args.iter().copied()),
            None => Self::new("", std::iter::empty::<String>()),
        }
    }

    /// `cargo run -r -- chipmunk <args>...`
    pub fn chipmunk<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cmd = Self::from_tokens(CHIPMUNK_PREFIX);
        cmd.args.extend(args.into_iter().map(Into::into));
        cmd
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn cmdline(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cmdline())
    }
}
