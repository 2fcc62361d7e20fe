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

//! Checks that both `chipmunk print-dot` variants exit successfully.

use crate::{
    command::{Command, PRINT_DOT_ALL_COMMAND, PRINT_DOT_COMMAND},
    render,
    root::ChipmunkRoot,
    runner::{CommandRunner, RunError},
};

#[derive(Debug, thiserror::Error)]
#[error("{label} print-dot command failed")]
pub struct PrintDotError {
    pub label: &'static str,
    #[source]
    pub source: RunError,
}

pub struct PrintDotVerifier {
    root: ChipmunkRoot,
}

impl PrintDotVerifier {
    pub fn new(root: ChipmunkRoot) -> Self {
        Self { root }
    }

    /// The invocations in the order they run, each with its label.
    pub fn invocations() -> [(&'static str, Command); 2] {
        [
            ("General", Command::from_tokens(PRINT_DOT_COMMAND)),
            ("All", Command::from_tokens(PRINT_DOT_ALL_COMMAND)),
        ]
    }

    pub fn run(&self, runner: &impl CommandRunner) -> Result<(), PrintDotError> {
        let cwd = self.root.cli_dir();
        for (label, command) in Self::invocations() {
            render::running(&format!("Running {label} Print Dot command..."));
            runner
                .run(&command, &cwd)
                .map_err(|source| PrintDotError { label, source })?;
            render::succeeded(&format!("*** {label} Print Dot command Succeeded ***"));
        }
        Ok(())
    }
}
