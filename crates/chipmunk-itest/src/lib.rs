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

//! Integration checks for the Chipmunk build CLI.
//!
//! Each check drives `cargo run -r -- chipmunk <subcommand>` through a
//! [`CommandRunner`] and then inspects what the command left behind.

pub mod clean;
pub mod command;
pub mod print_dot;
pub mod render;
pub mod root;
pub mod runner;
pub mod target;

pub use clean::{CleanError, CleanVerifier, ReportMode};
pub use command::Command;
pub use print_dot::{PrintDotError, PrintDotVerifier};
pub use root::{ChipmunkRoot, RootError};
pub use runner::{CommandRunner, RunError, SystemRunner};
pub use target::{PathEntry, Target};
