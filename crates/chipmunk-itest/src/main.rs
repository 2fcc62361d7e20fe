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

use std::io::IsTerminal;

use clap::Parser;
use colored::Colorize;

mod cli;

use cli::ItestSubcommands;

/// `RUST_LOG` filters log output on stderr. `--verbose` lowers the default
/// level from `WARN` to `DEBUG`.
fn init_tracing(verbose: bool) {
    let log_env_set = std::env::var("RUST_LOG").is_ok();
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_line_number(log_env_set)
        .with_level(true)
        .with_writer(std::io::stderr);
    let res = if log_env_set {
        builder.compact().try_init()
    } else {
        builder.with_target(false).without_time().try_init()
    };
    if let Err(e) = res {
        eprintln!("Warning: Failed to set global tracing subscriber: {e}");
    }
}

fn main() {
    let cli = cli::ItestCli::parse();
    init_tracing(cli.flags.verbose);

    use ItestSubcommands::*;
    let res = match &cli.subcommand {
        Some(Clean(c)) => cli::run_clean(&cli.flags, c),
        Some(PrintDot(p)) => cli::run_print_dot(&cli.flags, p),
        Some(All(a)) => cli::run_all(&cli.flags, a),
        None => cli::run_all(&cli.flags, &Default::default()),
    };

    match res {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}: {:?}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}
