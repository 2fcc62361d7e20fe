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

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use chipmunk_itest::{
    ChipmunkRoot, CleanVerifier, PrintDotVerifier, ReportMode, SystemRunner, Target,
};

#[derive(Debug, clap::Parser)]
#[clap(
    name = "chipmunk-itest",
    about = "Integration checks for the Chipmunk build CLI."
)]
pub struct ItestCli {
    /// Defaults to `all`
    #[clap(subcommand)]
    pub subcommand: Option<ItestSubcommands>,

    #[clap(flatten)]
    pub flags: GlobalFlags,
}

#[derive(Debug, clap::Parser)]
pub enum ItestSubcommands {
    /// Clean build targets and check that their artifacts are gone
    Clean(CleanSubcommand),
    /// Check that `print-dot` and `print-dot -a` succeed
    PrintDot(PrintDotSubcommand),
    /// Run every check, stopping at the first failure
    All(AllSubcommand),
}

#[derive(Debug, Clone, clap::Parser)]
pub struct GlobalFlags {
    /// Root of the Chipmunk checkout. Searched upwards from the current
    /// directory when omitted.
    #[clap(long, global = true, env = "CHIPMUNK_ROOT")]
    pub root: Option<PathBuf>,

    /// Kill a build CLI invocation after this many seconds
    #[clap(long, global = true, env = "CHIPMUNK_ITEST_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Increase verbosity
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, clap::Parser)]
pub struct CleanSubcommand {
    /// Targets to clean, all except `cli` by default
    #[clap(long = "target", short = 't', value_enum, value_delimiter = ',')]
    pub targets: Vec<Target>,

    /// Report every leftover path instead of stopping at the first one
    #[clap(long)]
    pub report_all: bool,
}

#[derive(Debug, Clone, Default, clap::Parser)]
pub struct PrintDotSubcommand {}

#[derive(Debug, Clone, Default, clap::Parser)]
pub struct AllSubcommand {}

fn setup(flags: &GlobalFlags) -> anyhow::Result<(ChipmunkRoot, SystemRunner)> {
    let root = ChipmunkRoot::discover(flags.root.as_deref())
        .context("failed to locate the Chipmunk root")?;
    let runner = SystemRunner::new().with_timeout(flags.timeout.map(Duration::from_secs));
    Ok((root, runner))
}

fn clean_verifier(root: ChipmunkRoot, cmd: &CleanSubcommand) -> CleanVerifier {
    let report = if cmd.report_all {
        ReportMode::All
    } else {
        ReportMode::FailFast
    };
    CleanVerifier::new(root)
        .with_targets(cmd.targets.iter().copied())
        .with_report(report)
}

pub fn run_clean(flags: &GlobalFlags, cmd: &CleanSubcommand) -> anyhow::Result<()> {
    let (root, runner) = setup(flags)?;
    clean_verifier(root, cmd).run(&runner)?;
    Ok(())
}

pub fn run_print_dot(flags: &GlobalFlags, _cmd: &PrintDotSubcommand) -> anyhow::Result<()> {
    let (root, runner) = setup(flags)?;
    PrintDotVerifier::new(root).run(&runner)?;
    Ok(())
}

pub fn run_all(flags: &GlobalFlags, _cmd: &AllSubcommand) -> anyhow::Result<()> {
    let (root, runner) = setup(flags)?;
    clean_verifier(root.clone(), &CleanSubcommand::default()).run(&runner)?;
    PrintDotVerifier::new(root).run(&runner)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_no_subcommand() {
        let cli = ItestCli::try_parse_from(["chipmunk-itest"]).unwrap();
        assert!(cli.subcommand.is_none());
        assert!(!cli.flags.verbose);
    }

    #[test]
    fn test_clean_targets() {
        let cli = ItestCli::try_parse_from([
            "chipmunk-itest",
            "clean",
            "-t",
            "core,client",
            "--target",
            "app",
        ])
        .unwrap();
        match cli.subcommand {
            Some(ItestSubcommands::Clean(c)) => {
                assert_eq!(c.targets, [Target::Core, Target::Client, Target::App]);
                assert!(!c.report_all);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_target() {
        assert!(ItestCli::try_parse_from(["chipmunk-itest", "clean", "-t", "nope"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = ItestCli::try_parse_from([
            "chipmunk-itest",
            "print-dot",
            "--root",
            "/tmp/chipmunk",
            "--timeout",
            "90",
        ])
        .unwrap();
        assert!(matches!(cli.subcommand, Some(ItestSubcommands::PrintDot(_))));
        assert_eq!(cli.flags.root, Some(PathBuf::from("/tmp/chipmunk")));
        assert_eq!(cli.flags.timeout, Some(90));
    }

    #[test]
    fn test_report_all_selects_mode() {
        let dir = chipmunk_itest_util::TestDir::chipmunk_tree().unwrap();
        dir.mkdir("application/client/dist").unwrap();
        dir.mkdir("application/holder/dist").unwrap();
        let root = ChipmunkRoot::from_dir(dir.as_ref()).unwrap();
        let cmd = CleanSubcommand {
            targets: vec![],
            report_all: true,
        };
        match clean_verifier(root, &cmd).check() {
            Err(chipmunk_itest::CleanError::Residual(r)) => assert_eq!(r.0.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
