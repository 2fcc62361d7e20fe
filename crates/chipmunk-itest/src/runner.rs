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

use std::{
    path::Path,
    process::{Child, ExitStatus},
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::command::Command;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to run `{cmdline}`")]
    Launch {
        cmdline: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for `{cmdline}`")]
    Wait {
        cmdline: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command `{cmdline}` failed: {}", describe_exit(*code))]
    Failed { cmdline: String, code: Option<i32> },
    #[error("command `{cmdline}` timed out after {}s", timeout.as_secs_f64())]
    TimedOut { cmdline: String, timeout: Duration },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl RunError {
    pub fn failed(command: &Command, status: ExitStatus) -> Self {
        RunError::Failed {
            cmdline: command.cmdline(),
            code: status.code(),
        }
    }
}

/// Runs a [`Command`] to completion. Anything other than a zero exit is an
/// error.
pub trait CommandRunner {
    fn run(&self, command: &Command, cwd: &Path) -> Result<(), RunError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &Command, cwd: &Path) -> Result<(), RunError> {
        (**self).run(command, cwd)
    }
}

/// Spawns the command as a child process with inherited stdio and blocks
/// until it exits.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the child once `timeout` has elapsed. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &Command, cwd: &Path) -> Result<(), RunError> {
        let cmdline = command.cmdline();
        println!("+ {cmdline}");
        debug!(cwd = %cwd.display(), "spawning `{cmdline}`");

        // A deadline that overflows `Instant` is as good as no timeout.
        let deadline = self.timeout.and_then(|t| Instant::now().checked_add(t));

        let mut process = std::process::Command::new(command.program());
        process.args(command.args()).current_dir(cwd);
        // `cargo run` does not forward a kill to the build CLI it launched, so a
        // child that may be timed out gets its own group and the whole group is
        // killed.
        #[cfg(unix)]
        if deadline.is_some() {
            use std::os::unix::process::CommandExt;
            process.process_group(0);
        }
        let mut child = process
            .spawn()
            .map_err(|source| RunError::Launch {
                cmdline: cmdline.clone(),
                source,
            })?;

        let status = match (self.timeout, deadline) {
            (Some(timeout), Some(deadline)) => match wait_until(&mut child, deadline) {
                Ok(Some(status)) => Ok(status),
                Ok(None) => {
                    return Err(RunError::TimedOut {
                        cmdline: cmdline.clone(),
                        timeout,
                    });
                }
                Err(e) => Err(e),
            },
            _ => child.wait(),
        }
        .map_err(|source| RunError::Wait {
            cmdline: cmdline.clone(),
            source,
        })?;

        debug!("`{cmdline}` exited with {status}");
        if !status.success() {
            return Err(RunError::failed(command, status));
        }
        Ok(())
    }
}

/// Returns `None` if the child was killed because it was still running at
/// `deadline`.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }

    kill_tree(child);
    child.wait()?;
    Ok(None)
}

#[cfg(unix)]
fn group_is_alive(pgid: i32) -> bool {
    unsafe {
        if libc::kill(-pgid, 0) == 0 {
            return true;
        }
    }
    !matches!(
        std::io::Error::last_os_error().raw_os_error(),
        Some(libc::ESRCH)
    )
}

/// SIGTERM the child's process group, then SIGKILL whatever is left after a
/// short grace period.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    let pgid = child.id() as i32;
    for signal in [libc::SIGTERM, libc::SIGKILL] {
        unsafe {
            let _ = libc::kill(-pgid, signal);
        }
        for _ in 0..5 {
            std::thread::sleep(POLL_INTERVAL);
            // reap the leader so it does not keep the group alive as a zombie
            let _ = child.try_wait();
            if !group_is_alive(pgid) {
                return;
            }
        }
    }
    warn!(
        "process group {pgid} survived SIGKILL, the build CLI may still be running"
    );
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("failed to kill child process {}: {e}", child.id());
    }
    warn!(
        "killed `cargo` (pid {}), the build CLI it launched may still be running",
        child.id()
    );
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use chipmunk_itest_util::TestDir;

    fn sh(script: &str) -> Command {
        Command::new("sh", ["-c", script])
    }

    #[test]
    fn test_success() {
        let dir = TestDir::new_empty().unwrap();
        SystemRunner::new().run(&sh("exit 0"), dir.as_ref()).unwrap();
    }

    #[test]
    fn test_non_zero_exit() {
        let dir = TestDir::new_empty().unwrap();
        let err = SystemRunner::new()
            .run(&sh("exit 3"), dir.as_ref())
            .unwrap_err();
        assert!(
            matches!(err, RunError::Failed { code: Some(3), .. }),
            "{err:?}"
        );
        assert_eq!(
            err.to_string(),
            "command `sh -c exit 3` failed: exit code 3"
        );
    }

    #[test]
    fn test_launch_failure() {
        let dir = TestDir::new_empty().unwrap();
        let cmd = Command::new("chipmunk-itest-no-such-program", ["x"]);
        let err = SystemRunner::new().run(&cmd, dir.as_ref()).unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }), "{err:?}");
    }

    #[test]
    fn test_runs_in_cwd() {
        let dir = TestDir::new_empty().unwrap();
        std::fs::write(dir.join("marker"), "").unwrap();
        SystemRunner::new()
            .run(&sh("test -f marker"), dir.as_ref())
            .unwrap();
    }

    #[test]
    fn test_timeout_kills_child() {
        let dir = TestDir::new_empty().unwrap();
        let runner = SystemRunner::new().with_timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let err = runner.run(&sh("sleep 30"), dir.as_ref()).unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[test]
    fn test_unrepresentable_timeout_waits() {
        let dir = TestDir::new_empty().unwrap();
        let runner = SystemRunner::new().with_timeout(Some(Duration::from_secs(u64::MAX)));
        runner.run(&sh("exit 0"), dir.as_ref()).unwrap();
        let err = runner.run(&sh("exit 4"), dir.as_ref()).unwrap_err();
        assert!(
            matches!(err, RunError::Failed { code: Some(4), .. }),
            "{err:?}"
        );
    }

    #[test]
    fn test_timeout_kills_grandchildren() {
        let dir = TestDir::new_empty().unwrap();
        let runner = SystemRunner::new().with_timeout(Some(Duration::from_millis(200)));
        let err = runner
            .run(&sh("(sleep 1; touch late) & wait"), dir.as_ref())
            .unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }), "{err:?}");

        std::thread::sleep(Duration::from_secs(2));
        assert!(!dir.join("late").exists());
    }

    #[test]
    fn test_timeout_not_reached() {
        let dir = TestDir::new_empty().unwrap();
        let runner = SystemRunner::new().with_timeout(Some(Duration::from_secs(30)));
        runner.run(&sh("exit 0"), dir.as_ref()).unwrap();
    }
}
