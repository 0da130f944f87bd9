use crate::command::{Executor, ExitCode, ScriptCommand};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::signals;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tracing::{debug, info};

/// Replaces the current process image with the shell.
///
/// The tool's exit status is the shell's own, and signals reach the script
/// directly because there is no parent left to receive them.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaceProcess;

#[cfg(unix)]
impl Executor for ReplaceProcess {
    fn execute(&self, command: ScriptCommand) -> Result<ExitCode> {
        use std::os::unix::process::CommandExt;

        debug!(program = %command.program.display(), args = ?command.args, "exec");
        // Only returns on failure.
        let err = command.to_command().exec();
        Err(Error::Launch(err))
    }
}

/// Runs the shell as a child process and waits for it.
///
/// Interrupt and termination signals sent to this process are caught while the
/// child runs and relayed to it, so the parent never exits ahead of the child.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnAndWait;

impl Executor for SpawnAndWait {
    fn execute(&self, command: ScriptCommand) -> Result<ExitCode> {
        signals::install();

        debug!(program = %command.program.display(), args = ?command.args, "spawn");
        let mut child = command
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(Error::Launch)?;

        let _guard = signals::watch(child.id());
        let exit_status = child.wait().map_err(Error::Launch)?;
        let code = match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        };
        if code != 0 {
            info!(code, "script exited with failure");
        }
        Ok(code)
    }
}

/// Pick the executor for this platform and configuration.
pub fn executor_for(config: &Config) -> Box<dyn Executor> {
    #[cfg(unix)]
    if !config.spawn {
        return Box::new(ReplaceProcess);
    }
    #[cfg(not(unix))]
    let _ = config;
    Box::new(SpawnAndWait)
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match ExitStatusExt::signal(&exit_status) {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// First regular file named `program` in the directories of `search_paths`.
pub fn find_in_path(search_paths: &OsStr, program: &str) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}
