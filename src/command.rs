use crate::env::{Environment, PATH_VAR};
use crate::error::{Error, Result};
use crate::external::find_in_path;
use crate::manifest::ManifestInfo;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

pub type ExitCode = i32;

/// Shell used to run script text.
pub const SHELL: &str = "sh";

/// A way of running a fully prepared [`ScriptCommand`].
///
/// Implementations must leave the standard streams inherited and use exactly
/// the environment and directory carried by the command, so that the observed
/// behavior only differs in whether the current process survives.
pub trait Executor {
    /// Run the command and return its exit code.
    fn execute(&self, command: ScriptCommand) -> Result<ExitCode>;
}

/// Shell invocation for one script, ready to be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: PathBuf,
    pub env: Environment,
}

impl ScriptCommand {
    /// Prepare `script` from `info` with `extra_args` as its positional
    /// parameters.
    ///
    /// `inherited` is the environment the tool was started with. Its search
    /// path is used to find the shell, and a copy with the local binary
    /// directory prepended becomes the script's environment.
    pub fn new(
        info: &ManifestInfo,
        script: &str,
        extra_args: &[OsString],
        inherited: &Environment,
    ) -> Result<Self> {
        let text = info.script(script).ok_or_else(|| Error::ScriptNotFound {
            name: script.to_owned(),
            directory: info.directory.clone(),
        })?;
        debug!(script, text, "resolved script");

        let program = resolve_shell(inherited)?;

        let mut env = inherited.clone();
        env.prepend_local_bin(&info.directory);

        Ok(Self {
            program,
            args: shell_args(text, extra_args),
            current_dir: info.directory.clone(),
            env,
        })
    }

    /// Build a [`Command`] with an explicit environment and inherited streams.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.current_dir)
            .env_clear()
            .envs(&self.env.vars);
        cmd
    }
}

/// `-c '<text> "$@"' sh <extra_args...>`
///
/// The token after the script text becomes `$0`, so the extra arguments land in
/// `$1`, `$2`, ... and `"$@"` appends them to the script's command line.
pub fn shell_args(text: &str, extra_args: &[OsString]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(extra_args.len() + 3);
    args.push(OsString::from("-c"));
    args.push(OsString::from(format!("{text} \"$@\"")));
    args.push(OsString::from(SHELL));
    args.extend(extra_args.iter().cloned());
    args
}

fn resolve_shell(inherited: &Environment) -> Result<PathBuf> {
    let search_paths = inherited.get_var(PATH_VAR).unwrap_or_default();
    find_in_path(search_paths, SHELL).ok_or_else(|| {
        Error::Launch(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{SHELL} not found in {PATH_VAR}"),
        ))
    })
}
