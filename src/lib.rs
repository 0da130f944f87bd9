//! Run a script from the nearest `package.json`.
//!
//! [`manifest::locate`] walks up from a directory to the closest manifest and
//! reads its `scripts` table. [`ScriptCommand`] turns one entry into a shell
//! invocation that runs in the manifest's directory with
//! `node_modules/.bin` on the search path, and an [`Executor`] runs it, either
//! by replacing the current process or by spawning a child and waiting.

pub mod command;
pub mod config;
pub mod env;
mod error;
pub mod external;
pub mod manifest;
mod signals;

pub use command::{Executor, ExitCode, ScriptCommand};
pub use config::Config;
pub use env::Environment;
pub use error::{Error, Result};
pub use manifest::ManifestInfo;

use std::ffi::OsString;
use std::path::Path;

/// Locate the manifest above `start`, prepare `script` and hand it to
/// `executor`.
pub fn run(
    start: &Path,
    script: &str,
    extra_args: &[OsString],
    inherited: &Environment,
    executor: &dyn Executor,
) -> Result<ExitCode> {
    let info = manifest::locate(start)?;
    let command = ScriptCommand::new(&info, script, extra_args, inherited)?;
    executor.execute(command)
}
