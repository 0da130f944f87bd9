use std::collections::BTreeMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the search-path variable.
pub const PATH_VAR: &str = "PATH";

/// Separator between entries of the search-path variable.
#[cfg(unix)]
pub const PATH_SEPARATOR: &str = ":";
#[cfg(not(unix))]
pub const PATH_SEPARATOR: &str = ";";

/// Explicit set of environment variables handed to a launched script.
///
/// Built from a snapshot of the process environment and then adjusted. The
/// process's own environment is never touched, so the parent stays the same
/// whether the script replaces it or runs as a child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn inherit() -> Self {
        Self::from_vars(stdenv::vars_os())
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Names are case-insensitive on Windows, where `PATH` is often `Path`.
    pub fn get_var(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        let key = self.stored_key(key.as_ref())?;
        self.vars.get(key).map(OsString::as_os_str)
    }

    /// Set or override an environment variable, keeping the spelling of an
    /// existing name.
    pub fn set_var(&mut self, key: impl Into<OsString>, val: impl Into<OsString>) {
        let key = key.into();
        let key = self.stored_key(&key).cloned().unwrap_or(key);
        self.vars.insert(key, val.into());
    }

    #[cfg(windows)]
    fn stored_key(&self, key: &OsStr) -> Option<&OsString> {
        self.vars.keys().find(|k| k.eq_ignore_ascii_case(key))
    }

    #[cfg(not(windows))]
    fn stored_key(&self, key: &OsStr) -> Option<&OsString> {
        self.vars.get_key_value(key).map(|(k, _)| k)
    }

    /// Put `<dir>/node_modules/.bin` in front of the search path.
    ///
    /// The separator cannot be escaped inside the search path, so a `dir`
    /// containing it leaves the variable exactly as inherited. When the
    /// variable is unset it becomes the local binary directory alone.
    pub fn prepend_local_bin(&mut self, dir: &Path) {
        if dir.to_string_lossy().contains(PATH_SEPARATOR) {
            warn!(
                directory = %dir.display(),
                "manifest directory contains {PATH_SEPARATOR:?}, leaving {PATH_VAR} unchanged"
            );
            return;
        }

        let local_bin = local_bin_dir(dir);
        let mut path = local_bin.into_os_string();
        if let Some(inherited) = self.get_var(PATH_VAR) {
            path.push(PATH_SEPARATOR);
            path.push(inherited);
        }
        debug!(path = ?path, "derived {PATH_VAR}");
        self.set_var(PATH_VAR, path);
    }
}

/// Directory holding the executables installed by the package manager.
pub fn local_bin_dir(dir: &Path) -> PathBuf {
    dir.join("node_modules").join(".bin")
}
