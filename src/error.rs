use std::path::PathBuf;

/// Everything that can stop a script from running.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The walk reached the filesystem root without finding a manifest.
    #[error("No package.json found at any level above {}", start.display())]
    ManifestNotFound { start: PathBuf },

    /// A manifest exists (or might exist) but could not be opened or read.
    #[error("failed to read {}", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not a JSON object, or its `scripts` field is not a
    /// string-to-string object.
    #[error("failed to parse {}", path.display())]
    ManifestMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to determine the current directory")]
    CurrentDir(#[source] std::io::Error),

    #[error("No script named {name} in {}/package.json", directory.display())]
    ScriptNotFound { name: String, directory: PathBuf },

    /// The shell could not be started.
    #[error("Script failed: {0}")]
    Launch(#[source] std::io::Error),
}

impl Error {
    /// Whether this error is an expected outcome with a one-line diagnostic,
    /// as opposed to a fault whose cause chain should be shown.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Error::ManifestNotFound { .. } | Error::ScriptNotFound { .. } | Error::Launch(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
