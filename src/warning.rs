//! Degraded-load conditions.
//!
//! None of these stop the hub. Loaders fall back to defaults or empty values and
//! hand the warning back so callers can log it and show it in the status line.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Warning {
    #[error("could not read {location}: {source}")]
    Unreadable {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("could not write defaults to {location}: {source}")]
    DefaultsNotWritten {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("{location}:{line}: skipped malformed line")]
    MalformedLine { location: String, line: usize },

    #[error("unknown animation '{0}', using spinner")]
    UnknownAnimation(String),

    #[error("theme '{requested}' not found, using '{used}'")]
    ThemeFallback { requested: String, used: String },

    #[error("no themes available in {0}")]
    NoThemes(String),

    #[error("theme '{name}' is not a valid theme record: {source}")]
    ThemeParse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Warning {
    /// Logs the warning and passes it through.
    pub fn logged(self) -> Self {
        tracing::warn!("{self}");
        self
    }
}
