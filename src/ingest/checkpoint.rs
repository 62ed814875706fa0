//! Resume marker for chunk ingestion

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Text file holding the URL of the last fully ingested decision
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored URL. A missing, unreadable or blank file means no checkpoint.
    pub fn load(&self) -> Option<String> {
        if !self.path.exists() {
            return None;
        }
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let url = content.trim();
                (!url.is_empty()).then(|| url.to_string())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable checkpoint");
                None
            }
        }
    }

    pub fn save(&self, url: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, url)
    }
}
