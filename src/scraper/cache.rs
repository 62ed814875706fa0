//! On-disk cache of crawled decisions

use super::{DecisionRecord, ScrapeError};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// One JSON file per decision, plus an append-only list of finished URLs
pub struct DecisionCache {
    dir: PathBuf,
    checkpoint_path: PathBuf,
    done: HashSet<String>,
}

impl DecisionCache {
    /// Opens (creating if needed) the cache directory and loads the checkpoint list
    pub fn open(dir: impl Into<PathBuf>, checkpoint_path: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let dir = dir.into();
        let checkpoint_path = checkpoint_path.into();
        fs::create_dir_all(&dir)?;

        let done: HashSet<String> = if checkpoint_path.exists() {
            fs::read_to_string(&checkpoint_path)?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };

        debug!(
            dir = %dir.display(),
            done = done.len(),
            "Opened decision cache"
        );

        Ok(Self {
            dir,
            checkpoint_path,
            done,
        })
    }

    /// Cache file name for a URL: hex SHA-256 of the URL
    pub fn key(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(url)))
    }

    pub fn is_done(&self, url: &str) -> bool {
        self.done.contains(url)
    }

    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    pub fn load(&self, url: &str) -> Result<Option<DecisionRecord>, ScrapeError> {
        let path = self.entry_path(url);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes the record and marks its URL as done
    pub fn save(&mut self, record: &DecisionRecord) -> Result<(), ScrapeError> {
        fs::write(self.entry_path(&record.url), serde_json::to_vec(record)?)?;

        let mut checkpoint = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.checkpoint_path)?;
        writeln!(checkpoint, "{}", record.url)?;

        self.done.insert(record.url.clone());
        Ok(())
    }
}
