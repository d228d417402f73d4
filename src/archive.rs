use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::youtube_utils::ensure_dir_exists;

/// Append-only record of post ids that were already archived.
#[derive(Debug, Default)]
pub struct ArchiveLedger {
    path: Option<PathBuf>,
    ids: HashSet<String>,
    /// The file's last line lacks its newline
    unterminated: bool,
}

impl ArchiveLedger {
    /// A ledger that remembers nothing and writes nowhere
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Make sure the archive file can be appended to, creating its directory if
    /// needed. Returns `None` (after logging) when it can't be used.
    pub fn prepare(path: &Path) -> Option<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = ensure_dir_exists(parent) {
                warn!("[ytca] failed to create log directory {}: {}", parent.display(), e);
            }
        }

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(_) => Some(path.to_path_buf()),
            Err(e) => {
                warn!(
                    "[ytca] cannot write to the archive file {} ({}), continuing...",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Read the ledger once. No path means no archive; a missing file is an
    /// empty archive. An unreadable file is logged and the run continues
    /// without an archive.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::disabled();
        };

        let contents = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Archive {} does not exist yet", path.display());
                String::new()
            }
            Err(e) => {
                warn!(
                    "[ytca] cannot read the archive file {} ({}), continuing without archive...",
                    path.display(),
                    e
                );
                return Self::disabled();
            }
        };

        let ids: HashSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        info!("[ytca] {} post ids in archive {}", ids.len(), path.display());
        Self {
            path: Some(path.to_path_buf()),
            ids,
            unterminated: !contents.is_empty() && !contents.ends_with('\n'),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.ids.contains(post_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append `post_id` and flush it to disk before returning.
    pub fn record(&mut self, post_id: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.ids.contains(post_id) {
            return Ok(());
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if self.unterminated {
            writeln!(file)?;
        }
        writeln!(file, "{}", post_id)?;
        file.flush()?;
        file.sync_data()?;

        self.unterminated = false;
        self.ids.insert(post_id.to_string());
        debug!("Recorded {} in archive", post_id);
        Ok(())
    }
}
