use crate::Error;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Progress of the relay.
///
/// Every withdraw below `height` has been submitted, as have the first `submitted` withdraws
/// (ordered by index) at `height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Next height to relay.
    pub height: u64,
    /// Number of withdraws at `height` already submitted.
    pub submitted: u32,
}

impl Cursor {
    /// Create a cursor at the start of `height`.
    pub fn new(height: u64) -> Self {
        Self {
            height,
            submitted: 0,
        }
    }

    /// Load the cursor persisted at `path` (if any).
    pub fn load(path: &Path) -> Result<Option<Self>, Error> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&contents)?))
    }

    /// Persist the cursor to `path`.
    ///
    /// The cursor is written to a sibling file and renamed over `path`, so a crash leaves either
    /// the previous or the new cursor in place. The rename is durable once this returns.
    pub fn store(&self, path: &Path) -> Result<(), Error> {
        let contents = serde_json::to_vec(self)?;
        let temporary = temporary(path);
        let mut file = File::create(&temporary)?;
        file.write_all(&contents)?;
        file.sync_all()?;
        fs::rename(&temporary, path)?;
        File::open(directory(path))?.sync_all()?;
        Ok(())
    }
}

fn temporary(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Directory holding `path` (the working directory for a bare file name).
fn directory(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
