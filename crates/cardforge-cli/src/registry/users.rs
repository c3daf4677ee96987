use std::fs::{OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{RegistryError, RegistryResult};

/// Append-only file of registered user ids, one per line.
///
/// Reads and appends happen under one lock, so a check followed by an
/// append cannot interleave with another writer in this process.
#[derive(Debug)]
pub struct UserRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UserRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_registered(&self, user_id: &str) -> RegistryResult<bool> {
        let _guard = self.lock.lock().map_err(|_| RegistryError::Poisoned)?;
        contains(&self.path, user_id)
    }

    /// Adds `user_id`; returns `false` when it was already present.
    pub fn register(&self, user_id: &str) -> RegistryResult<bool> {
        validate_user_id(user_id)?;
        let _guard = self.lock.lock().map_err(|_| RegistryError::Poisoned)?;
        if contains(&self.path, user_id)? {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{user_id}")?;
        file.sync_data()?;

        tracing::info!(event = "user_registered", user_id = %user_id);
        Ok(true)
    }
}

fn contains(path: &Path, user_id: &str) -> RegistryResult<bool> {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    for line in BufReader::new(file).lines() {
        if line? == user_id {
            return Ok(true);
        }
    }
    Ok(false)
}

fn validate_user_id(user_id: &str) -> RegistryResult<()> {
    if user_id.is_empty() || user_id.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(RegistryError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}
