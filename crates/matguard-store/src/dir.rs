//! Directory-backed durable store.
//!
//! Each key lives in its own `<key>.kv` file under the root directory.
//! Writes go to a sibling `.tmp` file first and are renamed into place, so a
//! crash mid-write leaves either the old value or the new one, never a torn
//! mix.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use matguard_error::{MatGuardError, Result};
use tracing::debug;

use crate::traits::KvStore;

const VALUE_EXTENSION: &str = "kv";
const TEMP_EXTENSION: &str = "kv.tmp";

/// Durable store rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(MatGuardError::InvalidKey {
            key: key.to_owned(),
        })
    }
}

fn write_temp(temp: &Path, value: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(temp)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

impl KvStore for DirStore {
    fn name(&self) -> &'static str {
        "dir"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key)?;
        let temp = self.root.join(format!("{key}.{TEMP_EXTENSION}"));
        if let Err(err) = write_temp(&temp, value).and_then(|()| fs::rename(&temp, &path)) {
            let _ = fs::remove_file(&temp);
            return Err(err.into());
        }
        debug!(
            target: "matguard::store",
            key,
            bytes = value.len(),
            path = %path.display(),
            "wrote durable value"
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
