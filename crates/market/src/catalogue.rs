//! Loading store files from disk.

use crate::error::{MarketError, Result};
use crate::model::Store;
use std::path::{Path, PathBuf};

/// Loads one store file.
pub fn load_file(path: &Path) -> Result<Store> {
    let content = std::fs::read_to_string(path).map_err(|source| MarketError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| MarketError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every `*.json` store in a directory, sorted by file name.
///
/// Unreadable or malformed files are skipped with a warning so one bad file
/// does not take the worker down. A missing directory is an error.
pub fn load_dir(dir: &Path) -> Result<Vec<Store>> {
    let entries = std::fs::read_dir(dir).map_err(|source| MarketError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut stores = Vec::with_capacity(paths.len());
    for path in paths {
        match load_file(&path) {
            Ok(store) => stores.push(store),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping store file"),
        }
    }

    tracing::debug!(dir = %dir.display(), count = stores.len(), "Catalogue loaded");
    Ok(stores)
}
