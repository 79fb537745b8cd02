//! Version metadata file (`Cargo.toml`, `pyproject.toml`, ...).
//!
//! Edits go through `toml_edit` so comments and layout survive.

use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use std::fs;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Value};

fn missing_key(path: &Path, key: &str) -> ReleaseError {
    ReleaseError::config(format!(
        "Key '{}' not found in {}",
        key,
        path.display()
    ))
}

/// Read the version string stored at dotted `key`
pub fn read_version(path: &Path, key: &str) -> Result<String> {
    let doc: DocumentMut = fs::read_to_string(path)?.parse()?;
    key.split('.')
        .try_fold(doc.as_item(), |item, part| item.get(part))
        .and_then(Item::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing_key(path, key))
}

/// Replace the version string stored at dotted `key`
pub fn write_version(path: &Path, key: &str, version: &Version) -> Result<()> {
    let mut doc: DocumentMut = fs::read_to_string(path)?.parse()?;

    let mut item = doc.as_item_mut();
    for part in key.split('.') {
        item = item.get_mut(part).ok_or_else(|| missing_key(path, key))?;
    }
    let value = item
        .as_value_mut()
        .filter(|value| value.is_str())
        .ok_or_else(|| {
            ReleaseError::config(format!(
                "Key '{}' in {} is not a string",
                key,
                path.display()
            ))
        })?;

    let decor = value.decor().clone();
    *value = Value::from(version.to_string());
    *value.decor_mut() = decor;

    fs::write(path, doc.to_string())?;
    Ok(())
}
