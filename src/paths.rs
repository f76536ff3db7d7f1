//! Output path preparation
//!
//! Destinations are composed by appending an entry name to a base directory
//! that always ends with a path separator, then the missing part of the parent
//! chain is created. Entry names come from the archive and are untrusted: a
//! name that is absolute or climbs out with `..` is refused before anything
//! touches the filesystem.
//!
//! Nothing here deletes or replaces existing files or directories.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf, is_separator};

use tracing::debug;

use crate::error::{Error, Result};

/// Ensure `base` ends with a path separator.
pub fn normalize_base(base: &Path) -> Result<PathBuf> {
    let text = base.to_string_lossy();
    if text.is_empty() {
        return Err(Error::InvalidInput("output path is empty".into()));
    }
    if text.chars().last().is_some_and(is_separator) {
        return Ok(base.to_path_buf());
    }

    let mut normalized = OsString::from(base.as_os_str());
    normalized.push(MAIN_SEPARATOR.to_string());
    Ok(PathBuf::from(normalized))
}

/// Refuse names that would land outside the output directory.
pub fn check_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("entry name is empty".into()));
    }

    let unsafe_path = || Error::UnsafePath {
        name: name.to_string(),
    };
    if name.contains('\0') {
        return Err(unsafe_path());
    }
    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path());
            },
        }
    }
    Ok(())
}

/// Concatenate a normalized base and an entry name.
pub fn compose(base: &Path, name: &str) -> Result<PathBuf> {
    check_entry_name(name)?;
    let mut joined = OsString::from(normalize_base(base)?.as_os_str());
    joined.push(name);
    Ok(PathBuf::from(joined))
}

/// Create the parent directory chain of `base + name` if it is missing.
///
/// Returns the composed destination path. Calling it again for the same
/// destination does nothing.
///
/// # Errors
///
/// - [`Error::UnsafePath`] / [`Error::InvalidInput`] for names that cannot be placed
/// - [`Error::Io`] when a directory cannot be created, for example because a
///   regular file already occupies part of the chain
pub fn ensure_parent_exists(base: &Path, name: &str) -> Result<PathBuf> {
    let outpath = compose(base, name)?;

    if let Some(parent) = outpath.parent()
        && !parent.is_dir()
    {
        debug!(dir = %parent.display(), "creating parent directories");
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    Ok(outpath)
}

/// Create the directory `base + name` (and its ancestors) if it is missing.
pub fn ensure_dir_exists(base: &Path, name: &str) -> Result<PathBuf> {
    let dir = compose(base, name)?;
    if !dir.exists() {
        debug!(dir = %dir.display(), "creating directory");
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    }
    Ok(dir)
}
