use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::{FsContext, Result};
use crate::layout::{NAME_FILE, TRASH_DIR_NAME};

/// One world folder as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldEntry {
    /// Directory name, the world's identifier.
    pub folder: String,
    /// `name.txt` contents, or the folder name when there is none.
    pub display_name: String,
    pub modified: Option<DateTime<Local>>,
}

impl WorldEntry {
    fn from_dir(dir: &Path, folder: String) -> Self {
        let modified = fs::metadata(dir)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);
        Self {
            display_name: display_name(dir),
            folder,
            modified,
        }
    }
}

/// Friendly name of a world dir: trimmed `name.txt`, else the folder name.
pub fn display_name(dir: &Path) -> String {
    if let Ok(s) = fs::read_to_string(dir.join(NAME_FILE)) {
        let s = s.trim();
        if !s.is_empty() {
            return s.to_string();
        }
    }
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn subdirs(dir: &Path) -> Result<Vec<(String, std::path::PathBuf)>> {
    let rd = fs::read_dir(dir).fs_context("read directory", dir)?;
    let mut out = Vec::new();
    for e in rd.flatten() {
        let p = e.path();
        if !p.is_dir() {
            continue;
        }
        let Some(name) = p.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
            tracing::warn!(path = %p.display(), "skipping non-UTF-8 folder name");
            continue;
        };
        out.push((name, p));
    }
    out.sort();
    Ok(out)
}

/// Worlds in `saves` other than the active one and the trash, by folder name.
pub fn list_worlds(saves: &Path, active_id: &str) -> Result<Vec<WorldEntry>> {
    Ok(subdirs(saves)?
        .into_iter()
        .filter(|(name, _)| name != active_id && !name.starts_with(TRASH_DIR_NAME))
        .map(|(name, p)| WorldEntry::from_dir(&p, name))
        .collect())
}

/// Trashed worlds. A missing trash dir lists as empty.
pub fn list_trash(trash: &Path) -> Result<Vec<WorldEntry>> {
    if !trash.is_dir() {
        return Ok(Vec::new());
    }
    Ok(subdirs(trash)?
        .into_iter()
        .map(|(name, p)| WorldEntry::from_dir(&p, name))
        .collect())
}

/// Lowest `worldK` (K >= 1) with no entry in `saves`.
pub fn next_world_name(saves: &Path) -> String {
    (1u32..)
        .map(|i| format!("world{}", i))
        .find(|n| !saves.join(n).exists())
        .unwrap_or_else(|| "world".to_string())
}

/// `base`, or `base_1`, `base_2`, ... whichever is free first in `dir`.
pub fn unique_name(dir: &Path, base: &str) -> String {
    if !dir.join(base).exists() {
        return base.to_string();
    }
    (1u32..)
        .map(|i| format!("{}_{}", base, i))
        .find(|n| !dir.join(n).exists())
        .unwrap_or_else(|| base.to_string())
}

/// Makes a display name usable as a folder name on every platform.
pub fn sanitize_folder_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_end_matches(['.', ' ']);
    if cleaned.is_empty() {
        "world".to_string()
    } else if cleaned.starts_with(TRASH_DIR_NAME) {
        format!("world{}", cleaned)
    } else {
        cleaned.to_string()
    }
}
