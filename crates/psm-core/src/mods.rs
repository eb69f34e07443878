//! Moving world settings and mods between world folders and the live
//! server directories.
//!
//! A world owns its `PalWorldSettings.ini` and a `Mods/` folder. While a
//! world is active its mods live in the server's paks and binaries dirs;
//! when it is switched away they are parked back inside the world folder.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{FsContext, Result};
use crate::layout::{MODS_DIR, SETTINGS_FILE, ServerLayout, mod_entries};

/// What `copy_into_active` transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySelection {
    Settings,
    Mods,
    Both,
}

impl CopySelection {
    pub fn settings(self) -> bool {
        matches!(self, CopySelection::Settings | CopySelection::Both)
    }
    pub fn mods(self) -> bool {
        matches!(self, CopySelection::Mods | CopySelection::Both)
    }
}

/// An item `copy_into_active` actually copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopiedItem {
    Settings,
    Mod(&'static str),
}

impl std::fmt::Display for CopiedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopiedItem::Settings => f.write_str("Settings"),
            CopiedItem::Mod(name) => f.write_str(name),
        }
    }
}

/// Recursively copies `src` into `dst` (created if missing).
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).fs_context("create directory", &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).fs_context("create directory", parent)?;
            }
            fs::copy(path, &target).fs_context("copy file", path)?;
        }
    }
    Ok(())
}

fn remove_entry(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path).fs_context("remove directory", path)
    } else {
        fs::remove_file(path).fs_context("remove file", path)
    }
}

/// Copies a file or directory over `dst`, replacing whatever was there.
/// Returns `false` when `src` does not exist.
pub fn replace_entry(src: &Path, dst: &Path) -> Result<bool> {
    if !src.exists() {
        tracing::debug!(src = %src.display(), "nothing to copy");
        return Ok(false);
    }
    if dst.exists() {
        remove_entry(dst)?;
    }
    if src.is_dir() {
        copy_tree(src, dst)?;
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).fs_context("create directory", parent)?;
        }
        fs::copy(src, dst).fs_context("copy file", src)?;
    }
    Ok(true)
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).fs_context("create directory", parent)?;
    }
    fs::copy(src, dst).fs_context("copy file", src)?;
    Ok(())
}

/// Resets the live settings to the server defaults and moves every live
/// mod entry into `<world>/Mods/`.
pub fn park_live_mods(layout: &ServerLayout, world_id: &str) -> Result<()> {
    let mods_dir = layout.world_dir(world_id).join(MODS_DIR);
    fs::create_dir_all(&mods_dir).fs_context("create mods dir", &mods_dir)?;

    let live = layout.live_settings();
    let default = layout.default_settings();
    if default.exists() {
        copy_file(&default, &live)?;
    } else {
        if let Some(parent) = live.parent() {
            fs::create_dir_all(parent).fs_context("create directory", parent)?;
        }
        fs::write(&live, "").fs_context("write settings", &live)?;
    }

    for entry in mod_entries() {
        let src = layout.live_mod_path(entry);
        if replace_entry(&src, &mods_dir.join(entry))? {
            remove_entry(&src)?;
            tracing::info!(world = world_id, entry, "parked live mod");
        }
    }
    Ok(())
}

/// Copies a world's settings and parked mods into the live server dirs.
pub fn restore_world_mods(layout: &ServerLayout, world_id: &str) -> Result<()> {
    let world_dir = layout.world_dir(world_id);
    let settings = world_dir.join(SETTINGS_FILE);
    if settings.exists() {
        copy_file(&settings, &layout.live_settings())?;
        tracing::info!(world = world_id, "restored world settings");
    }

    let mods_dir = world_dir.join(MODS_DIR);
    for entry in mod_entries() {
        if replace_entry(&mods_dir.join(entry), &layout.live_mod_path(entry))? {
            tracing::info!(world = world_id, entry, "restored mod");
        }
    }
    Ok(())
}

/// Copies settings and/or mods from `source_id` onto the active world and
/// the live server dirs. Items missing from the source are skipped.
pub fn copy_into_active(
    layout: &ServerLayout,
    source_id: &str,
    active_id: &str,
    selection: CopySelection,
) -> Result<Vec<CopiedItem>> {
    let source_dir = layout.world_dir(source_id);
    let active_dir = layout.world_dir(active_id);
    let mut copied = Vec::new();

    if selection.settings() {
        let src = source_dir.join(SETTINGS_FILE);
        if src.exists() {
            copy_file(&src, &layout.live_settings())?;
            copy_file(&src, &active_dir.join(SETTINGS_FILE))?;
            copied.push(CopiedItem::Settings);
        }
    }

    if selection.mods() {
        let mods_src = source_dir.join(MODS_DIR);
        let mods_dst = active_dir.join(MODS_DIR);
        fs::create_dir_all(&mods_dst).fs_context("create mods dir", &mods_dst)?;
        for entry in mod_entries() {
            let src = mods_src.join(entry);
            if replace_entry(&src, &mods_dst.join(entry))? {
                replace_entry(&src, &layout.live_mod_path(entry))?;
                copied.push(CopiedItem::Mod(entry));
            }
        }
    }

    tracing::info!(
        source = source_id,
        active = active_id,
        items = copied.len(),
        "copied into active world"
    );
    Ok(copied)
}
