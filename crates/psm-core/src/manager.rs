//! World operations over an explicit context: the server layout plus the
//! folder name of the active world.
//!
//! Every operation is a short sequence of independent filesystem calls.
//! Nothing is transactional; a failure part way leaves earlier steps in
//! place (the switch rename is the one step that is undone on failure).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use crate::archive;
use crate::error::{FsContext, ManagerError, Result};
use crate::ini;
use crate::layout::{NAME_FILE, SETTINGS_FILE, ServerLayout, TRASH_DIR_NAME};
use crate::mods::{self, CopiedItem, CopySelection};
use crate::worlds::{self, WorldEntry};

const LOCAL_SETTINGS_SECTION: &str = "/Script/Pal.PalGameLocalSettings";
const SERVER_NAME_KEY: &str = "DedicatedServerName";

/// Name given to a new world when none is entered.
pub const DEFAULT_WORLD_NAME: &str = "New World";

/// Reads the active world id from the server's `GameUserSettings.ini`.
/// Returns `None` unless the named folder exists in the saves dir.
pub fn detect_active_id(layout: &ServerLayout) -> Result<Option<String>> {
    let path = layout.game_user_settings();
    let id = ini::read_value(&path, LOCAL_SETTINGS_SECTION, SERVER_NAME_KEY)
        .fs_context("read game user settings", &path)?;
    Ok(id.filter(|id| is_plain_folder_name(id) && layout.world_dir(id).is_dir()))
}

fn is_plain_folder_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().and_then(|s| s.to_str()) == Some(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    /// Folder name the previously active world now lives under.
    pub archived_as: String,
    /// Display name of the newly active world.
    pub activated: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReport {
    pub archived_as: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct SaveManager {
    layout: ServerLayout,
    active_id: String,
}

impl SaveManager {
    /// Binds the layout to an active world, which must exist. Creates the
    /// trash dir if needed.
    pub fn open(layout: ServerLayout, active_id: impl Into<String>) -> Result<Self> {
        let active_id = active_id.into();
        if !is_plain_folder_name(&active_id) || !layout.world_dir(&active_id).is_dir() {
            return Err(ManagerError::WorldNotFound(active_id));
        }
        layout.ensure_trash_dir()?;
        Ok(Self { layout, active_id })
    }

    pub fn layout(&self) -> &ServerLayout {
        &self.layout
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    fn active_dir(&self) -> PathBuf {
        self.layout.world_dir(&self.active_id)
    }

    pub fn active_display_name(&self) -> String {
        worlds::display_name(&self.active_dir())
    }

    /// Inactive worlds.
    pub fn worlds(&self) -> Result<Vec<WorldEntry>> {
        worlds::list_worlds(&self.layout.saves_dir(), &self.active_id)
    }

    /// The active world followed by every inactive one.
    pub fn all_worlds(&self) -> Result<Vec<WorldEntry>> {
        let active = WorldEntry {
            folder: self.active_id.clone(),
            display_name: self.active_display_name(),
            modified: None,
        };
        let mut out = vec![active];
        out.extend(self.worlds()?);
        Ok(out)
    }

    pub fn trash(&self) -> Result<Vec<WorldEntry>> {
        worlds::list_trash(&self.layout.trash_dir())
    }

    // Existing world folder in the saves dir, active or not, never the trash.
    fn world_path(&self, folder: &str) -> Result<PathBuf> {
        if !is_plain_folder_name(folder) || folder.starts_with(TRASH_DIR_NAME) {
            return Err(ManagerError::WorldNotFound(folder.to_string()));
        }
        let dir = self.layout.world_dir(folder);
        if !dir.is_dir() {
            return Err(ManagerError::WorldNotFound(folder.to_string()));
        }
        Ok(dir)
    }

    fn inactive_world_path(&self, folder: &str) -> Result<PathBuf> {
        if folder == self.active_id {
            return Err(ManagerError::ActiveWorld(folder.to_string()));
        }
        self.world_path(folder)
    }

    // Parks live mods and moves the active folder out of the way.
    fn archive_active(&self) -> Result<String> {
        mods::park_live_mods(&self.layout, &self.active_id)?;
        let saves = self.layout.saves_dir();
        let archived = worlds::next_world_name(&saves);
        let target = saves.join(&archived);
        let active = self.active_dir();
        fs::rename(&active, &target).fs_context("rename active world", &active)?;
        tracing::info!(active = %self.active_id, archived_as = %archived, "archived active world");
        Ok(archived)
    }

    /// Makes `folder` the active world. The previous active world is kept
    /// under the lowest free `worldK` name.
    pub fn switch_to(&self, folder: &str) -> Result<SwitchReport> {
        self.switch_with(folder, |from, to| fs::rename(from, to))
    }

    // `activate` moves the selected world into the active folder.
    fn switch_with<F>(&self, folder: &str, activate: F) -> Result<SwitchReport>
    where
        F: FnOnce(&Path, &Path) -> std::io::Result<()>,
    {
        let selected = self.inactive_world_path(folder)?;
        let activated = worlds::display_name(&selected);

        let archived_as = self.archive_active()?;
        if let Err(source) = activate(&selected, &self.active_dir()) {
            let archived = self.layout.world_dir(&archived_as);
            match fs::rename(&archived, self.active_dir()) {
                Ok(()) => {
                    if let Err(e) = mods::restore_world_mods(&self.layout, &self.active_id) {
                        tracing::warn!(error = %e, "failed to restore mods after aborted switch");
                    }
                }
                Err(e) => tracing::warn!(
                    archived = %archived.display(),
                    error = %e,
                    "failed to undo archive of active world"
                ),
            }
            return Err(ManagerError::Fs {
                action: "activate world",
                path: selected,
                source,
            });
        }
        mods::restore_world_mods(&self.layout, &self.active_id)?;
        tracing::info!(world = folder, archived_as = %archived_as, "switched active world");
        Ok(SwitchReport {
            archived_as,
            activated,
        })
    }

    /// Archives the active world and starts a fresh one in its folder.
    pub fn create_world(&self, name: &str) -> Result<CreateReport> {
        let display_name = match name.trim() {
            "" => DEFAULT_WORLD_NAME.to_string(),
            n => n.to_string(),
        };
        let archived_as = self.archive_active()?;

        let dir = self.active_dir();
        fs::create_dir(&dir).fs_context("create world", &dir)?;
        let name_file = dir.join(NAME_FILE);
        fs::write(&name_file, &display_name).fs_context("write name", &name_file)?;
        let settings = dir.join(SETTINGS_FILE);
        let default = self.layout.default_settings();
        if default.exists() {
            fs::copy(&default, &settings).fs_context("copy default settings", &default)?;
        } else {
            fs::write(&settings, "").fs_context("write settings", &settings)?;
        }
        tracing::info!(world = %display_name, archived_as = %archived_as, "created world");
        Ok(CreateReport {
            archived_as,
            display_name,
        })
    }

    /// Moves a world into the trash, suffixed with the current unix time.
    pub fn trash_world(&self, folder: &str) -> Result<String> {
        self.trash_world_at(folder, chrono::Utc::now().timestamp())
    }

    pub fn trash_world_at(&self, folder: &str, timestamp: i64) -> Result<String> {
        let src = self.inactive_world_path(folder)?;
        let trash = self.layout.ensure_trash_dir()?;
        let name = worlds::unique_name(&trash, &format!("{}_{}", folder, timestamp));
        fs::rename(&src, trash.join(&name)).fs_context("move world to trash", &src)?;
        tracing::info!(world = folder, trashed_as = %name, "trashed world");
        Ok(name)
    }

    /// Moves a trashed world back into the saves dir, named after its
    /// display name. Returns the folder name it was restored under.
    pub fn restore_from_trash(&self, trashed: &str) -> Result<String> {
        let src = self.layout.trash_entry(trashed);
        if !is_plain_folder_name(trashed) || !src.is_dir() {
            return Err(ManagerError::NotInTrash(trashed.to_string()));
        }
        let saves = self.layout.saves_dir();
        let base = worlds::sanitize_folder_name(&worlds::display_name(&src));
        let name = worlds::unique_name(&saves, &base);
        fs::rename(&src, saves.join(&name)).fs_context("restore world", &src)?;
        tracing::info!(trashed, restored_as = %name, "restored world");
        Ok(name)
    }

    /// Permanently deletes every directory in the trash, whatever its name.
    pub fn clear_trash(&self) -> Result<usize> {
        let trash = self.layout.trash_dir();
        if !trash.is_dir() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&trash).fs_context("read directory", &trash)? {
            let path = entry.fs_context("read directory", &trash)?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path).fs_context("delete", &path)?;
                removed += 1;
            }
        }
        tracing::info!(removed, "cleared trash");
        Ok(removed)
    }

    /// Sets a world's display name. The folder name is untouched.
    pub fn rename_world(&self, folder: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ManagerError::InvalidName(name.to_string()));
        }
        let dir = self.world_path(folder)?;
        let path = dir.join(NAME_FILE);
        fs::write(&path, name).fs_context("write name", &path)?;
        tracing::info!(world = folder, name, "renamed world");
        Ok(())
    }

    /// Starts the dedicated server without blocking the caller. A watcher
    /// thread reaps the process when it exits. Returns its pid.
    pub fn launch_server(&self) -> Result<u32> {
        let exe = self.layout.server_exe();
        if !exe.is_file() {
            return Err(ManagerError::ServerNotFound(exe));
        }
        let mut child = Command::new(&exe)
            .current_dir(self.layout.root())
            .stdin(Stdio::null())
            .spawn()
            .fs_context("launch", &exe)?;
        let pid = child.id();
        tracing::info!(pid, exe = %exe.display(), "launched server");
        thread::Builder::new()
            .name("server-reaper".into())
            .spawn(move || match child.wait() {
                Ok(status) => tracing::info!(pid, %status, "server exited"),
                Err(e) => tracing::warn!(pid, error = %e, "failed to wait for server"),
            })
            .fs_context("watch server", &exe)?;
        Ok(pid)
    }

    pub fn copy_into_active(
        &self,
        source: &str,
        selection: CopySelection,
    ) -> Result<Vec<CopiedItem>> {
        self.inactive_world_path(source)?;
        mods::copy_into_active(&self.layout, source, &self.active_id, selection)
    }

    /// Zips a world folder into the archive dir.
    pub fn archive_world(&self, folder: &str) -> Result<PathBuf> {
        let dir = self.world_path(folder)?;
        archive::zip_world(&dir, &self.layout.archive_dir())
    }
}
