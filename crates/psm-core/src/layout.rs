//! Fixed directory layout of a Palworld dedicated server installation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FsContext, Result};

/// Folder under the saves dir that holds trashed worlds.
pub const TRASH_DIR_NAME: &str = "__trash__";
/// Display name file inside a world folder.
pub const NAME_FILE: &str = "name.txt";
/// Per-world settings file, also the name of the live settings file.
pub const SETTINGS_FILE: &str = "PalWorldSettings.ini";
/// Folder inside a world that holds its parked mods.
pub const MODS_DIR: &str = "Mods";
/// Mod folders living under the paks dir.
pub const PAK_MOD_ENTRIES: [&str; 2] = ["~mods", "LogicMods"];
/// UE4SS entries living under the binaries dir.
pub const BIN_MOD_ENTRIES: [&str; 2] = ["ue4ss", "dwmapi.dll"];

#[cfg(windows)]
const SERVER_EXE: &str = "PalServer.exe";
#[cfg(not(windows))]
const SERVER_EXE: &str = "PalServer.sh";

/// Paths derived from the server installation root.
#[derive(Debug, Clone)]
pub struct ServerLayout {
    root: PathBuf,
}

impl ServerLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn save_games_dir(&self) -> PathBuf {
        self.root.join("Pal").join("Saved").join("SaveGames")
    }

    /// Directory holding one subdirectory per world.
    pub fn saves_dir(&self) -> PathBuf {
        self.save_games_dir().join("0")
    }

    pub fn trash_dir(&self) -> PathBuf {
        self.saves_dir().join(TRASH_DIR_NAME)
    }

    /// Destination of zip archives. Kept outside the saves dir so archives
    /// never show up as worlds.
    pub fn archive_dir(&self) -> PathBuf {
        self.save_games_dir().join("backups")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root
            .join("Pal")
            .join("Saved")
            .join("Config")
            .join("WindowsServer")
    }

    pub fn game_user_settings(&self) -> PathBuf {
        self.config_dir().join("GameUserSettings.ini")
    }

    /// Settings file the server reads at startup.
    pub fn live_settings(&self) -> PathBuf {
        self.config_dir().join(SETTINGS_FILE)
    }

    pub fn default_settings(&self) -> PathBuf {
        self.root.join("DefaultPalWorldSettings.ini")
    }

    pub fn paks_dir(&self) -> PathBuf {
        self.root.join("Pal").join("Content").join("Paks")
    }

    pub fn binaries_dir(&self) -> PathBuf {
        self.root.join("Pal").join("Binaries").join("Win64")
    }

    pub fn server_exe(&self) -> PathBuf {
        self.root.join(SERVER_EXE)
    }

    pub fn world_dir(&self, id: &str) -> PathBuf {
        self.saves_dir().join(id)
    }

    pub fn trash_entry(&self, name: &str) -> PathBuf {
        self.trash_dir().join(name)
    }

    pub fn ensure_trash_dir(&self) -> Result<PathBuf> {
        let dir = self.trash_dir();
        fs::create_dir_all(&dir).fs_context("create trash dir", &dir)?;
        Ok(dir)
    }

    /// Live location of a mod entry (`~mods`, `ue4ss`, ...).
    pub fn live_mod_path(&self, entry: &str) -> PathBuf {
        if PAK_MOD_ENTRIES.contains(&entry) {
            self.paks_dir().join(entry)
        } else {
            self.binaries_dir().join(entry)
        }
    }
}

/// Every mod entry name, paks first.
pub fn mod_entries() -> impl Iterator<Item = &'static str> {
    PAK_MOD_ENTRIES.iter().chain(BIN_MOD_ENTRIES.iter()).copied()
}
