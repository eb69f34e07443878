//! Tool configuration: where the dedicated server is installed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FsContext, ManagerError, Result};
use crate::ini;
use crate::layout::ServerLayout;

/// Default config file name, resolved against the working directory.
pub const CONFIG_FILE: &str = "config.ini";

const SECTION: &str = "DEFAULT";
const SERVER_DIR_KEY: &str = "palserver_dir";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub server_dir: PathBuf,
}

impl ToolConfig {
    pub fn new(server_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_dir: server_dir.into(),
        }
    }

    /// Loads the config. `Ok(None)` means first run (no file yet).
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ManagerError::Fs {
                    action: "read config",
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let dir = ini::find_value(&text, SECTION, SERVER_DIR_KEY).ok_or_else(|| {
            ManagerError::Config(format!(
                "{} has no {} in [{}]",
                path.display(),
                SERVER_DIR_KEY,
                SECTION
            ))
        })?;
        Ok(Some(Self::new(dir)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = self.server_dir.to_string_lossy();
        let text = ini::render_section(SECTION, &[(SERVER_DIR_KEY, dir.as_ref())]);
        fs::write(path, text).fs_context("write config", path)?;
        tracing::info!(path = %path.display(), server_dir = %dir, "saved tool config");
        Ok(())
    }

    pub fn layout(&self) -> ServerLayout {
        ServerLayout::new(&self.server_dir)
    }
}
