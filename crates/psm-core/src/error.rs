//! Error types for world operations.

use std::path::PathBuf;

/// Errors produced while managing world folders.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to {action} {}: {source}", .path.display())]
    Fs {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("world folder not found: {0}")]
    WorldNotFound(String),

    #[error("no trashed world named {0}")]
    NotInTrash(String),

    #[error("{0} is the active world")]
    ActiveWorld(String),

    #[error("invalid world name: {0:?}")]
    InvalidName(String),

    #[error("server executable not found: {}", .0.display())]
    ServerNotFound(PathBuf),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ManagerError>;

/// Attaches the failed action and path to an I/O error.
pub(crate) trait FsContext<T> {
    fn fs_context(self, action: &'static str, path: &std::path::Path) -> Result<T>;
}

impl<T> FsContext<T> for std::io::Result<T> {
    fn fs_context(self, action: &'static str, path: &std::path::Path) -> Result<T> {
        self.map_err(|source| ManagerError::Fs {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}
