use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{FsContext, ManagerError, Result};

// Zip archive of a world directory into `dest_dir` (non-destructive)
pub fn zip_world(dir: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(ManagerError::WorldNotFound(dir.display().to_string()));
    }
    fs::create_dir_all(dest_dir).fs_context("create archive dir", dest_dir)?;
    let name = dir.file_name().and_then(|s| s.to_str()).unwrap_or("world");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = unique_archive_path(dest_dir, &format!("{}_{}", name, ts));

    let file = fs::File::create(&dest).fs_context("create archive", &dest)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(dir) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        let name = rel.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let data = fs::read(path).fs_context("read file", path)?;
            zip.write_all(&data)?;
        }
    }
    zip.finish()?;
    tracing::info!(world = %dir.display(), archive = %dest.display(), "archived world");
    Ok(dest)
}

// Two archives of the same world within one second get a numeric suffix.
fn unique_archive_path(dest_dir: &Path, stem: &str) -> PathBuf {
    let first = dest_dir.join(format!("{}.zip", stem));
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|i| dest_dir.join(format!("{}_{}.zip", stem, i)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}
