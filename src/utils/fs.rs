use std::fs;
use std::path::{Path, PathBuf};

pub fn get_cwd() -> Result<PathBuf, String> {
    std::env::current_dir().map_err(|e| format!("Failed to get current working directory: {}", e))
}

pub fn get_user_home() -> Result<PathBuf, String> {
    dirs::home_dir().ok_or_else(|| "Failed to get user home directory".to_string())
}

/// Collects every regular file below `root`. Symlinked directories are not followed.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(dir) = stack.pop() {
        let rd = fs::read_dir(&dir)
            .map_err(|e| format!("Failed to read directory {}: {}", dir.display(), e))?;
        for entry in rd.flatten() {
            let p = entry.path();
            let is_link = entry
                .file_type()
                .map(|t| t.is_symlink())
                .unwrap_or(false);
            if p.is_dir() && !is_link {
                stack.push(p);
            } else if p.is_file() {
                files.push(p);
            }
        }
    }
    files.sort();
    Ok(files)
}

pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(base).ok()?;
    Some(rel.to_path_buf())
}

pub fn to_unix_string<P: AsRef<Path>>(p: P) -> String {
    let s = p.as_ref().to_string_lossy().into_owned();
    s.replace('\\', "/")
}

/// Removes whatever sits at `path`: a symlink (to anything), a file or a directory tree.
/// A missing path is not an error.
pub fn remove_any(path: &Path) -> Result<(), String> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(format!("Failed to stat {}: {}", path.display(), e)),
    };

    let res = if meta.file_type().is_symlink() {
        remove_symlink(path)
    } else if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    res.map_err(|e| format!("Failed to remove {}: {}", path.display(), e))
}

pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(unix)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    // directory symlinks and junctions need remove_dir on windows
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

#[cfg(unix)]
pub fn symlink_dir(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
pub fn symlink_dir(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(original, link)
}
