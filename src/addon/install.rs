use crate::addon::descriptor;
use crate::utils::{
    config,
    fs as ufs,
    logger::{LogLevel, Logger},
    path,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Links an addon source directory into the Kodi addons directory.
///
/// ### Parameters
/// - `cwd`: The current working directory
/// - `source`: Addon directory (defaults to `cwd`)
/// - `addons_dir`: Kodi addons directory override
///
pub fn install(cwd: &Path, source: Option<&Path>, addons_dir: Option<&Path>) -> Result<(), String> {
    let source_dir = source.map(|s| cwd.join(s)).unwrap_or_else(|| cwd.to_path_buf());
    let project = config::load_project_config(&source_dir)?;
    let addons_dir = path::resolve_addons_dir(addons_dir, &project, &source_dir)?;
    Logger::new().log_message(
        LogLevel::Debug,
        &format!("Kodi addons directory: {}", addons_dir.display()),
    );

    let link = install_addon(&source_dir, &addons_dir)?;
    Logger::new().log_message_with_trace(
        LogLevel::Success,
        &format!("Installed at {}", link.display()),
        vec!["Restart Kodi or reload the addon to pick up the change"],
    );
    Ok(())
}

/// Removes the link previously created by [`install`].
pub fn uninstall(cwd: &Path, source: Option<&Path>, addons_dir: Option<&Path>) -> Result<(), String> {
    let source_dir = source.map(|s| cwd.join(s)).unwrap_or_else(|| cwd.to_path_buf());
    let project = config::load_project_config(&source_dir)?;
    let addons_dir = path::resolve_addons_dir(addons_dir, &project, &source_dir)?;

    match uninstall_addon(&source_dir, &addons_dir)? {
        Some(link) => Logger::new().log_message(
            LogLevel::Success,
            &format!("Removed {}", link.display()),
        ),
        None => Logger::new().log_message(LogLevel::Info, "Addon is not installed, nothing to remove"),
    }
    Ok(())
}

/// Creates `<addons_dir>/<id>` as a symlink to the absolute source directory.
/// Anything already at that path is replaced, so running it twice yields the same link.
pub fn install_addon(source_dir: &Path, addons_dir: &Path) -> Result<PathBuf, String> {
    if !source_dir.is_dir() {
        return Err(format!(
            "Source directory not found: {}",
            source_dir.display()
        ));
    }
    let source = descriptor::read_descriptor(source_dir)?;

    if !addons_dir.is_dir() {
        return Err(format!(
            "Kodi addons directory not found: {}",
            addons_dir.display()
        ));
    }

    let source_abs = fs::canonicalize(source_dir)
        .map_err(|e| format!("Failed to resolve {}: {}", source_dir.display(), e))?;
    let target = addons_dir.join(&source.descriptor.id);

    if !ufs::is_symlink(&target) && target.is_dir() {
        let target_abs = fs::canonicalize(&target)
            .map_err(|e| format!("Failed to resolve {}: {}", target.display(), e))?;
        if target_abs == source_abs {
            return Err(format!(
                "{} is the source directory itself, refusing to replace it",
                target.display()
            ));
        }
    }

    ufs::remove_any(&target)?;
    ufs::symlink_dir(&source_abs, &target).map_err(|e| {
        format!(
            "Failed to create symlink {} -> {}: {}",
            target.display(),
            source_abs.display(),
            e
        )
    })?;
    Ok(target)
}

/// Removes `<addons_dir>/<id>` when it is a symlink. Returns `None` when nothing
/// was installed; a real directory is left alone and reported as an error.
pub fn uninstall_addon(source_dir: &Path, addons_dir: &Path) -> Result<Option<PathBuf>, String> {
    if !source_dir.is_dir() {
        return Err(format!(
            "Source directory not found: {}",
            source_dir.display()
        ));
    }
    let source = descriptor::read_descriptor(source_dir)?;
    let target = addons_dir.join(&source.descriptor.id);

    if ufs::is_symlink(&target) {
        ufs::remove_any(&target)?;
        return Ok(Some(target));
    }
    if target.exists() {
        return Err(format!(
            "{} is not a symlink, refusing to remove it",
            target.display()
        ));
    }
    Ok(None)
}
