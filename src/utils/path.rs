use crate::types::project::ProjectConfig;
use crate::utils::fs::get_user_home;
use std::env;
use std::path::{Path, PathBuf};

pub const ADDONS_DIR_ENV: &str = "KODIPACK_ADDONS_DIR";
pub const KODI_HOME_ENV: &str = "KODI_HOME";
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Resolves the Kodi addons directory an addon gets linked into.
///
/// Precedence: explicit flag, `KODIPACK_ADDONS_DIR`, `[install].addons_dir`
/// from the project config (relative to the addon directory), `$KODI_HOME/addons`,
/// then the platform default.
pub fn resolve_addons_dir(
    flag: Option<&Path>,
    config: &ProjectConfig,
    addon_dir: &Path,
) -> Result<PathBuf, String> {
    if let Some(p) = flag {
        return Ok(p.to_path_buf());
    }
    if let Some(p) = non_empty_env(ADDONS_DIR_ENV) {
        return Ok(expand_home(&p));
    }
    if let Some(p) = config.install.addons_dir.as_deref() {
        let expanded = expand_home(p);
        return Ok(if expanded.is_absolute() {
            expanded
        } else {
            addon_dir.join(expanded)
        });
    }
    if let Some(home) = non_empty_env(KODI_HOME_ENV) {
        return Ok(expand_home(&home).join("addons"));
    }
    default_addons_dir()
}

/// Resolves where packaged artifacts are written: flag, then
/// `[package].output` (relative to `cwd`), then `<cwd>/dist`.
pub fn resolve_output_dir(flag: Option<&Path>, config: &ProjectConfig, cwd: &Path) -> PathBuf {
    match (flag, config.package.output.as_deref()) {
        (Some(p), _) => cwd.join(p),
        (None, Some(p)) => cwd.join(expand_home(p)),
        (None, None) => cwd.join(DEFAULT_OUTPUT_DIR),
    }
}

#[cfg(target_os = "macos")]
fn default_addons_dir() -> Result<PathBuf, String> {
    Ok(get_user_home()?
        .join("Library")
        .join("Application Support")
        .join("Kodi")
        .join("addons"))
}

#[cfg(target_os = "windows")]
fn default_addons_dir() -> Result<PathBuf, String> {
    let roaming = dirs::data_dir().ok_or_else(|| "Failed to locate %APPDATA%".to_string())?;
    Ok(roaming.join("Kodi").join("addons"))
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_addons_dir() -> Result<PathBuf, String> {
    Ok(get_user_home()?.join(".kodi").join("addons"))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Expands a leading `~/` to the user's home directory.
pub fn expand_home(p: &str) -> PathBuf {
    if p == "~" {
        if let Ok(home) = get_user_home() {
            return home;
        }
    }
    if let Some(rest) = p.strip_prefix("~/") {
        if let Ok(home) = get_user_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(p)
}
