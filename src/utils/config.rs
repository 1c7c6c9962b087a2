use crate::types::project::ProjectConfig;
use std::fs;
use std::path::Path;

pub const PROJECT_CONFIG: &str = "kodipack.toml";

/// Loads `kodipack.toml` from the addon directory.
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_project_config(addon_dir: &Path) -> Result<ProjectConfig, String> {
    let path = addon_dir.join(PROJECT_CONFIG);
    if !path.is_file() {
        return Ok(ProjectConfig::default());
    }
    let txt = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&txt).map_err(|e| format!("Invalid {}: {}", PROJECT_CONFIG, e))
}
