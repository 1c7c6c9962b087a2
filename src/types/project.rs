use serde::Deserialize;

/// Optional `kodipack.toml` placed next to `addon.xml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub package: PackageSection,
    #[serde(default)]
    pub install: InstallSection,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstallSection {
    #[serde(default)]
    pub addons_dir: Option<String>,
}
