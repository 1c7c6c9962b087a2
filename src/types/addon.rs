use serde::Serialize;
use std::path::PathBuf;

/// Fields pulled out of an `addon.xml` opening tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddonDescriptor {
    pub id: String,
    pub version: String,
    pub name: Option<String>,
    pub provider: Option<String>,
}

/// A descriptor together with the directory it was read from.
#[derive(Debug, Clone)]
pub struct AddonSource {
    pub dir: PathBuf,
    pub descriptor: AddonDescriptor,
    /// Raw `addon.xml` text, kept for the repository manifest.
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct PackagedAddon {
    pub descriptor: AddonDescriptor,
    pub archive: PathBuf,
    pub entries: Vec<String>,
    pub manifest_body: String,
}

#[derive(Debug, Clone)]
pub struct ManifestFiles {
    pub manifest: PathBuf,
    pub checksum: PathBuf,
    pub md5: String,
}
