use crate::types::addon::{AddonSource, ManifestFiles, PackagedAddon};
use crate::utils::logger::{LogLevel, Logger};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Logs what ended up in a packaged archive: location, size, checksum.
pub fn print_package_summary(packaged: &PackagedAddon) {
    let logger = Logger::new();

    logger.log_message(
        LogLevel::Success,
        &format!(
            "Packaged {} v{} at {}",
            packaged.descriptor.id,
            packaged.descriptor.version,
            packaged.archive.display()
        ),
    );

    let mut archive_lines: Vec<String> = Vec::new();
    archive_lines.push(format!("Path    : {}", packaged.archive.display()));
    match artifact_digest(&packaged.archive) {
        Ok((size, sha)) => {
            archive_lines.push(format!("Size    : {} bytes", size));
            archive_lines.push(format!("SHA256  : {}", sha));
        }
        Err(e) => logger.log_message(
            LogLevel::Warning,
            &format!("Failed to checksum archive: {}", e),
        ),
    }
    archive_lines.push(format!("Entries : {}", packaged.entries.len()));
    let refs: Vec<&str> = archive_lines.iter().map(|s| s.as_str()).collect();
    logger.log_message_with_trace(LogLevel::Info, "📦 Archive", refs);

    let entry_refs: Vec<&str> = packaged.entries.iter().map(|s| s.as_str()).collect();
    logger.log_message_with_trace(LogLevel::Debug, "Archive entries:", entry_refs);
}

pub fn print_manifest_summary(files: &ManifestFiles, addon_count: usize) {
    let lines = [
        format!("Manifest : {}", files.manifest.display()),
        format!("Checksum : {}", files.checksum.display()),
        format!("MD5      : {}", files.md5),
        format!("Addons   : {}", addon_count),
    ];
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    Logger::new().log_message_with_trace(LogLevel::Info, "🧾 Repository manifest", refs);
}

pub fn print_descriptor(source: &AddonSource) {
    let descriptor = &source.descriptor;
    let mut lines: Vec<String> = vec![
        format!("id       : {}", descriptor.id),
        format!("version  : {}", descriptor.version),
    ];
    if let Some(name) = &descriptor.name {
        lines.push(format!("name     : {}", name));
    }
    if let Some(provider) = &descriptor.provider {
        lines.push(format!("provider : {}", provider));
    }
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    Logger::new().log_message_with_trace(
        LogLevel::Info,
        &format!("📋 {}", source.dir.join("addon.xml").display()),
        refs,
    );
}

fn artifact_digest(path: &Path) -> Result<(u64, String), String> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read artifact for sha: {}", e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok((bytes.len() as u64, hex::encode(hasher.finalize())))
}
