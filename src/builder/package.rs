use crate::addon::descriptor::{self, DESCRIPTOR_FILE};
use crate::builder::manifest;
use crate::types::addon::{AddonSource, ManifestFiles, PackagedAddon};
use crate::utils::{
    config,
    fs as ufs,
    logger::{LogLevel, Logger},
    path, spinner,
};
use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

/// Files and directories shipped when the project config has no `[package].include`.
pub const DEFAULT_INCLUDE: &[&str] = &[
    "addon.xml",
    "LICENSE",
    "LICENSE.txt",
    "README.md",
    "changelog.txt",
    "default.py",
    "service.py",
    "resources",
];

pub const STAGING_DIR: &str = ".staging";

/// Packages every addon in `sources`, then writes one `addons.xml` covering
/// all of them plus its md5 sidecar.
///
/// ### Parameters
/// - `sources`: Addon directories, relative to `cwd` or absolute. Empty means `cwd`.
/// - `out`: Output directory override
/// - `cwd`: The current working directory
/// - `keep_staging`: Leave the staging copy on disk
///
pub fn package_all(
    sources: &[PathBuf],
    out: Option<&Path>,
    cwd: &Path,
    keep_staging: bool,
) -> Result<(), String> {
    let sources: Vec<PathBuf> = if sources.is_empty() {
        vec![cwd.to_path_buf()]
    } else {
        sources.iter().map(|s| cwd.join(s)).collect()
    };

    // The output directory is shared by the whole batch, so only the first
    // addon's config gets a say in it.
    let first_config = config::load_project_config(&sources[0])?;
    let out_dir = path::resolve_output_dir(out, &first_config, cwd);

    let total = sources.len();
    let mut packaged: Vec<PackagedAddon> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    // descriptors first: a repeated id is rejected before any archive is written
    let mut accepted: Vec<AddonSource> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    for source in &sources {
        let label = source.to_string_lossy().to_string();
        match read_source(source) {
            Ok(s) => {
                if !seen_ids.insert(s.descriptor.id.clone()) {
                    errors.push(format!(
                        "{} -> addon id '{}' appears more than once",
                        label, s.descriptor.id
                    ));
                    continue;
                }
                accepted.push(s);
            }
            Err(e) => errors.push(format!("{} -> {}", label, e)),
        }
    }

    for source in accepted {
        let label = source.dir.to_string_lossy().to_string();
        match package_source(source, &out_dir, keep_staging) {
            Ok(p) => {
                crate::addon::summary::print_package_summary(&p);
                packaged.push(p);
            }
            Err(e) => errors.push(format!("{} -> {}", label, e)),
        }
    }

    if packaged.is_empty() {
        return Err(format!(
            "No addon packaged ({}/{} failed):\n - {}",
            errors.len(),
            total,
            errors.join("\n - ")
        ));
    }

    let bodies: Vec<&str> = packaged.iter().map(|p| p.manifest_body.as_str()).collect();
    let files = spinner::run_step(
        &format!("Writing {}", manifest::MANIFEST_FILE),
        |f: &ManifestFiles| format!("Manifest written: {}", f.manifest.display()),
        || manifest::write_manifest(&out_dir, &bodies),
    )?;
    crate::addon::summary::print_manifest_summary(&files, packaged.len());

    if errors.is_empty() {
        if total > 1 {
            Logger::new().log_message(
                LogLevel::Success,
                &format!("Package complete: {} addon(s) packaged", total),
            );
        }
        Ok(())
    } else {
        Err(format!(
            "Some addons failed ({}/{}):\n - {}",
            errors.len(),
            total,
            errors.join("\n - ")
        ))
    }
}

/// Stages the allowlisted content of one addon and compresses it into
/// `<out_dir>/<id>-<version>.zip`.
///
/// ### Parameters
/// - `addon_dir`: The addon source directory (must contain addon.xml)
/// - `out_dir`: Where the archive is written
/// - `keep_staging`: Leave `<out_dir>/.staging/<id>` behind
///
pub fn package_addon(
    addon_dir: &Path,
    out_dir: &Path,
    keep_staging: bool,
) -> Result<PackagedAddon, String> {
    let source = read_source(addon_dir)?;
    package_source(source, out_dir, keep_staging)
}

fn read_source(addon_dir: &Path) -> Result<AddonSource, String> {
    if !addon_dir.is_dir() {
        return Err(format!(
            "Source directory not found: {}",
            addon_dir.display()
        ));
    }

    spinner::run_step(
        &format!("Reading {} in {}", DESCRIPTOR_FILE, addon_dir.display()),
        |s: &AddonSource| format!("Found {} v{}", s.descriptor.id, s.descriptor.version),
        || descriptor::read_descriptor(addon_dir),
    )
}

fn package_source(
    source: AddonSource,
    out_dir: &Path,
    keep_staging: bool,
) -> Result<PackagedAddon, String> {
    let addon_dir = source.dir.as_path();
    let id = source.descriptor.id.clone();
    let version = source.descriptor.version.clone();

    let project = config::load_project_config(addon_dir)?;
    let include = include_list(project.package.include.as_deref())?;
    Logger::new().log_message(
        LogLevel::Debug,
        &format!("Allowlist for {}: {}", id, include.join(", ")),
    );

    fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create output directory: {}", e))?;

    let staging_root = out_dir.join(STAGING_DIR);
    let staging = staging_root.join(&id);

    spinner::run_step(
        &format!("Staging {}", id),
        |copied: &Vec<String>| format!("Staged {} item(s)", copied.len()),
        || stage_addon(addon_dir, &staging, &include),
    )?;

    let out_file = out_dir.join(format!("{}-{}.zip", id, version));
    let entries = spinner::run_step(
        &format!(
            "Packaging artifact {}",
            out_file
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("archive")
        ),
        |entries: &Vec<String>| format!("Archive created ({} files)", entries.len()),
        || create_addon_zip(&staging, &id, &out_file),
    );

    if !keep_staging {
        ufs::remove_any(&staging)?;
        // other addons of the same batch may still own the staging root
        let _ = fs::remove_dir(&staging_root);
    }

    Ok(PackagedAddon {
        manifest_body: descriptor::descriptor_body(&source.raw).to_string(),
        descriptor: source.descriptor,
        archive: out_file,
        entries: entries?,
    })
}

/// Builds the effective allowlist: configured entries (or the defaults),
/// always led by `addon.xml`, deduplicated, and confined to the addon directory.
fn include_list(configured: Option<&[String]>) -> Result<Vec<String>, String> {
    let raw: Vec<String> = match configured {
        Some(list) => list.to_vec(),
        None => DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
    };

    let mut out: Vec<String> = vec![DESCRIPTOR_FILE.to_string()];
    for entry in raw {
        let unix = ufs::to_unix_string(entry.trim());
        let mut segments: Vec<&str> = Vec::new();
        for c in Path::new(&unix).components() {
            match c {
                Component::CurDir => {}
                Component::Normal(seg) => segments.push(seg.to_str().unwrap_or_default()),
                _ => {
                    return Err(format!(
                        "Include entry '{}' must be a relative path inside the addon directory",
                        entry
                    ));
                }
            }
        }
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(format!(
                "Include entry '{}' does not name anything inside the addon directory",
                entry
            ));
        }
        let entry = segments.join("/");
        if !out.contains(&entry) {
            out.push(entry);
        }
    }
    Ok(out)
}

/// Copies each allowlist entry from `addon_dir` into a fresh `staging` directory.
/// `addon.xml` must exist; any other missing entry is skipped with a warning.
fn stage_addon(addon_dir: &Path, staging: &Path, include: &[String]) -> Result<Vec<String>, String> {
    ufs::remove_any(staging)?;
    fs::create_dir_all(staging)
        .map_err(|e| format!("Failed to create staging directory: {}", e))?;

    let mut copied: Vec<String> = Vec::new();
    for entry in include {
        let from = addon_dir.join(entry);
        let to = staging.join(entry);

        if !from.exists() {
            if entry == DESCRIPTOR_FILE {
                return Err(format!("addon.xml not found in {}", addon_dir.display()));
            }
            Logger::new().log_message(
                LogLevel::Warning,
                &format!("Skipping missing entry: {}", entry),
            );
            continue;
        }

        let parent = to.parent().unwrap_or(staging);
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;

        if from.is_dir() {
            let mut options = fs_extra::dir::CopyOptions::new();
            options.overwrite = true;
            fs_extra::dir::copy(&from, parent, &options)
                .map_err(|e| format!("Failed to copy {}: {}", entry, e))?;
        } else {
            let mut options = fs_extra::file::CopyOptions::new();
            options.overwrite = true;
            fs_extra::file::copy(&from, &to, &options)
                .map_err(|e| format!("Failed to copy {}: {}", entry, e))?;
        }
        copied.push(entry.clone());
    }
    Ok(copied)
}

/// Zips the staging directory with every entry rooted under `<id>/`.
/// The archive is written next to `out_zip` as `<name>.tmp` and renamed into
/// place once finished; on failure the previous archive is left untouched.
///
/// ### Parameters
/// - `staging`: The staged addon directory
/// - `id`: The addon id, used as archive root folder
/// - `out_zip`: The output archive path (replaced if present)
///
fn create_addon_zip(staging: &Path, id: &str, out_zip: &Path) -> Result<Vec<String>, String> {
    let tmp = out_zip.with_extension("zip.tmp");
    ufs::remove_any(&tmp)?;

    let entries = match write_addon_zip(staging, id, &tmp) {
        Ok(entries) => entries,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
    };

    fs::rename(&tmp, out_zip).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        format!("Failed to move archive into place {}: {}", out_zip.display(), e)
    })?;
    Ok(entries)
}

fn write_addon_zip(staging: &Path, id: &str, zip_file: &Path) -> Result<Vec<String>, String> {
    let files = ufs::walk_files(staging)?;

    let file =
        fs::File::create(zip_file).map_err(|e| format!("Failed to create output file: {}", e))?;
    let mut zip = zip::ZipWriter::new(file);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut dirs_added: HashSet<String> = HashSet::new();
    let root = format!("{}/", id);
    zip.add_directory(root.clone(), options)
        .map_err(|e| format!("Failed to add {}: {}", root, e))?;
    dirs_added.insert(root);

    let mut entries: Vec<String> = Vec::new();
    for p in files {
        let rel = ufs::path_relative_to(&p, staging).ok_or_else(|| {
            format!("{} is outside the staging directory", p.display())
        })?;
        let rel = ufs::to_unix_string(&rel);

        // parent directory entries, outermost first
        let mut prefix = String::new();
        let segments: Vec<&str> = rel.split('/').collect();
        for seg in &segments[..segments.len().saturating_sub(1)] {
            prefix.push_str(seg);
            prefix.push('/');
            let dir_name = format!("{}/{}", id, prefix);
            if dirs_added.insert(dir_name.clone()) {
                zip.add_directory(dir_name.clone(), options)
                    .map_err(|e| format!("Failed to add {}: {}", dir_name, e))?;
            }
        }

        let mut data = Vec::new();
        fs::File::open(&p)
            .and_then(|mut f| f.read_to_end(&mut data))
            .map_err(|e| format!("Failed to read {}: {}", p.display(), e))?;

        let zip_path = format!("{}/{}", id, rel);
        zip.start_file(zip_path.clone(), options)
            .map_err(|e| format!("Failed to add {}: {}", zip_path, e))?;
        zip.write_all(&data)
            .map_err(|e| format!("Failed to write {}: {}", zip_path, e))?;
        entries.push(zip_path);
    }

    zip.finish()
        .map_err(|e| format!("Failed to finalize zip: {}", e))?;
    Ok(entries)
}
