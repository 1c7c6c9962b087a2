use crate::types::addon::ManifestFiles;
use md5::{Digest, Md5};
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE: &str = "addons.xml";
pub const CHECKSUM_FILE: &str = "addons.xml.md5";

const MANIFEST_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Wraps descriptor bodies in the repository `<addons>` envelope.
pub fn render_manifest<S: AsRef<str>>(bodies: &[S]) -> String {
    let mut out = String::new();
    out.push_str(MANIFEST_HEADER);
    out.push('\n');
    out.push_str("<addons>\n");
    for body in bodies {
        let body = body.as_ref().trim();
        if body.is_empty() {
            continue;
        }
        out.push_str(body);
        out.push('\n');
    }
    out.push_str("</addons>\n");
    out
}

pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Writes `addons.xml` and its `addons.xml.md5` sidecar into `out_dir`.
///
/// The checksum is computed over the exact bytes handed to the filesystem,
/// so the sidecar always matches the manifest on disk.
///
/// ### Parameters
/// - `out_dir`: The output directory (created when missing)
/// - `bodies`: Descriptor contents without their XML declaration
///
pub fn write_manifest<S: AsRef<str>>(out_dir: &Path, bodies: &[S]) -> Result<ManifestFiles, String> {
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create output directory: {}", e))?;

    let manifest = out_dir.join(MANIFEST_FILE);
    let checksum = out_dir.join(CHECKSUM_FILE);

    let bytes = render_manifest(bodies).into_bytes();
    fs::write(&manifest, &bytes)
        .map_err(|e| format!("Failed to write {}: {}", manifest.display(), e))?;

    let md5 = md5_hex(&bytes);
    fs::write(&checksum, md5.as_bytes())
        .map_err(|e| format!("Failed to write {}: {}", checksum.display(), e))?;

    Ok(ManifestFiles {
        manifest,
        checksum,
        md5,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_fixed() {
        let xml = render_manifest(&["<addon id=\"a\" version=\"1\"/>"]);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n<addon id=\"a\" version=\"1\"/>\n</addons>\n"
        );
    }

    #[test]
    fn empty_manifest_still_has_envelope() {
        let xml = render_manifest::<&str>(&[]);
        assert!(xml.ends_with("<addons>\n</addons>\n"));
    }

    #[test]
    fn md5_matches_known_digest() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn sidecar_matches_written_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("repo");
        let bodies = vec![
            "<addon id=\"one\" version=\"1.0.0\"></addon>".to_string(),
            "<addon id=\"two\" version=\"2.0.0\"></addon>".to_string(),
        ];

        let files = write_manifest(&out, &bodies).unwrap();
        let on_disk = fs::read(&files.manifest).unwrap();
        let sidecar = fs::read_to_string(&files.checksum).unwrap();

        assert_eq!(sidecar, md5_hex(&on_disk));
        assert_eq!(sidecar, files.md5);
        assert_eq!(sidecar.len(), 32);

        let text = String::from_utf8(on_disk).unwrap();
        let one = text.find("id=\"one\"").unwrap();
        let two = text.find("id=\"two\"").unwrap();
        assert!(one < two);
    }

    #[test]
    fn rewriting_overwrites_previous_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(tmp.path(), &["<addon id=\"old\" version=\"1\"/>"]).unwrap();
        let files = write_manifest(tmp.path(), &["<addon id=\"new\" version=\"2\"/>"]).unwrap();

        let text = fs::read_to_string(&files.manifest).unwrap();
        assert!(!text.contains("old"));
        assert_eq!(
            fs::read_to_string(&files.checksum).unwrap(),
            md5_hex(text.as_bytes())
        );
    }
}
