use crate::types::addon::{AddonDescriptor, AddonSource};
use std::fs;
use std::path::Path;

pub const DESCRIPTOR_FILE: &str = "addon.xml";

/// Reads and parses `<addon_dir>/addon.xml`.
///
/// ### Parameters
/// - `addon_dir`: The addon source directory
///
pub fn read_descriptor(addon_dir: &Path) -> Result<AddonSource, String> {
    let path = addon_dir.join(DESCRIPTOR_FILE);
    if !path.is_file() {
        return Err(format!("addon.xml not found in {}", addon_dir.display()));
    }
    let raw = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let descriptor =
        parse_descriptor(&raw).map_err(|e| format!("{} ({})", e, path.display()))?;
    Ok(AddonSource {
        dir: addon_dir.to_path_buf(),
        descriptor,
        raw,
    })
}

/// Extracts `id`, `version` and, when present, `name` and `provider-name`
/// from the `<addon ...>` opening tag.
pub fn parse_descriptor(text: &str) -> Result<AddonDescriptor, String> {
    let tag = find_addon_tag(text).ok_or_else(|| "No <addon> tag found".to_string())?;

    let id = attribute(tag, "id")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| "Attribute 'id' missing from <addon> tag".to_string())?;
    let version = attribute(tag, "version")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| "Attribute 'version' missing from <addon> tag".to_string())?;

    Ok(AddonDescriptor {
        id: id.trim().to_string(),
        version: version.trim().to_string(),
        name: attribute(tag, "name"),
        provider: attribute(tag, "provider-name"),
    })
}

/// The descriptor without its `<?xml ...?>` declaration, trimmed.
/// This is the fragment that goes inside the repository `<addons>` envelope.
pub fn descriptor_body(text: &str) -> &str {
    let s = text.trim_start_matches('\u{feff}').trim();
    if s.starts_with("<?xml") {
        if let Some(end) = s.find("?>") {
            return s[end + 2..].trim();
        }
    }
    s
}

/// Returns the attribute section of the first `<addon` element, i.e. the text
/// between `<addon` and the closing `>` of the opening tag. Comments are skipped
/// and `<addons>` does not match.
fn find_addon_tag(text: &str) -> Option<&str> {
    let mut pos = 0usize;
    while let Some(idx) = text[pos..].find('<') {
        let start = pos + idx;
        let rest = &text[start..];

        if rest.starts_with("<!--") {
            let close = rest.find("-->")?;
            pos = start + close + 3;
            continue;
        }

        if let Some(after) = rest.strip_prefix("<addon") {
            let boundary = after
                .chars()
                .next()
                .map(|c| c.is_whitespace() || c == '>' || c == '/')
                .unwrap_or(false);
            if boundary {
                let end = tag_end(after)?;
                return Some(after[..end].trim_end_matches('/'));
            }
        }

        pos = start + 1;
    }
    None
}

/// Index of the `>` closing an opening tag, ignoring any `>` inside quoted values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Finds `name="value"` (or single-quoted) inside a tag's attribute text.
/// Names are compared exactly, so `provider-name` never answers for `name`.
fn attribute(tag: &str, name: &str) -> Option<String> {
    attributes(tag)
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| unescape(v))
}

/// Splits a tag's attribute text into `(name, raw value)` pairs. Quoted
/// values are consumed whole, so attribute-looking text inside them is never
/// taken for an attribute.
fn attributes(tag: &str) -> Vec<(&str, &str)> {
    let bytes = tag.as_bytes();
    let mut out: Vec<(&str, &str)> = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = &tag[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            if !name.is_empty() {
                out.push((name, ""));
            }
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => {
                let value_start = i + 1;
                match tag[value_start..].find(q as char) {
                    Some(len) => {
                        i = value_start + len + 1;
                        &tag[value_start..value_start + len]
                    }
                    None => {
                        i = bytes.len();
                        &tag[value_start..]
                    }
                }
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &tag[value_start..i]
            }
        };
        if !name.is_empty() {
            out.push((name, value));
        }
    }
    out
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<addon id="service.upnext" name="Up Next" version="1.1.9+matrix.1" provider-name="im85288, MoojMidge">
  <requires>
    <import addon="xbmc.python" version="3.0.0"/>
  </requires>
  <extension point="xbmc.service" library="service.py"/>
</addon>
"#;

    #[test]
    fn extracts_id_and_version() {
        let d = parse_descriptor(DESCRIPTOR).unwrap();
        assert_eq!(d.id, "service.upnext");
        assert_eq!(d.version, "1.1.9+matrix.1");
        assert_eq!(d.name.as_deref(), Some("Up Next"));
        assert_eq!(d.provider.as_deref(), Some("im85288, MoojMidge"));
    }

    #[test]
    fn ignores_import_versions_and_provider_name() {
        let text = r#"<addon provider-name="someone" version='2.0.0' id='plugin.video.demo'>
<import addon="xbmc.python" version="3.0.0"/></addon>"#;
        let d = parse_descriptor(text).unwrap();
        assert_eq!(d.id, "plugin.video.demo");
        assert_eq!(d.version, "2.0.0");
        assert_eq!(d.name, None);
        assert_eq!(d.provider.as_deref(), Some("someone"));
    }

    #[test]
    fn skips_addons_wrapper_and_comments() {
        let text = r#"<addons>
<!-- <addon id="commented.out" version="0.0.1"> -->
<addon
    id="script.multi.line"
    version="0.3.0">
</addon>
</addons>"#;
        let d = parse_descriptor(text).unwrap();
        assert_eq!(d.id, "script.multi.line");
        assert_eq!(d.version, "0.3.0");
    }

    #[test]
    fn quoted_gt_does_not_end_the_tag() {
        let text = r#"<addon name="a > b" id="x.y" version="1.0.0"></addon>"#;
        let d = parse_descriptor(text).unwrap();
        assert_eq!(d.name.as_deref(), Some("a > b"));
        assert_eq!(d.id, "x.y");
    }

    #[test]
    fn attribute_text_inside_values_is_not_matched() {
        let text = r#"<addon name="a id='b' version='9'" id="c" version="1.0.0"></addon>"#;
        let d = parse_descriptor(text).unwrap();
        assert_eq!(d.id, "c");
        assert_eq!(d.version, "1.0.0");
        assert_eq!(d.name.as_deref(), Some("a id='b' version='9'"));
    }

    #[test]
    fn unescapes_entities() {
        let text = r#"<addon id="x" version="1" name="Tom &amp; Jerry"/>"#;
        let d = parse_descriptor(text).unwrap();
        assert_eq!(d.name.as_deref(), Some("Tom & Jerry"));
    }

    #[test]
    fn missing_attributes_are_errors() {
        let err = parse_descriptor(r#"<addon id="x.y"></addon>"#).unwrap_err();
        assert!(err.contains("version"));

        let err = parse_descriptor(r#"<addon version="1.0.0"></addon>"#).unwrap_err();
        assert!(err.contains("id"));

        let err = parse_descriptor(r#"<addon id="" version="1.0.0"></addon>"#).unwrap_err();
        assert!(err.contains("id"));

        let err = parse_descriptor("<settings/>").unwrap_err();
        assert!(err.contains("No <addon> tag"));
    }

    #[test]
    fn body_drops_declaration() {
        let body = descriptor_body(DESCRIPTOR);
        assert!(body.starts_with("<addon id=\"service.upnext\""));
        assert!(body.ends_with("</addon>"));

        assert_eq!(descriptor_body("  <addon/>\n"), "<addon/>");
    }

    #[test]
    fn read_descriptor_requires_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_descriptor(tmp.path()).unwrap_err();
        assert!(err.starts_with("addon.xml not found"));

        fs::write(tmp.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();
        let src = read_descriptor(tmp.path()).unwrap();
        assert_eq!(src.descriptor.id, "service.upnext");
        assert_eq!(src.raw, DESCRIPTOR);
    }
}
