use assert_cmd::Command;
use md5::{Digest, Md5};
use std::fs;
use std::path::Path;

const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<addon id="service.upnext" name="Up Next" version="1.1.9" provider-name="im85288">
  <extension point="xbmc.service" library="service.py"/>
</addon>
"#;

fn write_addon(dir: &Path) {
    fs::create_dir_all(dir.join("resources/lib")).unwrap();
    fs::write(dir.join("addon.xml"), DESCRIPTOR).unwrap();
    fs::write(dir.join("service.py"), "import resources.lib\n").unwrap();
    fs::write(dir.join("resources/lib/state.py"), "STATE = {}\n").unwrap();
}

fn kodipack(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kodipack").unwrap();
    cmd.current_dir(cwd)
        .env_remove("KODIPACK_ADDONS_DIR")
        .env_remove("KODI_HOME")
        .env_remove("KODIPACK_DEBUG");
    cmd
}

#[test]
fn package_writes_zip_manifest_and_checksum() {
    let tmp = tempfile::tempdir().unwrap();
    write_addon(tmp.path());

    kodipack(tmp.path()).arg("package").assert().success();

    let dist = tmp.path().join("dist");
    assert!(dist.join("service.upnext-1.1.9.zip").is_file());
    assert!(!dist.join(".staging").exists());

    let manifest = fs::read(dist.join("addons.xml")).unwrap();
    let text = String::from_utf8(manifest.clone()).unwrap();
    assert!(text.starts_with(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<addons>\n<addon id=\"service.upnext\""
    ));
    assert!(text.ends_with("</addon>\n</addons>\n"));

    let mut hasher = Md5::new();
    hasher.update(&manifest);
    let expected = hex::encode(hasher.finalize());
    assert_eq!(
        fs::read_to_string(dist.join("addons.xml.md5")).unwrap(),
        expected
    );
}

#[test]
fn package_without_descriptor_exits_one() {
    let tmp = tempfile::tempdir().unwrap();
    kodipack(tmp.path()).arg("package").assert().code(1);
    assert!(!tmp.path().join("dist/addons.xml").exists());
}

#[test]
fn package_honours_out_flag() {
    let tmp = tempfile::tempdir().unwrap();
    write_addon(&tmp.path().join("upnext"));

    kodipack(tmp.path())
        .args(["package", "upnext", "--out", "repo", "--keep-staging"])
        .assert()
        .success();

    let repo = tmp.path().join("repo");
    assert!(repo.join("service.upnext-1.1.9.zip").is_file());
    assert!(repo.join("addons.xml").is_file());
    assert!(repo.join(".staging/service.upnext/service.py").is_file());
}

#[cfg(unix)]
#[test]
fn install_links_and_can_be_rerun() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("upnext");
    let addons = tmp.path().join("kodi/addons");
    write_addon(&src);
    fs::create_dir_all(&addons).unwrap();

    for _ in 0..2 {
        kodipack(&src)
            .arg("install")
            .arg("--addons-dir")
            .arg(&addons)
            .assert()
            .success();
    }

    let link = addons.join("service.upnext");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), fs::canonicalize(&src).unwrap());

    kodipack(&src)
        .arg("uninstall")
        .arg("--addons-dir")
        .arg(&addons)
        .assert()
        .success();
    assert!(fs::symlink_metadata(&link).is_err());
}

#[cfg(unix)]
#[test]
fn install_reads_addons_dir_from_environment() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("upnext");
    let kodi_home = tmp.path().join("portable_data");
    write_addon(&src);
    fs::create_dir_all(kodi_home.join("addons")).unwrap();

    kodipack(&src)
        .env("KODI_HOME", &kodi_home)
        .arg("install")
        .assert()
        .success();

    assert!(kodi_home.join("addons/service.upnext/addon.xml").is_file());
}

#[cfg(unix)]
#[test]
fn install_exits_one_when_link_cannot_be_created() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("upnext");
    let addons = tmp.path().join("addons");
    write_addon(&src);
    fs::create_dir_all(&addons).unwrap();
    fs::set_permissions(&addons, fs::Permissions::from_mode(0o555)).unwrap();

    // permission bits do not bind a privileged user
    if fs::write(addons.join("check"), "").is_ok() {
        fs::set_permissions(&addons, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let assert = kodipack(&src)
        .arg("install")
        .arg("--addons-dir")
        .arg(&addons)
        .assert();
    fs::set_permissions(&addons, fs::Permissions::from_mode(0o755)).unwrap();

    let output = assert.code(1).get_output().clone();
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Failed to create symlink"));
}

#[test]
fn install_fails_when_addons_dir_missing() {
    let tmp = tempfile::tempdir().unwrap();
    write_addon(tmp.path());

    kodipack(tmp.path())
        .arg("install")
        .arg("--addons-dir")
        .arg(tmp.path().join("missing"))
        .assert()
        .code(1);
}

#[test]
fn install_fails_when_source_missing() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("addons")).unwrap();

    kodipack(tmp.path())
        .args(["install", "--source", "nowhere", "--addons-dir", "addons"])
        .assert()
        .code(1);
}

#[test]
fn info_prints_descriptor_as_json() {
    let tmp = tempfile::tempdir().unwrap();
    write_addon(tmp.path());

    let out = kodipack(tmp.path())
        .args(["info", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["id"], "service.upnext");
    assert_eq!(value["version"], "1.1.9");
    assert_eq!(value["name"], "Up Next");
    assert_eq!(value["provider"], "im85288");
}
