pub fn get_signature(version: &str) -> String {
    format!(
        r#"
   ┌──────────┐
   │  ▶ KODI  │   📦 Kodipack (addon installer and packager for Kodi)
   │  ░░░░░░  │
   └──┬────┬──┘   v{}
"#,
        version
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_carries_version() {
        assert!(get_signature("1.2.3").contains("v1.2.3"));
    }
}
