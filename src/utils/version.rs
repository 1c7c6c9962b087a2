pub const VERSION_ENV: &str = "KODIPACK_CLI_VERSION";

/// Returns the CLI version:
/// 1. KODIPACK_CLI_VERSION env var
/// 2. compile-time env!("CARGO_PKG_VERSION")
pub fn get_version() -> String {
    if let Ok(v) = std::env::var(VERSION_ENV) {
        if !v.trim().is_empty() {
            return v;
        }
    }

    env!("CARGO_PKG_VERSION").to_string()
}
