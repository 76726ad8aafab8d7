// Package identity baked in at build time, logged once at startup

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// "name version", e.g. for the startup log line.
pub fn banner() -> String {
    format!("{} {}", NAME, VERSION)
}
