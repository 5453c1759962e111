use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads a TOML settings file, fills in defaults and validates the result
///
/// Sections and keys missing from the file keep their built-in values, so an
/// empty file is the default configuration.
///
/// # Returns
///
/// * `Ok(Config)` - Settings ready to hand to the crawler
/// * `Err(ConfigError)` - Unreadable file, bad TOML, or rejected values
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    parse_config(&raw)
}

/// SHA-256 of a settings file, hex encoded
///
/// Logged at startup so two mirrors of the same site can be told apart by
/// the settings they were produced with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let raw = std::fs::read(path)?;
    Ok(digest(&raw))
}

/// Like [`load_config`], also returning the hash of the exact bytes parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let config = parse_config(&raw)?;
    Ok((config, digest(raw.as_bytes())))
}

fn parse_config(raw: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw)?;
    validate(&config)?;
    Ok(config)
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
