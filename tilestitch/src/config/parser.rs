//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::str::FromStr;

use super::defaults::clamp_http_timeout;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::output::OutputFormat;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [http] section
    if let Some(section) = ini.section(Some("http")) {
        if let Some(v) = section.get("timeout") {
            let timeout = parse_value("http", "timeout", v, "must be a positive integer (seconds)")?;
            config.http.timeout = clamp_http_timeout(timeout);
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.http.user_agent = v.to_string();
            }
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("tile_size") {
            let size: u32 = parse_value("output", "tile_size", v, "must be a positive integer")?;
            if size == 0 {
                return Err(invalid("output", "tile_size", v, "must be a positive integer"));
            }
            config.output.tile_size = size;
        }
        if let Some(v) = section.get("format") {
            config.output.format = v
                .parse::<OutputFormat>()
                .map_err(|_| invalid("output", "format", v, "must be 'png' or 'geotiff'"))?;
        }
        if let Some(v) = section.get("worldfile") {
            config.output.worldfile = parse_bool("output", "worldfile", v)?;
        }
    }

    // [limits] section
    if let Some(section) = ini.section(Some("limits")) {
        if let Some(v) = section.get("max_pixels") {
            let max: u64 = parse_value("limits", "max_pixels", v, "must be a positive integer")?;
            if max == 0 {
                return Err(invalid("limits", "max_pixels", v, "must be a positive integer"));
            }
            config.limits.max_pixels = max;
        }
        if let Some(v) = section.get("max_failure_ratio") {
            let ratio: f64 = parse_value(
                "limits",
                "max_failure_ratio",
                v,
                "must be a number between 0 and 1",
            )?;
            if !(0.0..=1.0).contains(&ratio) {
                return Err(invalid(
                    "limits",
                    "max_failure_ratio",
                    v,
                    "must be a number between 0 and 1",
                ));
            }
            config.limits.max_failure_ratio = ratio;
        }
        if let Some(v) = section.get("deadline") {
            let secs: u64 = parse_value(
                "limits",
                "deadline",
                v,
                "must be a non-negative integer (seconds, 0 = none)",
            )?;
            config.limits.deadline = (secs > 0).then_some(secs);
        }
    }

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.bind = v.to_string();
            }
        }
        if let Some(v) = section.get("port") {
            config.server.port = parse_value("server", "port", v, "must be a port number (1-65535)")?;
            if config.server.port == 0 {
                return Err(invalid("server", "port", v, "must be a port number (1-65535)"));
            }
        }
        if let Some(v) = section.get("request_timeout") {
            let secs: u64 = parse_value(
                "server",
                "request_timeout",
                v,
                "must be a positive integer (seconds)",
            )?;
            if secs == 0 {
                return Err(invalid(
                    "server",
                    "request_timeout",
                    v,
                    "must be a positive integer (seconds)",
                ));
            }
            config.server.request_timeout = secs;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}
