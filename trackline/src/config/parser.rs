//! INI parsing: `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::defaults::{MAX_KEY_PRECISION, VALID_PROVIDER_TYPES};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("type") {
            let v = v.trim().to_lowercase();
            if !VALID_PROVIDER_TYPES.contains(&v.as_str()) {
                return Err(invalid(
                    "provider",
                    "type",
                    &v,
                    format!("must be one of: {}", VALID_PROVIDER_TYPES.join(", ")),
                ));
            }
            config.provider.provider_type = v;
        }
        if let Some(v) = non_empty(section, "base_url") {
            config.provider.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty(section, "profile") {
            config.provider.profile = v.to_string();
        }
        if let Some(v) = non_empty(section, "api_key") {
            config.provider.api_key = Some(v.to_string());
        }
        if let Some(v) = non_empty(section, "mode") {
            config.provider.mode = v.to_lowercase();
        }
        if let Some(v) = section.get("timeout_secs") {
            let timeout: u64 = parse_number(v, "provider", "timeout_secs")?;
            if timeout == 0 {
                return Err(invalid("provider", "timeout_secs", v, "must be at least 1"));
            }
            config.provider.timeout_secs = timeout;
        }
    }

    // [route] section
    if let Some(section) = ini.section(Some("route")) {
        let route = &mut config.tracking.route;
        if let Some(v) = section.get("ttl_secs") {
            route.ttl = secs(v, "route", "ttl_secs")?;
        }
        if let Some(v) = section.get("purge_horizon_secs") {
            route.purge_horizon = secs(v, "route", "purge_horizon_secs")?;
        }
        if let Some(v) = section.get("throttle_window_ms") {
            route.throttle_window = millis(v, "route", "throttle_window_ms")?;
        }
        if let Some(v) = section.get("key_precision") {
            let precision: u32 = parse_number(v, "route", "key_precision")?;
            if precision > MAX_KEY_PRECISION {
                return Err(invalid(
                    "route",
                    "key_precision",
                    v,
                    format!("must be between 0 and {}", MAX_KEY_PRECISION),
                ));
            }
            route.key_precision = precision;
        }
        if let Some(v) = section.get("min_route_distance_m") {
            route.min_route_distance_m = non_negative(v, "route", "min_route_distance_m")?;
        }
        if let Some(v) = section.get("max_entries") {
            let max: usize = parse_number(v, "route", "max_entries")?;
            if max == 0 {
                return Err(invalid("route", "max_entries", v, "must be at least 1"));
            }
            route.max_entries = max;
        }
        if route.purge_horizon < route.ttl {
            return Err(invalid(
                "route",
                "purge_horizon_secs",
                &route.purge_horizon.as_secs().to_string(),
                "must not be shorter than ttl_secs",
            ));
        }
    }

    // [snap] section
    if let Some(section) = ini.section(Some("snap")) {
        if let Some(v) = section.get("backtrack_tolerance") {
            let tolerance = non_negative(v, "snap", "backtrack_tolerance")?;
            if tolerance > 1.0 {
                return Err(invalid(
                    "snap",
                    "backtrack_tolerance",
                    v,
                    "must be a fraction between 0 and 1",
                ));
            }
            config.tracking.snap.backtrack_tolerance = tolerance;
        }
        if let Some(v) = section.get("overlap_tolerance_m") {
            config.tracking.snap.overlap_tolerance_m =
                non_negative(v, "snap", "overlap_tolerance_m")?;
        }
    }

    // [animation] section
    if let Some(section) = ini.section(Some("animation")) {
        if let Some(v) = section.get("tween_duration_ms") {
            config.tracking.animation.tween_duration = millis(v, "animation", "tween_duration_ms")?;
        }
        if let Some(v) = section.get("frame_interval_ms") {
            let interval = millis(v, "animation", "frame_interval_ms")?;
            if interval.is_zero() {
                return Err(invalid(
                    "animation",
                    "frame_interval_ms",
                    v,
                    "must be at least 1",
                ));
            }
            config.tracking.animation.frame_interval = interval;
        }
    }

    // [session] section
    if let Some(section) = ini.section(Some("session")) {
        let session = &mut config.tracking.session;
        if let Some(v) = section.get("stale_fix_timeout_secs") {
            let timeout = secs(v, "session", "stale_fix_timeout_secs")?;
            if timeout.is_zero() {
                return Err(invalid(
                    "session",
                    "stale_fix_timeout_secs",
                    v,
                    "must be at least 1",
                ));
            }
            session.stale_fix_timeout = timeout;
        }
        if let Some(v) = section.get("off_route_threshold_m") {
            session.off_route_threshold_m = non_negative(v, "session", "off_route_threshold_m")?;
        }
        if let Some(v) = section.get("off_route_fixes") {
            session.off_route_fixes = parse_number(v, "session", "off_route_fixes")?;
        }
        if let Some(v) = section.get("channel_capacity") {
            let capacity: usize = parse_number(v, "session", "channel_capacity")?;
            if capacity == 0 {
                return Err(invalid("session", "channel_capacity", v, "must be at least 1"));
            }
            session.channel_capacity = capacity;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(value: &str, section: &str, key: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn non_negative(value: &str, section: &str, key: &str) -> Result<f64, ConfigFileError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(invalid(section, key, value, "must be a non-negative number")),
    }
}

fn secs(value: &str, section: &str, key: &str) -> Result<Duration, ConfigFileError> {
    parse_number(value, section, key).map(Duration::from_secs)
}

fn millis(value: &str, section: &str, key: &str) -> Result<Duration, ConfigFileError> {
    parse_number(value, section, key).map(Duration::from_millis)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
