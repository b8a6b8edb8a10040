//! INI serialization: `ConfigFile` → commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let provider = &config.provider;
    let route = &config.tracking.route;
    let snap = &config.tracking.snap;
    let animation = &config.tracking.animation;
    let session = &config.tracking.session;
    let api_key = provider.api_key.as_deref().unwrap_or("");

    format!(
        r#"[provider]
; Routing provider:
;   osrm     - OSRM route service (self-hosted or the public demo server)
;   google   - Google Directions API (requires API key)
;   straight - straight line between the endpoints, no network access
type = {}
; OSRM server URL and profile (type = osrm)
base_url = {}
profile = {}
; Google Maps Platform API key and travel mode (type = google)
api_key = {}
mode = {}
; HTTP timeout for route requests
timeout_secs = {}

[route]
; Cached routes are reused for this long
ttl_secs = {}
; Entries older than this are purged on insert (must be >= ttl_secs)
purge_horizon_secs = {}
; Repeat requests for one route within this window share a single call
throttle_window_ms = {}
; Decimal places used to round endpoints into route keys (4 is about 11 m)
key_precision = {}
; Endpoints closer than this need no route
min_route_distance_m = {}
max_entries = {}

[snap]
; Backward movement below this fraction of the route is treated as GPS noise
backtrack_tolerance = {}
; Candidate band for overlapping route segments, in metres
overlap_tolerance_m = {}

[animation]
tween_duration_ms = {}
frame_interval_ms = {}

[session]
; Ask for the current position after this long without a fix
stale_fix_timeout_secs = {}
; Reroute after off_route_fixes consecutive fixes further than this from the route
off_route_threshold_m = {}
; Set to 0 to disable rerouting
off_route_fixes = {}
channel_capacity = {}

[logging]
directory = {}
file = {}
"#,
        provider.provider_type,
        provider.base_url,
        provider.profile,
        api_key,
        provider.mode,
        provider.timeout_secs,
        route.ttl.as_secs(),
        route.purge_horizon.as_secs(),
        route.throttle_window.as_millis(),
        route.key_precision,
        route.min_route_distance_m,
        route.max_entries,
        snap.backtrack_tolerance,
        snap.overlap_tolerance_m,
        animation.tween_duration.as_millis(),
        animation.frame_interval.as_millis(),
        session.stale_fix_timeout.as_secs(),
        session.off_route_threshold_m,
        session.off_route_fixes,
        session.channel_capacity,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
