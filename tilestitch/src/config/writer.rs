//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let deadline = config.limits.deadline.unwrap_or(0);

    format!(
        r#"[http]
; Timeout for a single tile request, in seconds (default: 30)
timeout = {}
; User-Agent sent to tile servers. A User-Agent passed with --header
; overrides this for one run.
user_agent = {}

[output]
; Edge length of the tile server's tiles in pixels (default: 256)
tile_size = {}
; Output format:
;   png     - PNG image (default)
;   geotiff - accepted, but written as PNG with a warning
format = {}
; Write a .pnw world file next to the image (default: false)
worldfile = {}

[limits]
; Largest output image accepted, in pixels (default: 100000000 = 10000x10000)
max_pixels = {}
; Share of tiles allowed to fail before the stitch is rejected (default: 0.5)
max_failure_ratio = {}
; Deadline for a whole stitch, in seconds. 0 disables it (default: 0)
deadline = {}

[server]
; Address and port for `tilestitch serve`
bind = {}
port = {}
; Deadline for one API stitch request, in seconds (default: 30)
request_timeout = {}
"#,
        config.http.timeout,
        config.http.user_agent,
        config.output.tile_size,
        config.output.format,
        config.output.worldfile,
        config.limits.max_pixels,
        config.limits.max_failure_ratio,
        deadline,
        config.server.bind,
        config.server.port,
        config.server.request_timeout,
    )
}
