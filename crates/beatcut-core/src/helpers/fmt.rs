// crates/beatcut-core/src/helpers/fmt.rs
//
// Fixed-precision formatters for FFmpeg filter expressions, plus the
// display-time helpers shared with any host UI.
//
// The export compiler must emit byte-identical graphs for byte-identical
// projects across platforms, so every float that reaches a filter string
// goes through one of these two functions — never through `{}` or `{:?}`.

/// Format a time value (seconds) for a filter expression: fixed 4 decimals.
///
/// ```
/// use beatcut_core::helpers::fmt::ts;
/// assert_eq!(ts(0.0),       "0.0000");
/// assert_eq!(ts(1.15),      "1.1500");
/// assert_eq!(ts(12.34567),  "12.3457");
/// ```
#[inline]
pub fn ts(seconds: f64) -> String {
    format!("{seconds:.4}")
}

/// Format a scalar parameter (scale factor, angle, gain): fixed 6 decimals.
///
/// ```
/// use beatcut_core::helpers::fmt::param;
/// assert_eq!(param(1.1),  "1.100000");
/// assert_eq!(param(0.5),  "0.500000");
/// ```
#[inline]
pub fn param(value: f64) -> String {
    format!("{value:.6}")
}

/// Milliseconds for `adelay`, rounded to the nearest integer.
#[inline]
pub fn millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Round a pixel dimension to the nearest even integer, minimum 2.
///
/// yuv420p subsamples chroma 2×2, so every scaled/cropped dimension the
/// compiler emits must be even.
#[inline]
pub fn even_px(v: f64) -> u32 {
    let r = v.round().max(2.0) as u32;
    r & !1
}

/// Format a duration in seconds as `MM:SS:FF` (frames at 30 fps).
///
/// Used on timeline rulers where frame-level precision matters.
///
/// ```
/// use beatcut_core::helpers::fmt::format_time;
/// assert_eq!(format_time(0.0),  "00:00:00");
/// assert_eq!(format_time(61.5), "01:01:15");
/// ```
pub fn format_time(s: f64) -> String {
    let m  = (s / 60.0) as u32;
    let sc = (s % 60.0) as u32;
    let fr = ((s * 30.0) as u32) % 30;
    format!("{m:02}:{sc:02}:{fr:02}")
}

/// Centisecond timestamp in ASS `H:MM:SS.CC` form.
///
/// ```
/// use beatcut_core::helpers::fmt::ass_time;
/// assert_eq!(ass_time(0.0),    "0:00:00.00");
/// assert_eq!(ass_time(61.25),  "0:01:01.25");
/// assert_eq!(ass_time(3661.0), "1:01:01.00");
/// ```
pub fn ass_time(s: f64) -> String {
    let cs    = (s * 100.0).round() as u64;
    let h     = cs / 360_000;
    let m     = (cs % 360_000) / 6_000;
    let sec   = (cs % 6_000) / 100;
    let centi = cs % 100;
    format!("{h}:{m:02}:{sec:02}.{centi:02}")
}

/// Escape a filesystem path for use inside a `subtitles='…'` filter arg.
///
/// FFmpeg parses the filtergraph twice (option parser, then the filter's
/// own), so Windows backslashes become forward slashes and `:` / `'` get
/// a protecting backslash.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Escape literal text for a `drawtext=text='…'` argument.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}
