//! Per-request clip parameters and their clamping rules.
//!
//! Out-of-range values clamp to the nearest bound; non-numeric values fall
//! back to the default. Requests are never rejected over a bad number.

pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 90;
pub const DEFAULT_DURATION_SECS: u32 = 10;

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 60;
pub const DEFAULT_FPS: u32 = 30;

pub const MIN_DIMENSION: u32 = 2;
pub const MAX_DIMENSION: u32 = 4096;

/// Configured fallback dimensions for requests that omit width/height.
#[derive(Clone, Copy, Debug)]
pub struct ClipDefaults {
    pub width: u32,
    pub height: u32,
}

/// Resolved media parameters for one encode request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ClipParams {
    pub duration_secs: u32,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

fn clamp_or(raw: Option<&str>, default: u32, min: u32, max: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

/// The encoder's default pixel format requires even dimensions.
fn round_up_to_even(value: u32) -> u32 {
    value + (value & 1)
}

impl ClipParams {
    /// Resolve raw query-string values into clamped parameters.
    pub fn resolve(
        duration: Option<&str>,
        fps: Option<&str>,
        width: Option<&str>,
        height: Option<&str>,
        defaults: ClipDefaults,
    ) -> Self {
        ClipParams {
            duration_secs: clamp_or(
                duration,
                DEFAULT_DURATION_SECS,
                MIN_DURATION_SECS,
                MAX_DURATION_SECS,
            ),
            fps: clamp_or(fps, DEFAULT_FPS, MIN_FPS, MAX_FPS),
            width: round_up_to_even(clamp_or(
                width,
                defaults.width,
                MIN_DIMENSION,
                MAX_DIMENSION,
            )),
            height: round_up_to_even(clamp_or(
                height,
                defaults.height,
                MIN_DIMENSION,
                MAX_DIMENSION,
            )),
        }
    }

    /// Clamp an intro duration into `[0, max_secs]`. The upper bound is a
    /// configuration value, not a hard-coded limit.
    pub fn clamp_intro_duration(raw: Option<&str>, max_secs: u32) -> u32 {
        raw.and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0)
            .min(max_secs)
    }
}
