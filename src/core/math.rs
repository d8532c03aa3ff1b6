// Math utilities and helper functions

use glam::Vec2;

/// Clamp a value into the normalized [0, 1] range
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Normalize a vector in place and return its original length.
/// A zero vector is left untouched and reports a length of 0.
pub fn normalize_mag(v: &mut Vec2) -> f32 {
    let length = v.length();
    if length > 0.0 {
        *v /= length;
    }
    length
}

/// Returns true when the clock crossed a multiple of `interval` during the
/// last `dt` seconds.
pub fn time_increment_passed(interval: f32, time: f32, dt: f32) -> bool {
    if interval <= 0.0 {
        return true;
    }
    (time / interval).floor() != ((time - dt) / interval).floor()
}
