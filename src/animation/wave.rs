use crate::foundation::core::{Affine, Point};

const SWING_AMPLITUDE_RAD: f64 = 0.15;
const SWING_RATE: f64 = 2.0;
const SHAKE_AMPLITUDE_RAD: f64 = 0.02;
const SHAKE_RATE: f64 = 20.0;

/// Arm-wave rotation in radians at `t_secs` since the loop started.
///
/// A slow swing, with a small shake added only while the arm is raised (negative swing). The
/// shake is scaled by `sin(2t)^2`, so it fades out at both ends of the raise.
pub fn wave_angle(t_secs: f64) -> f64 {
    let swing = (t_secs * SWING_RATE).sin();
    let base = swing * SWING_AMPLITUDE_RAD;
    if base < 0.0 {
        let shake = (t_secs * SHAKE_RATE).sin() * SHAKE_AMPLITUDE_RAD;
        base + shake * swing * swing
    } else {
        base
    }
}

/// Rotation by [`wave_angle`] about `pivot`.
pub fn wave_transform(t_secs: f64, pivot: Point) -> Affine {
    Affine::rotate_about(wave_angle(t_secs), pivot)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/wave.rs"]
mod tests;
