//! Continuous vector control
//!
//! Input arrives as explicit per-tick deltas instead of a polled key set, so
//! the adjustment itself is a pure function of (vector, delta, dt).

use glam::{Quat, Vec3};

use crate::magnitude;
use crate::settings::Settings;

/// What a control delta adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAxis {
    /// Grow (+) or shrink (-) the vector
    Length,
    /// Rotate around world +X
    Pitch,
    /// Rotate around world +Y
    Yaw,
    /// Rotate around world +Z
    Roll,
}

impl ControlAxis {
    /// World rotation axis, if this is a rotation
    pub fn rotation_axis(&self) -> Option<Vec3> {
        match self {
            ControlAxis::Length => None,
            ControlAxis::Pitch => Some(Vec3::X),
            ControlAxis::Yaw => Some(Vec3::Y),
            ControlAxis::Roll => Some(Vec3::Z),
        }
    }
}

/// One control input for a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlDelta {
    pub axis: ControlAxis,
    /// Sign of the adjustment (positive grows / rotates counter-clockwise)
    pub direction: f32,
    /// Input strength (1.0 for a held key, fractional for analog input)
    pub magnitude: f32,
}

impl ControlDelta {
    pub fn new(axis: ControlAxis, direction: f32) -> Self {
        Self {
            axis,
            direction,
            magnitude: 1.0,
        }
    }

    pub fn grow() -> Self {
        Self::new(ControlAxis::Length, 1.0)
    }

    pub fn shrink() -> Self {
        Self::new(ControlAxis::Length, -1.0)
    }

    pub fn rotate(axis: ControlAxis, direction: f32) -> Self {
        Self::new(axis, direction)
    }
}

/// Rescale `v` to `length`, keeping its direction (zero stays zero)
fn with_length(v: Vec3, length: f32) -> Vec3 {
    v.normalize_or_zero() * length
}

/// Apply one control delta to a vector
///
/// Speeds come from `settings`, scaled by `dt` and by the precision
/// multiplier when `precision` is held.
pub fn apply_control_delta(
    v: Vec3,
    delta: &ControlDelta,
    dt: f32,
    precision: bool,
    settings: &Settings,
) -> Vec3 {
    let strength = delta.magnitude * delta.direction.signum();
    if delta.direction == 0.0 || strength == 0.0 {
        return v;
    }

    match delta.axis.rotation_axis() {
        None => {
            let step = settings.effective_magnitude_speed(precision) * dt * delta.magnitude;
            let len = magnitude(v);
            if delta.direction > 0.0 {
                if len < settings.min_length {
                    Vec3::new(0.0, settings.regrow_length, 0.0)
                } else {
                    with_length(v, len + step)
                }
            } else if len > step {
                with_length(v, len - step)
            } else {
                with_length(v, settings.shrink_floor)
            }
        }
        Some(axis) => {
            let angle = settings.effective_rotation_speed(precision) * dt * strength;
            Quat::from_axis_angle(axis, angle) * v
        }
    }
}

/// Apply several deltas in order
pub fn apply_control_deltas(
    v: Vec3,
    deltas: &[ControlDelta],
    dt: f32,
    precision: bool,
    settings: &Settings,
) -> Vec3 {
    deltas
        .iter()
        .fold(v, |acc, delta| apply_control_delta(acc, delta, dt, precision, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_grow_extends_along_direction() {
        let settings = Settings::default();
        let v = apply_control_delta(Vec3::new(2.0, 0.0, 0.0), &ControlDelta::grow(), 1.0, false, &settings);
        assert!(approx(v, Vec3::new(4.5, 0.0, 0.0)));
    }

    #[test]
    fn test_precision_slows_growth() {
        let settings = Settings::default();
        let v = apply_control_delta(Vec3::new(2.0, 0.0, 0.0), &ControlDelta::grow(), 1.0, true, &settings);
        assert!(approx(v, Vec3::new(2.625, 0.0, 0.0)));
    }

    #[test]
    fn test_grow_from_near_zero_restarts_upward() {
        let settings = Settings::default();
        let v = apply_control_delta(Vec3::new(0.001, 0.0, 0.0), &ControlDelta::grow(), 0.016, false, &settings);
        assert_eq!(v, Vec3::new(0.0, 0.1, 0.0));
    }

    #[test]
    fn test_shrink_bottoms_out() {
        let settings = Settings::default();
        let v = apply_control_delta(Vec3::new(0.0, 0.5, 0.0), &ControlDelta::shrink(), 1.0, false, &settings);
        assert!(approx(v, Vec3::new(0.0, 0.001, 0.0)));

        let v = apply_control_delta(Vec3::new(0.0, 5.0, 0.0), &ControlDelta::shrink(), 1.0, false, &settings);
        assert!(approx(v, Vec3::new(0.0, 2.5, 0.0)));
    }

    #[test]
    fn test_shrink_zero_vector_stays_zero() {
        let settings = Settings::default();
        let v = apply_control_delta(Vec3::ZERO, &ControlDelta::shrink(), 1.0, false, &settings);
        assert_eq!(v, Vec3::ZERO);
    }

    #[test]
    fn test_yaw_rotates_around_y() {
        let settings = Settings::default();
        // 90 deg/s for one second: +X rotates to -Z around +Y
        let v = apply_control_delta(Vec3::X, &ControlDelta::rotate(ControlAxis::Yaw, 1.0), 1.0, false, &settings);
        assert!(approx(v, Vec3::new(0.0, 0.0, -1.0)));

        let back = apply_control_delta(v, &ControlDelta::rotate(ControlAxis::Yaw, -1.0), 1.0, false, &settings);
        assert!(approx(back, Vec3::X));
    }

    #[test]
    fn test_rotation_preserves_length() {
        let settings = Settings::default();
        let start = Vec3::new(1.0, 2.0, 3.0);
        let deltas = [
            ControlDelta::rotate(ControlAxis::Pitch, 1.0),
            ControlDelta::rotate(ControlAxis::Roll, -1.0),
            ControlDelta::rotate(ControlAxis::Yaw, 1.0),
        ];
        let v = apply_control_deltas(start, &deltas, 0.3, false, &settings);
        assert!((v.length() - start.length()).abs() < 1e-4);
        assert!(!approx(v, start));
    }

    #[test]
    fn test_zero_direction_is_noop() {
        let settings = Settings::default();
        let start = Vec3::new(1.0, 1.0, 0.0);
        let delta = ControlDelta::new(ControlAxis::Roll, 0.0);
        assert_eq!(apply_control_delta(start, &delta, 1.0, false, &settings), start);
    }
}
