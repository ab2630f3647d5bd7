//! Vector Voyage - vector-math puzzle game core
//!
//! Core modules:
//! - `sim`: Deterministic level evaluation (kinematics, scoring, session state)
//! - `progress`: Stars, unlock indices and module gating
//! - `badges`: Career badge requirements
//! - `session`: Level lifecycle orchestration and change events
//! - `persistence`: Save/load of career progress
//! - `settings`: Control tuning

pub mod badges;
pub mod persistence;
pub mod progress;
pub mod session;
pub mod settings;
pub mod sim;

pub use progress::{CareerProgress, ModuleProgress};
pub use session::{GameSession, SessionEvent};
pub use settings::{ControlPreset, Settings};
pub use sim::GameModule;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Stars awarded for any successful submission (flat, not graded)
    pub const SUCCESS_STARS: u32 = 3;
    /// Star count that marks a level as perfect
    pub const PERFECT_STARS: u32 = 3;

    /// Failed attempt counts as a near miss within tolerance * this factor
    pub const NEAR_MISS_TOLERANCE_FACTOR: f32 = 1.5;
    /// ...or when it improves on the session best by at least this fraction
    pub const NEAR_MISS_IMPROVEMENT_RATIO: f32 = 0.35;

    /// Abstract unlock index needed to open each application module
    pub const DRONE_UNLOCK_INDEX: usize = 5;
    pub const BRIDGE_UNLOCK_INDEX: usize = 10;
    pub const ROBOTICS_UNLOCK_INDEX: usize = 15;

    /// Components of a freshly spawned player vector
    pub const DEFAULT_VECTOR: [f32; 3] = [0.0, 0.1, 0.0];
    /// Display color of a freshly spawned player vector
    pub const DEFAULT_VECTOR_COLOR: &str = "#FFD166";

    /// Wind oscillator frequency when a level doesn't specify one
    pub const DEFAULT_WIND_FREQUENCY: f32 = 0.1;
}

/// Component-wise sum of two vectors
#[inline]
pub fn vector_add(a: Vec3, b: Vec3) -> Vec3 {
    a + b
}

/// Component-wise difference `a - b`
#[inline]
pub fn vector_sub(a: Vec3, b: Vec3) -> Vec3 {
    a - b
}

/// Euclidean length sqrt(x² + y² + z²)
#[inline]
pub fn magnitude(v: Vec3) -> f32 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

/// Sum of a sequence of vectors (zero for an empty sequence)
pub fn resultant<I: IntoIterator<Item = Vec3>>(vectors: I) -> Vec3 {
    vectors.into_iter().fold(Vec3::ZERO, vector_add)
}

/// Unit direction of `v`, or zero when `v` has no direction
#[inline]
pub fn direction_or_zero(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}
