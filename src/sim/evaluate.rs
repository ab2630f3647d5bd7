//! Submission scoring
//!
//! Every module follows the same skeleton: build a module-specific resultant,
//! measure the error against the target, then fold in module violations.
//! Near-miss classification only changes feedback, never success.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::kinematics::{joint_limits_violated, total_load};
use super::level::{BridgeLevel, DroneLevel, LevelConfig, ModuleLevel, RoboticsLevel};
use super::state::{BridgeState, DroneState, ModuleState, RoboticsState, VectorData};
use crate::consts::{NEAR_MISS_IMPROVEMENT_RATIO, NEAR_MISS_TOLERANCE_FACTOR};
use crate::{magnitude, resultant, vector_add, vector_sub};

/// Module-specific feedback attached to a submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModuleFlags {
    Abstract,
    Drone {
        battery_depleted: bool,
        /// Energy the attempted thrust would consume
        battery_used: f32,
    },
    Bridge {
        budget_exceeded: bool,
    },
    Robotics {
        joint_limit_violation: bool,
    },
}

impl ModuleFlags {
    /// Whether a module rule was broken (forces failure)
    pub fn has_violation(&self) -> bool {
        match *self {
            ModuleFlags::Abstract => false,
            ModuleFlags::Drone {
                battery_depleted, ..
            } => battery_depleted,
            ModuleFlags::Bridge { budget_exceeded } => budget_exceeded,
            ModuleFlags::Robotics {
                joint_limit_violation,
            } => joint_limit_violation,
        }
    }
}

/// Outcome of a submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub success: bool,
    pub error_vector: Vec3,
    pub magnitude_error: f32,
    pub is_near_miss: bool,
    pub flags: ModuleFlags,
}

impl SubmitResult {
    pub fn battery_depleted(&self) -> bool {
        matches!(
            self.flags,
            ModuleFlags::Drone {
                battery_depleted: true,
                ..
            }
        )
    }

    pub fn budget_exceeded(&self) -> bool {
        matches!(
            self.flags,
            ModuleFlags::Bridge {
                budget_exceeded: true
            }
        )
    }

    pub fn joint_limit_violation(&self) -> bool {
        matches!(
            self.flags,
            ModuleFlags::Robotics {
                joint_limit_violation: true
            }
        )
    }
}

/// Near-miss heuristic for a failed attempt
///
/// Close if within `tolerance * 1.5`, or if it improves on a finite, positive
/// session best by at least 35%. With no prior best the improvement term is 0.
pub fn is_near_miss(error: f32, tolerance: f32, best_error: f32) -> bool {
    let improvement_ratio = if best_error.is_finite() && best_error > 0.0 {
        (best_error - error) / best_error
    } else {
        0.0
    };
    let absolute_close = error <= tolerance * NEAR_MISS_TOLERANCE_FACTOR;

    improvement_ratio >= NEAR_MISS_IMPROVEMENT_RATIO || absolute_close
}

/// Combine error, tolerance and module flags into a result
fn classify(
    error_vector: Vec3,
    magnitude_error: f32,
    tolerance: f32,
    best_error: f32,
    flags: ModuleFlags,
) -> SubmitResult {
    let violation = flags.has_violation();
    let success = magnitude_error <= tolerance && !violation;
    let near_miss = !success && !violation && is_near_miss(magnitude_error, tolerance, best_error);

    SubmitResult {
        success,
        error_vector,
        magnitude_error,
        is_near_miss: near_miss,
        flags,
    }
}

/// Score a submission for the loaded level
///
/// Applies the module-state side effects of a submit (drone battery debit
/// and delivery count, bridge equilibrium error). `best_error` is the
/// session's running minimum before this attempt.
pub fn evaluate(
    level: &LevelConfig,
    vectors: &[VectorData],
    state: &mut ModuleState,
    best_error: f32,
) -> SubmitResult {
    match (&level.kind, state) {
        (ModuleLevel::Drone(drone), ModuleState::Drone(s)) => {
            evaluate_drone(level, drone, vectors, s, best_error)
        }
        (ModuleLevel::Bridge(bridge), ModuleState::Bridge(s)) => {
            evaluate_bridge(level, bridge, vectors, s, best_error)
        }
        (ModuleLevel::Robotics(robotics), ModuleState::Robotics(s)) => {
            evaluate_robotics(level, robotics, s, best_error)
        }
        // Abstract levels, or module state that doesn't match the level
        _ => evaluate_abstract(level, vectors, best_error),
    }
}

/// Resultant of all player vectors against the level target
pub fn evaluate_abstract(level: &LevelConfig, vectors: &[VectorData], best_error: f32) -> SubmitResult {
    let sum = resultant(vectors.iter().map(|v| v.components));
    let error_vector = vector_sub(level.target_vector, sum);
    let error = magnitude(error_vector);

    classify(error_vector, error, level.tolerance, best_error, ModuleFlags::Abstract)
}

/// Thrust + wind against the first delivery target, gated by battery
fn evaluate_drone(
    level: &LevelConfig,
    drone: &DroneLevel,
    vectors: &[VectorData],
    state: &mut DroneState,
    best_error: f32,
) -> SubmitResult {
    let thrust = resultant(vectors.iter().map(|v| v.components));
    let effective = vector_add(thrust, state.current_wind);

    // Later waypoints are not scored
    let target = drone
        .delivery_targets
        .first()
        .copied()
        .unwrap_or(level.target_vector);
    let error_vector = vector_sub(target, effective);
    let error = magnitude(error_vector);

    let battery_used = magnitude(thrust) * drone.battery.drain_per_unit;
    let battery_depleted = battery_used > drone.battery.max_capacity;

    let result = classify(
        error_vector,
        error,
        level.tolerance,
        best_error,
        ModuleFlags::Drone {
            battery_depleted,
            battery_used,
        },
    );

    // Debited whether or not the attempt succeeds
    state.battery_remaining = (drone.battery.max_capacity - battery_used).max(0.0);
    if result.success {
        state.deliveries_completed += 1;
    }

    log::debug!(
        "Drone submit: thrust {:?} wind {:?} error {:.3} battery used {:.1}/{:.1}",
        thrust,
        state.current_wind,
        error,
        battery_used,
        drone.battery.max_capacity
    );

    result
}

/// Force equilibrium: supports + loads should close to zero
fn evaluate_bridge(
    level: &LevelConfig,
    bridge: &BridgeLevel,
    vectors: &[VectorData],
    state: &mut BridgeState,
    best_error: f32,
) -> SubmitResult {
    let supports = resultant(vectors.iter().map(|v| v.components));
    let net_force = vector_add(supports, total_load(&bridge.loads));
    let equilibrium_error = magnitude(net_force);
    let budget_exceeded = state.total_cost > bridge.budget;

    state.equilibrium_error = equilibrium_error;

    log::debug!(
        "Bridge submit: net force {:?} cost {:.1}/{:.1}",
        net_force,
        state.total_cost,
        bridge.budget
    );

    classify(
        net_force,
        equilibrium_error,
        level.tolerance,
        best_error,
        ModuleFlags::Bridge { budget_exceeded },
    )
}

/// End effector against the pickup or place target
fn evaluate_robotics(
    level: &LevelConfig,
    robotics: &RoboticsLevel,
    state: &RoboticsState,
    best_error: f32,
) -> SubmitResult {
    let target = robotics.target_for_step(state.sequence_step);
    let error_vector = vector_sub(target, state.end_effector_position);
    let error = magnitude(error_vector);
    let joint_limit_violation = joint_limits_violated(&robotics.joints, &state.joint_angles);

    classify(
        error_vector,
        error,
        level.tolerance,
        best_error,
        ModuleFlags::Robotics {
            joint_limit_violation,
        },
    )
}
