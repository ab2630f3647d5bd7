//! Per-module derived state
//!
//! Stateless calculators for the application modules:
//! - Robotics: planar forward kinematics and joint-limit clamping
//! - Drone: smooth wind sampling around the configured base
//! - Bridge: external load aggregation and member cost

use glam::Vec3;

use super::level::{Joint, Load, Material, WindConfig};
use crate::consts::DEFAULT_WIND_FREQUENCY;
use crate::{magnitude, resultant, vector_sub};

/// One arm segment after forward kinematics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPose {
    /// Pivot of this joint
    pub start: Vec3,
    /// Tip of this segment (pivot of the next joint)
    pub end: Vec3,
    /// Accumulated angle from the x-axis (radians)
    pub cumulative_angle: f32,
}

/// Lay out every segment of the arm, base to tip
///
/// Angles accumulate along the chain. The arm is planar (z = 0) and rooted at
/// the origin. Missing angles count as zero.
pub fn joint_chain(joints: &[Joint], angles: &[f32]) -> Vec<SegmentPose> {
    let mut poses = Vec::with_capacity(joints.len());
    let mut cursor = Vec3::ZERO;
    let mut cumulative_angle = 0.0_f32;

    for (i, joint) in joints.iter().enumerate() {
        cumulative_angle += angles.get(i).copied().unwrap_or(0.0);
        let end = cursor
            + Vec3::new(
                joint.length * cumulative_angle.cos(),
                joint.length * cumulative_angle.sin(),
                0.0,
            );
        poses.push(SegmentPose {
            start: cursor,
            end,
            cumulative_angle,
        });
        cursor = end;
    }

    poses
}

/// End-effector position for the given joint angles
pub fn forward_kinematics(joints: &[Joint], angles: &[f32]) -> Vec3 {
    joint_chain(joints, angles)
        .last()
        .map(|pose| pose.end)
        .unwrap_or(Vec3::ZERO)
}

/// Clamp an angle into the joint's `[min_angle, max_angle]` range
///
/// Never panics, even for a joint whose limits are inverted.
#[inline]
pub fn clamp_joint_angle(joint: &Joint, angle: f32) -> f32 {
    angle.min(joint.max_angle).max(joint.min_angle)
}

/// True if any stored angle lies outside its joint's limits
pub fn joint_limits_violated(joints: &[Joint], angles: &[f32]) -> bool {
    joints
        .iter()
        .zip(angles)
        .any(|(joint, &angle)| !joint.allows(angle))
}

/// Effective wind at time `t` seconds
///
/// Three phase-shifted sine oscillators scaled by the variance give smooth,
/// bounded variation around the base wind.
pub fn sample_wind(wind: &WindConfig, t: f32) -> Vec3 {
    let freq = wind.noise_frequency.unwrap_or(DEFAULT_WIND_FREQUENCY);
    let phase = t * freq;
    let variation = Vec3::new(
        phase.sin(),
        0.5 * (1.3 * phase).sin(),
        (0.7 * phase).sin(),
    );
    wind.base + variation * wind.variance
}

/// Sum of all external load forces
pub fn total_load(loads: &[Load]) -> Vec3 {
    resultant(loads.iter().map(|l| l.force))
}

/// Cost of a straight member between two points
pub fn member_cost(start: Vec3, end: Vec3, material: &Material) -> f32 {
    magnitude(vector_sub(end, start)) * material.cost_per_unit
}
