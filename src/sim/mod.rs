//! Deterministic level core
//!
//! All scoring logic lives here. This module must stay pure:
//! - No rendering or platform dependencies
//! - Time only advances through explicit `dt`
//! - Level configs are read-only input

pub mod catalog;
pub mod control;
pub mod evaluate;
pub mod kinematics;
pub mod level;
pub mod state;

pub use catalog::{CatalogError, LevelCatalog, should_module_be_unlocked, unlock_threshold};
pub use control::{ControlAxis, ControlDelta, apply_control_delta, apply_control_deltas};
pub use evaluate::{ModuleFlags, SubmitResult, evaluate, is_near_miss};
pub use kinematics::{
    SegmentPose, clamp_joint_angle, forward_kinematics, joint_chain, joint_limits_violated,
    member_cost, sample_wind, total_load,
};
pub use level::{
    ArmAction, BridgeLevel, DroneLevel, GameModule, Joint, LevelConfig, ModuleLevel,
    RoboticsLevel,
};
pub use state::{
    BridgeMember, BridgeState, DroneState, GamePhase, ModuleState, RoboticsState, VectorData,
    VectorPatch, Waypoint,
};
