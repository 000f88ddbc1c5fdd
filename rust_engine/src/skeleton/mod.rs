//! 骨骼层级与正向运动学

mod hierarchy;
mod pose_calculator;

pub use hierarchy::{
    BoneHierarchy, BoneNode, STANDARD_BONES, STANDARD_OUTPUT_NAMES, standard_hierarchy,
};
pub use pose_calculator::{
    BonePoseCalculator, compute_forward_kinematics, low_pass_filter_positions,
    low_pass_filter_track,
};
