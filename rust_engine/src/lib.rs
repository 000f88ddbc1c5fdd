//! VMD 插值引擎 - 稀疏关键帧到逐帧运动的转换
//!
//! 提供以下功能：
//! - VMD 文件读写（骨骼 / 相机关键帧）
//! - 贝塞尔曲线插值与单调样条平滑
//! - 骨骼层级正向运动学与低通滤波
//! - 相机骨骼追踪与抖动注入
//! - 相机 / 不旋转骨骼的转换流程

pub mod animation;
pub mod camera;
pub mod config;
pub mod pipeline;
pub mod skeleton;
pub mod transform;

pub use animation::{
    BoneTrack, CameraTrack, CurveParam, InterpolationMode, VmdVersion,
    interpolate_track, interpolate_track_over, resample_camera,
    is_camera_file, list_bone_names, read_bone_tracks, read_camera, read_track_name,
    write_bone_tracks, write_camera,
};
pub use camera::{add_shake, trace_bone};
pub use config::{ConversionConfig, MotionConstants, ShakeSettings};
pub use pipeline::{
    ConversionOutcome, SkipReason, TrackKind, classify, generate_bone_tracing_camera,
    generate_nonrotatable_bones,
};
pub use skeleton::{
    BoneHierarchy, BonePoseCalculator, compute_forward_kinematics, low_pass_filter_positions,
    standard_hierarchy,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MmdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown VMD version header: {0:?}")]
    UnknownVersion(String),

    #[error("VMD data truncated while reading {0}")]
    Truncated(String),

    #[error("Text encoding error: {0}")]
    Encoding(String),

    #[error("Bone hierarchy error: {0}")]
    Hierarchy(String),
}

pub type Result<T> = std::result::Result<T, MmdError>;
