//! 动画数据与插值
//!
//! 提供 VMD 关键帧读写、贝塞尔曲线插值、单调样条平滑、轨道重采样等功能。

mod bezier;
mod keyframe;
mod resample;
mod smooth;
mod track;
mod vmd_file;

pub use bezier::{
    BezierCurve, interpolate_position, interpolate_quaternion, interpolate_scalar,
    interpolate_vec3_shared,
};
pub use keyframe::{BoneKeyframe, CameraKeyframe, CurveParam};
pub use resample::{InterpolationMode, interpolate_track, interpolate_track_over, resample_camera};
pub use smooth::{
    MonotoneSpline, smooth_interp_quat, smooth_interp_scalar, smooth_interp_vec3,
    smooth_interp_vec3_frames,
};
pub use track::{BoneTrack, CameraTrack, Channel, TrackChannels};
pub(crate) use track::clamped_index;
pub use vmd_file::{
    FormatLayout, FovEncoding, VmdReader, VmdVersion,
    is_camera_file, list_bone_names, read_bone_tracks, read_camera, read_track_name,
    write_bone_tracks, write_bone_tracks_to, write_camera, write_camera_to,
};
