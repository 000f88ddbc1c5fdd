//! 转换流程
//!
//! 读取 → 插值 → 追踪 → 抖动 → 写出。参数解析由调用方负责，
//! 这里只接收已经整理好的 [`ConversionConfig`]。

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::animation::{
    BoneTrack, InterpolationMode, interpolate_track_over, is_camera_file, read_bone_tracks,
    read_camera, resample_camera, write_bone_tracks, write_camera,
};
use crate::camera::{add_shake, trace_bone};
use crate::config::ConversionConfig;
use crate::skeleton::{
    BonePoseCalculator, STANDARD_BONES, STANDARD_OUTPUT_NAMES, standard_hierarchy,
};
use crate::Result;

/// 不旋转骨骼文件的模型名
pub const NONROTATABLE_MODEL_NAME: &str = "nonrotatable_bone";

/// 文件内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Bone,
    Camera,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Bone => write!(f, "bone"),
            TrackKind::Camera => write!(f, "camera"),
        }
    }
}

/// 跳过转换的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 文件内容与期望不符（需要骨骼却是相机，或相反）
    ContentMismatch {
        path: PathBuf,
        expected: TrackKind,
        found: TrackKind,
    },
}

/// 一次转换的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// 已写出，附带写出的关键帧数
    Written { keyframes: usize },
    Skipped(SkipReason),
}

/// 判断文件是骨骼动作还是相机动作
pub fn classify<P: AsRef<Path>>(path: P) -> Result<TrackKind> {
    if is_camera_file(path)? {
        Ok(TrackKind::Camera)
    } else {
        Ok(TrackKind::Bone)
    }
}

/// 内容类型不符时返回跳过原因
fn check_kind(path: &Path, expected: TrackKind) -> Result<Option<SkipReason>> {
    let found = classify(path)?;
    if found == expected {
        return Ok(None);
    }
    log::warn!("{} 不是{}数据而是{}数据，跳过", path.display(), expected, found);
    Ok(Some(SkipReason::ContentMismatch {
        path: path.to_path_buf(),
        expected,
        found,
    }))
}

/// 生成追踪骨骼的相机动作
///
/// `src_bone` 与 `config.trace_bone_name` 必须同时给出才会追踪骨骼，
/// 抖动周期与幅度也必须同时给出才会加入抖动。
pub fn generate_bone_tracing_camera<R: Rng + ?Sized>(
    src_camera: &Path,
    dst_camera: &Path,
    src_bone: Option<&Path>,
    config: &ConversionConfig,
    rng: &mut R,
) -> Result<ConversionOutcome> {
    if let Some(reason) = check_kind(src_camera, TrackKind::Camera)? {
        return Ok(ConversionOutcome::Skipped(reason));
    }

    let camera = read_camera(src_camera)?;
    log::info!("读取相机数据: {} 帧", camera.len());

    let mut camera = resample_camera(
        &camera,
        config.interp_frame_interval,
        config.smooth,
        config.smooth_fov,
    );
    log::info!("相机插值完成: {} 帧", camera.len());

    match (src_bone, config.trace_bone_name.as_deref()) {
        (Some(bone_path), Some(bone_name)) => {
            if let Some(reason) = check_kind(bone_path, TrackKind::Bone)? {
                return Ok(ConversionOutcome::Skipped(reason));
            }
            let bone = read_bone_tracks(bone_path, [bone_name])?
                .remove(bone_name)
                .unwrap_or_else(|| BoneTrack::new(bone_name));
            log::info!("读取骨骼 {}: {} 帧", bone_name, bone.len());

            let last_frame = camera.last_frame().unwrap_or(0).max(bone.last_frame().unwrap_or(0));
            let bone = interpolate_track_over(&bone, InterpolationMode::Direct, 0..=last_frame);
            camera = trace_bone(&camera, &bone);
            log::info!("相机追踪骨骼 {}", bone_name);
        }
        (Some(bone_path), None) => {
            log::warn!("未给出追踪骨骼名，忽略骨骼文件: {}", bone_path.display());
        }
        (None, Some(bone_name)) => {
            log::warn!("未给出骨骼文件，忽略追踪骨骼: {}", bone_name);
        }
        (None, None) => {}
    }

    if let Some(shake) = config.shake() {
        log::info!(
            "加入相机抖动: 周期 {} 秒, 幅度 {} 米",
            shake.interval_seconds,
            shake.amplitude_meters
        );
        camera = add_shake(
            &camera,
            shake.interval_seconds,
            shake.amplitude_meters,
            &config.constants,
            rng,
        );
    }

    write_camera(dst_camera, &camera)?;
    log::info!("写出相机数据: {}", dst_camera.display());
    Ok(ConversionOutcome::Written {
        keyframes: camera.len(),
    })
}

/// 生成不旋转骨骼动作
///
/// 读取上半身标准骨骼，做正向运动学得到世界位置，低通滤波后以单位旋转写出，
/// 骨骼名换成英文名（肩P 不输出）。
pub fn generate_nonrotatable_bones(
    src: &Path,
    dst: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutcome> {
    if let Some(reason) = check_kind(src, TrackKind::Bone)? {
        return Ok(ConversionOutcome::Skipped(reason));
    }

    let names: Vec<&str> = STANDARD_BONES.iter().map(|(name, _, _)| *name).collect();
    let tracks = read_bone_tracks(src, &names)?;
    for name in &names {
        if let Some(track) = tracks.get(*name) {
            log::debug!("骨骼 {}: {} 帧", name, track.len());
        }
    }

    let hierarchy = standard_hierarchy()?;
    let mut calculator = BonePoseCalculator::new(&tracks, &hierarchy, InterpolationMode::Direct);
    log::info!(
        "生成不旋转骨骼: 帧范围 {:?}, 延迟 {} 秒",
        calculator.frame_range(),
        config.motion_delay
    );
    let mut filtered = calculator.low_pass_filtered_bones(config.motion_delay, &config.constants);

    let remapped: HashMap<String, BoneTrack> = STANDARD_OUTPUT_NAMES
        .iter()
        .filter_map(|(source, output)| {
            filtered.remove(*source).map(|mut track| {
                track.name = output.to_string();
                (output.to_string(), track)
            })
        })
        .collect();
    let keyframes = remapped.values().map(|t| t.len()).sum();

    write_bone_tracks(dst, NONROTATABLE_MODEL_NAME, &remapped)?;
    log::info!("写出不旋转骨骼数据: {}", dst.display());
    Ok(ConversionOutcome::Written { keyframes })
}
