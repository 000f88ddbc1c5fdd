//! 轨道重采样
//!
//! 把稀疏关键帧展开为逐帧（骨骼）或自适应步长（相机）的稠密轨道。
//!
//! - 直接模式：每个关键帧区间用 MMD 贝塞尔曲线插值
//! - 平滑模式：按"相邻帧号差为 1"切分连续段，段内用单调样条，
//!   两点段退回贝塞尔插值，单点段保持常量

use std::ops::{Range, RangeInclusive};

use super::bezier;
use super::smooth;
use super::track::{BoneTrack, CameraTrack, TrackChannels};

/// 插值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// 逐区间贝塞尔曲线（MMD 默认行为）
    Direct,
    /// 单调样条平滑
    #[default]
    Smooth,
}

impl InterpolationMode {
    pub fn from_smooth_flag(smooth: bool) -> Self {
        if smooth {
            InterpolationMode::Smooth
        } else {
            InterpolationMode::Direct
        }
    }
}

/// 平滑模式下的连续段
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    /// 段内关键帧索引
    keys: Range<usize>,
    /// 段对应的采样索引
    samples: Range<usize>,
}

/// 采样布局：采样帧号、每个关键帧的采样位置、连续段
#[derive(Debug, Clone, Default)]
struct SampleLayout {
    frame_ids: Vec<u32>,
    key_locs: Vec<usize>,
    runs: Vec<Run>,
}

impl SampleLayout {
    /// 区间 `[f0, f1)` 按 `stride_for(i)` 步长采样，最后追加末帧
    fn build(key_frames: &[u32], stride_for: impl Fn(usize) -> u32) -> Self {
        let n = key_frames.len();
        if n == 0 {
            return Self::default();
        }

        let mut frame_ids = Vec::new();
        let mut key_locs = Vec::with_capacity(n);
        for i in 0..n - 1 {
            key_locs.push(frame_ids.len());
            let (f0, f1) = (key_frames[i], key_frames[i + 1]);
            let stride = stride_for(i).max(1) as usize;
            frame_ids.extend((f0..f1).step_by(stride));
        }
        key_locs.push(frame_ids.len());
        frame_ids.push(key_frames[n - 1]);

        // 相邻帧号差为 1 的区间之后切段
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 0..n - 1 {
            if key_frames[i + 1] - key_frames[i] == 1 {
                runs.push(Run {
                    keys: start..i + 1,
                    samples: key_locs[start]..key_locs[i + 1],
                });
                start = i + 1;
            }
        }
        runs.push(Run {
            keys: start..n,
            samples: key_locs[start]..frame_ids.len(),
        });

        Self {
            frame_ids,
            key_locs,
            runs,
        }
    }

    fn len(&self) -> usize {
        self.frame_ids.len()
    }

    /// 第 i 个区间的采样（不含下一个关键帧）
    fn interval(&self, i: usize) -> Range<usize> {
        self.key_locs[i]..self.key_locs[i + 1]
    }
}

/// 逐区间贝塞尔插值
///
/// `segment(i, frames, values, samples)` 对区间 i 插值，曲线参数取第 i+1 个关键帧。
fn resample_direct<T, F>(
    layout: &SampleLayout,
    key_frames: &[u32],
    values: &[T],
    segment: F,
) -> Vec<T>
where
    T: Copy,
    F: Fn(usize, (u32, u32), (T, T), &[u32]) -> Vec<T>,
{
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![values[0]; layout.len()],
        _ => {
            let mut out = Vec::with_capacity(layout.len());
            for i in 0..n - 1 {
                let samples = &layout.frame_ids[layout.interval(i)];
                out.extend(segment(
                    i,
                    (key_frames[i], key_frames[i + 1]),
                    (values[i], values[i + 1]),
                    samples,
                ));
            }
            out.push(values[n - 1]);
            out
        }
    }
}

/// 分段平滑插值
fn resample_smooth<T, F, S>(
    layout: &SampleLayout,
    key_frames: &[u32],
    values: &[T],
    segment: F,
    spline: S,
) -> Vec<T>
where
    T: Copy,
    F: Fn(usize, (u32, u32), (T, T), &[u32]) -> Vec<T>,
    S: Fn(&[u32], &[T], &[u32]) -> Vec<T>,
{
    match values.len() {
        0 => Vec::new(),
        1 => vec![values[0]; layout.len()],
        _ => {
            let mut out = Vec::with_capacity(layout.len());
            for run in &layout.runs {
                let samples = &layout.frame_ids[run.samples.clone()];
                let a = run.keys.start;
                match run.keys.len() {
                    1 => out.extend(std::iter::repeat(values[a]).take(samples.len())),
                    2 => out.extend(segment(
                        a,
                        (key_frames[a], key_frames[a + 1]),
                        (values[a], values[a + 1]),
                        samples,
                    )),
                    _ => {
                        let keys = run.keys.clone();
                        out.extend(spline(&key_frames[keys.clone()], &values[keys], samples))
                    }
                }
            }
            out
        }
    }
}

fn resample_channel<T, F, S>(
    mode: InterpolationMode,
    layout: &SampleLayout,
    key_frames: &[u32],
    values: &[T],
    segment: F,
    spline: S,
) -> Vec<T>
where
    T: Copy,
    F: Fn(usize, (u32, u32), (T, T), &[u32]) -> Vec<T>,
    S: Fn(&[u32], &[T], &[u32]) -> Vec<T>,
{
    match mode {
        InterpolationMode::Direct => resample_direct(layout, key_frames, values, segment),
        InterpolationMode::Smooth => resample_smooth(layout, key_frames, values, segment, spline),
    }
}

/// 对骨骼轨道做逐帧插值，覆盖第一个到最后一个关键帧
///
/// 没有关键帧时返回空轨道。
pub fn interpolate_track(track: &BoneTrack, mode: InterpolationMode) -> BoneTrack {
    match (track.frame_ids.first(), track.last_frame()) {
        (Some(&first), Some(last)) => interpolate_track_over(track, mode, first..=last),
        _ => BoneTrack::new(track.name.clone()),
    }
}

/// 在给定帧范围上逐帧插值
///
/// 范围超出关键帧的部分保持最近关键帧的值；没有关键帧时输出默认值。
pub fn interpolate_track_over(
    track: &BoneTrack,
    mode: InterpolationMode,
    frames: RangeInclusive<u32>,
) -> BoneTrack {
    let mut dense = BoneTrack::with_frames(track.name.clone(), frames.collect());
    let (Some(&first), Some(last)) = (track.frame_ids.first(), track.last_frame()) else {
        return dense;
    };

    let layout = SampleLayout::build(&track.frame_ids, |_| 1);
    let positions = resample_channel(
        mode,
        &layout,
        &track.frame_ids,
        &track.positions,
        |i, frames, values, samples| {
            bezier::interpolate_position(frames, values, &track.position_curves(i + 1), samples)
        },
        smooth::smooth_interp_vec3_frames,
    );
    let orientations = resample_channel(
        mode,
        &layout,
        &track.frame_ids,
        &track.orientations,
        |i, frames, values, samples| {
            bezier::interpolate_quaternion(frames, values, &track.curve_rot[i + 1], samples)
        },
        smooth::smooth_interp_quat,
    );

    for (k, &frame_id) in dense.frame_ids.iter().enumerate() {
        let loc = (frame_id.clamp(first, last) - first) as usize;
        dense.positions[k] = positions[loc];
        dense.orientations[k] = orientations[loc];
    }
    dense
}

/// 相机轨道重采样
///
/// - 区间两端 FOV 相同时按 `interp_frame_interval` 采样，否则逐帧采样
/// - `smooth_positions` 控制位置、角度、距离是否平滑
/// - `smooth_fov` 为 false 时 FOV 按曲线插值，并抽掉取整后不变化的帧
/// - 透视标志在区间内保持起点关键帧的值
/// - 输出的曲线参数均为默认线性曲线
pub fn resample_camera(
    track: &CameraTrack,
    interp_frame_interval: u32,
    smooth_positions: bool,
    smooth_fov: bool,
) -> CameraTrack {
    if track.is_empty() {
        return CameraTrack::new();
    }

    let fovs = &track.fov_angles;
    let layout = SampleLayout::build(&track.frame_ids, |i| {
        if fovs[i] == fovs[i + 1] {
            interp_frame_interval
        } else {
            1
        }
    });
    let keys = &track.frame_ids;
    let mode = InterpolationMode::from_smooth_flag(smooth_positions);

    let mut out = CameraTrack::with_frames(layout.frame_ids.clone());
    out.positions = resample_channel(
        mode,
        &layout,
        keys,
        &track.positions,
        |i, frames, values, samples| {
            bezier::interpolate_position(frames, values, &track.position_curves(i + 1), samples)
        },
        smooth::smooth_interp_vec3_frames,
    );
    out.orientations = resample_channel(
        mode,
        &layout,
        keys,
        &track.orientations,
        |i, frames, values, samples| {
            bezier::interpolate_vec3_shared(frames, values, &track.curve_rot[i + 1], samples)
        },
        smooth::smooth_interp_vec3_frames,
    );
    out.distances = resample_channel(
        mode,
        &layout,
        keys,
        &track.distances,
        |i, frames, values, samples| {
            bezier::interpolate_scalar(frames, values, &track.curve_dis[i + 1], samples)
        },
        smooth::smooth_interp_scalar,
    );
    out.fov_angles = resample_channel(
        InterpolationMode::from_smooth_flag(smooth_fov),
        &layout,
        keys,
        fovs,
        |i, frames, values, samples| {
            bezier::interpolate_scalar(frames, values, &track.curve_fov[i + 1], samples)
        },
        smooth::smooth_interp_scalar,
    );
    out.perspective_flags = hold_constant(&layout, &track.perspective_flags);

    if !smooth_fov {
        let mask = fov_thinning_mask(&layout, fovs, &out.fov_angles);
        out.apply_mask(&mask);
    }

    log::debug!(
        "相机重采样: {} 个关键帧 -> {} 帧",
        track.len(),
        out.len()
    );
    out
}

/// 区间内保持起点值
fn hold_constant<T: Copy>(layout: &SampleLayout, values: &[T]) -> Vec<T> {
    let n = values.len();
    if n == 1 {
        return vec![values[0]; layout.len()];
    }
    let mut out = Vec::with_capacity(layout.len());
    for i in 0..n - 1 {
        out.extend(std::iter::repeat(values[i]).take(layout.interval(i).len()));
    }
    out.push(values[n - 1]);
    out
}

/// FOV 抽稀掩码
///
/// FOV 写入时会取整。两端 FOV 相同的区间全部保留；否则区间（含下一关键帧）
/// 按取整值切分成若干段，首尾两段之外的每段保留索引 `start + len / 2`，
/// 区间两端总是保留。单关键帧的相机保留唯一的一帧。
fn fov_thinning_mask(layout: &SampleLayout, key_fovs: &[f32], fovs: &[f32]) -> Vec<bool> {
    let n = key_fovs.len();
    if n <= 1 {
        return vec![true; fovs.len()];
    }

    let mut mask = vec![false; fovs.len()];
    for i in 0..n - 1 {
        let (loc0, loc1) = (layout.key_locs[i], layout.key_locs[i + 1]);
        if key_fovs[i] == key_fovs[i + 1] {
            mask[loc0..=loc1].iter_mut().for_each(|m| *m = true);
            continue;
        }

        let rounded: Vec<f32> = fovs[loc0..=loc1].iter().map(|v| v.round()).collect();
        let mut starts: Vec<usize> = vec![0];
        starts.extend((1..rounded.len()).filter(|&k| rounded[k] != rounded[k - 1]));
        starts.push(rounded.len());
        let run_count = starts.len() - 1;
        for j in 1..run_count.saturating_sub(1) {
            let (start, end) = (starts[j], starts[j + 1]);
            mask[loc0 + start + (end - start) / 2] = true;
        }
        mask[loc0] = true;
        mask[loc1] = true;
    }
    mask
}
