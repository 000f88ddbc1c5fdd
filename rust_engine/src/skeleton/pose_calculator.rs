//! 骨骼姿态计算
//!
//! 对每根骨骼逐帧插值，再沿骨骼层级做正向运动学得到世界姿态，
//! 最后可对世界位置做一阶低通滤波。

use std::collections::HashMap;
use std::ops::RangeInclusive;

use glam::{Quat, Vec3};

use super::hierarchy::BoneHierarchy;
use crate::animation::{BoneTrack, InterpolationMode, clamped_index, interpolate_track_over};
use crate::config::MotionConstants;
use crate::transform::Pose;

/// 把局部轨道叠加到父骨骼的世界轨道上
///
/// 子骨骼位置 = 插值位置 + 相对父骨骼的偏移。父轨道为空时使用父骨骼的静止姿态。
fn compose_track(
    parent: &BoneTrack,
    parent_rest: Pose,
    local: &BoneTrack,
    bone_offset: Vec3,
) -> BoneTrack {
    let mut world = local.clone();
    for k in 0..local.len() {
        let parent_pose = match clamped_index(&parent.frame_ids, local.frame_ids[k]) {
            Some(i) => Pose::new(parent.orientations[i], parent.positions[i]),
            None => parent_rest,
        };
        let child = Pose::new(local.orientations[k], local.positions[k] + bone_offset);
        let pose = parent_pose.compose(&child);
        world.orientations[k] = pose.orientation;
        world.positions[k] = pose.position;
    }
    world
}

/// 没有轨道的骨骼随父骨骼运动，保持静止时的相对偏移
fn carry_rest_pose(parent: &BoneTrack, name: &str, bone_offset: Vec3) -> BoneTrack {
    let mut world = BoneTrack::with_frames(name, parent.frame_ids.clone());
    let rest = Pose::new(Quat::IDENTITY, bone_offset);
    for k in 0..parent.len() {
        let pose = Pose::new(parent.orientations[k], parent.positions[k]).compose(&rest);
        world.orientations[k] = pose.orientation;
        world.positions[k] = pose.position;
    }
    world
}

/// 祖先链上都没有轨道时的世界姿态：根骨骼在原点，其余沿偏移累加
fn rest_pose(hierarchy: &BoneHierarchy, index: usize) -> Pose {
    let mut position = Vec3::ZERO;
    let mut cursor = Some(index);
    while let Some(i) = cursor {
        let node = &hierarchy.bones()[i];
        if node.parent_index.is_some() {
            position += node.bone_offset;
        }
        cursor = node.parent_index;
    }
    Pose::new(Quat::IDENTITY, position)
}

/// 解析一根骨骼的世界轨道
///
/// 沿父链向上收集尚未缓存的骨骼，再从根往下依次计算，
/// 每根骨骼只计算一次。不在层级中的骨骼视为根骨骼。
fn resolve_pose(
    hierarchy: &BoneHierarchy,
    cache: &mut [Option<BoneTrack>],
    name: &str,
    local: &mut dyn FnMut(&str) -> BoneTrack,
) -> BoneTrack {
    let Some(index) = hierarchy.find_bone_by_name(name) else {
        return local(name);
    };

    let mut chain = Vec::new();
    let mut cursor = Some(index);
    while let Some(i) = cursor {
        if cache[i].is_some() {
            break;
        }
        chain.push(i);
        cursor = hierarchy.bones()[i].parent_index;
    }

    for &i in chain.iter().rev() {
        let node = &hierarchy.bones()[i];
        let local_track = local(&node.name);
        let parent = node
            .parent_index
            .and_then(|p| cache[p].as_ref().map(|track| (p, track)));
        let world = match parent {
            Some((_, parent)) if local_track.is_empty() => {
                carry_rest_pose(parent, &node.name, node.bone_offset)
            }
            Some((p, parent)) => {
                compose_track(parent, rest_pose(hierarchy, p), &local_track, node.bone_offset)
            }
            None => local_track,
        };
        cache[i] = Some(world);
    }

    cache[index].clone().unwrap_or_else(|| local(name))
}

/// 对已插值的轨道做正向运动学
///
/// 根骨骼的世界姿态等于其自身轨道；子骨骼的世界姿态为父骨骼世界姿态
/// 与（局部旋转, 局部位置 + 偏移）的组合。
/// 层级中没有轨道的骨骼取父骨骼的帧，保持静止姿态随父骨骼运动。
pub fn compute_forward_kinematics(
    hierarchy: &BoneHierarchy,
    interpolated_tracks: &HashMap<String, BoneTrack>,
) -> HashMap<String, BoneTrack> {
    let mut cache: Vec<Option<BoneTrack>> = vec![None; hierarchy.bone_count()];
    let mut local = |name: &str| {
        interpolated_tracks
            .get(name)
            .cloned()
            .unwrap_or_else(|| BoneTrack::new(name))
    };
    interpolated_tracks
        .keys()
        .map(|name| (name.clone(), resolve_pose(hierarchy, &mut cache, name, &mut local)))
        .collect()
}

/// 一阶低通滤波
///
/// `y[i] = a * y[i-1] + (1 - a) * x[i]`，`a = 1 / (1 + dt / τ)`，`τ = delay / 2.5`。
/// delay 为阶跃响应达到约 90% 所需的时间（秒），为 0 时原样返回。
pub fn low_pass_filter_positions(
    positions: &[Vec3],
    delay: f32,
    constants: &MotionConstants,
) -> Vec<Vec3> {
    if delay <= 0.0 || positions.is_empty() {
        return positions.to_vec();
    }
    let tau = delay / 2.5;
    let a = 1.0 / (1.0 + constants.frame_duration() / tau);

    let mut filtered = Vec::with_capacity(positions.len());
    let mut y = positions[0];
    filtered.push(y);
    for &x in &positions[1..] {
        y = y * a + x * (1.0 - a);
        filtered.push(y);
    }
    filtered
}

/// 对轨道的位置做低通滤波，旋转不变
pub fn low_pass_filter_track(
    track: &BoneTrack,
    delay: f32,
    constants: &MotionConstants,
) -> BoneTrack {
    let mut filtered = track.clone();
    filtered.positions = low_pass_filter_positions(&track.positions, delay, constants);
    filtered
}

/// 骨骼姿态计算器
///
/// 所有骨骼统一插值到 `0..=最大关键帧` 的逐帧网格上，结果按骨骼缓存。
pub struct BonePoseCalculator<'a> {
    tracks: &'a HashMap<String, BoneTrack>,
    hierarchy: &'a BoneHierarchy,
    mode: InterpolationMode,
    frame_range: RangeInclusive<u32>,
    full_interp: HashMap<String, BoneTrack>,
    full_pose: Vec<Option<BoneTrack>>,
}

impl<'a> BonePoseCalculator<'a> {
    pub fn new(
        tracks: &'a HashMap<String, BoneTrack>,
        hierarchy: &'a BoneHierarchy,
        mode: InterpolationMode,
    ) -> Self {
        let last_frame = tracks
            .values()
            .filter_map(|t| t.last_frame())
            .max()
            .unwrap_or(0);
        Self {
            tracks,
            hierarchy,
            mode,
            frame_range: 0..=last_frame,
            full_interp: HashMap::new(),
            full_pose: vec![None; hierarchy.bone_count()],
        }
    }

    /// 逐帧网格的帧范围
    pub fn frame_range(&self) -> RangeInclusive<u32> {
        self.frame_range.clone()
    }

    /// 单根骨骼的逐帧局部轨道
    pub fn full_interp_bone(&mut self, name: &str) -> BoneTrack {
        interp_cached(self.tracks, self.mode, &self.frame_range, &mut self.full_interp, name)
    }

    /// 所有骨骼的逐帧局部轨道
    pub fn full_interp_bones(&mut self) -> HashMap<String, BoneTrack> {
        let names: Vec<String> = self.tracks.keys().cloned().collect();
        names
            .into_iter()
            .map(|name| {
                let track = self.full_interp_bone(&name);
                (name, track)
            })
            .collect()
    }

    /// 单根骨骼的逐帧世界轨道
    pub fn full_pose_bone(&mut self, name: &str) -> BoneTrack {
        let tracks = self.tracks;
        let hierarchy = self.hierarchy;
        let mode = self.mode;
        let frame_range = &self.frame_range;
        let full_interp = &mut self.full_interp;
        let mut local = |bone: &str| interp_cached(tracks, mode, frame_range, full_interp, bone);
        resolve_pose(hierarchy, &mut self.full_pose, name, &mut local)
    }

    /// 所有骨骼的逐帧世界轨道
    pub fn full_pose_bones(&mut self) -> HashMap<String, BoneTrack> {
        let names: Vec<String> = self.tracks.keys().cloned().collect();
        names
            .into_iter()
            .map(|name| {
                let track = self.full_pose_bone(&name);
                (name, track)
            })
            .collect()
    }

    /// 世界位置经低通滤波、旋转为单位四元数的骨骼轨道（"不旋转骨骼"）
    pub fn low_pass_filtered_bones(
        &mut self,
        delay: f32,
        constants: &MotionConstants,
    ) -> HashMap<String, BoneTrack> {
        self.full_pose_bones()
            .into_iter()
            .map(|(name, pose)| {
                let mut filtered = low_pass_filter_track(&pose, delay, constants);
                filtered.orientations = vec![constants.default_orientation; filtered.len()];
                (name, filtered)
            })
            .collect()
    }
}

fn interp_cached(
    tracks: &HashMap<String, BoneTrack>,
    mode: InterpolationMode,
    frame_range: &RangeInclusive<u32>,
    cache: &mut HashMap<String, BoneTrack>,
    name: &str,
) -> BoneTrack {
    if let Some(track) = cache.get(name) {
        return track.clone();
    }
    let dense = match tracks.get(name) {
        Some(track) => interpolate_track_over(track, mode, frame_range.clone()),
        None => interpolate_track_over(&BoneTrack::new(name), mode, frame_range.clone()),
    };
    cache.insert(name.to_string(), dense.clone());
    dense
}
