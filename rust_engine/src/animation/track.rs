//! 动画轨道
//!
//! 轨道按列存储：每个通道是一个与 `frame_ids` 等长的数组。
//! 排序与掩码过滤通过 [`TrackChannels`] 显式列出的通道统一完成。

use glam::{Quat, Vec3};

use super::keyframe::{BoneKeyframe, CameraKeyframe, CurveParam};

/// 单个通道数组
pub trait Channel {
    fn channel_len(&self) -> usize;

    /// 按索引顺序重排
    fn reorder(&mut self, order: &[usize]);

    /// 只保留掩码为 true 的元素
    fn retain_mask(&mut self, mask: &[bool]);
}

impl<T: Clone> Channel for Vec<T> {
    fn channel_len(&self) -> usize {
        self.len()
    }

    fn reorder(&mut self, order: &[usize]) {
        let reordered: Vec<T> = order.iter().map(|&i| self[i].clone()).collect();
        *self = reordered;
    }

    fn retain_mask(&mut self, mask: &[bool]) {
        let mut keep = mask.iter();
        self.retain(|_| keep.next().copied().unwrap_or(false));
    }
}

/// 轨道所拥有的全部通道
pub trait TrackChannels {
    fn frame_ids(&self) -> &[u32];

    /// 所有通道（包括 frame_ids 自身）
    fn channels_mut(&mut self) -> Vec<&mut dyn Channel>;

    fn frame_count(&self) -> usize {
        self.frame_ids().len()
    }

    /// 按帧号排序
    ///
    /// VMD 中关键帧按登录顺序存储而非时间顺序。排序是稳定的，
    /// 同一帧号出现多次时保留最后登录的那一个。
    fn sort_by_frame(&mut self) {
        let ids = self.frame_ids().to_vec();
        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_by_key(|&i| ids[i]);

        for channel in self.channels_mut() {
            channel.reorder(&order);
        }

        let sorted = self.frame_ids().to_vec();
        let mask: Vec<bool> = (0..sorted.len())
            .map(|i| i + 1 >= sorted.len() || sorted[i] != sorted[i + 1])
            .collect();
        if mask.iter().any(|keep| !keep) {
            let dropped = mask.iter().filter(|k| !**k).count();
            log::debug!("丢弃 {} 个重复帧号的关键帧", dropped);
            self.apply_mask(&mask);
        }
    }

    /// 对所有通道应用同一掩码
    fn apply_mask(&mut self, mask: &[bool]) {
        for channel in self.channels_mut() {
            debug_assert_eq!(channel.channel_len(), mask.len());
            channel.retain_mask(mask);
        }
    }
}

/// 骨骼轨道
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoneTrack {
    pub name: String,
    pub frame_ids: Vec<u32>,
    pub positions: Vec<Vec3>,
    pub orientations: Vec<Quat>,
    pub curve_x: Vec<CurveParam>,
    pub curve_y: Vec<CurveParam>,
    pub curve_z: Vec<CurveParam>,
    pub curve_rot: Vec<CurveParam>,
}

impl BoneTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 以默认值分配给定帧号的轨道
    pub fn with_frames(name: impl Into<String>, frame_ids: Vec<u32>) -> Self {
        let n = frame_ids.len();
        Self {
            name: name.into(),
            frame_ids,
            positions: vec![Vec3::ZERO; n],
            orientations: vec![Quat::IDENTITY; n],
            curve_x: vec![CurveParam::LINEAR; n],
            curve_y: vec![CurveParam::LINEAR; n],
            curve_z: vec![CurveParam::LINEAR; n],
            curve_rot: vec![CurveParam::LINEAR; n],
        }
    }

    pub fn from_keyframes(
        name: impl Into<String>,
        keyframes: impl IntoIterator<Item = BoneKeyframe>,
    ) -> Self {
        let mut track = Self::new(name);
        for kf in keyframes {
            track.push(kf);
        }
        track.sort_by_frame();
        track
    }

    /// 追加关键帧（不排序）
    pub fn push(&mut self, kf: BoneKeyframe) {
        self.frame_ids.push(kf.frame_id);
        self.positions.push(kf.position);
        self.orientations.push(kf.orientation);
        self.curve_x.push(kf.curve_x);
        self.curve_y.push(kf.curve_y);
        self.curve_z.push(kf.curve_z);
        self.curve_rot.push(kf.curve_rot);
    }

    pub fn keyframe(&self, i: usize) -> BoneKeyframe {
        BoneKeyframe {
            frame_id: self.frame_ids[i],
            position: self.positions[i],
            orientation: self.orientations[i],
            curve_x: self.curve_x[i],
            curve_y: self.curve_y[i],
            curve_z: self.curve_z[i],
            curve_rot: self.curve_rot[i],
        }
    }

    pub fn len(&self) -> usize {
        self.frame_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_ids.is_empty()
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.frame_ids.last().copied()
    }

    /// 位置各轴的曲线参数
    pub fn position_curves(&self, i: usize) -> [CurveParam; 3] {
        [self.curve_x[i], self.curve_y[i], self.curve_z[i]]
    }

    /// 指定帧的位置：不在轨道中时保持前一帧的值，越界时钳制到两端
    pub fn position_at_clamped(&self, frame_id: u32) -> Option<Vec3> {
        clamped_index(&self.frame_ids, frame_id).map(|i| self.positions[i])
    }
}

impl TrackChannels for BoneTrack {
    fn frame_ids(&self) -> &[u32] {
        &self.frame_ids
    }

    fn channels_mut(&mut self) -> Vec<&mut dyn Channel> {
        vec![
            &mut self.frame_ids as &mut dyn Channel,
            &mut self.positions as &mut dyn Channel,
            &mut self.orientations as &mut dyn Channel,
            &mut self.curve_x as &mut dyn Channel,
            &mut self.curve_y as &mut dyn Channel,
            &mut self.curve_z as &mut dyn Channel,
            &mut self.curve_rot as &mut dyn Channel,
        ]
    }
}

/// 相机轨道（单一轨道，不按名称分）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraTrack {
    pub frame_ids: Vec<u32>,
    pub distances: Vec<f32>,
    pub positions: Vec<Vec3>,
    /// 欧拉角（弧度）：pitch, yaw, roll
    pub orientations: Vec<Vec3>,
    pub curve_x: Vec<CurveParam>,
    pub curve_y: Vec<CurveParam>,
    pub curve_z: Vec<CurveParam>,
    pub curve_rot: Vec<CurveParam>,
    pub curve_dis: Vec<CurveParam>,
    pub curve_fov: Vec<CurveParam>,
    pub fov_angles: Vec<f32>,
    pub perspective_flags: Vec<bool>,
}

impl CameraTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以默认值分配给定帧号的轨道
    pub fn with_frames(frame_ids: Vec<u32>) -> Self {
        let n = frame_ids.len();
        Self {
            frame_ids,
            distances: vec![0.0; n],
            positions: vec![Vec3::ZERO; n],
            orientations: vec![Vec3::ZERO; n],
            curve_x: vec![CurveParam::LINEAR; n],
            curve_y: vec![CurveParam::LINEAR; n],
            curve_z: vec![CurveParam::LINEAR; n],
            curve_rot: vec![CurveParam::LINEAR; n],
            curve_dis: vec![CurveParam::LINEAR; n],
            curve_fov: vec![CurveParam::LINEAR; n],
            fov_angles: vec![0.0; n],
            perspective_flags: vec![true; n],
        }
    }

    pub fn from_keyframes(keyframes: impl IntoIterator<Item = CameraKeyframe>) -> Self {
        let mut track = Self::new();
        for kf in keyframes {
            track.push(kf);
        }
        track.sort_by_frame();
        track
    }

    /// 追加关键帧（不排序）
    pub fn push(&mut self, kf: CameraKeyframe) {
        self.frame_ids.push(kf.frame_id);
        self.distances.push(kf.distance);
        self.positions.push(kf.position);
        self.orientations.push(kf.orientation);
        self.curve_x.push(kf.curve_x);
        self.curve_y.push(kf.curve_y);
        self.curve_z.push(kf.curve_z);
        self.curve_rot.push(kf.curve_rot);
        self.curve_dis.push(kf.curve_dis);
        self.curve_fov.push(kf.curve_fov);
        self.fov_angles.push(kf.fov_angle);
        self.perspective_flags.push(kf.perspective_flag);
    }

    pub fn keyframe(&self, i: usize) -> CameraKeyframe {
        CameraKeyframe {
            frame_id: self.frame_ids[i],
            distance: self.distances[i],
            position: self.positions[i],
            orientation: self.orientations[i],
            curve_x: self.curve_x[i],
            curve_y: self.curve_y[i],
            curve_z: self.curve_z[i],
            curve_rot: self.curve_rot[i],
            curve_dis: self.curve_dis[i],
            curve_fov: self.curve_fov[i],
            fov_angle: self.fov_angles[i],
            perspective_flag: self.perspective_flags[i],
        }
    }

    pub fn len(&self) -> usize {
        self.frame_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_ids.is_empty()
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.frame_ids.last().copied()
    }

    pub fn position_curves(&self, i: usize) -> [CurveParam; 3] {
        [self.curve_x[i], self.curve_y[i], self.curve_z[i]]
    }
}

impl TrackChannels for CameraTrack {
    fn frame_ids(&self) -> &[u32] {
        &self.frame_ids
    }

    fn channels_mut(&mut self) -> Vec<&mut dyn Channel> {
        vec![
            &mut self.frame_ids as &mut dyn Channel,
            &mut self.distances as &mut dyn Channel,
            &mut self.positions as &mut dyn Channel,
            &mut self.orientations as &mut dyn Channel,
            &mut self.curve_x as &mut dyn Channel,
            &mut self.curve_y as &mut dyn Channel,
            &mut self.curve_z as &mut dyn Channel,
            &mut self.curve_rot as &mut dyn Channel,
            &mut self.curve_dis as &mut dyn Channel,
            &mut self.curve_fov as &mut dyn Channel,
            &mut self.fov_angles as &mut dyn Channel,
            &mut self.perspective_flags as &mut dyn Channel,
        ]
    }
}

/// 在有序帧号中查找不晚于 frame_id 的最后一个索引，越界时钳制到两端
pub(crate) fn clamped_index(frame_ids: &[u32], frame_id: u32) -> Option<usize> {
    if frame_ids.is_empty() {
        return None;
    }
    match frame_ids.binary_search(&frame_id) {
        Ok(i) => Some(i),
        Err(0) => Some(0),
        Err(i) => Some(i - 1),
    }
}
