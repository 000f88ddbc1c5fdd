//! 动画关键帧

use glam::{Quat, Vec3};

/// 插值曲线参数
///
/// 4 个有符号字节 `[x1, y1, x2, y2]`，定义从上一关键帧到本关键帧的
/// 三次贝塞尔缓动曲线的两个控制点，有效范围 `[0, 127]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurveParam(pub [i8; 4]);

impl CurveParam {
    /// MMD 默认（线性）曲线
    pub const LINEAR: CurveParam = CurveParam([20, 20, 107, 107]);

    pub fn new(x1: i8, y1: i8, x2: i8, y2: i8) -> Self {
        Self([x1, y1, x2, y2])
    }

    /// 两个内部控制点（归一化到 [0, 1]）
    pub fn control_points(&self) -> [(f64, f64); 2] {
        let norm = |v: i8| f64::from(v.max(0)) / 127.0;
        [
            (norm(self.0[0]), norm(self.0[1])),
            (norm(self.0[2]), norm(self.0[3])),
        ]
    }

    /// 以无符号字节形式读取（相机记录）
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes.map(|b| b as i8))
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        self.0.map(|b| b as u8)
    }
}

impl Default for CurveParam {
    fn default() -> Self {
        Self::LINEAR
    }
}

/// 骨骼关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct BoneKeyframe {
    pub frame_id: u32,
    pub position: Vec3,
    pub orientation: Quat,
    pub curve_x: CurveParam,
    pub curve_y: CurveParam,
    pub curve_z: CurveParam,
    pub curve_rot: CurveParam,
}

impl BoneKeyframe {
    pub fn new(frame_id: u32) -> Self {
        Self {
            frame_id,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            curve_x: CurveParam::LINEAR,
            curve_y: CurveParam::LINEAR,
            curve_z: CurveParam::LINEAR,
            curve_rot: CurveParam::LINEAR,
        }
    }

    pub fn with_pose(frame_id: u32, position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            ..Self::new(frame_id)
        }
    }
}

/// 相机关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct CameraKeyframe {
    pub frame_id: u32,
    pub distance: f32,
    pub position: Vec3,
    /// 欧拉角（弧度）：pitch, yaw, roll
    pub orientation: Vec3,
    pub curve_x: CurveParam,
    pub curve_y: CurveParam,
    pub curve_z: CurveParam,
    pub curve_rot: CurveParam,
    pub curve_dis: CurveParam,
    pub curve_fov: CurveParam,
    pub fov_angle: f32,
    pub perspective_flag: bool,
}

impl CameraKeyframe {
    pub fn new(frame_id: u32) -> Self {
        Self {
            frame_id,
            distance: 0.0,
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            curve_x: CurveParam::LINEAR,
            curve_y: CurveParam::LINEAR,
            curve_z: CurveParam::LINEAR,
            curve_rot: CurveParam::LINEAR,
            curve_dis: CurveParam::LINEAR,
            curve_fov: CurveParam::LINEAR,
            fov_angle: 30.0,
            perspective_flag: true,
        }
    }
}
