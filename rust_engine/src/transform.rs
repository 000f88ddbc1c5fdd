//! 刚体变换与 MMD 专用的四元数约定
//!
//! 四元数运算直接使用 glam 的运算符（Hamilton 约定），
//! 这里只保留轴角分解与相机欧拉角两处约定。

use glam::{Quat, Vec3};

/// 姿态（旋转 + 平移）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub orientation: Quat,
    pub position: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}

impl Pose {
    pub fn new(orientation: Quat, position: Vec3) -> Self {
        Self { orientation, position }
    }

    /// 将以本姿态局部坐标表示的子姿态变换到本姿态所在空间
    pub fn compose(&self, child: &Pose) -> Pose {
        Pose {
            orientation: self.orientation * child.orientation,
            position: self.position + self.orientation * child.position,
        }
    }
}

/// 分解为旋转轴和旋转角
///
/// 角度为 `2 * atan2(|v|, w)`；角度为 0 时旋转轴为零向量。
pub fn decompose(q: Quat) -> (Vec3, f32) {
    let v = q.xyz();
    let sin_half = v.length();
    let angle = 2.0 * sin_half.atan2(q.w);
    let axis = if sin_half > 0.0 { v / sin_half } else { Vec3::ZERO };
    (axis, angle)
}

/// MMD 相机欧拉角 (pitch, yaw, roll) 转四元数
///
/// 相机使用左手坐标系，yaw 与 roll 轴相对 pitch 取反：
/// `q = Ry(-yaw) * Rx(pitch) * Rz(-roll)`
pub fn camera_euler_to_quaternion(angles: Vec3) -> Quat {
    let pitch = Quat::from_axis_angle(Vec3::X, angles.x);
    let yaw = Quat::from_axis_angle(Vec3::Y, -angles.y);
    let roll = Quat::from_axis_angle(Vec3::Z, -angles.z);
    yaw * pitch * roll
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_decompose_roundtrip() {
        let axis = Vec3::new(1.0, 2.0, -0.5).normalize();
        let q = Quat::from_axis_angle(axis, 1.3);
        let (a, angle) = decompose(q);
        assert!(approx_vec(a, axis));
        assert!((angle - 1.3).abs() < 1e-5);
    }

    #[test]
    fn test_decompose_identity() {
        let (axis, angle) = decompose(Quat::IDENTITY);
        assert_eq!(axis, Vec3::ZERO);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_decompose_relative_rotation() {
        let q0 = Quat::from_rotation_y(0.4);
        let q1 = Quat::from_rotation_x(-0.9) * Quat::from_rotation_z(0.2);
        let (axis, angle) = decompose(q0.conjugate() * q1);
        let back = q0 * Quat::from_axis_angle(axis, angle);
        assert!((back.dot(q1).abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_pose_compose() {
        let parent = Pose::new(Quat::from_axis_angle(Vec3::Z, FRAC_PI_2), Vec3::new(1.0, 0.0, 0.0));
        let child = Pose::new(Quat::IDENTITY, Vec3::new(2.0, 0.0, 0.0));
        let world = parent.compose(&child);
        assert!(approx_vec(world.position, Vec3::new(1.0, 2.0, 0.0)));
        assert!((world.orientation.dot(parent.orientation).abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_camera_euler_sign_convention() {
        assert_eq!(camera_euler_to_quaternion(Vec3::ZERO), Quat::IDENTITY);
        // yaw 取反：正 yaw 使 X 轴转向 +Z
        let q = camera_euler_to_quaternion(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert!(approx_vec(q * Vec3::X, Vec3::Z));
        // pitch 不取反
        let q = camera_euler_to_quaternion(Vec3::new(FRAC_PI_2, 0.0, 0.0));
        assert!(approx_vec(q * Vec3::Y, Vec3::Z));
        // roll 取反
        let q = camera_euler_to_quaternion(Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert!(approx_vec(q * Vec3::X, -Vec3::Y));
    }
}
