//! 相机派生运动：骨骼追踪与抖动

use glam::Vec3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::animation::{BoneTrack, CameraTrack, smooth_interp_vec3};
use crate::config::MotionConstants;
use crate::transform::camera_euler_to_quaternion;

/// 让相机追踪骨骼
///
/// 相机位置的 x、y 视为相机局部坐标下的偏移，经相机旋转变换到世界坐标后
/// 叠加骨骼的世界位置。原位置的 z 移入距离通道。
/// 骨骼位置按相机帧号取最近的前一帧（超出范围时取首尾帧），不做插值，
/// 所以骨骼轨道必须事先插值到逐帧，否则会得到阶梯状的位置。
/// 骨骼轨道短于相机时保持其最后一帧的位置。
pub fn trace_bone(camera: &CameraTrack, bone: &BoneTrack) -> CameraTrack {
    if bone.is_empty() {
        log::warn!("追踪骨骼 {} 没有关键帧，按原点处理", bone.name);
    }

    let mut traced = camera.clone();
    for k in 0..camera.len() {
        let local = camera.positions[k];
        let q = camera_euler_to_quaternion(camera.orientations[k]);
        let bone_position = bone
            .position_at_clamped(camera.frame_ids[k])
            .unwrap_or(Vec3::ZERO);
        traced.distances[k] = local.z;
        traced.positions[k] = q * Vec3::new(local.x, local.y, 0.0) + bone_position;
    }
    traced
}

/// 生成稀疏抖动点并平滑到相机的每个采样帧（相机局部坐标，z 为 0）
fn shake_offsets<R: Rng + ?Sized>(
    frame_ids: &[u32],
    interval_seconds: f32,
    amplitude_meters: f32,
    constants: &MotionConstants,
    rng: &mut R,
) -> Option<Vec<Vec3>> {
    let last_frame = *frame_ids.last()?;
    let frames_per_interval = f64::from(interval_seconds) * f64::from(constants.frame_rate);
    let point_count = (f64::from(last_frame) / frames_per_interval).ceil() as usize + 1;

    let std_dev = amplitude_meters / 3.0 * constants.length_unit_per_meter;
    let normal = match Normal::new(0.0f32, std_dev) {
        Ok(normal) => normal,
        Err(e) => {
            log::warn!("抖动幅度无效 ({} 米): {}", amplitude_meters, e);
            return None;
        }
    };

    let shake_frames: Vec<f64> = (0..point_count)
        .map(|k| k as f64 * frames_per_interval)
        .collect();
    let points: Vec<Vec3> = (0..point_count)
        .map(|_| Vec3::new(normal.sample(&mut *rng), normal.sample(&mut *rng), 0.0))
        .collect();

    let desired: Vec<f64> = frame_ids.iter().map(|&f| f64::from(f)).collect();
    Some(smooth_interp_vec3(&shake_frames, &points, &desired))
}

/// 给相机加入随机抖动
///
/// 每隔 `interval_seconds` 秒生成一个二维高斯随机点（标准差为幅度的 1/3），
/// 用单调样条平滑到每个采样帧，经相机旋转后叠加到位置上。
/// 周期或幅度不为正时原样返回。
pub fn add_shake<R: Rng + ?Sized>(
    camera: &CameraTrack,
    interval_seconds: f32,
    amplitude_meters: f32,
    constants: &MotionConstants,
    rng: &mut R,
) -> CameraTrack {
    let mut shaken = camera.clone();
    if interval_seconds <= 0.0 || amplitude_meters <= 0.0 {
        return shaken;
    }
    let offsets =
        shake_offsets(&camera.frame_ids, interval_seconds, amplitude_meters, constants, rng);
    let Some(offsets) = offsets else {
        return shaken;
    };

    for (k, offset) in offsets.into_iter().enumerate() {
        let q = camera_euler_to_quaternion(camera.orientations[k]);
        shaken.positions[k] += q * offset;
    }
    shaken
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use crate::animation::{
        BoneKeyframe, CameraKeyframe, InterpolationMode, interpolate_track,
    };

    fn camera_with_offsets() -> CameraTrack {
        CameraTrack::from_keyframes((0..=20).step_by(5).map(|f| CameraKeyframe {
            position: Vec3::new(1.0, 2.0, -30.0),
            ..CameraKeyframe::new(f)
        }))
    }

    #[test]
    fn test_trace_is_addition_without_rotation() {
        let camera = camera_with_offsets();
        let bone = BoneTrack::from_keyframes(
            "head",
            (0..=20).map(|f| {
                BoneKeyframe::with_pose(f, Vec3::new(f as f32, 10.0, 0.0), Quat::IDENTITY)
            }),
        );
        let traced = trace_bone(&camera, &bone);
        for k in 0..traced.len() {
            let f = traced.frame_ids[k] as f32;
            assert!((traced.positions[k] - Vec3::new(1.0 + f, 12.0, 0.0)).length() < 1e-5);
            assert_eq!(traced.distances[k], -30.0);
        }
    }

    #[test]
    fn test_trace_holds_last_bone_position() {
        let camera = camera_with_offsets();
        let bone = BoneTrack::from_keyframes(
            "head",
            (0..=8).map(|f| {
                BoneKeyframe::with_pose(f, Vec3::new(0.0, f as f32, 0.0), Quat::IDENTITY)
            }),
        );
        let traced = trace_bone(&camera, &bone);
        // 帧 10 之后保持帧 8 的位置，而不是补零
        assert!((traced.positions[2] - Vec3::new(1.0, 10.0, 0.0)).length() < 1e-5);
        assert!((traced.positions[4] - Vec3::new(1.0, 10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_trace_needs_dense_bone_track() {
        let camera =
            CameraTrack::from_keyframes(vec![CameraKeyframe::new(0), CameraKeyframe::new(5)]);
        let sparse = BoneTrack::from_keyframes(
            "head",
            vec![
                BoneKeyframe::with_pose(0, Vec3::ZERO, Quat::IDENTITY),
                BoneKeyframe::with_pose(10, Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY),
            ],
        );
        // 稀疏轨道按前一关键帧取值
        let stepped = trace_bone(&camera, &sparse);
        assert_eq!(stepped.positions[1], Vec3::ZERO);

        let dense = interpolate_track(&sparse, InterpolationMode::Direct);
        let traced = trace_bone(&camera, &dense);
        assert!((traced.positions[1] - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_trace_rotates_local_offset() {
        // yaw 取反后，绕 y 轴转 -90 度把 +x 转到 +z
        let camera = CameraTrack::from_keyframes(vec![CameraKeyframe {
            position: Vec3::new(1.0, 0.0, 5.0),
            orientation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            ..CameraKeyframe::new(0)
        }]);
        let bone = BoneTrack::from_keyframes(
            "head",
            vec![BoneKeyframe::with_pose(0, Vec3::ZERO, Quat::IDENTITY)],
        );
        let traced = trace_bone(&camera, &bone);
        let expected = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2) * Vec3::X;
        assert!((traced.positions[0] - expected).length() < 1e-5);
        assert_eq!(traced.distances[0], 5.0);
    }

    #[test]
    fn test_shake_is_deterministic_with_seed() {
        let camera = camera_with_offsets();
        let constants = MotionConstants::STANDARD;
        let a = add_shake(&camera, 0.5, 0.1, &constants, &mut StdRng::seed_from_u64(7));
        let b = add_shake(&camera, 0.5, 0.1, &constants, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_ne!(a.positions, camera.positions);
        // 无旋转时抖动只在 xy 平面内
        for (shaken, original) in a.positions.iter().zip(camera.positions.iter()) {
            assert_eq!(shaken.z, original.z);
        }
    }

    #[test]
    fn test_shake_requires_positive_settings() {
        let camera = camera_with_offsets();
        let constants = MotionConstants::STANDARD;
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(add_shake(&camera, 0.0, 0.1, &constants, &mut rng), camera);
        assert_eq!(add_shake(&camera, 1.0, 0.0, &constants, &mut rng), camera);
    }

    #[test]
    fn test_shake_point_count() {
        let constants = MotionConstants::STANDARD;
        let mut rng = StdRng::seed_from_u64(3);
        let frames: Vec<u32> = (0..=45).collect();
        let offsets = shake_offsets(&frames, 1.0, 0.08, &constants, &mut rng).unwrap();
        assert_eq!(offsets.len(), frames.len());
        assert!(offsets.iter().all(|o| o.z == 0.0 && o.is_finite()));
        assert!(shake_offsets(&[], 1.0, 0.08, &constants, &mut rng).is_none());
    }
}
