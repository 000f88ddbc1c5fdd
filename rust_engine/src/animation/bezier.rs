//! 贝塞尔曲线插值
//!
//! MMD 插值曲线是 (0,0)-(x1,y1)-(x2,y2)-(1,1) 的三次贝塞尔曲线。
//! 给定归一化时间 x，先解三次方程 X(t) = x 得到曲线参数 t，
//! 再求 Y(t) 作为缓动进度。方程用解析方法（Cardano / 三角形式）求解。

use std::f64::consts::PI;

use glam::{Quat, Vec3};

use super::keyframe::CurveParam;
use crate::transform;

/// 根允许落在 [0, 1] 之外的容差
const ROOT_TOLERANCE: f64 = 1e-6;
/// 三次项系数小于此值时按低次方程求解
const DEGENERATE_EPSILON: f64 = 1e-12;

/// 贝塞尔曲线（多项式系数形式）
///
/// `coeffs_x[i]` / `coeffs_y[i]` 为 t³, t², t¹, t⁰ 的系数。
#[derive(Clone, Debug, PartialEq)]
pub struct BezierCurve {
    coeffs_x: [f64; 4],
    coeffs_y: [f64; 4],
}

impl BezierCurve {
    pub fn new(p1: (f64, f64), p2: (f64, f64)) -> Self {
        let p0 = (0.0, 0.0);
        let p3 = (1.0, 1.0);
        let coeffs = |c0: f64, c1: f64, c2: f64, c3: f64| {
            [
                -c0 + 3.0 * c1 - 3.0 * c2 + c3,
                3.0 * c0 - 6.0 * c1 + 3.0 * c2,
                -3.0 * c0 + 3.0 * c1,
                c0,
            ]
        };
        Self {
            coeffs_x: coeffs(p0.0, p1.0, p2.0, p3.0),
            coeffs_y: coeffs(p0.1, p1.1, p2.1, p3.1),
        }
    }

    /// 从 VMD 曲线参数创建
    pub fn from_param(param: &CurveParam) -> Self {
        let [p1, p2] = param.control_points();
        Self::new(p1, p2)
    }

    /// 线性插值
    pub fn linear() -> Self {
        Self::from_param(&CurveParam::LINEAR)
    }

    /// 求解 X(t) = x 在 [0, 1] 内的根
    ///
    /// 找不到容差内的根时返回 None。
    pub fn find_root(&self, x: f64) -> Option<f64> {
        let [a, b, c, d] = self.coeffs_x;
        let candidates = solve_cubic(a, b, c, d - x);
        candidates
            .into_iter()
            .find(|t| (-ROOT_TOLERANCE..=1.0 + ROOT_TOLERANCE).contains(t))
            .map(|t| t.clamp(0.0, 1.0))
    }

    /// 求解曲线参数 t，必定落在 [0, 1]
    pub fn solve_t(&self, x: f64) -> f64 {
        if let Some(t) = self.find_root(x) {
            return t;
        }
        // 数值退化：取最接近区间的实根并钳制
        let [a, b, c, d] = self.coeffs_x;
        let nearest = solve_cubic(a, b, c, d - x)
            .into_iter()
            .min_by(|l, r| distance_to_unit(*l).total_cmp(&distance_to_unit(*r)))
            .unwrap_or(x);
        log::warn!("贝塞尔曲线在 x={} 处无 [0,1] 内的根，钳制 t={}", x, nearest);
        nearest.clamp(0.0, 1.0)
    }

    /// 评估贝塞尔曲线：归一化时间 x -> 缓动进度 y
    pub fn evaluate(&self, x: f64) -> f64 {
        let t = self.solve_t(x);
        let [a, b, c, d] = self.coeffs_y;
        ((a * t + b) * t + c) * t + d
    }
}

fn distance_to_unit(t: f64) -> f64 {
    if t < 0.0 {
        -t
    } else if t > 1.0 {
        t - 1.0
    } else {
        0.0
    }
}

/// 求 a·t³ + b·t² + c·t + d = 0 的全部实根
fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a.abs() < DEGENERATE_EPSILON {
        return solve_quadratic(b, c, d);
    }

    let ca = c / a;
    let b3a = b / (3.0 * a);
    let p = ca - 3.0 * b3a * b3a;
    let q = d / a + 2.0 * b3a * b3a * b3a - ca * b3a;
    // 判别式
    let delta = q * q + (4.0 / 27.0) * p * p * p;

    if delta >= 0.0 {
        // 单实根
        let delta_sqrt = delta.sqrt();
        let m = (0.5 * (-q + delta_sqrt)).cbrt();
        let n = (0.5 * (-q - delta_sqrt)).cbrt();
        vec![m + n - b3a]
    } else {
        // 三实根
        let th0 = (-delta).sqrt().atan2(-q);
        let r = 2.0 * (-p / 3.0).sqrt();
        (0..3)
            .map(|k| r * ((th0 + 2.0 * PI * k as f64) / 3.0).cos() - b3a)
            .collect()
    }
}

fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < DEGENERATE_EPSILON {
        if b.abs() < DEGENERATE_EPSILON {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let sqrt = disc.sqrt();
    vec![(-b + sqrt) / (2.0 * a), (-b - sqrt) / (2.0 * a)]
}

/// 区间内插值：对每个目标帧返回 [0,1] 缓动进度
///
/// 与端点帧号相同的帧返回 None，由调用方直接使用端点值。
fn curve_progress(
    frame_endpoints: (u32, u32),
    curve: &BezierCurve,
    frame_id: u32,
) -> Option<f64> {
    let (f0, f1) = frame_endpoints;
    if frame_id == f0 || frame_id == f1 {
        return None;
    }
    let x = (f64::from(frame_id) - f64::from(f0)) / (f64::from(f1) - f64::from(f0));
    Some(curve.evaluate(x))
}

/// 标量插值
///
/// - 端点帧直接返回端点值（避免浮点越界）
/// - 两端值相等时跳过曲线计算
pub fn interpolate_scalar(
    frame_endpoints: (u32, u32),
    value_endpoints: (f32, f32),
    curve_param: &CurveParam,
    frame_ids: &[u32],
) -> Vec<f32> {
    let (f0, f1) = frame_endpoints;
    let (v0, v1) = value_endpoints;
    let curve = BezierCurve::from_param(curve_param);
    frame_ids
        .iter()
        .map(|&frame_id| {
            if frame_id == f0 {
                v0
            } else if frame_id == f1 {
                v1
            } else if v0 == v1 {
                v0
            } else {
                let y = curve_progress(frame_endpoints, &curve, frame_id).unwrap_or(0.0);
                (f64::from(v0) + y * (f64::from(v1) - f64::from(v0))) as f32
            }
        })
        .collect()
}

/// 位置插值：xyz 各轴使用各自的曲线
pub fn interpolate_position(
    frame_endpoints: (u32, u32),
    position_endpoints: (Vec3, Vec3),
    curve_params: &[CurveParam; 3],
    frame_ids: &[u32],
) -> Vec<Vec3> {
    let (p0, p1) = position_endpoints;
    let axes: Vec<Vec<f32>> = (0..3)
        .map(|axis| {
            let values = (p0[axis], p1[axis]);
            interpolate_scalar(frame_endpoints, values, &curve_params[axis], frame_ids)
        })
        .collect();
    (0..frame_ids.len())
        .map(|i| Vec3::new(axes[0][i], axes[1][i], axes[2][i]))
        .collect()
}

/// 三个分量共用一条曲线的向量插值（相机欧拉角）
pub fn interpolate_vec3_shared(
    frame_endpoints: (u32, u32),
    value_endpoints: (Vec3, Vec3),
    curve_param: &CurveParam,
    frame_ids: &[u32],
) -> Vec<Vec3> {
    let (v0, v1) = value_endpoints;
    let (f0, f1) = frame_endpoints;
    let curve = BezierCurve::from_param(curve_param);
    frame_ids
        .iter()
        .map(|&frame_id| {
            if frame_id == f0 {
                v0
            } else if frame_id == f1 {
                v1
            } else if v0 == v1 {
                v0
            } else {
                let y = curve_progress(frame_endpoints, &curve, frame_id).unwrap_or(0.0) as f32;
                v0 + (v1 - v0) * y
            }
        })
        .collect()
}

/// 四元数插值
///
/// 将相对旋转 `inverse(q0) * q1` 分解为轴角，只对角度做曲线插值，
/// 再组合回 `q0 * axis_angle(axis, angle(t))`。
pub fn interpolate_quaternion(
    frame_endpoints: (u32, u32),
    quaternion_endpoints: (Quat, Quat),
    curve_param: &CurveParam,
    frame_ids: &[u32],
) -> Vec<Quat> {
    let (q0, q1) = quaternion_endpoints;
    if q0 == q1 {
        return vec![q0; frame_ids.len()];
    }
    let (f0, f1) = frame_endpoints;
    let (axis, angle) = transform::decompose(q0.conjugate() * q1);
    let angles = interpolate_scalar(frame_endpoints, (0.0, angle), curve_param, frame_ids);
    frame_ids
        .iter()
        .zip(angles)
        .map(|(&frame_id, eased)| {
            if frame_id == f0 {
                q0
            } else if frame_id == f1 {
                q1
            } else if axis == Vec3::ZERO {
                // q1 = -q0，同一旋转
                q0
            } else {
                q0 * Quat::from_axis_angle(axis, eased)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve_midpoint() {
        let curve = BezierCurve::linear();
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_root_validity_over_legal_params() {
        let steps: Vec<i8> = (0..=127).step_by(9).map(|v| v as i8).chain([127]).collect();
        let xs: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        for &x1 in &steps {
            for &y1 in &[0i8, 64, 127] {
                for &x2 in &steps {
                    for &y2 in &[0i8, 64, 127] {
                        let curve = BezierCurve::from_param(&CurveParam::new(x1, y1, x2, y2));
                        for &x in &xs {
                            let t = curve
                                .find_root(x)
                                .unwrap_or_else(|| {
                                    panic!("no root for {:?} at x={}", (x1, y1, x2, y2), x)
                                });
                            assert!((0.0..=1.0).contains(&t));
                            let [a, b, c, d] = curve.coeffs_x;
                            let back = ((a * t + b) * t + c) * t + d;
                            assert!((back - x).abs() < 1e-6, "X(t)={} x={}", back, x);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_endpoint_exactness() {
        let curve = CurveParam::new(127, 0, 0, 127);
        let values = interpolate_scalar((3, 17), (1.1, -7.3), &curve, &[3, 10, 17]);
        assert_eq!(values[0], 1.1);
        assert_eq!(values[2], -7.3);
    }

    #[test]
    fn test_constant_segment() {
        let curve = CurveParam::new(100, 3, 5, 90);
        let values = interpolate_scalar((0, 8), (2.5, 2.5), &curve, &(0..=8).collect::<Vec<_>>());
        assert!(values.iter().all(|&v| v == 2.5));
    }

    #[test]
    fn test_linear_position_midpoint() {
        let curves = [CurveParam::LINEAR; 3];
        let positions = interpolate_position(
            (0, 10),
            (Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)),
            &curves,
            &(0..=10).collect::<Vec<_>>(),
        );
        assert!((positions[5].x - 5.0).abs() < 1e-4);
        assert_eq!(positions[10], Vec3::new(10.0, 0.0, 0.0));
        // 单调
        for w in positions.windows(2) {
            assert!(w[1].x >= w[0].x);
        }
    }

    #[test]
    fn test_quaternion_interpolation() {
        let q0 = Quat::IDENTITY;
        let q1 = Quat::from_rotation_y(1.0);
        let frames: Vec<u32> = (0..=4).collect();
        let qs = interpolate_quaternion((0, 4), (q0, q1), &CurveParam::LINEAR, &frames);
        assert_eq!(qs[0], q0);
        assert_eq!(qs[4], q1);
        let expected = Quat::from_rotation_y(0.5);
        assert!((qs[2].dot(expected).abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_quaternion_constant() {
        let q = Quat::from_rotation_x(0.3);
        let curve = CurveParam::new(0, 127, 127, 0);
        let qs = interpolate_quaternion((0, 5), (q, q), &curve, &[1, 2, 3]);
        assert!(qs.iter().all(|&v| v == q));
    }

    #[test]
    fn test_degenerate_cubic_falls_back() {
        // x1 = x2 = 0 时 X(t) = t³
        let curve = BezierCurve::from_param(&CurveParam::new(0, 0, 0, 0));
        let t = curve.solve_t(0.125);
        assert!((t - 0.5).abs() < 1e-9);
    }
}
