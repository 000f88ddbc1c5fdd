//! 单调分段三次 Hermite 样条（PCHIP）
//!
//! 严格经过所有给定点，并保持数据的单调性，不会在相邻关键帧之间产生过冲。

use glam::{Quat, Vec3};

/// 单调保形样条
#[derive(Clone, Debug)]
pub struct MonotoneSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneSpline {
    /// `xs` 必须严格递增且与 `ys` 等长
    pub fn new(xs: &[f64], ys: &[f64]) -> Self {
        debug_assert_eq!(xs.len(), ys.len());
        debug_assert!(xs.windows(2).all(|w| w[0] < w[1]));
        Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            slopes: pchip_slopes(xs, ys),
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        match n {
            0 => 0.0,
            1 => self.ys[0],
            _ => {
                // 区间外沿用端点区间的多项式
                let k = match self.xs.partition_point(|&xi| xi <= x) {
                    0 => 0,
                    i => (i - 1).min(n - 2),
                };
                let h = self.xs[k + 1] - self.xs[k];
                let t = (x - self.xs[k]) / h;
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * self.ys[k]
                    + h10 * h * self.slopes[k]
                    + h01 * self.ys[k + 1]
                    + h11 * h * self.slopes[k + 1]
            }
        }
    }
}

/// 各节点处的导数（Fritsch-Butland 加权调和平均）
fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let m: Vec<f64> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();
    if n == 2 {
        return vec![m[0], m[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (m0, m1) = (m[k - 1], m[k]);
        if m0 == 0.0 || m1 == 0.0 || m0.signum() != m1.signum() {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / m0 + w2 / m1);
        }
    }
    d[0] = edge_slope(h[0], h[1], m[0], m[1]);
    d[n - 1] = edge_slope(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
    d
}

/// 端点导数：三点公式，并限制以保持单调
fn edge_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// 对标量序列做平滑插值
pub fn smooth_interp_scalar(
    frame_ids: &[u32],
    values: &[f32],
    frame_ids_desired: &[u32],
) -> Vec<f32> {
    let xs: Vec<f64> = frame_ids.iter().map(|&f| f64::from(f)).collect();
    let ys: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
    let spline = MonotoneSpline::new(&xs, &ys);
    frame_ids_desired
        .iter()
        .map(|&f| spline.evaluate(f64::from(f)) as f32)
        .collect()
}

/// 对向量序列逐分量做平滑插值
pub fn smooth_interp_vec3(xs: &[f64], values: &[Vec3], xs_desired: &[f64]) -> Vec<Vec3> {
    let splines: Vec<MonotoneSpline> = (0..3)
        .map(|axis| {
            let ys: Vec<f64> = values.iter().map(|v| f64::from(v[axis])).collect();
            MonotoneSpline::new(xs, &ys)
        })
        .collect();
    xs_desired
        .iter()
        .map(|&x| {
            Vec3::new(
                splines[0].evaluate(x) as f32,
                splines[1].evaluate(x) as f32,
                splines[2].evaluate(x) as f32,
            )
        })
        .collect()
}

/// 帧号版本的向量平滑插值
pub fn smooth_interp_vec3_frames(
    frame_ids: &[u32],
    values: &[Vec3],
    frame_ids_desired: &[u32],
) -> Vec<Vec3> {
    let xs: Vec<f64> = frame_ids.iter().map(|&f| f64::from(f)).collect();
    let desired: Vec<f64> = frame_ids_desired.iter().map(|&f| f64::from(f)).collect();
    smooth_interp_vec3(&xs, values, &desired)
}

/// 四元数平滑插值
///
/// 先把每个关键帧翻转到与前一帧同一半球，逐分量插值后再归一化。
pub fn smooth_interp_quat(
    frame_ids: &[u32],
    values: &[Quat],
    frame_ids_desired: &[u32],
) -> Vec<Quat> {
    let mut aligned: Vec<Quat> = Vec::with_capacity(values.len());
    for &q in values {
        let q = match aligned.last() {
            Some(prev) if prev.dot(q) < 0.0 => -q,
            _ => q,
        };
        aligned.push(q);
    }

    let xs: Vec<f64> = frame_ids.iter().map(|&f| f64::from(f)).collect();
    let splines: Vec<MonotoneSpline> = (0..4)
        .map(|axis| {
            let ys: Vec<f64> = aligned.iter().map(|q| f64::from(q.to_array()[axis])).collect();
            MonotoneSpline::new(&xs, &ys)
        })
        .collect();
    frame_ids_desired
        .iter()
        .map(|&f| {
            let x = f64::from(f);
            Quat::from_xyzw(
                splines[0].evaluate(x) as f32,
                splines[1].evaluate(x) as f32,
                splines[2].evaluate(x) as f32,
                splines[3].evaluate(x) as f32,
            )
            .normalize()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_through_points() {
        let xs = [0.0, 3.0, 7.0, 10.0];
        let ys = [1.0, 4.0, 2.0, 2.5];
        let spline = MonotoneSpline::new(&xs, &ys);
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((spline.evaluate(*x) - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_no_overshoot_on_monotone_data() {
        let xs = [0.0, 1.0, 2.0, 10.0];
        let ys = [0.0, 0.1, 5.0, 5.1];
        let spline = MonotoneSpline::new(&xs, &ys);
        let mut prev = spline.evaluate(0.0);
        for i in 1..=100 {
            let v = spline.evaluate(i as f64 * 0.1);
            assert!(v >= prev - 1e-12);
            assert!(v <= 5.1 + 1e-12);
            prev = v;
        }
    }

    #[test]
    fn test_flat_between_extrema() {
        // 局部极值处导数为 0，平台保持水平
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 1.0, 0.0];
        let spline = MonotoneSpline::new(&xs, &ys);
        assert!((spline.evaluate(1.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_points_linear() {
        let values = smooth_interp_scalar(&[0, 4], &[0.0, 8.0], &[0, 1, 2, 3, 4]);
        assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_quat_hemisphere_alignment() {
        let q = Quat::from_rotation_z(0.4);
        // -q 与 q 表示同一旋转
        let values = smooth_interp_quat(&[0, 5, 10], &[q, -q, q], &[0, 3, 7, 10]);
        for v in values {
            assert!((v.dot(q).abs() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_single_point_constant() {
        let values = smooth_interp_vec3(&[0.0], &[Vec3::ONE], &[0.0, 5.0]);
        assert_eq!(values, vec![Vec3::ONE, Vec3::ONE]);
    }
}
