//! 转换配置
//!
//! 常量表与转换参数扁平化存放，直接在代码中修改默认值即可。

use glam::Quat;

use crate::animation::CurveParam;

/// 全局数值常量表
///
/// 所有依赖帧率、长度单位、默认曲线的计算都通过引用接收此表，
/// 不在调用点各自硬编码。
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConstants {
    /// MMD 固定帧率（帧/秒）
    pub frame_rate: f32,
    /// 每米对应的 MMD 长度单位（1 单位 = 8cm）
    pub length_unit_per_meter: f32,
    /// 默认（线性）插值曲线参数
    pub default_curve: CurveParam,
    /// 默认姿态
    pub default_orientation: Quat,
    /// 相机文件的模型名
    pub camera_header_name: &'static str,
}

impl MotionConstants {
    pub const STANDARD: MotionConstants = MotionConstants {
        frame_rate: 30.0,
        length_unit_per_meter: 1.0 / 0.08,
        default_curve: CurveParam::LINEAR,
        default_orientation: Quat::IDENTITY,
        camera_header_name: "カメラ・照明",
    };

    /// 单帧时长（秒）
    pub fn frame_duration(&self) -> f32 {
        1.0 / self.frame_rate
    }
}

impl Default for MotionConstants {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// 转换配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    // ========== 插值 ==========
    /// 相机插值采样间隔（帧），FOV 变化的区间强制为 1，默认 2
    pub interp_frame_interval: u32,
    /// 是否使用单调样条平滑（false 时使用 MMD 默认的逐区间曲线），默认 true
    pub smooth: bool,
    /// 是否平滑 FOV，默认 false
    /// FOV 写入时会取整，不平滑时按取整结果抽稀帧
    pub smooth_fov: bool,

    // ========== 相机抖动 ==========
    /// 抖动周期（秒），需与 shake_amplitude 同时给出，默认 0.0
    pub shake_interval: f32,
    /// 抖动幅度（米），默认 0.0
    pub shake_amplitude: f32,

    // ========== 骨骼 ==========
    /// 低通滤波延迟（秒），0 表示不滤波
    pub motion_delay: f32,
    /// 相机要追踪的骨骼名
    pub trace_bone_name: Option<String>,

    // ========== 常量 ==========
    pub constants: MotionConstants,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            interp_frame_interval: 2,
            smooth: true,
            smooth_fov: false,
            shake_interval: 0.0,
            shake_amplitude: 0.0,
            motion_delay: 0.0,
            trace_bone_name: None,
            constants: MotionConstants::STANDARD,
        }
    }
}

impl ConversionConfig {
    /// 有效的相机抖动参数（周期与幅度必须同时给出）
    pub fn shake(&self) -> Option<ShakeSettings> {
        ShakeSettings::from_pair(self.shake_interval, self.shake_amplitude)
    }
}

/// 相机抖动参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeSettings {
    /// 抖动点之间的时间间隔（秒）
    pub interval_seconds: f32,
    /// 抖动幅度（米）
    pub amplitude_meters: f32,
}

impl ShakeSettings {
    /// 只有两者都为正时才生效，只给出一个时忽略并警告
    pub fn from_pair(interval_seconds: f32, amplitude_meters: f32) -> Option<Self> {
        match (interval_seconds > 0.0, amplitude_meters > 0.0) {
            (true, true) => Some(Self { interval_seconds, amplitude_meters }),
            (true, false) => {
                log::warn!("未给出抖动幅度，忽略抖动周期: {} 秒", interval_seconds);
                None
            }
            (false, true) => {
                log::warn!("未给出抖动周期，忽略抖动幅度: {} 米", amplitude_meters);
                None
            }
            (false, false) => None,
        }
    }
}
