//! 相机运动派生

mod tracer;

pub use tracer::{add_shake, trace_bone};
