/// 单元格勘测模块
///
/// 采集流程：信号源 -> 采样器 -> 聚合器 -> 写出器
/// - 信标表与单元格定义
/// - 可替换的信号源（模拟 / 真实蓝牙）
/// - 固定周期采样
/// - 描述统计与文件输出

pub mod beacon;
pub mod cell;
pub mod radio;
pub mod sampler;
pub mod session;
pub mod stats;
pub mod writer;

pub use beacon::*;
pub use cell::{Cell, TIMESTAMP_FORMAT};
pub use radio::*;
pub use sampler::*;
pub use session::*;
pub use stats::*;
pub use writer::*;
