/// 蓝牙信标 RSSI 采集工具
///
/// 在已知位置（单元格）采集各信标的 RSSI 样本，输出原始数据与统计，
/// 用于构建室内定位的指纹电波地图。

pub mod collector;
pub mod config;
pub mod error;
pub mod input;
pub mod plan;
pub mod radio_map;
pub mod survey;

#[cfg(feature = "ble")]
pub mod ble;

pub use collector::{CollectionOutcome, Collector};
pub use config::CollectorConfig;
pub use error::CollectorError;
