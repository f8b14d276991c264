/// 勘测单元格（采集点）

use chrono::{DateTime, Local};
use std::fmt;

use crate::error::InputError;

/// 时间戳格式，与采集文件一致
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 一个已标注的勘测点
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// 单元格 ID（大写）
    pub id: String,
    /// X 坐标（米）
    pub x: f64,
    /// Y 坐标（米）
    pub y: f64,
    /// 采集时间戳（`%Y%m%d_%H%M%S`）
    pub timestamp: String,
}

impl Cell {
    /// 以当前本地时间创建单元格
    pub fn new(id: &str, x: f64, y: f64) -> Result<Self, InputError> {
        Self::with_time(id, x, y, Local::now())
    }

    /// 使用指定时间创建单元格
    pub fn with_time(id: &str, x: f64, y: f64, at: DateTime<Local>) -> Result<Self, InputError> {
        Ok(Cell {
            id: normalize_cell_id(id)?,
            x,
            y,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        })
    }

    /// 原始样本文件名
    pub fn data_file_name(&self) -> String {
        data_file_name(&self.id)
    }

    /// 统计文件名
    pub fn stats_file_name(&self) -> String {
        stats_file_name(&self.id)
    }
}

/// `<ID>_data.csv`，编号一律大写
pub fn data_file_name(cell_id: &str) -> String {
    format!("{}_data.csv", cell_id.trim().to_uppercase())
}

/// `<ID>_stats.json`，编号一律大写
pub fn stats_file_name(cell_id: &str) -> String {
    format!("{}_stats.json", cell_id.trim().to_uppercase())
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.id, self.x, self.y)
    }
}

/// 去除首尾空白并转为大写，空字符串视为错误
pub fn normalize_cell_id(raw: &str) -> Result<String, InputError> {
    let id = raw.trim().to_uppercase();
    if id.is_empty() {
        return Err(InputError::EmptyCellId);
    }
    Ok(id)
}
