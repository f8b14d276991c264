/// 错误类型定义
///
/// 按采集流程划分：输入校验、配置、扫描、写出

use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

/// 操作员输入错误（致命，扫描前终止）
#[derive(Debug, Error)]
pub enum InputError {
    #[error("单元格 ID 不能为空")]
    EmptyCellId,

    #[error("坐标 {axis} 不是有效数字: {value:?}")]
    InvalidCoordinate {
        axis: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("坐标 {axis} 必须为有限实数: {value:?}")]
    NonFiniteCoordinate { axis: &'static str, value: String },

    #[error("输入流已结束，缺少 {0}")]
    UnexpectedEof(&'static str),

    #[error("读取输入失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置项 `{field}` 无效: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("无法读取配置文件 `{path}`: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法写入配置文件 `{path}`: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析配置文件 `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 扫描错误（单个周期内被吸收，不会中断整个扫描）
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("蓝牙适配器不可用: {0}")]
    AdapterUnavailable(String),

    #[error("扫描周期失败: {0}")]
    CycleFailed(String),
}

/// 输出文件读写错误（写出失败为致命）
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("读取 `{path}` 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("写入 `{path}` 失败: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV 写入 `{path}` 失败: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON 序列化 `{path}` 失败: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON 解析 `{path}` 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 电波地图生成错误
#[derive(Debug, Error)]
pub enum RadioMapError {
    #[error("目录 `{0}` 中没有找到任何 *_stats.json 单元格数据")]
    NoCellData(PathBuf),

    #[error("读取目录 `{path}` 失败: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// 采集流程的总错误类型
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
