/// 采集配置
///
/// 信标表和扫描参数在启动时从 JSON 文件加载，未给出的字段使用默认值，
/// 同一套程序可以用于不同的部署现场。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::plan::{GridLayout, PlanConfig};
use crate::survey::{BeaconMap, DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_SCAN_DURATION_SECS};

/// MAC 地址格式 XX:XX:XX:XX:XX:XX
const MAC_PATTERN: &str = r"^([0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}$";

/// 模拟信号参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 基线 RSSI (dBm)
    pub baseline_dbm: f64,
    /// 高斯噪声标准差 (dBm)
    pub noise_std_dbm: f64,
    /// 随机种子，None 表示使用系统熵
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            baseline_dbm: -70.0,
            noise_std_dbm: 3.0,
            seed: None,
        }
    }
}

/// 信标安装位置（仅用于生成电波地图）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeaconPlacement {
    /// 平面坐标 [x, y]（米）
    pub position: [f64; 2],
    /// 发射功率 (dBm)
    pub tx_power: i32,
}

/// 采集配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 信标符号名 -> 硬件地址
    pub beacon_map: BeaconMap,
    /// 扫描时长（秒）
    pub scan_duration_seconds: f64,
    /// 采样周期（毫秒）
    pub sample_interval_ms: u64,
    /// 输出目录
    pub output_dir: PathBuf,
    pub simulation: SimulationConfig,
    pub beacon_positions: BTreeMap<String, BeaconPlacement>,
    /// 采集计划（场地栅格与挑选规则）
    pub plan: PlanConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            beacon_map: BeaconMap::default_survey(),
            scan_duration_seconds: DEFAULT_SCAN_DURATION_SECS,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            output_dir: PathBuf::from("."),
            simulation: SimulationConfig::default(),
            beacon_positions: default_beacon_positions(),
            plan: PlanConfig::default(),
        }
    }
}

fn default_beacon_positions() -> BTreeMap<String, BeaconPlacement> {
    [("B1", [0.0, 0.0]), ("B2", [11.0, 0.0]), ("B3", [5.0, 7.0])]
        .into_iter()
        .map(|(id, position)| {
            (
                id.to_string(),
                BeaconPlacement {
                    position,
                    tx_power: -12,
                },
            )
        })
        .collect()
}

/// 秒数转换为扫描时长：非负有限且可由 `Duration` 表示
pub fn scan_duration_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        ConfigError::invalid_value("scan_duration_seconds", format!("{secs} 超出范围: {e}"))
    })
}

impl CollectorConfig {
    /// 从 JSON 文件加载并校验
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CollectorConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为 JSON 文件
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))
    }

    /// 扫描时长，超出 `Duration` 表示范围时返回错误
    pub fn scan_duration(&self) -> Result<Duration, ConfigError> {
        scan_duration_from_secs(self.scan_duration_seconds)
    }

    /// 采样周期
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// 校验配置的合理性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beacon_map.is_empty() {
            return Err(ConfigError::invalid_value("beacon_map", "至少需要一个信标"));
        }

        let mac = Regex::new(MAC_PATTERN)
            .map_err(|e| ConfigError::invalid_value("beacon_map", e.to_string()))?;
        let mut ids = HashSet::new();
        let mut addresses = HashSet::new();
        for beacon in self.beacon_map.iter() {
            if beacon.id.trim().is_empty() {
                return Err(ConfigError::invalid_value("beacon_map", "信标符号名不能为空"));
            }
            if !ids.insert(beacon.id.as_str()) {
                return Err(ConfigError::invalid_value(
                    "beacon_map",
                    format!("信标符号名 {} 重复", beacon.id),
                ));
            }
            if !mac.is_match(&beacon.address) {
                return Err(ConfigError::invalid_value(
                    format!("beacon_map.{}", beacon.id),
                    format!("地址 {:?} 不是 XX:XX:XX:XX:XX:XX 格式", beacon.address),
                ));
            }
            if !addresses.insert(beacon.address.to_ascii_uppercase()) {
                return Err(ConfigError::invalid_value(
                    format!("beacon_map.{}", beacon.id),
                    format!("地址 {} 重复", beacon.address),
                ));
            }
        }

        if !(self.scan_duration_seconds.is_finite() && self.scan_duration_seconds > 0.0) {
            return Err(ConfigError::invalid_value(
                "scan_duration_seconds",
                "必须为正数",
            ));
        }
        self.scan_duration()?;
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::invalid_value("sample_interval_ms", "必须大于 0"));
        }
        if !(self.simulation.noise_std_dbm.is_finite() && self.simulation.noise_std_dbm >= 0.0) {
            return Err(ConfigError::invalid_value(
                "simulation.noise_std_dbm",
                "必须为非负数",
            ));
        }
        if !self.simulation.baseline_dbm.is_finite() {
            return Err(ConfigError::invalid_value("simulation.baseline_dbm", "必须为有限值"));
        }
        GridLayout::parse(&self.plan.layout)?;
        Ok(())
    }
}
