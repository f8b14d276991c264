/// 信号源接口
///
/// 采样器只依赖“每周期、每信标一个标量读数”的契约，
/// 模拟信号源和真实蓝牙扫描都实现同一个 trait。

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::config::SimulationConfig;
use crate::error::{ConfigError, ScanError};
use crate::survey::BeaconMap;

/// 单个 RSSI 观测
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// 信标符号名
    pub beacon_id: String,
    /// RSSI 值 (dBm)
    pub rssi: f64,
}

impl Observation {
    pub fn new(beacon_id: impl Into<String>, rssi: f64) -> Self {
        Observation {
            beacon_id: beacon_id.into(),
            rssi,
        }
    }
}

/// 信号源：给定扫描窗口（一个采样周期），返回 (信标, RSSI) 观测集合
#[allow(async_fn_in_trait)]
pub trait RadioSource {
    /// 读取一个周期的观测。返回错误时该周期不贡献样本。
    async fn read_cycle(&mut self, beacons: &BeaconMap) -> Result<Vec<Observation>, ScanError>;

    /// 信号源名称（用于日志）
    fn name(&self) -> &str;
}

/// 模拟信号源：基线 + 高斯噪声
///
/// 仅作为真实扫描的临时替身。
pub struct SimulatedRadio {
    noise: Normal<f64>,
    rng: StdRng,
}

impl SimulatedRadio {
    /// 创建模拟信号源
    ///
    /// 噪声标准差必须是非负有限值，基线必须是有限值。
    pub fn new(baseline_dbm: f64, noise_std_dbm: f64, seed: Option<u64>) -> Result<Self, ConfigError> {
        if !baseline_dbm.is_finite() {
            return Err(ConfigError::invalid_value(
                "simulation.baseline_dbm",
                format!("必须是有限值，实际为 {baseline_dbm}"),
            ));
        }
        // Normal::new 会接受负的标准差
        if !(noise_std_dbm.is_finite() && noise_std_dbm >= 0.0) {
            return Err(ConfigError::invalid_value(
                "simulation.noise_std_dbm",
                format!("必须是非负有限值，实际为 {noise_std_dbm}"),
            ));
        }
        let noise = Normal::new(baseline_dbm, noise_std_dbm).map_err(|e| {
            ConfigError::invalid_value("simulation.noise_std_dbm", e.to_string())
        })?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(SimulatedRadio { noise, rng })
    }

    /// 从配置创建
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::new(config.baseline_dbm, config.noise_std_dbm, config.seed)
    }

    fn sample(&mut self) -> f64 {
        self.noise.sample(&mut self.rng)
    }
}

impl RadioSource for SimulatedRadio {
    async fn read_cycle(&mut self, beacons: &BeaconMap) -> Result<Vec<Observation>, ScanError> {
        Ok(beacons
            .ids()
            .map(|id| Observation::new(id, self.sample()))
            .collect())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
