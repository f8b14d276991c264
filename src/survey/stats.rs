/// 样本统计（聚合器）
///
/// 纯函数：相同输入得到相同输出，无副作用。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::survey::Session;

/// 单个信标在一个单元格内的描述统计
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeaconStats {
    /// 算术平均值 (dBm)
    pub mean: f64,
    /// 总体标准差（除以样本数）
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// 样本数
    pub samples: usize,
}

impl BeaconStats {
    /// 计算统计量，空序列返回 None
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / count;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // 浮点舍入可能让均值略微越界
        let mean = if mean < min {
            min
        } else if mean > max {
            max
        } else {
            mean
        };

        Some(BeaconStats {
            mean,
            std: variance.sqrt(),
            min,
            max,
            samples: samples.len(),
        })
    }

    /// 无信号占位（电波地图中代替空统计）
    pub fn no_signal() -> Self {
        BeaconStats {
            mean: -100.0,
            std: 0.0,
            min: -100.0,
            max: -100.0,
            samples: 0,
        }
    }
}

impl fmt::Display for BeaconStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean={:.1}dBm, std={:.1}, min={:.1}, max={:.1}, samples={}",
            self.mean, self.std, self.min, self.max, self.samples
        )
    }
}

/// 信标符号名 -> 统计（无样本的信标为 None）
pub type BeaconStatsMap = BTreeMap<String, Option<BeaconStats>>;

/// 对会话中每个信标的样本序列求统计
pub fn aggregate(session: &Session) -> BeaconStatsMap {
    session
        .tracks()
        .iter()
        .map(|track| (track.beacon_id.clone(), BeaconStats::from_samples(track.samples())))
        .collect()
}
