/// 采样器
///
/// 在固定时长内按固定周期采样，每个周期为每个信标追加至多一个样本。

use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::config::scan_duration_from_secs;
use crate::error::ConfigError;
use crate::survey::{RadioSource, Session};

/// 默认扫描时长（秒）
pub const DEFAULT_SCAN_DURATION_SECS: f64 = 10.0;
/// 默认采样周期（毫秒）
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

/// 一次扫描的执行情况
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanReport {
    /// 执行的周期数
    pub cycles: usize,
    /// 失败（未贡献样本）的周期数
    pub failed_cycles: usize,
    /// 因信标不在信标表中而丢弃的观测数
    pub dropped_observations: usize,
    /// 实际耗时
    pub elapsed: Duration,
}

/// 采样器
#[derive(Clone, Debug)]
pub struct Sampler {
    duration: Duration,
    interval: Duration,
    show_progress: bool,
}

impl Sampler {
    /// 创建采样器
    pub fn new(duration: Duration, interval: Duration) -> Self {
        Sampler {
            duration,
            interval,
            show_progress: false,
        }
    }

    /// 以秒为单位的时长创建
    ///
    /// 允许 0；负数、NaN 或超出 `Duration` 表示范围的值返回错误。
    pub fn from_secs_f64(duration_secs: f64, interval: Duration) -> Result<Self, ConfigError> {
        let duration = scan_duration_from_secs(duration_secs)?;
        Ok(Self::new(duration, interval))
    }

    /// 是否在终端打印进度点
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 运行扫描，直到耗时达到或超过配置时长
    ///
    /// 信标表取自会话本身。周期失败只记录警告，该周期不贡献样本；
    /// 扫描不会因此中断。
    pub async fn run<R: RadioSource>(&self, radio: &mut R, session: &mut Session) -> ScanReport {
        let beacons = session.beacons().clone();
        info!(
            "开始扫描 [{}]: 单元格 {}, 时长 {:.1}s, 周期 {}ms, 信标 {} 个",
            radio.name(),
            session.cell().id,
            self.duration.as_secs_f64(),
            self.interval.as_millis(),
            beacons.len()
        );

        let mut report = ScanReport::default();
        let start = Instant::now();

        while start.elapsed() < self.duration {
            sleep(self.interval).await;
            report.cycles += 1;

            match radio.read_cycle(&beacons).await {
                Ok(observations) => {
                    let mut seen = HashSet::new();
                    for obs in observations {
                        // 每个周期每个信标只取第一个读数
                        if !seen.insert(obs.beacon_id.clone()) {
                            continue;
                        }
                        if !session.append(&obs.beacon_id, obs.rssi) {
                            report.dropped_observations += 1;
                            debug!("丢弃未配置信标的观测: {}", obs.beacon_id);
                        }
                    }
                    debug!("周期 {}: {} 个信标有读数", report.cycles, seen.len());
                }
                Err(e) => {
                    report.failed_cycles += 1;
                    warn!("周期 {} 扫描失败，跳过: {}", report.cycles, e);
                }
            }

            if self.show_progress {
                print!(".");
                let _ = std::io::stdout().flush();
            }
        }

        report.elapsed = start.elapsed();
        if self.show_progress {
            println!();
        }
        info!(
            "扫描完成: {} 个周期 ({} 个失败), 共 {} 个样本, 耗时 {:.2}s",
            report.cycles,
            report.failed_cycles,
            session.total_samples(),
            report.elapsed.as_secs_f64()
        );
        report
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(
            Duration::from_secs_f64(DEFAULT_SCAN_DURATION_SECS),
            Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{BeaconMap, Cell, SimulatedRadio};

    #[test]
    fn test_out_of_range_duration_rejected() {
        let interval = Duration::from_millis(100);
        for secs in [-1.0, f64::NAN, f64::INFINITY, 1e30] {
            match Sampler::from_secs_f64(secs, interval) {
                Err(ConfigError::InvalidValue { field, .. }) => {
                    assert_eq!(field, "scan_duration_seconds")
                }
                other => panic!("{} 秒应被拒绝，实际: {:?}", secs, other),
            }
        }

        let sampler = Sampler::from_secs_f64(0.0, interval).unwrap();
        assert_eq!(sampler.duration(), Duration::ZERO);
        let sampler = Sampler::from_secs_f64(2.5, interval).unwrap();
        assert_eq!(sampler.duration(), Duration::from_millis(2500));
    }

    #[test]
    fn test_default_sampler() {
        let sampler = Sampler::default();
        assert_eq!(sampler.duration(), Duration::from_secs(10));
        assert_eq!(sampler.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_duration_runs_no_cycle() {
        let beacons = BeaconMap::default_survey();
        let mut session = Session::new(Cell::new("A1", 0.0, 0.0).unwrap(), &beacons);
        let mut radio = SimulatedRadio::new(-70.0, 3.0, Some(1)).unwrap();
        let sampler = Sampler::new(Duration::ZERO, Duration::from_millis(100));

        let report = tokio_test::block_on(sampler.run(&mut radio, &mut session));
        assert_eq!(report.cycles, 0);
        assert_eq!(session.total_samples(), 0);
        assert_eq!(session.beacon_ids().count(), 3);
    }
}
