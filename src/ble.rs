/// btleplug 蓝牙信号源
///
/// 使用第一个蓝牙适配器持续扫描，每个周期读取信标表中设备的最新 RSSI。
/// 单个设备的属性查询失败只跳过该设备。

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use log::{debug, info};

use crate::error::ScanError;
use crate::survey::{BeaconMap, Observation, RadioSource};

/// 基于 btleplug 的真实信号源
pub struct BtleplugRadio {
    adapter: Adapter,
}

impl BtleplugRadio {
    /// 初始化蓝牙管理器并在第一个适配器上开始扫描
    pub async fn connect() -> Result<Self, ScanError> {
        let manager = Manager::new()
            .await
            .map_err(|e| ScanError::AdapterUnavailable(e.to_string()))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| ScanError::AdapterUnavailable(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| ScanError::AdapterUnavailable("未找到蓝牙适配器".to_string()))?;

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| ScanError::AdapterUnavailable(e.to_string()))?;
        info!("✓ 蓝牙扫描已启动");
        Ok(BtleplugRadio { adapter })
    }

    /// 停止扫描
    pub async fn stop(&self) -> Result<(), ScanError> {
        self.adapter
            .stop_scan()
            .await
            .map_err(|e| ScanError::CycleFailed(e.to_string()))
    }
}

impl RadioSource for BtleplugRadio {
    async fn read_cycle(&mut self, beacons: &BeaconMap) -> Result<Vec<Observation>, ScanError> {
        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|e| ScanError::CycleFailed(e.to_string()))?;

        let mut observations = Vec::new();
        for peripheral in peripherals {
            let address = peripheral.address().to_string();
            let Some(beacon) = beacons.by_address(&address) else {
                continue;
            };

            match peripheral.properties().await {
                Ok(Some(props)) => {
                    if let Some(rssi) = props.rssi {
                        observations.push(Observation::new(beacon.id.clone(), f64::from(rssi)));
                    }
                }
                Ok(None) => continue,
                Err(e) => debug!("读取 {} 属性失败: {}", address, e),
            }
        }
        Ok(observations)
    }

    fn name(&self) -> &str {
        "btleplug"
    }
}
