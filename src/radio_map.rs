/// 电波地图生成
///
/// 汇总目录中所有 `*_stats.json`，生成指纹匹配使用的 radio_map.json。
/// 坐标按网格取整，缺失的信标统计用无信号占位值代替。

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BeaconPlacement;
use crate::error::{OutputError, RadioMapError};
use crate::survey::{BeaconStats, StatsRecord};

const STATS_SUFFIX: &str = "_stats.json";

/// 电波地图中的一个单元格
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadioMapCell {
    /// 网格 X 坐标
    pub x: i64,
    /// 网格 Y 坐标
    pub y: i64,
    pub beacon_stats: BTreeMap<String, BeaconStats>,
}

impl RadioMapCell {
    /// 由统计记录转换，空统计替换为无信号占位
    pub fn from_record(record: &StatsRecord) -> Self {
        RadioMapCell {
            x: record.x.trunc() as i64,
            y: record.y.trunc() as i64,
            beacon_stats: record
                .beacon_stats
                .iter()
                .map(|(id, stats)| (id.clone(), stats.clone().unwrap_or_else(BeaconStats::no_signal)))
                .collect(),
        }
    }
}

/// 电波地图元数据
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadioMapMetadata {
    pub creation_date: DateTime<Utc>,
    pub grid_resolution: f64,
    pub total_cells: usize,
    pub cells_collected: Vec<String>,
    pub beacon_config: BTreeMap<String, BeaconPlacement>,
    pub notes: String,
}

/// 电波地图
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadioMap {
    pub metadata: RadioMapMetadata,
    pub cells: BTreeMap<String, RadioMapCell>,
}

impl RadioMap {
    /// 由单元格集合构建
    pub fn new(
        cells: BTreeMap<String, RadioMapCell>,
        beacon_config: BTreeMap<String, BeaconPlacement>,
    ) -> Self {
        RadioMap {
            metadata: RadioMapMetadata {
                creation_date: Utc::now(),
                grid_resolution: 1.0,
                total_cells: cells.len(),
                cells_collected: cells.keys().cloned().collect(),
                beacon_config,
                notes: "radio map aggregated from per-cell survey statistics".to_string(),
            },
            cells,
        }
    }

    /// 写出为缩进 JSON
    pub fn write(&self, path: &Path) -> Result<(), OutputError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| OutputError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("✓ 已生成 {}，共 {} 个单元格", path.display(), self.cells.len());
        Ok(())
    }
}

/// 列出目录中的统计文件（按文件名排序）
pub fn find_stats_files(dir: &Path) -> Result<Vec<PathBuf>, RadioMapError> {
    let entries = fs::read_dir(dir).map_err(|source| RadioMapError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(STATS_SUFFIX))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// 汇总目录中的所有单元格统计
///
/// 无法读取或格式错误的文件记录警告后跳过。
pub fn aggregate_dir(dir: &Path) -> Result<BTreeMap<String, RadioMapCell>, RadioMapError> {
    let mut cells = BTreeMap::new();
    for path in find_stats_files(dir)? {
        match StatsRecord::read(&path) {
            Ok(record) => {
                info!("✓ 已加入单元格 {}", record.cell_id);
                cells.insert(record.cell_id.clone(), RadioMapCell::from_record(&record));
            }
            Err(e) => warn!("✗ 处理 {} 出错: {}", path.display(), e),
        }
    }

    if cells.is_empty() {
        return Err(RadioMapError::NoCellData(dir.to_path_buf()));
    }
    Ok(cells)
}

/// 汇总目录并写出电波地图
pub fn build_radio_map(
    data_dir: &Path,
    output: &Path,
    beacon_config: BTreeMap<String, BeaconPlacement>,
) -> Result<RadioMap, RadioMapError> {
    let cells = aggregate_dir(data_dir)?;
    let map = RadioMap::new(cells, beacon_config);
    map.write(output)?;
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::BeaconStatsMap;
    use tempfile::tempdir;

    fn record(cell_id: &str, x: f64, y: f64) -> StatsRecord {
        let mut beacon_stats = BeaconStatsMap::new();
        beacon_stats.insert("B1".to_string(), BeaconStats::from_samples(&[-60.0, -62.0]));
        beacon_stats.insert("B2".to_string(), None);
        StatsRecord {
            cell_id: cell_id.to_string(),
            x,
            y,
            timestamp: "20240101_120000".to_string(),
            beacon_stats,
        }
    }

    #[test]
    fn test_null_stats_become_no_signal() {
        let cell = RadioMapCell::from_record(&record("A1", 2.7, 5.2));
        assert_eq!((cell.x, cell.y), (2, 5));
        assert_eq!(cell.beacon_stats["B2"], BeaconStats::no_signal());
        assert_eq!(cell.beacon_stats["B1"].samples, 2);
    }

    #[test]
    fn test_aggregate_dir_skips_bad_files() {
        let tmp = tempdir().unwrap();
        for r in [record("A1", 0.0, 0.0), record("B4", 3.0, 1.0)] {
            let json = serde_json::to_string_pretty(&r).unwrap();
            fs::write(tmp.path().join(format!("{}_stats.json", r.cell_id)), json).unwrap();
        }
        fs::write(tmp.path().join("C1_stats.json"), "{ broken").unwrap();
        fs::write(tmp.path().join("A1_data.csv"), "cell_id,x,y,timestamp,beacon,rssi\n").unwrap();

        let cells = aggregate_dir(tmp.path()).unwrap();
        assert_eq!(cells.keys().collect::<Vec<_>>(), vec!["A1", "B4"]);
    }

    #[test]
    fn test_empty_dir_is_error() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            aggregate_dir(tmp.path()),
            Err(RadioMapError::NoCellData(_))
        ));
    }

    #[test]
    fn test_build_radio_map_writes_file() {
        let tmp = tempdir().unwrap();
        let r = record("A1", 1.0, 1.0);
        fs::write(
            tmp.path().join("A1_stats.json"),
            serde_json::to_string(&r).unwrap(),
        )
        .unwrap();

        let output = tmp.path().join("radio_map.json");
        let map = build_radio_map(tmp.path(), &output, BTreeMap::new()).unwrap();
        assert_eq!(map.metadata.total_cells, 1);
        assert_eq!(map.metadata.cells_collected, vec!["A1".to_string()]);

        let loaded: RadioMap = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(loaded.cells, map.cells);
    }
}
