/// 采集结果写出
///
/// 每次运行写出两个文件：
/// - `<cell_id>_data.csv`  原始样本，每个样本一行，按信标分组
/// - `<cell_id>_stats.json` 统计记录
///
/// 已存在的同名文件会被覆盖。

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::OutputError;
use crate::survey::{BeaconStatsMap, Session, cell};

/// 原始样本文件表头
pub const RAW_HEADER: [&str; 6] = ["cell_id", "x", "y", "timestamp", "beacon", "rssi"];

#[derive(Serialize)]
struct RawRow<'a> {
    cell_id: &'a str,
    x: f64,
    y: f64,
    timestamp: &'a str,
    beacon: &'a str,
    rssi: f64,
}

/// 统计文件内容
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub cell_id: String,
    pub x: f64,
    pub y: f64,
    pub timestamp: String,
    pub beacon_stats: BeaconStatsMap,
}

impl StatsRecord {
    /// 由会话和聚合结果组装
    pub fn new(session: &Session, beacon_stats: BeaconStatsMap) -> Self {
        let cell = session.cell();
        StatsRecord {
            cell_id: cell.id.clone(),
            x: cell.x,
            y: cell.y,
            timestamp: cell.timestamp.clone(),
            beacon_stats,
        }
    }

    /// 读取统计文件
    pub fn read(path: &Path) -> Result<Self, OutputError> {
        let contents = fs::read_to_string(path).map_err(|source| OutputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| OutputError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 写出结果：两个文件的路径
#[derive(Clone, Debug, PartialEq)]
pub struct WrittenFiles {
    pub data_file: PathBuf,
    pub stats_file: PathBuf,
    pub rows: usize,
}

/// 结果写出器
#[derive(Clone, Debug)]
pub struct SurveyWriter {
    output_dir: PathBuf,
}

impl SurveyWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        SurveyWriter {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 先写原始样本，再写统计。两次写入之间没有事务保证。
    pub fn write_all(&self, session: &Session, record: &StatsRecord) -> Result<WrittenFiles, OutputError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::Write {
            path: self.output_dir.clone(),
            source,
        })?;
        let (data_file, rows) = self.write_raw(session)?;
        let stats_file = self.write_stats(record)?;
        Ok(WrittenFiles {
            data_file,
            stats_file,
            rows,
        })
    }

    /// 写原始样本 CSV，返回路径和数据行数
    pub fn write_raw(&self, session: &Session) -> Result<(PathBuf, usize), OutputError> {
        let cell = session.cell();
        let path = self.output_dir.join(cell.data_file_name());
        let csv_err = |source| OutputError::Csv {
            path: path.clone(),
            source,
        };

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(csv_err)?;
        wtr.write_record(RAW_HEADER).map_err(csv_err)?;

        let mut rows = 0;
        for track in session.tracks() {
            for &rssi in track.samples() {
                wtr.serialize(RawRow {
                    cell_id: &cell.id,
                    x: cell.x,
                    y: cell.y,
                    timestamp: &cell.timestamp,
                    beacon: &track.beacon_id,
                    rssi,
                })
                .map_err(csv_err)?;
                rows += 1;
            }
        }
        wtr.flush().map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;

        info!("已保存 {} 个样本到 {}", rows, path.display());
        Ok((path, rows))
    }

    /// 写统计 JSON（缩进格式）
    pub fn write_stats(&self, record: &StatsRecord) -> Result<PathBuf, OutputError> {
        let path = self.output_dir.join(cell::stats_file_name(&record.cell_id));
        let json = serde_json::to_string_pretty(record).map_err(|source| OutputError::Serialize {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;

        info!("统计已保存到 {}", path.display());
        Ok(path)
    }
}

/// 格式化汇总表，行顺序与原始数据文件一致（配置的信标顺序）
pub fn summary_table(session: &Session, record: &StatsRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "单元格 {} ({}, {}) @ {}", record.cell_id, record.x, record.y, record.timestamp);
    let _ = writeln!(
        out,
        "{:<8} {:>10} {:>8} {:>8} {:>8} {:>8}",
        "信标", "均值(dBm)", "标准差", "最小", "最大", "样本数"
    );
    let _ = writeln!(out, "{}", "=".repeat(56));
    for beacon_id in session.beacon_ids() {
        match record.beacon_stats.get(beacon_id).and_then(Option::as_ref) {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "{:<8} {:>10.1} {:>8.1} {:>8.1} {:>8.1} {:>8}",
                    beacon_id, s.mean, s.std, s.min, s.max, s.samples
                );
            }
            None => {
                let _ = writeln!(out, "{:<8} {:>10}", beacon_id, "无样本");
            }
        }
    }
    let _ = write!(out, "{}", "=".repeat(56));
    out
}
