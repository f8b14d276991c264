/// 采集会话：一个单元格 + 每个信标的有序 RSSI 序列

use crate::survey::{BeaconMap, Cell};

/// 单个信标的样本序列（只追加）
#[derive(Clone, Debug, PartialEq)]
pub struct BeaconTrack {
    pub beacon_id: String,
    samples: Vec<f64>,
}

impl BeaconTrack {
    fn new(beacon_id: &str) -> Self {
        BeaconTrack {
            beacon_id: beacon_id.to_string(),
            samples: Vec::new(),
        }
    }

    /// 按采集顺序的样本
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// 采集会话
///
/// 信标集合在创建时固定为配置的信标表，之后不会增减；
/// 样本只能追加，不能删除或重排。
#[derive(Clone, Debug)]
pub struct Session {
    cell: Cell,
    beacons: BeaconMap,
    tracks: Vec<BeaconTrack>,
}

impl Session {
    /// 为单元格创建会话，每个配置的信标对应一个空序列
    pub fn new(cell: Cell, beacons: &BeaconMap) -> Self {
        Session {
            cell,
            beacons: beacons.clone(),
            tracks: beacons.ids().map(BeaconTrack::new).collect(),
        }
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// 创建会话时使用的信标表
    pub fn beacons(&self) -> &BeaconMap {
        &self.beacons
    }

    /// 追加一个样本。未配置的信标返回 false 且不记录。
    pub fn append(&mut self, beacon_id: &str, rssi: f64) -> bool {
        match self.tracks.iter_mut().find(|t| t.beacon_id == beacon_id) {
            Some(track) => {
                track.samples.push(rssi);
                true
            }
            None => false,
        }
    }

    /// 获取某个信标的样本序列
    pub fn samples(&self, beacon_id: &str) -> Option<&[f64]> {
        self.tracks
            .iter()
            .find(|t| t.beacon_id == beacon_id)
            .map(|t| t.samples())
    }

    /// 所有信标序列（配置顺序）
    pub fn tracks(&self) -> &[BeaconTrack] {
        &self.tracks
    }

    pub fn beacon_ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.beacon_id.as_str())
    }

    /// 样本总数
    pub fn total_samples(&self) -> usize {
        self.tracks.iter().map(|t| t.len()).sum()
    }
}
