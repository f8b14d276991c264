/// 蓝牙信标定义和信标表

use serde::{Deserialize, Serialize};

/// 单个蓝牙信标：符号名 -> 硬件地址
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    /// 信标符号名（如 "B1"）
    pub id: String,
    /// 信标 MAC 地址
    pub address: String,
}

impl Beacon {
    /// 创建新的信标
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Beacon {
            id: id.into(),
            address: address.into(),
        }
    }

    /// 地址是否匹配（忽略大小写）
    pub fn matches_address(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}

/// 信标表 - 启动时配置，运行期间不可变
///
/// 保持配置顺序，原始数据文件按此顺序分组输出。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeaconMap {
    beacons: Vec<Beacon>,
}

impl BeaconMap {
    /// 从信标向量创建，重复的符号名只保留第一个
    pub fn from_vec(beacons: Vec<Beacon>) -> Self {
        let mut map = BeaconMap::default();
        for beacon in beacons {
            if map.get(&beacon.id).is_none() {
                map.beacons.push(beacon);
            }
        }
        map
    }

    /// 从 (符号名, 地址) 对创建（简洁方式）
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::from_vec(
            pairs
                .iter()
                .map(|(id, address)| Beacon::new(*id, *address))
                .collect(),
        )
    }

    /// 按符号名获取信标
    pub fn get(&self, id: &str) -> Option<&Beacon> {
        self.beacons.iter().find(|b| b.id == id)
    }

    /// 按硬件地址反查信标
    pub fn by_address(&self, address: &str) -> Option<&Beacon> {
        self.beacons.iter().find(|b| b.matches_address(address))
    }

    /// 所有符号名（配置顺序）
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.beacons.iter().map(|b| b.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Beacon> {
        self.beacons.iter()
    }

    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }

    /// 原始记录中配置的信标地址（需替换为实际设备地址）
    pub fn default_survey() -> Self {
        Self::from_pairs(&[
            ("B1", "AA:BB:CC:DD:EE:01"),
            ("B2", "AA:BB:CC:DD:EE:02"),
            ("B3", "AA:BB:CC:DD:EE:03"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beacon_map_keeps_order() {
        let map = BeaconMap::from_pairs(&[("B3", "03"), ("B1", "01"), ("B2", "02")]);
        let ids: Vec<&str> = map.ids().collect();
        assert_eq!(ids, vec!["B3", "B1", "B2"]);
    }

    #[test]
    fn test_beacon_map_ignores_duplicate_ids() {
        let map = BeaconMap::from_pairs(&[("B1", "01"), ("B1", "02")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("B1").unwrap().address, "01");
    }

    #[test]
    fn test_lookup_by_address_is_case_insensitive() {
        let map = BeaconMap::default_survey();
        let beacon = map.by_address("aa:bb:cc:dd:ee:02").unwrap();
        assert_eq!(beacon.id, "B2");
        assert!(map.by_address("11:22:33:44:55:66").is_none());
    }

    #[test]
    fn test_serializes_as_list() {
        let map = BeaconMap::from_pairs(&[("B1", "AA:BB:CC:DD:EE:01")]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"[{"id":"B1","address":"AA:BB:CC:DD:EE:01"}]"#);
    }
}
