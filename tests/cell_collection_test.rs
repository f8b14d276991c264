/// 单元格采集流程集成测试
///
/// 覆盖：采样 -> 聚合 -> 写出 的完整链路，以及信号源失败时的行为

use blumap::config::CollectorConfig;
use blumap::error::{CollectorError, ConfigError, ScanError};
use blumap::survey::*;
use blumap::Collector;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

fn config_for(dir: &std::path::Path, beacons: BeaconMap, duration_secs: f64) -> CollectorConfig {
    CollectorConfig {
        beacon_map: beacons,
        scan_duration_seconds: duration_secs,
        output_dir: dir.to_path_buf(),
        ..CollectorConfig::default()
    }
}

/// 每隔一个周期失败的信号源
struct FlakyRadio {
    inner: SimulatedRadio,
    cycle: usize,
}

impl RadioSource for FlakyRadio {
    async fn read_cycle(&mut self, beacons: &BeaconMap) -> Result<Vec<Observation>, ScanError> {
        self.cycle += 1;
        if self.cycle % 2 == 0 {
            return Err(ScanError::CycleFailed("模拟适配器超时".to_string()));
        }
        self.inner.read_cycle(beacons).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// 只报告部分信标、并混入未知设备和重复读数的信号源
struct PartialRadio;

impl RadioSource for PartialRadio {
    async fn read_cycle(&mut self, _beacons: &BeaconMap) -> Result<Vec<Observation>, ScanError> {
        Ok(vec![
            Observation::new("B1", -61.0),
            Observation::new("B1", -99.0),
            Observation::new("X9", -50.0),
        ])
    }

    fn name(&self) -> &str {
        "partial"
    }
}

#[tokio::test]
async fn test_short_scan_three_beacons() {
    println!("\n========== 0.3 秒三信标采集 ==========\n");

    let tmp = tempdir().unwrap();
    let config = config_for(tmp.path(), BeaconMap::default_survey(), 0.3);
    let collector = Collector::new(config);
    let mut radio = SimulatedRadio::new(-70.0, 3.0, Some(11)).unwrap();

    let cell = Cell::new("A1", 1.0, 2.0).unwrap();
    let outcome = collector.collect(cell, &mut radio).await.unwrap();

    // 会话中的信标集合与配置完全一致
    let ids: Vec<&str> = outcome.session.beacon_ids().collect();
    assert_eq!(ids, vec!["B1", "B2", "B3"]);

    for track in outcome.session.tracks() {
        println!("✓ {}: {} 个样本", track.beacon_id, track.len());
        assert!(
            (2..=4).contains(&track.len()),
            "{} 样本数 {} 不在 2..=4 范围内",
            track.beacon_id,
            track.len()
        );
    }

    // 原始数据：表头 + 每个样本一行
    let csv = fs::read_to_string(&outcome.files.data_file).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "cell_id,x,y,timestamp,beacon,rssi");
    assert_eq!(lines.len(), 1 + outcome.session.total_samples());
    assert_eq!(outcome.files.rows, outcome.session.total_samples());

    // 按信标分组：B1 的行全部在 B2 之前
    let beacons: Vec<&str> = lines[1..]
        .iter()
        .map(|l| l.split(',').nth(4).unwrap())
        .collect();
    let mut sorted = beacons.clone();
    sorted.sort();
    assert_eq!(beacons, sorted);

    // 统计：三个非空条目
    let stats = StatsRecord::read(&outcome.files.stats_file).unwrap();
    assert_eq!(stats.beacon_stats.len(), 3);
    for (id, s) in &stats.beacon_stats {
        let s = s.as_ref().unwrap_or_else(|| panic!("{} 统计不应为空", id));
        assert!(s.min <= s.mean && s.mean <= s.max);
        assert!(s.std >= 0.0);
    }
    assert_eq!(stats.cell_id, outcome.record.cell_id);
    assert_eq!((stats.x, stats.y), (1.0, 2.0));
    for (id, s) in &stats.beacon_stats {
        let expected = outcome.record.beacon_stats[id].as_ref().unwrap();
        let s = s.as_ref().unwrap();
        assert!((s.mean - expected.mean).abs() < 1e-9);
        assert!((s.std - expected.std).abs() < 1e-9);
        assert_eq!(s.samples, expected.samples);
    }
}

#[tokio::test]
async fn test_zero_duration_writes_header_and_null_stats() {
    let tmp = tempdir().unwrap();
    let beacons = BeaconMap::from_pairs(&[("B1", "AA:BB:CC:DD:EE:01")]);
    let writer = SurveyWriter::new(tmp.path());
    let mut session = Session::new(Cell::new("Z9", 0.0, 0.0).unwrap(), &beacons);
    let mut radio = SimulatedRadio::new(-70.0, 3.0, None).unwrap();

    let sampler = Sampler::new(Duration::ZERO, Duration::from_millis(100));
    let report = sampler.run(&mut radio, &mut session).await;
    assert_eq!(report.cycles, 0);

    let record = StatsRecord::new(&session, aggregate(&session));
    let files = writer.write_all(&session, &record).unwrap();

    let csv = fs::read_to_string(&files.data_file).unwrap();
    assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["cell_id,x,y,timestamp,beacon,rssi"]);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&files.stats_file).unwrap()).unwrap();
    assert!(json["beacon_stats"]["B1"].is_null());
    assert_eq!(json["cell_id"], "Z9");
}

#[tokio::test]
async fn test_lowercase_cell_id_used_in_file_names() {
    let tmp = tempdir().unwrap();
    let config = config_for(tmp.path(), BeaconMap::default_survey(), 0.1);
    let collector = Collector::new(config);
    let mut radio = SimulatedRadio::new(-70.0, 3.0, Some(3)).unwrap();

    let cell = Cell::new("a1", 0.5, 0.5).unwrap();
    let outcome = collector.collect(cell, &mut radio).await.unwrap();

    assert_eq!(outcome.record.cell_id, "A1");
    assert!(tmp.path().join("A1_data.csv").exists());
    assert!(tmp.path().join("A1_stats.json").exists());
    assert!(!tmp.path().join("a1_data.csv").exists());

    let csv = fs::read_to_string(tmp.path().join("A1_data.csv")).unwrap();
    assert!(csv.lines().skip(1).all(|l| l.starts_with("A1,")));
}

#[tokio::test]
async fn test_failed_cycles_contribute_no_samples() {
    println!("\n========== 周期失败不中断扫描 ==========\n");

    let beacons = BeaconMap::default_survey();
    let mut session = Session::new(Cell::new("F1", 0.0, 0.0).unwrap(), &beacons);
    let mut radio = FlakyRadio {
        inner: SimulatedRadio::new(-70.0, 3.0, Some(5)).unwrap(),
        cycle: 0,
    };

    let sampler = Sampler::new(Duration::from_millis(400), Duration::from_millis(100));
    let report = sampler.run(&mut radio, &mut session).await;

    println!(
        "✓ 周期 {}, 失败 {}, 样本 {}",
        report.cycles,
        report.failed_cycles,
        session.total_samples()
    );
    assert!(report.cycles >= 2);
    assert_eq!(report.failed_cycles, report.cycles / 2);
    let ok_cycles = report.cycles - report.failed_cycles;
    for track in session.tracks() {
        assert_eq!(track.len(), ok_cycles);
    }
}

#[tokio::test]
async fn test_partial_observations() {
    let beacons = BeaconMap::default_survey();
    let mut session = Session::new(Cell::new("P1", 0.0, 0.0).unwrap(), &beacons);

    let sampler = Sampler::new(Duration::from_millis(200), Duration::from_millis(100));
    let report = sampler.run(&mut PartialRadio, &mut session).await;

    // 重复读数只取第一个，未知设备被丢弃
    assert!(session.samples("B1").unwrap().iter().all(|&v| v == -61.0));
    assert_eq!(session.samples("B1").unwrap().len(), report.cycles);
    assert_eq!(report.dropped_observations, report.cycles);

    // 从未收到读数的信标依然存在，统计为空
    let stats = aggregate(&session);
    assert_eq!(stats.len(), 3);
    assert!(stats["B2"].is_none());
    assert!(stats["B3"].is_none());
}

#[tokio::test]
async fn test_session_keys_match_configured_set() {
    let sets = [
        BeaconMap::from_pairs(&[("B1", "AA:BB:CC:DD:EE:01")]),
        BeaconMap::from_pairs(&[("K2", "AA:BB:CC:DD:EE:02"), ("K1", "AA:BB:CC:DD:EE:01")]),
        BeaconMap::default_survey(),
    ];

    for beacons in sets {
        let mut session = Session::new(Cell::new("K", 0.0, 0.0).unwrap(), &beacons);
        let mut radio = SimulatedRadio::new(-70.0, 3.0, Some(1)).unwrap();
        let sampler = Sampler::new(Duration::from_millis(100), Duration::from_millis(100));
        sampler.run(&mut radio, &mut session).await;

        let expected: Vec<&str> = beacons.ids().collect();
        let actual: Vec<&str> = session.beacon_ids().collect();
        assert_eq!(actual, expected);

        let stats = aggregate(&session);
        let mut stat_keys: Vec<&str> = stats.keys().map(String::as_str).collect();
        let mut expected_sorted = expected.clone();
        stat_keys.sort();
        expected_sorted.sort();
        assert_eq!(stat_keys, expected_sorted);
    }
}

#[tokio::test]
async fn test_out_of_range_duration_fails_without_output() {
    println!("\n========== 超大扫描时长 ==========\n");

    let tmp = tempdir().unwrap();
    // 未经 validate() 的配置直接交给采集器
    let config = config_for(tmp.path(), BeaconMap::default_survey(), 1e30);
    let collector = Collector::new(config);
    let mut radio = SimulatedRadio::new(-70.0, 3.0, Some(9)).unwrap();

    let result = collector.collect(Cell::new("H1", 0.0, 0.0).unwrap(), &mut radio).await;
    match result {
        Err(CollectorError::Config(ConfigError::InvalidValue { field, .. })) => {
            assert_eq!(field, "scan_duration_seconds");
            println!("✓ 已拒绝: {}", field);
        }
        Err(e) => panic!("意外错误: {}", e),
        Ok(_) => panic!("超大时长应被拒绝"),
    }
    assert!(!tmp.path().join("H1_data.csv").exists());
    assert!(!tmp.path().join("H1_stats.json").exists());
}

#[tokio::test]
async fn test_sampler_uses_session_beacons() {
    // 会话只配置了 K1，信号源报告的其他信标都被丢弃
    let beacons = BeaconMap::from_pairs(&[("K1", "AA:BB:CC:DD:EE:01")]);
    let mut session = Session::new(Cell::new("S1", 0.0, 0.0).unwrap(), &beacons);
    let mut radio = SimulatedRadio::new(-70.0, 3.0, Some(2)).unwrap();

    let sampler = Sampler::new(Duration::from_millis(200), Duration::from_millis(100));
    let report = sampler.run(&mut radio, &mut session).await;

    assert_eq!(session.beacons(), &beacons);
    assert_eq!(session.samples("K1").unwrap().len(), report.cycles);
    assert_eq!(report.dropped_observations, 0);
}
