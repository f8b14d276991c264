/// 单元格采集流程
///
/// 扫描全部结束后才写出文件；扫描中途终止进程不会留下任何输出。

use log::{debug, info};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::survey::{
    RadioSource, Sampler, ScanReport, Session, StatsRecord, SurveyWriter, WrittenFiles, aggregate,
    summary_table, Cell,
};

/// 一次采集的全部产物
#[derive(Debug)]
pub struct CollectionOutcome {
    pub session: Session,
    pub record: StatsRecord,
    pub report: ScanReport,
    pub files: WrittenFiles,
}

/// 采集器：按配置串联采样、聚合和写出
pub struct Collector {
    config: CollectorConfig,
    show_progress: bool,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Self {
        Collector {
            config,
            show_progress: false,
        }
    }

    /// 是否在终端显示进度点和汇总表
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// 按配置构造采样器；时长超出范围时返回配置错误
    pub fn sampler(&self) -> Result<Sampler, CollectorError> {
        let sampler =
            Sampler::from_secs_f64(self.config.scan_duration_seconds, self.config.sample_interval())?;
        Ok(sampler.with_progress(self.show_progress))
    }

    pub fn writer(&self) -> SurveyWriter {
        SurveyWriter::new(&self.config.output_dir)
    }

    /// 采集一个单元格
    pub async fn collect<R: RadioSource>(
        &self,
        cell: Cell,
        radio: &mut R,
    ) -> Result<CollectionOutcome, CollectorError> {
        let sampler = self.sampler()?;
        let mut session = Session::new(cell, &self.config.beacon_map);

        if self.show_progress {
            println!("\n正在采集单元格 {} ...", session.cell());
        }
        let report = sampler.run(radio, &mut session).await;

        let record = StatsRecord::new(&session, aggregate(&session));
        for (beacon_id, stats) in &record.beacon_stats {
            match stats {
                Some(s) => debug!("{}: {}", beacon_id, s),
                None => debug!("{}: 无样本", beacon_id),
            }
        }
        let files = self.writer().write_all(&session, &record)?;
        info!("单元格 {} 采集完成: {} 行原始数据", record.cell_id, files.rows);

        if self.show_progress {
            println!("\n✓ 已保存 {} 个样本到 {}", files.rows, files.data_file.display());
            println!("✓ 统计已保存到 {}\n", files.stats_file.display());
            println!("{}", summary_table(&session, &record));
        }

        Ok(CollectionOutcome {
            session,
            record,
            report,
            files,
        })
    }
}
