use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};

use blumap::input::InputCollector;
use blumap::plan::{PLAN_FILE_NAME, build_plan, field_sheet};
use blumap::radio_map::build_radio_map;
use blumap::survey::{Cell, SimulatedRadio};
use blumap::{Collector, CollectorConfig};

/// 蓝牙信标 RSSI 采集工具（电波地图勘测）
#[derive(Parser)]
#[command(name = "blumap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 在一个单元格采集 RSSI 样本（默认命令）
    Collect(CollectArgs),
    /// 汇总 *_stats.json 生成 radio_map.json
    RadioMap {
        /// 统计文件所在目录
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
        /// 输出文件
        #[arg(long, default_value = "radio_map.json")]
        output: PathBuf,
        /// 配置文件（读取信标位置）
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// 根据场地栅格生成现场采集单和 mvp_cells_to_collect.json
    Plan {
        /// 配置文件（读取栅格、信标位置和挑选规则）
        #[arg(long)]
        config: Option<PathBuf>,
        /// 输出文件，默认写到配置的输出目录
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// 打印默认配置 JSON
    DefaultConfig,
}

#[derive(Args, Default)]
struct CollectArgs {
    /// 配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 扫描时长（秒），覆盖配置
    #[arg(long)]
    duration: Option<f64>,
    /// 输出目录，覆盖配置
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// 模拟信号随机种子，覆盖配置
    #[arg(long)]
    seed: Option<u64>,
    /// 使用真实蓝牙适配器代替模拟信号（需要 `ble` 功能）
    #[arg(long)]
    ble: bool,
}

fn load_config(path: Option<&Path>) -> Result<CollectorConfig> {
    match path {
        Some(path) => CollectorConfig::from_json(path)
            .with_context(|| format!("加载配置 {} 失败", path.display())),
        None => Ok(CollectorConfig::default()),
    }
}

async fn collect(args: CollectArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(duration) = args.duration {
        config.scan_duration_seconds = duration;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    config.validate().context("配置无效")?;
    if args.ble && !cfg!(feature = "ble") {
        anyhow::bail!("编译时未启用 `ble` 功能，无法使用真实蓝牙扫描");
    }

    println!("{}", "=".repeat(50));
    println!("蓝牙信标 RSSI 采集 - 电波地图勘测");
    println!("{}", "=".repeat(50));

    let input = InputCollector::new(io::stdin().lock(), io::stdout())
        .collect()
        .context("输入无效，未进行扫描")?;
    let cell = Cell::new(&input.cell_id, input.x, input.y)?;

    let collector = Collector::new(config).with_progress(true);

    if args.ble {
        return collect_ble(&collector, cell).await;
    }

    let mut radio = SimulatedRadio::from_config(&collector.config().simulation)?;
    collector.collect(cell, &mut radio).await?;
    Ok(())
}

#[cfg(feature = "ble")]
async fn collect_ble(collector: &Collector, cell: Cell) -> Result<()> {
    let mut radio = blumap::ble::BtleplugRadio::connect().await?;
    let outcome = collector.collect(cell, &mut radio).await;
    radio.stop().await?;
    outcome?;
    Ok(())
}

#[cfg(not(feature = "ble"))]
async fn collect_ble(_collector: &Collector, _cell: Cell) -> Result<()> {
    anyhow::bail!("编译时未启用 `ble` 功能")
}

fn radio_map(data_dir: &Path, output: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let map = build_radio_map(data_dir, output, config.beacon_positions)
        .with_context(|| format!("生成电波地图失败 (目录 {})", data_dir.display()))?;
    println!(
        "✓ 已生成 {}，共 {} 个单元格: {}",
        output.display(),
        map.metadata.total_cells,
        map.metadata.cells_collected.join(", ")
    );
    Ok(())
}

fn plan(config: Option<&Path>, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let plan = build_plan(&config).context("采集计划配置无效")?;
    println!(
        "第 {}-{} 行共有 {} 个可采集单元格",
        config.plan.rows[0], config.plan.rows[1], plan.total_available_cells
    );
    println!("{}", field_sheet(&plan, config.scan_duration_seconds));

    let output = output.unwrap_or_else(|| config.output_dir.join(PLAN_FILE_NAME));
    plan.write(&output)?;
    println!("✓ 采集计划已保存到 {}", output.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Collect(CollectArgs::default())) {
        Command::Collect(args) => collect(args).await,
        Command::RadioMap {
            data_dir,
            output,
            config,
        } => radio_map(&data_dir, &output, config.as_deref()),
        Command::Plan { config, output } => plan(config.as_deref(), output),
        Command::DefaultConfig => {
            let json = CollectorConfig::default().to_json_string()?;
            println!("{}", json);
            Ok(())
        }
    }
}
