/// 采集计划
///
/// 根据场地栅格和信标位置挑选需要实地采集的单元格，输出现场采集单
/// 和 `mvp_cells_to_collect.json`。
///
/// 栅格每行一个字符串，字符含义：
/// - `#` 墙体（不可采集）
/// - `.` 通道
/// - `E` 出口
///
/// 第 y 行、第 x 列的单元格编号为 `('A' + y)` 加 `x + 1`，例如 `A1`、`B12`。

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::config::{BeaconPlacement, CollectorConfig};
use crate::error::{ConfigError, OutputError};
use crate::survey::cell;

/// 计划文件名
pub const PLAN_FILE_NAME: &str = "mvp_cells_to_collect.json";

/// 行字母最多 26 个
const MAX_ROWS: usize = 26;

/// 栅格单元类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Passage,
    Exit,
}

impl Tile {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Tile::Wall),
            '.' => Some(Tile::Passage),
            'E' | 'e' => Some(Tile::Exit),
            _ => None,
        }
    }

    pub fn is_walkable(self) -> bool {
        !matches!(self, Tile::Wall)
    }
}

/// 计划参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// 场地栅格，第 0 行在前
    pub layout: Vec<String>,
    /// 单元格边长（米）
    pub cell_size_m: f64,
    /// 参与挑选的行范围 [起始行, 结束行]（含两端）
    pub rows: [usize; 2],
    /// 最多挑选的单元格数
    pub max_cells: usize,
    /// 最多优先挑选的出口数
    pub max_exit_cells: usize,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            layout: default_layout(),
            cell_size_m: 1.0,
            rows: [0, 7],
            max_cells: 8,
            max_exit_cells: 2,
        }
    }
}

/// 默认场地：16 行 12 列的迷宫
fn default_layout() -> Vec<String> {
    let (height, width) = (16, 12);
    let mut grid = vec![vec!['#'; width]; height];
    let mut open = |rows: std::ops::RangeInclusive<usize>, cols: std::ops::RangeInclusive<usize>| {
        for y in rows {
            for x in cols.clone() {
                grid[y][x] = '.';
            }
        }
    };
    open(1..=1, 1..=9);
    open(7..=8, 1..=9);
    open(14..=14, 1..=9);
    open(1..=14, 2..=2);
    open(1..=14, 8..=8);
    open(12..=13, 5..=5);
    open(10..=12, 9..=10);

    for (y, x) in [(0, 7), (6, 1), (9, 9), (15, 7)] {
        grid[y][x] = 'E';
    }
    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

/// 解析后的场地栅格
#[derive(Clone, Debug, PartialEq)]
pub struct GridLayout {
    width: usize,
    tiles: Vec<Vec<Tile>>,
}

impl GridLayout {
    /// 解析栅格：各行等宽，只允许 `#` `.` `E`
    pub fn parse(rows: &[String]) -> Result<Self, ConfigError> {
        if rows.is_empty() {
            return Err(ConfigError::invalid_value("plan.layout", "栅格不能为空"));
        }
        let width = rows[0].chars().count();
        if width == 0 {
            return Err(ConfigError::invalid_value("plan.layout", "栅格宽度不能为 0"));
        }

        let mut tiles = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let parsed = row
                .chars()
                .enumerate()
                .map(|(x, c)| {
                    Tile::from_char(c).ok_or_else(|| {
                        ConfigError::invalid_value(
                            "plan.layout",
                            format!("第 {} 行第 {} 列的字符 `{}` 无效", y, x, c),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if parsed.len() != width {
                return Err(ConfigError::invalid_value(
                    "plan.layout",
                    format!("第 {} 行宽度为 {}，应为 {}", y, parsed.len(), width),
                ));
            }
            tiles.push(parsed);
        }

        Ok(GridLayout { width, tiles })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<Tile> {
        self.tiles.get(y).and_then(|row| row.get(x)).copied()
    }
}

/// 由栅格坐标得到单元格编号
pub fn grid_cell_id(x: usize, y: usize) -> Option<String> {
    if y >= MAX_ROWS {
        return None;
    }
    let letter = char::from(b'A' + y as u8);
    Some(format!("{}{}", letter, x + 1))
}

/// 候选单元格
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateCell {
    pub cell_id: String,
    pub grid_x: usize,
    pub grid_y: usize,
    pub is_exit: bool,
    /// 单元格中心（米）
    pub physical_center_m: [f64; 2],
    /// 到各信标的距离（米）
    pub beacon_distances: BTreeMap<String, f64>,
}

impl CandidateCell {
    /// 到最近信标的距离，没有信标时为无穷大
    pub fn nearest_beacon_distance(&self) -> f64 {
        self.beacon_distances
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }
}

/// 列出行范围内所有可通行的单元格（按行、列顺序）
pub fn candidate_cells(
    grid: &GridLayout,
    plan: &PlanConfig,
    beacons: &BTreeMap<String, BeaconPlacement>,
) -> Result<Vec<CandidateCell>, ConfigError> {
    let [start, end] = plan.rows;
    if start > end || end >= grid.height() {
        return Err(ConfigError::invalid_value(
            "plan.rows",
            format!("行范围 [{}, {}] 超出栅格高度 {}", start, end, grid.height()),
        ));
    }
    if end >= MAX_ROWS {
        return Err(ConfigError::invalid_value(
            "plan.rows",
            format!("行号最多到 {}，无法编号第 {} 行", MAX_ROWS - 1, end),
        ));
    }
    if !(plan.cell_size_m.is_finite() && plan.cell_size_m > 0.0) {
        return Err(ConfigError::invalid_value(
            "plan.cell_size_m",
            format!("必须是正有限值，实际为 {}", plan.cell_size_m),
        ));
    }

    let size = plan.cell_size_m;
    let mut cells = Vec::new();
    for y in start..=end {
        for x in 0..grid.width() {
            let Some(tile) = grid.tile(x, y).filter(|t| t.is_walkable()) else {
                continue;
            };
            let Some(cell_id) = grid_cell_id(x, y) else {
                continue;
            };
            // 距离按栅格点计算，与信标安装坐标同一参照
            let (gx, gy) = (x as f64 * size, y as f64 * size);
            let beacon_distances = beacons
                .iter()
                .map(|(id, b)| {
                    let [bx, by] = b.position;
                    (id.clone(), (gx - bx).hypot(gy - by))
                })
                .collect();
            cells.push(CandidateCell {
                cell_id,
                grid_x: x,
                grid_y: y,
                is_exit: tile == Tile::Exit,
                physical_center_m: [(x as f64 + 0.5) * size, (y as f64 + 0.5) * size],
                beacon_distances,
            });
        }
    }
    Ok(cells)
}

/// 挑选采集单元格
///
/// 先取至多 `max_exit_cells` 个出口，再按到最近信标的距离从近到远补足通道单元格，
/// 总数不超过 `max_cells`。距离相同时保持行列顺序。
pub fn select_cells(cells: &[CandidateCell], max_cells: usize, max_exit_cells: usize) -> Vec<CandidateCell> {
    let mut selected: Vec<CandidateCell> = cells
        .iter()
        .filter(|c| c.is_exit)
        .take(max_exit_cells.min(max_cells))
        .cloned()
        .collect();

    let mut passages: Vec<&CandidateCell> = cells.iter().filter(|c| !c.is_exit).collect();
    passages.sort_by(|a, b| {
        a.nearest_beacon_distance()
            .total_cmp(&b.nearest_beacon_distance())
    });

    let remaining = max_cells.saturating_sub(selected.len());
    selected.extend(passages.into_iter().take(remaining).cloned());
    selected
}

/// 采集计划（写入 `mvp_cells_to_collect.json`）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionPlan {
    pub beacon_positions: BTreeMap<String, [f64; 2]>,
    pub selected_cells: Vec<CandidateCell>,
    pub total_available_cells: usize,
    pub generated_at: DateTime<Local>,
}

impl CollectionPlan {
    /// 写出缩进格式的 JSON，已存在的文件会被覆盖
    pub fn write(&self, path: &Path) -> Result<(), OutputError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| OutputError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("采集计划已保存到 {}", path.display());
        Ok(())
    }
}

/// 根据配置生成采集计划
pub fn build_plan(config: &CollectorConfig) -> Result<CollectionPlan, ConfigError> {
    let grid = GridLayout::parse(&config.plan.layout)?;
    let cells = candidate_cells(&grid, &config.plan, &config.beacon_positions)?;
    info!(
        "第 {}-{} 行共有 {} 个可采集单元格",
        config.plan.rows[0],
        config.plan.rows[1],
        cells.len()
    );

    let selected = select_cells(&cells, config.plan.max_cells, config.plan.max_exit_cells);
    for c in &selected {
        debug!(
            "选中 {} ({}, {}), 出口: {}, 最近信标 {:.1}m",
            c.cell_id,
            c.grid_x,
            c.grid_y,
            c.is_exit,
            c.nearest_beacon_distance()
        );
    }

    Ok(CollectionPlan {
        beacon_positions: config
            .beacon_positions
            .iter()
            .map(|(id, b)| (id.clone(), b.position))
            .collect(),
        selected_cells: selected,
        total_available_cells: cells.len(),
        generated_at: Local::now(),
    })
}

/// 现场采集单
pub fn field_sheet(plan: &CollectionPlan, scan_duration_secs: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(
        out,
        "现场采集单（共 {} 个单元格，可选 {} 个）",
        plan.selected_cells.len(),
        plan.total_available_cells
    );
    let _ = writeln!(out, "{}", "=".repeat(60));

    for (i, c) in plan.selected_cells.iter().enumerate() {
        let distances = c
            .beacon_distances
            .iter()
            .map(|(id, d)| format!("{}={:.1}m", id, d))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "\n{}. 单元格 {}", i + 1, c.cell_id);
        let _ = writeln!(out, "   栅格: ({}, {})", c.grid_x, c.grid_y);
        let _ = writeln!(
            out,
            "   中心位置: {:.1}m, {:.1}m",
            c.physical_center_m[0], c.physical_center_m[1]
        );
        let _ = writeln!(out, "   类型: {}", if c.is_exit { "出口" } else { "通道" });
        let _ = writeln!(out, "   信标距离: {}", distances);
        let _ = writeln!(out, "   步骤:");
        let _ = writeln!(out, "     1. 站在单元格 {} 的中心", c.cell_id);
        let _ = writeln!(out, "     2. 接收设备保持在腰部高度");
        let _ = writeln!(out, "     3. 运行采集 {} 秒", scan_duration_secs);
        let _ = writeln!(out, "     4. 确认生成 {}", cell::data_file_name(&c.cell_id));
    }

    let _ = writeln!(out, "\n{}", "=".repeat(60));
    let _ = writeln!(out, "先采集出口，再采集靠近信标的单元格");
    let _ = write!(out, "{}", "=".repeat(60));
    out
}
