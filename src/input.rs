/// 操作员输入：单元格 ID 和坐标
///
/// 坐标无法解析时直接返回错误，不重试。

use std::io::{BufRead, Write};

use crate::error::InputError;
use crate::survey::cell::normalize_cell_id;

/// 操作员输入的单元格信息
#[derive(Clone, Debug, PartialEq)]
pub struct CellInput {
    /// 单元格 ID（已转为大写）
    pub cell_id: String,
    pub x: f64,
    pub y: f64,
}

/// 从任意输入流读取单元格信息
pub struct InputCollector<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> InputCollector<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        InputCollector { reader, writer }
    }

    /// 依次提示并读取单元格 ID、X、Y
    pub fn collect(&mut self) -> Result<CellInput, InputError> {
        let raw_id = self.prompt("请输入单元格 ID (例如 A1): ", "单元格 ID")?;
        let cell_id = normalize_cell_id(&raw_id)?;
        let x = self.prompt_coordinate("请输入 X 坐标 (米): ", "X")?;
        let y = self.prompt_coordinate("请输入 Y 坐标 (米): ", "Y")?;
        Ok(CellInput { cell_id, x, y })
    }

    fn prompt(&mut self, message: &str, what: &'static str) -> Result<String, InputError> {
        write!(self.writer, "{}", message)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(InputError::UnexpectedEof(what));
        }
        Ok(line.trim().to_string())
    }

    fn prompt_coordinate(&mut self, message: &str, axis: &'static str) -> Result<f64, InputError> {
        let raw = self.prompt(message, axis)?;
        parse_coordinate(&raw, axis)
    }
}

/// 解析坐标，仅接受有限实数
pub fn parse_coordinate(raw: &str, axis: &'static str) -> Result<f64, InputError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|source| InputError::InvalidCoordinate {
            axis,
            value: raw.to_string(),
            source,
        })?;
    // "inf" / "NaN" 能被解析但不是有效坐标
    if !value.is_finite() {
        return Err(InputError::NonFiniteCoordinate {
            axis,
            value: raw.to_string(),
        });
    }
    Ok(value)
}
