//! Output Format Module
//!
//! Strategy Patternによる出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use crate::api::OutputFormat;
use crate::error::Error;
use crate::table::Table;
use std::io::Write;

pub use formatters::*;

/// 欠損値の出力表記（CSV・Markdown）
pub const MISSING_VALUE: &str = "NA";

/// 出力フォーマッター（Strategy Pattern）
#[derive(Debug, Clone, Copy)]
pub enum OutputFormatter {
    Csv,
    Json,
    Markdown,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => OutputFormatter::Csv,
            OutputFormat::Json => OutputFormatter::Json,
            OutputFormat::Markdown => OutputFormatter::Markdown,
        }
    }

    /// テーブルを指定されたフォーマットで出力する
    pub fn render<W: Write>(&self, table: &Table, writer: &mut W) -> Result<(), Error> {
        match self {
            OutputFormatter::Csv => CsvFormatter.render(table, writer),
            OutputFormatter::Json => JsonFormatter.render(table, writer),
            OutputFormatter::Markdown => MarkdownFormatter.render(table, writer),
        }
    }
}
