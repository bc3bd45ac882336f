//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use std::io::Write;
use unicode_width::UnicodeWidthStr;

use super::MISSING_VALUE;
use crate::error::Error;
use crate::table::Table;
use crate::types::CellValue;

/// セルの表示文字列（欠損値は`NA`）
fn display(cell: &CellValue) -> String {
    if cell.is_empty() {
        MISSING_VALUE.to_string()
    } else {
        cell.to_string()
    }
}

/// CSV形式のフォーマッター
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn render<W: Write>(&self, table: &Table, writer: &mut W) -> Result<(), Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let map_err = |e: csv::Error| Error::Config(format!("CSV serialization error: {}", e));

        csv_writer.write_record(table.columns()).map_err(map_err)?;
        for row in table.rows() {
            csv_writer
                .write_record(row.iter().map(display))
                .map_err(map_err)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// JSON形式のフォーマッター
///
/// `{"columns": [...], "rows": [{列名: 値}, ...]}` を出力します。欠損値は`null`。
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(&self, table: &Table, writer: &mut W) -> Result<(), Error> {
        use serde_json::{json, Map, Value};

        let rows: Vec<Value> = table
            .rows()
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (name, cell) in table.columns().iter().zip(row) {
                    object.insert(name.clone(), json!(cell));
                }
                Value::Object(object)
            })
            .collect();

        let output = json!({
            "columns": table.columns(),
            "rows": rows,
        });

        serde_json::to_writer_pretty(&mut *writer, &output)
            .map_err(|e| Error::Config(format!("JSON serialization error: {}", e)))?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Markdownテーブル形式のフォーマッター
///
/// 全角文字を含む場合も列幅が揃うよう、表示幅でパディングします。
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn render<W: Write>(&self, table: &Table, writer: &mut W) -> Result<(), Error> {
        if table.columns().is_empty() {
            return Ok(());
        }

        let body: Vec<Vec<String>> = table
            .rows()
            .iter()
            .map(|row| row.iter().map(|c| escape_markdown(&display(c))).collect())
            .collect();
        let header: Vec<String> = table.columns().iter().map(|c| escape_markdown(c)).collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.width().max(3)).collect();
        for row in &body {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        write_markdown_row(writer, &header, &widths)?;
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_markdown_row(writer, &separator, &widths)?;
        for row in &body {
            write_markdown_row(writer, row, &widths)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn write_markdown_row<W: Write>(
    writer: &mut W,
    cells: &[String],
    widths: &[usize],
) -> Result<(), Error> {
    write!(writer, "|")?;
    for (cell, width) in cells.iter().zip(widths) {
        let padding = width.saturating_sub(cell.width());
        write!(writer, " {}{} |", cell, " ".repeat(padding))?;
    }
    writeln!(writer)?;
    Ok(())
}

/// パイプと改行をエスケープ
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace("\r\n", "<br>").replace('\n', "<br>")
}
