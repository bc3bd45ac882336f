//! Workbook Parser Module
//!
//! calamineを使用したワークブック読み込み。
//! セル値はcalamineから、ハイパーリンクはXlsxMetadataParserから取得し、
//! 同じシートを2つの視点（値とリンク先）で参照できるようにします。

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use crate::api::SheetSelector;
use crate::error::Error;
use crate::parser::{SheetHyperlinks, XlsxMetadataParser};
use crate::security::SecurityConfig;
use crate::table::Table;
use crate::types::{CellCoord, CellValue};

/// ワークブックパーサー
///
/// 入力全体を一度だけメモリに読み込み、calamineとメタデータパーサーで共有します。
pub(crate) struct WorkbookParser {
    workbook: Xlsx<Cursor<Arc<[u8]>>>,
    metadata: XlsxMetadataParser,
}

/// 読み込み済みシート
///
/// `header`は最初の使用行、`rows`はそれ以降の行です。
/// 列インデックスはすべて`first_col`からの相対位置です。
#[derive(Debug, Clone)]
pub(crate) struct LoadedSheet {
    pub name: String,
    /// ヘッダー行の絶対行番号（0始まり）
    pub header_row: u32,
    /// 最初の使用列の絶対列番号（0始まり）
    pub first_col: u32,
    pub header: Vec<CellValue>,
    pub rows: Vec<Vec<CellValue>>,
}

impl LoadedSheet {
    /// データ行インデックスと相対列からシート上の絶対座標を求める
    pub fn coord(&self, data_row: usize, col: usize) -> CellCoord {
        CellCoord::new(
            self.header_row + 1 + data_row as u32,
            self.first_col + col as u32,
        )
    }

    /// ヘッダー行を列名としたテーブルに変換（バルク読み込み）
    ///
    /// 空のヘッダーは `Unnamed: {n}`、重複したヘッダーは `{name}.{k}` になります。
    pub fn to_table(&self) -> Table {
        let mut columns: Vec<String> = Vec::with_capacity(self.header.len());
        for (i, cell) in self.header.iter().enumerate() {
            let base = if cell.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                cell.to_string()
            };
            let mut name = base.clone();
            let mut k = 1;
            while columns.contains(&name) {
                name = format!("{}.{}", base, k);
                k += 1;
            }
            columns.push(name);
        }

        let mut table = Table::new(columns);
        for row in &self.rows {
            table.push_row(row.clone());
        }
        table
    }
}

impl WorkbookParser {
    /// ワークブックを開き、XMLメタデータも解析する
    pub fn open<R: Read + Seek>(mut reader: R) -> Result<Self, Error> {
        let mut buffer = Vec::new();
        let bytes_read = reader.read_to_end(&mut buffer)?;
        SecurityConfig::default().check_input_size(bytes_read)?;

        // バイト列はメタデータとcalamineで共有する
        let data: Arc<[u8]> = Arc::from(buffer);

        // 先にメタデータを解析してアーカイブの安全性を確認する
        let metadata = XlsxMetadataParser::new(Arc::clone(&data))?;

        let sheets = open_workbook_auto_from_rs(Cursor::new(data)).map_err(Error::Parse)?;
        let workbook = match sheets {
            Sheets::Xlsx(workbook) => workbook,
            _ => {
                return Err(Error::Config(
                    "Only XLSX format is supported".to_string(),
                ))
            }
        };

        Ok(Self { workbook, metadata })
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// 指定シートのハイパーリンクを解析
    pub fn hyperlinks(&self, sheet_name: &str) -> Result<SheetHyperlinks, Error> {
        self.metadata.sheet_hyperlinks(sheet_name)
    }

    /// シート選択方式に基づいてシート名を決定
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, Error> {
        let names = self.sheet_names();
        match selector {
            SheetSelector::Index(index) => names.get(*index).cloned().ok_or_else(|| {
                Error::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    names.len()
                ))
            }),
            SheetSelector::Name(name) => {
                if names.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(Error::Config(format!("Sheet '{}' not found", name)))
                }
            }
        }
    }

    /// シートを読み込み、ヘッダー行とデータ行に分割する
    pub fn load_sheet(&mut self, sheet_name: &str) -> Result<LoadedSheet, Error> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| Error::Parse(e.into()))?;

        let is_1904 = self.metadata.is_1904();
        let (header_row, first_col) = range.start().unwrap_or((0, 0));

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| convert_cell(cell, is_1904)).collect::<Vec<_>>());
        let header = rows.next().unwrap_or_default();
        let rows: Vec<Vec<CellValue>> = rows.collect();

        tracing::debug!(
            sheet = sheet_name,
            header_row,
            first_col,
            columns = header.len(),
            rows = rows.len(),
            "loaded sheet"
        );

        Ok(LoadedSheet {
            name: sheet_name.to_string(),
            header_row,
            first_col,
            header,
            rows,
        })
    }
}

/// calamineのセルを`CellValue`に変換
fn convert_cell(cell: &Data, is_1904: bool) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match serial_to_datetime(dt.as_f64(), is_1904) {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

/// Excelのシリアル日時値を`NaiveDateTime`に変換
///
/// - 1900年システム: 1899-12-30 起算（シリアル値60以降で正しい日付）
/// - 1904年システム: 1904-01-01 起算
///
/// chronoで表せない範囲の値は`None`を返します。
fn serial_to_datetime(serial_value: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial_value.is_finite() {
        return None;
    }
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let days = serial_value.floor();
    let seconds = ((serial_value - days) * 86_400.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(days as i64)?)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}
