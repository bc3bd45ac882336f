//! Hyperlink Column Walker / Table Builder
//!
//! 指定列の各データ行からハイパーリンク先を取り出し、同じ行の識別子と組にします。

use std::collections::HashMap;

use crate::error::Error;
use crate::extract::header::HeaderMap;
use crate::extract::product_code::extract_product_code;
use crate::parser::{LoadedSheet, SheetHyperlinks};
use crate::table::Table;
use crate::types::{CellCoord, CellValue};

/// 1行分のリンク情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// シート上の行番号（Excelと同じ1始まり）
    pub row: u32,
    /// 識別子。セルが空なら`None`
    pub identifier: Option<i64>,
    /// ハイパーリンク先。リンクがなければ`None`
    pub url: Option<String>,
}

impl LinkRecord {
    /// URLに含まれる商品コード
    pub fn product_code(&self) -> Option<&str> {
        self.url.as_deref().and_then(extract_product_code)
    }
}

/// 行順に並んだリンク情報の一覧
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    records: Vec<LinkRecord>,
}

impl LinkTable {
    pub fn new(records: Vec<LinkRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinkRecord> {
        self.records.iter()
    }

    /// 識別子のない行を取り除く
    pub fn retain_identified(mut self) -> Self {
        self.records.retain(|r| r.identifier.is_some());
        self
    }

    /// 識別子 -> レコードの対応表（同じ識別子が複数ある場合は先勝ち）
    pub fn by_identifier(&self) -> HashMap<i64, &LinkRecord> {
        let mut lookup = HashMap::with_capacity(self.records.len());
        for record in &self.records {
            if let Some(id) = record.identifier {
                lookup.entry(id).or_insert(record);
            }
        }
        lookup
    }

    /// テーブル形式に変換
    ///
    /// 列は識別子、URL、（指定があれば）商品コードの順です。
    pub fn to_table(&self, id_column: &str, url_column: &str, code_column: Option<&str>) -> Table {
        let mut columns = vec![id_column, url_column];
        columns.extend(code_column);
        let mut table = Table::new(columns);
        for record in &self.records {
            let mut row = vec![
                CellValue::from(record.identifier),
                CellValue::from(record.url.clone()),
            ];
            if code_column.is_some() {
                row.push(CellValue::from(record.product_code()));
            }
            table.push_row(row);
        }
        table
    }
}

impl<'a> IntoIterator for &'a LinkTable {
    type Item = &'a LinkRecord;
    type IntoIter = std::slice::Iter<'a, LinkRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// ハイパーリンク列を走査してリンク情報を集める
///
/// ヘッダー行の次の行から最終使用行まで、1行につき1レコードを行順に出力します。
pub(crate) fn walk_hyperlinks(
    sheet: &LoadedSheet,
    hyperlinks: &SheetHyperlinks,
    headers: &HeaderMap,
    url_column: &str,
    id_column: &str,
) -> Result<LinkTable, Error> {
    let url_col = headers.require(url_column)?;
    let id_col = headers.require(id_column)?;

    let mut records = Vec::with_capacity(sheet.rows.len());
    for (index, cells) in sheet.rows.iter().enumerate() {
        let id_coord = sheet.coord(index, id_col);
        let row_number = id_coord.row + 1;

        let identifier = match cells.get(id_col) {
            Some(value) => parse_identifier(value, id_coord)?,
            None => None,
        };

        let url = hyperlinks
            .get(sheet.coord(index, url_col))
            .map(str::to_string);

        records.push(LinkRecord {
            row: row_number,
            identifier,
            url,
        });
    }

    tracing::debug!(
        sheet = %sheet.name,
        rows = records.len(),
        linked = records.iter().filter(|r| r.url.is_some()).count(),
        "walked hyperlink column"
    );

    Ok(LinkTable::new(records))
}

/// 識別子セルを整数に変換
///
/// 空セルと空文字列は`None`。小数部を持つ数値や数値でない文字列はエラー。
/// `0`は有効な識別子として扱います。
///
/// 小数（`1001.5`）や真偽値は整数に切り捨てず、`InvalidIdentifier`になります。
pub(crate) fn parse_identifier(value: &CellValue, coord: CellCoord) -> Result<Option<i64>, Error> {
    if value.is_empty() || value.as_str().is_some_and(|s| s.trim().is_empty()) {
        return Ok(None);
    }
    value
        .as_i64()
        .map(Some)
        .ok_or_else(|| Error::InvalidIdentifier {
            cell: coord.to_a1(),
            row: coord.row + 1,
            value: value.to_string(),
        })
}
