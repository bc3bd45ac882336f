//! Header Locator
//!
//! ヘッダー行から列名 -> 列位置のマッピングを構築します。

use std::collections::HashMap;

use crate::error::Error;
use crate::types::CellValue;

/// 列名から列位置（0始まり、シートの使用範囲の先頭列からの相対位置）への対応表
///
/// 抽出1回につき1度だけ構築します。同じ列名が複数ある場合は最初の列を採用します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    sheet: String,
    positions: HashMap<String, usize>,
}

impl HeaderMap {
    /// ヘッダー行のセルから構築
    ///
    /// 文字列以外のセルは表示文字列に変換し、空のセルは無視します。
    pub fn from_cells(sheet: &str, cells: &[CellValue]) -> Self {
        let mut positions = HashMap::with_capacity(cells.len());
        for (position, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            positions.entry(cell.to_string()).or_insert(position);
        }
        Self {
            sheet: sheet.to_string(),
            positions,
        }
    }

    /// 列名の位置を取得
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// 列名の位置を取得し、存在しなければ`Error::MissingColumn`
    pub fn require(&self, name: &str) -> Result<usize, Error> {
        self.position(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            sheet: self.sheet.clone(),
        })
    }

    /// 登録されている列数
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
