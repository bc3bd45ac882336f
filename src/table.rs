//! Table Module
//!
//! 列名付きの行指向テーブル。バルク読み込み結果と結合結果の両方をこの型で表現します。

use crate::error::Error;
use crate::types::CellValue;
use serde::Serialize;

/// 列名と行データを持つインメモリテーブル
///
/// すべての行は列数と同じ長さを持ちます（`push_row`で保証）。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// 列名を指定して空のテーブルを生成
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// 列名の一覧
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// すべての行
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 行が1つもないかどうか
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 列名から列インデックスを取得（最初に一致したもの）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 行を追加
    ///
    /// 列数より短い行は`Empty`で埋め、長い行は切り詰めます。
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    /// 指定行・列名のセルを取得
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// 列の値を上から順に列挙
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[col]))
    }

    /// 列名を変更
    ///
    /// `from`が存在しない場合は何もしません。
    /// 変更後の名前が既存の別の列と衝突する場合は`Error::Config`。
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), Error> {
        let Some(index) = self.column_index(from) else {
            return Ok(());
        };
        if from != to && self.column_index(to).is_some() {
            return Err(Error::Config(format!(
                "Cannot rename column '{}' to '{}': column already exists",
                from, to
            )));
        }
        self.columns[index] = to.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(["ItemID", "ProductURL"]);
        table.push_row(vec![CellValue::Int(1), CellValue::from("Milk")]);
        table.push_row(vec![CellValue::Int(2)]);
        table
    }

    #[test]
    fn test_push_row_pads_short_rows() {
        let table = sample();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "ProductURL"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_rename_column() {
        let mut table = sample();
        table
            .rename_column("ProductURL", "ProductDescription")
            .unwrap();
        assert_eq!(table.columns(), &["ItemID", "ProductDescription"]);

        // 存在しない列は無視
        table.rename_column("Missing", "Other").unwrap();
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_rename_column_conflict() {
        let mut table = sample();
        let result = table.rename_column("ProductURL", "ItemID");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_column_iter() {
        let table = sample();
        let ids: Vec<_> = table
            .column("ItemID")
            .unwrap()
            .filter_map(|v| v.as_i64())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(table.column("Nope").is_none());
    }
}
