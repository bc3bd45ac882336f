//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// セルの値を表す列挙型
///
/// calamineの`Data`から変換され、`Table`の各セルに格納されます。
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CellValue {
    /// 空セル（欠損値）
    Empty,

    /// 整数
    Int(i64),

    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// 日時
    DateTime(NaiveDateTime),

    /// エラー値（例: #DIV/0!）
    Error(String),
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空文字列も欠損として扱います。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// 文字列値を参照として取得
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// 整数値として取得
    ///
    /// 小数部のない数値と、整数として解析できる文字列を受け付けます。
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                if *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            CellValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::DateTime(_) | CellValue::Error(_) => {
                serializer.serialize_str(&self.to_string())
            }
        }
    }
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列から座標を生成（例: "B3" -> (2, 1)）
    ///
    /// 絶対参照の`$`は無視します。列・行のどちらかが欠けている場合は`None`。
    pub fn from_a1(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        let mut col: u32 = 0;
        let mut col_len = 0;
        let mut row_str = String::new();

        for ch in reference.chars() {
            if ch == '$' {
                continue;
            }
            if ch.is_ascii_alphabetic() && row_str.is_empty() {
                let val = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
                col = col.checked_mul(26)?.checked_add(val)?;
                col_len += 1;
            } else if ch.is_ascii_digit() {
                row_str.push(ch);
            } else {
                return None;
            }
        }

        if col_len == 0 || row_str.is_empty() {
            return None;
        }

        let row = row_str.parse::<u32>().ok()?.checked_sub(1)?;
        Some(Self::new(row, col - 1))
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    pub fn to_a1(self) -> String {
        format!("{}{}", col_index_to_letter(self.col), self.row + 1)
    }
}

/// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
pub(crate) fn col_index_to_letter(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        let remainder = col % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// セル範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// `ref`属性の値を解析（"B2" または "B2:B4"）
    ///
    /// 開始と終了が逆順で書かれていても正規化します。
    pub fn from_ref(reference: &str) -> Option<Self> {
        match reference.split_once(':') {
            Some((a, b)) => {
                let a = CellCoord::from_a1(a)?;
                let b = CellCoord::from_a1(b)?;
                Some(Self::new(
                    CellCoord::new(a.row.min(b.row), a.col.min(b.col)),
                    CellCoord::new(a.row.max(b.row), a.col.max(b.col)),
                ))
            }
            None => {
                let coord = CellCoord::from_a1(reference)?;
                Some(Self::new(coord, coord))
            }
        }
    }

    /// 座標が範囲内にあるかどうか
    pub fn contains(&self, coord: CellCoord) -> bool {
        (self.start.row..=self.end.row).contains(&coord.row)
            && (self.start.col..=self.end.col).contains(&coord.col)
    }

    /// 1セルだけの範囲かどうか
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}
