//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// シート選択方式
///
/// 抽出対象のシートを1枚選択します。デフォルトは先頭のシートです。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// インデックス指定（0始まり）
    ///
    /// 例: `SheetSelector::Index(0)` は最初のシートを選択
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Products".to_string())`
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

/// 出力フォーマット
///
/// 結合済みテーブルを書き出す際の形式を指定します。
/// 欠損値はCSVとMarkdownでは `NA`、JSONでは `null` として出力されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    /// CSV形式（デフォルト）
    ///
    /// ```csv
    /// ItemID,ProductDescription,ProductURL
    /// 1001,Milk,https://example.com/254656543
    /// ```
    #[default]
    Csv,

    /// JSON形式
    ///
    /// 列名と、行ごとのオブジェクト配列を出力します。
    ///
    /// ```json
    /// {
    ///   "columns": ["ItemID", "ProductURL"],
    ///   "rows": [{"ItemID": 1001, "ProductURL": "https://example.com/254656543"}]
    /// }
    /// ```
    Json,

    /// Markdownテーブル形式
    Markdown,
}

/// HTTPステータスの扱い
///
/// 商品APIが2xx以外を返した場合の挙動を明示的に選択します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum StatusPolicy {
    /// 2xx以外は`Error::Status`として返す（デフォルト）
    #[default]
    Raise,

    /// ステータスに関係なくレスポンス本文をJSONとして返す
    Passthrough,
}
