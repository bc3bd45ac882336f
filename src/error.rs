//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlsxlinksクレート全体で使用するエラー型
///
/// スプレッドシートの読み込み、ハイパーリンク抽出、結合処理、
/// 商品APIへのリクエスト中に発生するすべてのエラーを統一的に扱います。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxlinks::Error;
/// use std::fs::File;
///
/// fn open_sheet(path: &str) -> Result<File, Error> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー（calamine由来）
    ///
    /// ファイル形式が不正、破損したファイル、存在しないシート名などが原因となります。
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// XMLパーツの解析エラー
    #[error("XML error in '{part}': {message}")]
    Xml {
        /// エラーが発生したパーツ名（例: `xl/worksheets/sheet1.xml`）
        part: String,
        /// エラーの詳細
        message: String,
    },

    /// 設定の検証に失敗したエラー
    ///
    /// `ExtractorBuilder::build()`時の検証や、結合時の列名衝突で発生します。
    ///
    /// ```rust,no_run
    /// use xlsxlinks::{Error, ExtractorBuilder};
    ///
    /// let result = ExtractorBuilder::new()
    ///     .with_url_column("ItemID")
    ///     .build();
    ///
    /// if let Err(Error::Config(msg)) = result {
    ///     println!("設定エラー: {}", msg);
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// ヘッダー行に指定された列が存在しない
    #[error("Column '{column}' not found in header row of sheet '{sheet}'")]
    MissingColumn {
        /// 見つからなかった列名
        column: String,
        /// 対象シート名
        sheet: String,
    },

    /// 識別子セルが整数に変換できない
    #[error("Invalid identifier '{value}' at {cell} (row {row})")]
    InvalidIdentifier {
        /// セル参照（A1形式）
        cell: String,
        /// 行番号（Excelと同じ1始まり）
        row: u32,
        /// セルの表示値
        value: String,
    },

    /// HTTP通信またはレスポンスのデコードに失敗したエラー
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `StatusPolicy::Raise`で2xx以外のステータスを受け取った
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// HTTPステータスコード
        status: u16,
        /// リクエストURL
        url: String,
    },

    /// レスポンスの構造が期待と異なる
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
