//! Builder Module
//!
//! Fluent Builder APIを提供し、`Extractor`インスタンスを段階的に構築する。

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::api::{OutputFormat, SheetSelector};
use crate::error::Error;
use crate::extract::header::HeaderMap;
use crate::extract::links::{walk_hyperlinks, LinkTable};
use crate::extract::merge::{merge_links, MergeColumns};
use crate::output::OutputFormatter;
use crate::parser::{LoadedSheet, WorkbookParser};
use crate::table::Table;

/// 抽出処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ExtractionConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// ハイパーリンクを持つ列
    pub url_column: String,

    /// 結合キーとなる識別子列
    pub id_column: String,

    /// ハイパーリンク列（表示テキスト）の変更後の列名
    pub description_column: String,

    /// 抽出したURLを格納する列名
    pub link_column: String,

    /// 商品コード列名（Noneの場合は商品コードを付与しない）
    pub product_code_column: Option<String>,

    /// 出力フォーマット
    pub output_format: OutputFormat,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::default(),
            url_column: "ProductURL".to_string(),
            id_column: "ItemID".to_string(),
            description_column: "ProductDescription".to_string(),
            link_column: "ProductURL".to_string(),
            product_code_column: Some("ProductCode".to_string()),
            output_format: OutputFormat::default(),
        }
    }
}

impl ExtractionConfig {
    fn merge_columns(&self) -> MergeColumns<'_> {
        MergeColumns {
            url_column: &self.url_column,
            description_column: &self.description_column,
            id_column: &self.id_column,
            link_column: &self.link_column,
            code_column: self.product_code_column.as_deref(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値があり、必要な項目だけを上書きできます。
///
/// # デフォルト設定
///
/// - シート: 先頭のシート
/// - ハイパーリンク列: `ProductURL`
/// - 識別子列: `ItemID`
/// - リネーム後の表示テキスト列: `ProductDescription`
/// - URL列: `ProductURL`
/// - 商品コード列: `ProductCode`
/// - 出力フォーマット: CSV
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxlinks::{ExtractorBuilder, SheetSelector};
///
/// # fn main() -> Result<(), xlsxlinks::Error> {
/// let extractor = ExtractorBuilder::new()
///     .with_sheet_selector(SheetSelector::Name("Basket".to_string()))
///     .with_id_column("SKU")
///     .build()?;
/// let table = extractor.extract_path("basket.xlsx")?;
/// println!("{} rows", table.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ExtractorBuilder {
    config: ExtractionConfig,
}

impl ExtractorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 抽出対象のシートを選択する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// ハイパーリンクを持つ列のヘッダー名を指定する
    pub fn with_url_column(mut self, name: impl Into<String>) -> Self {
        self.config.url_column = name.into();
        self
    }

    /// 識別子列のヘッダー名を指定する
    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.config.id_column = name.into();
        self
    }

    /// 結合結果でハイパーリンク列（表示テキスト）に付ける名前を指定する
    pub fn with_description_column(mut self, name: impl Into<String>) -> Self {
        self.config.description_column = name.into();
        self
    }

    /// 抽出したURLを格納する列名を指定する
    pub fn with_link_column(mut self, name: impl Into<String>) -> Self {
        self.config.link_column = name.into();
        self
    }

    /// 商品コード列名を指定する。`None`で商品コード列を出力しない
    pub fn with_product_code_column(mut self, name: Option<String>) -> Self {
        self.config.product_code_column = name;
        self
    }

    /// 出力フォーマットを指定する
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// 設定を検証し、`Extractor`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `Error::Config`
    ///   * 列名が空
    ///   * ハイパーリンク列と識別子列が同じ
    ///   * 出力列名（識別子、表示テキスト、URL、商品コード）が重複している
    pub fn build(self) -> Result<Extractor, Error> {
        let config = &self.config;

        let mut named = vec![
            ("url column", config.url_column.as_str()),
            ("id column", config.id_column.as_str()),
            ("description column", config.description_column.as_str()),
            ("link column", config.link_column.as_str()),
        ];
        if let Some(code) = &config.product_code_column {
            named.push(("product code column", code.as_str()));
        }
        for (label, name) in &named {
            if name.trim().is_empty() {
                return Err(Error::Config(format!("The {} name must not be empty", label)));
            }
        }

        if config.url_column == config.id_column {
            return Err(Error::Config(format!(
                "The url column and the id column must differ (both '{}')",
                config.url_column
            )));
        }

        // 結合結果に並ぶ列名は互いに異なる必要がある
        let outputs = &named[1..];
        for (i, (label_a, a)) in outputs.iter().enumerate() {
            for (label_b, b) in &outputs[i + 1..] {
                if a == b {
                    return Err(Error::Config(format!(
                        "The {} and the {} share the name '{}'",
                        label_a, label_b, a
                    )));
                }
            }
        }

        Ok(Extractor {
            config: self.config,
        })
    }
}

/// ハイパーリンク抽出と結合を行う
///
/// `ExtractorBuilder`で構築します。各メソッド呼び出しは独立しており、状態を持ちません。
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractionConfig,
}

impl Extractor {
    /// 識別子とハイパーリンク先の組を抽出する（識別子のない行は除外）
    pub fn extract_links<R: Read + Seek>(&self, reader: R) -> Result<LinkTable, Error> {
        let (mut parser, sheet_name) = self.open(reader)?;
        let sheet = parser.load_sheet(&sheet_name)?;
        self.links_for(&parser, &sheet)
    }

    /// 結合済みテーブルを生成する
    ///
    /// 1. ヘッダー行から列位置を解決
    /// 2. ハイパーリンク列を走査してリンク情報を作成し、識別子のない行を除外
    /// 3. シート全体をテーブルとして読み込み、ハイパーリンク列をリネーム
    /// 4. 識別子列で内部結合し、URL列と商品コード列を追加
    pub fn extract<R: Read + Seek>(&self, reader: R) -> Result<Table, Error> {
        let (mut parser, sheet_name) = self.open(reader)?;
        let sheet = parser.load_sheet(&sheet_name)?;
        let links = self.links_for(&parser, &sheet)?;
        merge_links(sheet.to_table(), &links, self.config.merge_columns())
    }

    /// ファイルパスを指定して`extract`を実行する
    pub fn extract_path<P: AsRef<Path>>(&self, path: P) -> Result<Table, Error> {
        let file = File::open(path)?;
        self.extract(BufReader::new(file))
    }

    /// ファイルパスを指定して`extract_links`を実行する
    pub fn extract_links_path<P: AsRef<Path>>(&self, path: P) -> Result<LinkTable, Error> {
        let file = File::open(path)?;
        self.extract_links(BufReader::new(file))
    }

    /// 結合済みテーブルを設定された出力フォーマットで書き出す
    pub fn extract_to_writer<R: Read + Seek, W: Write>(
        &self,
        reader: R,
        mut writer: W,
    ) -> Result<(), Error> {
        let table = self.extract(reader)?;
        OutputFormatter::from_format(self.config.output_format).render(&table, &mut writer)
    }

    /// 結合済みテーブルを文字列として取得する
    pub fn extract_to_string<R: Read + Seek>(&self, reader: R) -> Result<String, Error> {
        let mut buffer = Cursor::new(Vec::new());
        self.extract_to_writer(reader, &mut buffer)?;
        String::from_utf8(buffer.into_inner())
            .map_err(|e| Error::Config(format!("Output is not valid UTF-8: {}", e)))
    }

    fn open<R: Read + Seek>(&self, reader: R) -> Result<(WorkbookParser, String), Error> {
        let parser = WorkbookParser::open(reader)?;
        let sheet_name = parser.select_sheet(&self.config.sheet_selector)?;
        Ok((parser, sheet_name))
    }

    fn links_for(&self, parser: &WorkbookParser, sheet: &LoadedSheet) -> Result<LinkTable, Error> {
        let headers = HeaderMap::from_cells(&sheet.name, &sheet.header);
        let hyperlinks = parser.hyperlinks(&sheet.name)?;
        let links = walk_hyperlinks(
            sheet,
            &hyperlinks,
            &headers,
            &self.config.url_column,
            &self.config.id_column,
        )?;
        Ok(links.retain_identified())
    }
}
