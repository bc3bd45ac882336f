//! XML Metadata Parser Module
//!
//! XLSX内部のXMLパーツから、calamineで取得できない情報を抽出するモジュール。
//! セルのハイパーリンク先（表示テキストではなくリンク先URL）と1904年エポック判定を提供します。

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;
use zip::ZipArchive;

use crate::error::Error;
use crate::security::{validate_zip_path, SecurityConfig};
use crate::types::{CellCoord, CellRange};

/// シート1枚分のハイパーリンク
///
/// `ref`が範囲の場合はセルごとに展開せず、範囲のまま保持します。
/// 同じセルに複数のハイパーリンクがある場合は文書内で先に現れたものを返します。
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetHyperlinks {
    /// 単一セル -> リンク先の番号
    cells: HashMap<CellCoord, usize>,
    /// 複数セルの範囲とリンク先の番号（出現順）
    ranges: Vec<(CellRange, usize)>,
    targets: Vec<String>,
}

impl SheetHyperlinks {
    fn insert(&mut self, range: CellRange, target: String) {
        let index = self.targets.len();
        self.targets.push(target);
        if range.is_single() {
            self.cells.entry(range.start).or_insert(index);
        } else {
            self.ranges.push((range, index));
        }
    }

    /// 指定セルのリンク先
    pub fn get(&self, coord: CellCoord) -> Option<&str> {
        let cell = self.cells.get(&coord).copied();
        let range = self
            .ranges
            .iter()
            .find(|(range, _)| range.contains(coord))
            .map(|(_, index)| *index);
        let index = match (cell, range) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b)?,
        };
        self.targets.get(index).map(String::as_str)
    }

    /// 解析した`<hyperlink>`要素の数
    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

/// workbook.xmlに記載されたシート
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    relationship_id: Option<String>,
}

/// XLSXメタデータパーサー
///
/// 生成時にアーカイブの安全性を検査し、シート名とワークシートパーツの対応を
/// `xl/workbook.xml` と `xl/_rels/workbook.xml.rels` から解決します。
/// ワークシートのハイパーリンクは要求されたシートについてのみ解析します。
#[derive(Debug, Clone)]
pub(crate) struct XlsxMetadataParser {
    data: Arc<[u8]>,
    /// シート名 -> ワークシートパーツのパス
    sheet_parts: HashMap<String, String>,
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl XlsxMetadataParser {
    /// XLSXファイル（ZIPアーカイブ）のバイト列からメタデータを解析
    pub fn new(data: Arc<[u8]>) -> Result<Self, Error> {
        let mut archive = open_archive(&data)?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| Error::Zip(e.to_string()))?;
            entries.push((file.name().to_string(), file.size()));
        }
        SecurityConfig::default().check_entries(
            archive.len(),
            entries.iter().map(|(name, size)| (name.as_str(), *size)),
        )?;

        // 1. xl/workbook.xml: シート一覧とエポック
        let workbook_part = "xl/workbook.xml";
        let (sheets, is_1904) = match read_part(&mut archive, workbook_part)? {
            Some(xml) => parse_workbook(&xml, workbook_part)?,
            None => (Vec::new(), false),
        };

        // 2. xl/_rels/workbook.xml.rels: rId -> ワークシートパーツ
        let workbook_rels_part = "xl/_rels/workbook.xml.rels";
        let workbook_rels = match read_part(&mut archive, workbook_rels_part)? {
            Some(xml) => parse_relationships(&xml, workbook_rels_part)?,
            None => HashMap::new(),
        };

        let mut sheet_parts = HashMap::with_capacity(sheets.len());
        for (index, sheet) in sheets.iter().enumerate() {
            let part = match sheet
                .relationship_id
                .as_ref()
                .and_then(|id| workbook_rels.get(id))
            {
                Some(target) => resolve_target("xl", target)?,
                // relsが欠けている場合は既定の命名規則で推測
                None => format!("xl/worksheets/sheet{}.xml", index + 1),
            };
            sheet_parts.entry(sheet.name.clone()).or_insert(part);
        }

        Ok(Self {
            data,
            sheet_parts,
            is_1904,
        })
    }

    /// 指定シートのハイパーリンクを解析
    ///
    /// シートが存在しない、またはワークシートパーツがない場合は空を返します。
    pub fn sheet_hyperlinks(&self, sheet_name: &str) -> Result<SheetHyperlinks, Error> {
        let Some(part) = self.sheet_parts.get(sheet_name) else {
            return Ok(SheetHyperlinks::default());
        };

        let mut archive = open_archive(&self.data)?;
        let Some(sheet_xml) = read_part(&mut archive, part)? else {
            return Ok(SheetHyperlinks::default());
        };

        let rels_part = rels_path_for(part);
        let rels = match read_part(&mut archive, &rels_part)? {
            Some(xml) => parse_relationships(&xml, &rels_part)?,
            None => HashMap::new(),
        };

        let links = parse_worksheet_hyperlinks(&sheet_xml, &rels, part)?;
        tracing::debug!(sheet = sheet_name, part = %part, count = links.len(), "parsed hyperlinks");
        Ok(links)
    }

    /// 1904年エポックを使用するかどうか
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }
}

fn open_archive(data: &Arc<[u8]>) -> Result<ZipArchive<Cursor<Arc<[u8]>>>, Error> {
    ZipArchive::new(Cursor::new(Arc::clone(data))).map_err(|e| Error::Zip(e.to_string()))
}

/// アーカイブからパーツを読み込む。存在しない場合は`None`
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, Error> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(Error::Zip(e.to_string())),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

fn xml_error(part: &str, message: impl std::fmt::Display) -> Error {
    Error::Xml {
        part: part.to_string(),
        message: message.to_string(),
    }
}

/// 属性値をUTF-8として読み、アンエスケープして取得
fn attr_value(
    attr: &quick_xml::events::attributes::Attribute<'_>,
    part: &str,
) -> Result<String, Error> {
    let raw = std::str::from_utf8(&attr.value).map_err(|e| xml_error(part, e))?;
    quick_xml::escape::unescape(raw)
        .map(|v| v.into_owned())
        .map_err(|e| xml_error(part, e))
}

/// 要素の属性を (prefixの有無, ローカル名, 値) として列挙
fn attributes(e: &BytesStart<'_>, part: &str) -> Result<Vec<(bool, Vec<u8>, String)>, Error> {
    let mut result = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_error(part, e))?;
        let prefixed = attr.key.prefix().is_some();
        let local = attr.key.local_name().as_ref().to_vec();
        result.push((prefixed, local, attr_value(&attr, part)?));
    }
    Ok(result)
}

/// xl/workbook.xml の解析
///
/// `<sheet name=".." r:id=".."/>` を出現順に集め、`<workbookPr date1904="1"/>` を判定します。
fn parse_workbook(xml: &[u8], part: &str) -> Result<(Vec<SheetEntry>, bool), Error> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    let mut is_1904 = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"sheet" => {
                    let mut name = None;
                    let mut relationship_id = None;
                    for (prefixed, key, value) in attributes(&e, part)? {
                        match (prefixed, key.as_slice()) {
                            (false, b"name") => name = Some(value),
                            (true, b"id") => relationship_id = Some(value),
                            _ => {}
                        }
                    }
                    if let Some(name) = name {
                        sheets.push(SheetEntry {
                            name,
                            relationship_id,
                        });
                    }
                }
                b"workbookPr" => {
                    for (_, key, value) in attributes(&e, part)? {
                        if key == b"date1904" {
                            is_1904 = value == "1" || value.eq_ignore_ascii_case("true");
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, is_1904))
}

/// リレーションシップパーツ（*.rels）の解析: Id -> Target
fn parse_relationships(xml: &[u8], part: &str) -> Result<HashMap<String, String>, Error> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    for (_, key, value) in attributes(&e, part)? {
                        match key.as_slice() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            _ => {}
                        }
                    }
                    // IdかTargetが欠けたものは無視
                    if let (Some(id), Some(target)) = (id, target) {
                        relationships.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// ワークシートXMLから `<hyperlinks>` 内の `<hyperlink>` を解析
///
/// `ref`が範囲（例: `B2:B4`）の場合は範囲内の全セルが同じURLを持ちます。
/// `r:id`を持たない内部リンク（`location`のみ）はリンク先なしとして扱います。
fn parse_worksheet_hyperlinks(
    xml: &[u8],
    relationships: &HashMap<String, String>,
    part: &str,
) -> Result<SheetHyperlinks, Error> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut hyperlinks = SheetHyperlinks::default();
    let mut in_hyperlinks = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"hyperlinks" => in_hyperlinks = true,
                b"hyperlink" if in_hyperlinks => {
                    let mut range = None;
                    let mut relationship_id = None;
                    for (prefixed, key, value) in attributes(&e, part)? {
                        match (prefixed, key.as_slice()) {
                            (false, b"ref") => range = CellRange::from_ref(&value),
                            (true, b"id") => relationship_id = Some(value),
                            _ => {}
                        }
                    }

                    let url = relationship_id
                        .and_then(|id| relationships.get(&id))
                        .filter(|url| !url.is_empty());
                    if let (Some(range), Some(url)) = (range, url) {
                        hyperlinks.insert(range, url.clone());
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"hyperlinks" {
                    in_hyperlinks = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(hyperlinks)
}

/// リレーションシップのTargetをアーカイブ内パスに解決
///
/// `/xl/worksheets/sheet1.xml` のような絶対指定と、`base`からの相対指定の両方を扱います。
fn resolve_target(base: &str, target: &str) -> Result<String, Error> {
    let path = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let target = target.strip_prefix("./").unwrap_or(target);
            format!("{}/{}", base.trim_end_matches('/'), target)
        }
    };
    validate_zip_path(&path).map_err(|e| Error::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;
    Ok(path)
}

/// パーツに対応するrelsパス（例: "xl/worksheets/sheet1.xml" -> "xl/worksheets/_rels/sheet1.xml.rels"）
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}
