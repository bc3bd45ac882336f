//! Parser Module
//!
//! calamineによるセル値の読み込みと、XMLから直接取得するハイパーリンク情報。

mod metadata;
mod workbook;

pub(crate) use metadata::{SheetHyperlinks, XlsxMetadataParser};
pub(crate) use workbook::{LoadedSheet, WorkbookParser};
