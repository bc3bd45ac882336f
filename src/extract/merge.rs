//! Bulk Merge
//!
//! バルク読み込みしたテーブルとリンク情報を識別子列で内部結合します。

use crate::error::Error;
use crate::extract::links::LinkTable;
use crate::table::Table;
use crate::types::CellValue;

/// 結合時に使用する列名
#[derive(Debug, Clone, Copy)]
pub(crate) struct MergeColumns<'a> {
    /// 元のハイパーリンク列（表示テキストが入っている列）
    pub url_column: &'a str,
    /// 上記列の変更後の名前
    pub description_column: &'a str,
    /// 結合キー
    pub id_column: &'a str,
    /// 追加するURL列
    pub link_column: &'a str,
    /// 追加する商品コード列
    pub code_column: Option<&'a str>,
}

/// ハイパーリンク列をリネームし、リンク情報を内部結合する
///
/// 各バルク行は同じ識別子を持つ最初のリンクレコードとだけ結合されるため、
/// 結果の行数がバルクテーブルの行数を超えることはありません。
/// 識別子が空、またはリンクレコードのない行は結果に含まれません。
pub(crate) fn merge_links(
    mut bulk: Table,
    links: &LinkTable,
    columns: MergeColumns<'_>,
) -> Result<Table, Error> {
    bulk.rename_column(columns.url_column, columns.description_column)?;

    let id_index = bulk
        .column_index(columns.id_column)
        .ok_or_else(|| Error::MissingColumn {
            column: columns.id_column.to_string(),
            sheet: "bulk table".to_string(),
        })?;

    let mut appended = vec![columns.link_column];
    appended.extend(columns.code_column);
    for name in &appended {
        if bulk.column_index(name).is_some() {
            return Err(Error::Config(format!(
                "Output column '{}' collides with an existing column",
                name
            )));
        }
    }

    let mut output_columns: Vec<String> = bulk.columns().to_vec();
    output_columns.extend(appended.iter().map(|s| s.to_string()));
    let mut merged = Table::new(output_columns);

    let lookup = links.by_identifier();
    for row in bulk.rows() {
        let Some(record) = row[id_index].as_i64().and_then(|id| lookup.get(&id)) else {
            continue;
        };

        let mut out = row.clone();
        out.push(CellValue::from(record.url.clone()));
        if columns.code_column.is_some() {
            out.push(CellValue::from(record.product_code()));
        }
        merged.push_row(out);
    }

    tracing::debug!(
        bulk_rows = bulk.len(),
        link_rows = links.len(),
        merged_rows = merged.len(),
        "merged link table"
    );

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::links::LinkRecord;

    const COLUMNS: MergeColumns<'static> = MergeColumns {
        url_column: "ProductURL",
        description_column: "ProductDescription",
        id_column: "ItemID",
        link_column: "ProductURL",
        code_column: Some("ProductCode"),
    };

    fn bulk() -> Table {
        let mut table = Table::new(["ItemID", "ProductURL", "Qty"]);
        table.push_row(vec![CellValue::Int(1), "Milk".into(), CellValue::Int(2)]);
        table.push_row(vec![CellValue::Int(2), "Bread".into(), CellValue::Int(1)]);
        table.push_row(vec![CellValue::Empty, CellValue::Empty, CellValue::Empty]);
        table.push_row(vec![CellValue::Int(3), "Eggs".into(), CellValue::Int(12)]);
        table
    }

    fn links() -> LinkTable {
        LinkTable::new(vec![
            LinkRecord {
                row: 2,
                identifier: Some(1),
                url: Some("https://shop/254656543".to_string()),
            },
            LinkRecord {
                row: 3,
                identifier: Some(2),
                url: None,
            },
            LinkRecord {
                row: 5,
                identifier: Some(3),
                url: Some("https://shop/other".to_string()),
            },
        ])
    }

    #[test]
    fn test_merge_renames_and_appends() {
        let merged = merge_links(bulk(), &links(), COLUMNS).unwrap();
        assert_eq!(
            merged.columns(),
            &["ItemID", "ProductDescription", "Qty", "ProductURL", "ProductCode"]
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(0, "ProductDescription"), Some(&"Milk".into()));
        assert_eq!(
            merged.get(0, "ProductURL"),
            Some(&"https://shop/254656543".into())
        );
        assert_eq!(merged.get(0, "ProductCode"), Some(&"254656543".into()));
        assert_eq!(merged.get(1, "ProductURL"), Some(&CellValue::Empty));
        assert_eq!(merged.get(2, "ProductCode"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_merge_drops_unmatched_rows() {
        let only_first = LinkTable::new(links().records()[..1].to_vec());
        let merged = merge_links(bulk(), &only_first, COLUMNS).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_merge_with_duplicate_links_does_not_grow() {
        let mut records = links().records().to_vec();
        records.push(LinkRecord {
            row: 9,
            identifier: Some(1),
            url: Some("https://shop/dup".to_string()),
        });
        let merged = merge_links(bulk(), &LinkTable::new(records), COLUMNS).unwrap();
        assert!(merged.len() <= bulk().len());
        assert_eq!(
            merged.get(0, "ProductURL"),
            Some(&"https://shop/254656543".into())
        );
    }

    #[test]
    fn test_merge_column_collision() {
        let columns = MergeColumns {
            link_column: "Qty",
            ..COLUMNS
        };
        assert!(matches!(
            merge_links(bulk(), &links(), columns),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_merge_missing_identifier_column() {
        let columns = MergeColumns {
            id_column: "SKU",
            ..COLUMNS
        };
        assert!(matches!(
            merge_links(bulk(), &links(), columns),
            Err(Error::MissingColumn { .. })
        ));
    }
}
