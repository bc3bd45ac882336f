//! Extraction Module
//!
//! ヘッダー行の探索、ハイパーリンク列の走査、バルクテーブルとの結合、
//! URLからの商品コード抽出を提供します。

pub(crate) mod header;
pub(crate) mod links;
pub(crate) mod merge;
pub(crate) mod product_code;

pub use header::HeaderMap;
pub use links::{LinkRecord, LinkTable};
pub use product_code::{extract_product_code, PRODUCT_CODE_PATTERN};
