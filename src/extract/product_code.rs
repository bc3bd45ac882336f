//! Product Code Extractor
//!
//! 商品URLに含まれる9桁の商品コードを取り出します。

use once_cell::sync::Lazy;
use regex::Regex;

/// 商品コードのパターン（9桁の数字）
pub const PRODUCT_CODE_PATTERN: &str = r"\d{9}";

static PRODUCT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PRODUCT_CODE_PATTERN).expect("product code pattern is valid"));

/// URLから最初に現れる9桁の数字列を返す
///
/// 一致がなければ`None`。複数一致する場合は先頭のものを採用します。
///
/// ```rust
/// use xlsxlinks::extract_product_code;
///
/// assert_eq!(extract_product_code("https://x/123456789/y"), Some("123456789"));
/// assert_eq!(extract_product_code("https://x/abc"), None);
/// ```
pub fn extract_product_code(url: &str) -> Option<&str> {
    PRODUCT_CODE_RE.find(url).map(|m| m.as_str())
}
