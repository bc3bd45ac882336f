//! Security Module
//!
//! XLSX（ZIPアーカイブ）を展開する前に適用する安全上の制限。
//! ZIP bomb とパストラバーサルを入口で弾きます。

use crate::error::Error;

/// アーカイブ読み込み時の上限値
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後サイズの合計上限（バイト）。デフォルト: 1GB
    pub max_decompressed_size: u64,
    /// アーカイブ内のエントリ数上限。デフォルト: 10000
    pub max_file_count: usize,
    /// 単一エントリの展開後サイズ上限（バイト）。デフォルト: 100MB
    pub max_file_size: u64,
    /// 入力ファイル自体のサイズ上限（バイト）。デフォルト: 2GB
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824,
            max_file_count: 10_000,
            max_file_size: 104_857_600,
            max_input_file_size: 2_147_483_648,
        }
    }
}

impl SecurityConfig {
    /// 入力バッファのサイズを検証
    pub fn check_input_size(&self, len: usize) -> Result<(), Error> {
        if len as u64 > self.max_input_file_size {
            return Err(Error::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                len, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// エントリ一覧（名前と展開後サイズ）を検証
    ///
    /// エントリ数、各エントリのパスとサイズ、合計サイズの順に確認します。
    pub fn check_entries<'a, I>(&self, count: usize, entries: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        if count > self.max_file_count {
            return Err(Error::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                count, self.max_file_count
            )));
        }

        let mut total: u64 = 0;
        for (name, size) in entries {
            validate_zip_path(name)
                .map_err(|e| Error::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

            if size > self.max_file_size {
                return Err(Error::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    name, size, self.max_file_size
                )));
            }

            total = total.checked_add(size).ok_or_else(|| {
                Error::SecurityViolation("Total decompressed size calculation overflow".to_string())
            })?;
            if total > self.max_decompressed_size {
                return Err(Error::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total, self.max_decompressed_size
                )));
            }
        }

        Ok(())
    }
}

/// アーカイブ内パスの検証
///
/// 空パス、絶対パス、`..`、バックスラッシュを含むパスを拒否します。
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if path.starts_with('/') || has_drive {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_zip_path_valid() {
        assert!(validate_zip_path("xl/workbook.xml").is_ok());
        assert!(validate_zip_path("xl/worksheets/_rels/sheet1.xml.rels").is_ok());
        assert!(validate_zip_path("[Content_Types].xml").is_ok());
    }

    #[test]
    fn test_validate_zip_path_rejected() {
        assert!(validate_zip_path("").is_err());
        assert!(validate_zip_path("/etc/passwd").is_err());
        assert!(validate_zip_path("C:\\Windows\\system32").is_err());
        assert!(validate_zip_path("d:/xl/workbook.xml").is_err());
        assert!(validate_zip_path("../etc/passwd").is_err());
        assert!(validate_zip_path("xl/../../etc/passwd").is_err());
        assert!(validate_zip_path("xl\\workbook.xml").is_err());
    }

    #[test]
    fn test_check_entries_too_many() {
        let config = SecurityConfig {
            max_file_count: 2,
            ..SecurityConfig::default()
        };
        let result = config.check_entries(3, vec![("a.xml", 1), ("b.xml", 1), ("c.xml", 1)]);
        match result {
            Err(Error::SecurityViolation(msg)) => assert!(msg.contains("too many files")),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_check_entries_total_size() {
        let config = SecurityConfig {
            max_decompressed_size: 10,
            ..SecurityConfig::default()
        };
        let result = config.check_entries(2, vec![("a.xml", 6), ("b.xml", 6)]);
        assert!(matches!(result, Err(Error::SecurityViolation(_))));
        assert!(config.check_entries(1, vec![("a.xml", 10)]).is_ok());
    }

    #[test]
    fn test_check_input_size() {
        let config = SecurityConfig {
            max_input_file_size: 4,
            ..SecurityConfig::default()
        };
        assert!(config.check_input_size(4).is_ok());
        assert!(config.check_input_size(5).is_err());
    }
}
