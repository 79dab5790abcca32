pub mod pdf;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// ダウンロード用のファイル名とメディアタイプ
pub const REPORT_FILE_NAME: &str = "plant_disease_report.pdf";
pub const REPORT_MEDIA_TYPE: &str = "application/pdf";

/// 出力先を決める（ディレクトリ・拡張子なしなら既定ファイル名を付ける）
pub fn report_output_path(output: Option<&Path>) -> PathBuf {
    match output {
        None => PathBuf::from(REPORT_FILE_NAME),
        Some(path) if path.is_dir() || path.extension().is_none() => path.join(REPORT_FILE_NAME),
        Some(path) => path.to_path_buf(),
    }
}

/// レポートを書き出す
pub fn write_report(bytes: &[u8], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, bytes)?;
    Ok(())
}
