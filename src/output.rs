use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;

/// レポートを出力する。
///
/// `out_path`が指定されている場合はファイルに書き込み、指定されていない場合は`stdout`に書き込む。
///
/// # Arguments
///
/// * `out_path` - 出力先のファイル
/// * `report` - 出力するレポート
/// * `stdout` - ファイルが指定されていない場合の出力先
pub fn write_report<W: Write>(out_path: Option<&Path>, report: &str, stdout: &mut W) -> Result<()> {
    match out_path {
        Some(path) => {
            fs::write(path, report)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => {
            stdout
                .write_all(report.as_bytes())
                .context("Failed to write report to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
