//! 匹配图片导出 - 业务能力层
//!
//! 把匹配集合的原始内容写入以模式命名的导出目录：
//! `<导出根目录>/<archive_name>/Matched_Photos/<文件名>`。
//! 导出失败只影响导出本身，不影响已经结束的运行。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::ExportError;
use crate::models::{AnalysisMode, InputItem};

const MATCHED_FOLDER: &str = "Matched_Photos";

/// 导出结果
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub directory: PathBuf,
    pub written: Vec<PathBuf>,
}

/// 导出到本地文件夹
pub struct FolderExporter {
    root: PathBuf,
}

impl FolderExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 某个模式对应的导出目录
    pub fn target_dir(&self, mode: &AnalysisMode) -> PathBuf {
        self.root.join(mode.archive_name()).join(MATCHED_FOLDER)
    }

    /// 导出匹配图片
    ///
    /// 同一模式的旧导出会被整体替换；重名文件追加序号。
    pub async fn export(
        &self,
        mode: &AnalysisMode,
        matched: &[InputItem],
    ) -> Result<ExportReport, ExportError> {
        if matched.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let archive_dir = self.root.join(mode.archive_name());
        if fs::try_exists(&archive_dir).await.unwrap_or(false) {
            fs::remove_dir_all(&archive_dir)
                .await
                .map_err(|source| write_error(&archive_dir, source))?;
        }

        let directory = self.target_dir(mode);
        fs::create_dir_all(&directory)
            .await
            .map_err(|source| write_error(&directory, source))?;

        info!("📦 正在导出 {} 张匹配图片...", matched.len());

        let mut used = HashSet::new();
        let mut written = Vec::with_capacity(matched.len());
        for item in matched {
            let file_name = unique_file_name(item.name(), &mut used);
            let path = directory.join(&file_name);
            fs::write(&path, item.content())
                .await
                .map_err(|source| write_error(&path, source))?;
            debug!("已写入: {}", path.display());
            written.push(path);
        }

        info!("✓ 导出完成: {}", directory.display());

        Ok(ExportReport { directory, written })
    }
}

fn write_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// 只保留文件名部分，重名时追加 ` (n)`
fn unique_file_name(name: &str, used: &mut HashSet<String>) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "image".to_string());

    if used.insert(base.clone()) {
        return base;
    }

    let path = Path::new(&base);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| base.clone());
    let ext = path.extension().map(|e| e.to_string_lossy().to_string());

    let mut n = 1;
    loop {
        let candidate = match &ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
