//! 输入图片
//!
//! 入队之后不可变，编排器只读取它

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;

/// 一张待分类的图片（二进制内容 + 显示名称）
///
/// 内容用 `Arc<[u8]>` 持有，克隆只增加引用计数，
/// 匹配集合和结果列表可以放心地保存副本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    name: String,
    content: Arc<[u8]>,
}

impl InputItem {
    /// 从内存中的数据创建
    pub fn new(name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// 从文件读取，文件名作为显示名称
    pub async fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read(path)
            .await
            .with_context(|| format!("无法读取图片: {}", path.display()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            content: content.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
