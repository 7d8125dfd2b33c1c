use crate::models::item::InputItem;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "bmp", "gif", "tiff"];

/// 是否为支持的图片扩展名（忽略大小写）
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 从文件夹中加载所有图片，按文件名排序
///
/// 单个文件读取失败只记录警告，不影响其他文件。
pub async fn load_images_from_folder(folder_path: &str) -> Result<Vec<InputItem>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_supported_image(&path) {
            paths.push(path);
        }
    }

    // read_dir 的顺序不固定，排序保证两次运行的输入顺序一致
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        match InputItem::from_path(&path).await {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!("加载图片失败 {}: {}", path.display(), e);
            }
        }
    }

    tracing::info!("从 {} 加载了 {} 张图片", folder_path, items.len());

    Ok(items)
}
