use crate::models::reference::FeatureVector;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// 预计算检测清单
///
/// 由离线推理生成，每张图片一条记录，参考图片单独一组。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionManifest {
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    #[serde(default)]
    pub references: Vec<ReferenceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub name: String,
    #[serde(default)]
    pub detections: Vec<DetectionRecord>,
    /// 推理时的解码错误，存在时该图片分析失败
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<FeatureVector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub name: String,
    /// 单人脸描述子，图片中没有人脸时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<FeatureVector>,
}

/// 从 TOML 文件加载检测清单
pub async fn load_manifest(manifest_path: &Path) -> Result<DetectionManifest> {
    let content = fs::read_to_string(manifest_path)
        .await
        .with_context(|| format!("无法读取检测清单: {}", manifest_path.display()))?;

    let manifest: DetectionManifest = toml::from_str(&content)
        .with_context(|| format!("无法解析检测清单: {}", manifest_path.display()))?;

    tracing::info!(
        "检测清单已加载: {} 张图片, {} 张参考图片",
        manifest.images.len(),
        manifest.references.len()
    );

    Ok(manifest)
}
