//! 基于预计算检测清单的分析引擎
//!
//! 推理在离线完成，结果写入 TOML 清单；这里按图片名称查表，
//! 行为上与在线推理一致：同一张图片总是得到同样的输出。

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::error::OracleError;
use crate::infrastructure::oracle::{Detection, Oracle, OracleOutput};
use crate::models::loaders::{load_manifest, DetectionManifest, DetectionRecord, ImageRecord};
use crate::models::{AnalysisSettings, FeatureVector, InputItem};

/// 清单分析引擎
pub struct ManifestOracle {
    images: HashMap<String, ImageRecord>,
    references: HashMap<String, Option<FeatureVector>>,
    /// 低于该置信度的检测结果在比较前被过滤
    min_detection_confidence: f32,
}

impl ManifestOracle {
    pub fn new(manifest: DetectionManifest, min_detection_confidence: f32) -> Self {
        let images = manifest
            .images
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        let references = manifest
            .references
            .into_iter()
            .map(|record| (record.name, record.descriptor))
            .collect();

        Self {
            images,
            references,
            min_detection_confidence,
        }
    }

    /// 从文件加载清单
    pub async fn load(manifest_path: &Path, min_detection_confidence: f32) -> Result<Self> {
        let manifest = load_manifest(manifest_path).await?;
        Ok(Self::new(manifest, min_detection_confidence))
    }

    fn record(&self, name: &str) -> Result<&ImageRecord, OracleError> {
        let record = self.images.get(name).ok_or_else(|| OracleError::MissingRecord {
            name: name.to_string(),
        })?;

        if let Some(reason) = &record.error {
            return Err(OracleError::Decode {
                name: name.to_string(),
                reason: reason.clone(),
            });
        }

        Ok(record)
    }

    fn confident<'a>(&self, detections: &'a [DetectionRecord]) -> impl Iterator<Item = &'a DetectionRecord> {
        let floor = self.min_detection_confidence;
        detections.iter().filter(move |d| d.confidence >= floor)
    }
}

#[async_trait]
impl Oracle for ManifestOracle {
    fn name(&self) -> &str {
        "manifest"
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn analyze(
        &self,
        item: &InputItem,
        _settings: &AnalysisSettings,
    ) -> Result<OracleOutput, OracleError> {
        let record = self.record(item.name())?;

        let detections: Vec<Detection> = self
            .confident(&record.detections)
            .map(|d| Detection {
                label: d.label.clone(),
                confidence: d.confidence,
                descriptor: d.descriptor.clone(),
            })
            .collect();

        debug!(
            "{}: {} 个检测结果 (过滤前 {})",
            item.name(),
            detections.len(),
            record.detections.len()
        );

        Ok(OracleOutput::new(detections))
    }

    async fn describe_reference(&self, item: &InputItem) -> Result<Option<FeatureVector>, OracleError> {
        if let Some(descriptor) = self.references.get(item.name()) {
            return Ok(descriptor.clone());
        }

        // 参考图片也可以直接出现在 images 里：取置信度最高的人脸
        let record = self.record(item.name())?;
        let best = self
            .confident(&record.detections)
            .filter(|d| d.descriptor.is_some())
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        Ok(best.and_then(|d| d.descriptor.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> DetectionManifest {
        toml::from_str(
            r#"
            [[images]]
            name = "group.jpg"
            [[images.detections]]
            label = "face"
            confidence = 0.9
            descriptor = [0.0, 1.0]
            [[images.detections]]
            label = "face"
            confidence = 0.3
            descriptor = [1.0, 0.0]

            [[images]]
            name = "broken.jpg"
            error = "bad header"

            [[references]]
            name = "me.jpg"
            descriptor = [0.0, 0.9]

            [[references]]
            name = "landscape.jpg"
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_low_confidence_detections_are_filtered() {
        let oracle = ManifestOracle::new(manifest(), 0.5);
        let output = oracle
            .analyze(&InputItem::new("group.jpg", vec![1u8]), &AnalysisSettings::default())
            .await
            .unwrap();
        assert_eq!(output.detections.len(), 1);
        assert_eq!(output.best_score, Some(0.9));
    }

    #[tokio::test]
    async fn test_errors_map_to_oracle_failures() {
        let oracle = ManifestOracle::new(manifest(), 0.5);
        let settings = AnalysisSettings::default();

        let broken = oracle.analyze(&InputItem::new("broken.jpg", vec![1u8]), &settings).await;
        assert!(matches!(broken, Err(OracleError::Decode { .. })));

        let unknown = oracle.analyze(&InputItem::new("nope.jpg", vec![1u8]), &settings).await;
        assert!(matches!(unknown, Err(OracleError::MissingRecord { .. })));
    }

    #[tokio::test]
    async fn test_describe_reference() {
        let oracle = ManifestOracle::new(manifest(), 0.5);

        let me = oracle.describe_reference(&InputItem::new("me.jpg", vec![1u8])).await.unwrap();
        assert_eq!(me, Some(FeatureVector::new(vec![0.0, 0.9])));

        let nobody = oracle
            .describe_reference(&InputItem::new("landscape.jpg", vec![1u8]))
            .await
            .unwrap();
        assert_eq!(nobody, None);

        let from_images = oracle
            .describe_reference(&InputItem::new("group.jpg", vec![1u8]))
            .await
            .unwrap();
        assert_eq!(from_images, Some(FeatureVector::new(vec![0.0, 1.0])));
    }
}
