//! 分析引擎接口
//!
//! 人脸检测 / 识别或通用目标检测都在这个接口之后，编排器只把它当作黑盒。

use async_trait::async_trait;

use crate::error::OracleError;
use crate::models::{AnalysisSettings, FeatureVector, InputItem};

/// 单个检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// 类别标签（人脸检测可以没有）
    pub label: Option<String>,
    pub confidence: f32,
    /// 识别特征向量（目标检测没有）
    pub descriptor: Option<FeatureVector>,
}

impl Detection {
    /// 带特征向量的人脸
    pub fn face(confidence: f32, descriptor: Vec<f32>) -> Self {
        Self {
            label: Some("face".to_string()),
            confidence,
            descriptor: Some(FeatureVector::new(descriptor)),
        }
    }

    /// 带类别标签的目标
    pub fn labeled(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: Some(label.into()),
            confidence,
            descriptor: None,
        }
    }
}

/// 分析引擎对一张图片的输出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleOutput {
    pub detections: Vec<Detection>,
    /// 引擎自己给出的最佳分数（可选，仅用于日志）
    pub best_score: Option<f32>,
}

impl OracleOutput {
    pub fn new(detections: Vec<Detection>) -> Self {
        let best_score = detections
            .iter()
            .map(|d| d.confidence)
            .fold(None, |best: Option<f32>, c| Some(best.map_or(c, |b| b.max(c))));
        Self {
            detections,
            best_score,
        }
    }

    /// 没有检测到任何目标：合法结果，不是失败
    pub fn empty() -> Self {
        Self::default()
    }
}

/// 分析引擎
///
/// 约定：
/// - 第一次调用之前已经完成模型初始化（`is_ready`）
/// - 对不同图片重复调用是安全的
/// - 调用方保证同一时刻只有一个调用在进行
#[async_trait]
pub trait Oracle: Send + Sync {
    /// 引擎名称（用于日志和错误信息）
    fn name(&self) -> &str;

    /// 模型是否已经加载完成
    fn is_ready(&self) -> bool;

    /// 分析一张候选图片
    async fn analyze(
        &self,
        item: &InputItem,
        settings: &AnalysisSettings,
    ) -> Result<OracleOutput, OracleError>;

    /// 从参考图片中提取单个人脸的特征向量，没有人脸时返回 None
    async fn describe_reference(&self, item: &InputItem) -> Result<Option<FeatureVector>, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_best_score() {
        let output = OracleOutput::new(vec![
            Detection::labeled("dog", 0.4),
            Detection::labeled("cat", 0.9),
        ]);
        assert_eq!(output.best_score, Some(0.9));
        assert_eq!(OracleOutput::empty().best_score, None);
    }
}
