//! 参考向量录入 - 业务能力层
//!
//! 对每张参考图片提取单个人脸的特征向量，组成参考集合。
//! 没有人脸、超时或分析失败的图片被跳过并记录原因。

use std::time::Duration;

use tracing::{info, warn};

use crate::infrastructure::{guard, Oracle};
use crate::models::{InputItem, ReferenceSet};

/// 录入结果
#[derive(Debug, Clone, Default)]
pub struct EnrollmentReport {
    pub references: ReferenceSet,
    pub accepted: Vec<String>,
    /// (图片名称, 原因)
    pub rejected: Vec<(String, String)>,
}

impl EnrollmentReport {
    /// 是否一个向量都没有录入
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// 从参考图片构建参考集合
///
/// # 参数
/// - `oracle`: 分析引擎
/// - `items`: 参考图片
/// - `timeout`: 单张图片的超时时间
pub async fn enroll_references(
    oracle: &dyn Oracle,
    items: &[InputItem],
    timeout: Duration,
) -> EnrollmentReport {
    let mut report = EnrollmentReport::default();

    for item in items {
        let outcome = guard(timeout, oracle.describe_reference(item)).await;

        let rejection = match outcome {
            Ok(Some(descriptor)) => match report.references.push(descriptor) {
                Ok(()) => {
                    report.accepted.push(item.name().to_string());
                    continue;
                }
                Err(e) => e.to_string(),
            },
            Ok(None) => "未检测到人脸".to_string(),
            Err(e) => e.to_string(),
        };

        warn!("参考图片 {} 被跳过: {}", item.name(), rejection);
        report.rejected.push((item.name().to_string(), rejection));
    }

    if report.is_empty() {
        warn!("⚠️ 参考向量录入失败，请上传清晰的正脸照片");
    } else {
        info!("✓ 已录入 {} 个参考向量", report.references.len());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::infrastructure::OracleOutput;
    use crate::models::{AnalysisSettings, FeatureVector};
    use async_trait::async_trait;

    struct ScriptedOracle;

    #[async_trait]
    impl Oracle for ScriptedOracle {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_ready(&self) -> bool {
            true
        }

        async fn analyze(
            &self,
            _item: &InputItem,
            _settings: &AnalysisSettings,
        ) -> Result<OracleOutput, OracleError> {
            Ok(OracleOutput::empty())
        }

        async fn describe_reference(
            &self,
            item: &InputItem,
        ) -> Result<Option<FeatureVector>, OracleError> {
            match item.name() {
                "good.jpg" => Ok(Some(FeatureVector::new(vec![0.1, 0.2]))),
                "wide.jpg" => Ok(Some(FeatureVector::new(vec![0.1, 0.2, 0.3]))),
                "empty.jpg" => Ok(None),
                "slow.jpg" => std::future::pending().await,
                _ => Err(OracleError::Internal("boom".to_string())),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrollment_skips_bad_references() {
        let items: Vec<InputItem> = ["good.jpg", "empty.jpg", "wide.jpg", "slow.jpg", "bad.jpg"]
            .iter()
            .map(|name| InputItem::new(*name, vec![0u8]))
            .collect();

        let report = enroll_references(&ScriptedOracle, &items, Duration::from_millis(200)).await;

        assert_eq!(report.accepted, vec!["good.jpg".to_string()]);
        assert_eq!(report.references.len(), 1);
        let rejected: Vec<&str> = report.rejected.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(rejected, vec!["empty.jpg", "wide.jpg", "slow.jpg", "bad.jpg"]);
    }

    #[tokio::test]
    async fn test_enrollment_with_no_faces_is_empty() {
        let items = vec![InputItem::new("empty.jpg", vec![0u8])];
        let report = enroll_references(&ScriptedOracle, &items, Duration::from_secs(1)).await;
        assert!(report.is_empty());
    }
}
