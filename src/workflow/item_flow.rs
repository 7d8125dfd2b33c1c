//! 单张图片处理流程 - 流程层
//!
//! 核心职责：定义"一张图片"的完整处理流程
//!
//! 流程顺序：
//! 1. 超时保护下调用分析引擎
//! 2. 按模式判定匹配
//! 3. 超时 / 失败 / panic 转换为失败结果（不匹配），从不向上传播
//!
//! 本次调用产生的临时资源（解码后的图片等）都归分析调用的 future 所有，
//! 无论成功、失败还是超时，在流程返回前都已释放。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::{GuardError, OracleError};
use crate::infrastructure::{Oracle, TimeoutGuard};
use crate::models::{AnalysisResult, AnalysisSettings, Annotation, InputItem};
use crate::services::classify;
use crate::workflow::item_ctx::ItemCtx;

/// 单张图片处理流程
///
/// - 不持有运行状态
/// - 不修改计数器
/// - 总是返回一个结果
pub struct ItemFlow {
    oracle: Arc<dyn Oracle>,
    guard: TimeoutGuard,
}

impl ItemFlow {
    pub fn new(oracle: Arc<dyn Oracle>, guard: TimeoutGuard) -> Self {
        Self { oracle, guard }
    }

    pub async fn run(
        &self,
        item: &InputItem,
        ctx: &ItemCtx,
        settings: &AnalysisSettings,
    ) -> AnalysisResult {
        let direction = settings.mode.direction();

        let analysis = AssertUnwindSafe(self.oracle.analyze(item, settings))
            .catch_unwind()
            .map(|outcome| outcome.unwrap_or(Err(OracleError::Panicked)));

        match self.guard.run(analysis).await {
            Ok(output) => {
                let classification = classify(settings, &output);
                debug!(
                    "{} 检测数: {}, 分数: {:.3}, {}",
                    ctx,
                    output.detections.len(),
                    classification.score,
                    classification.annotation
                );
                AnalysisResult {
                    index: ctx.index,
                    name: ctx.name.clone(),
                    is_match: classification.is_match,
                    score: classification.score,
                    annotation: classification.annotation,
                    direction,
                }
            }
            Err(GuardError::TimedOut(after)) => {
                warn!("{} ⏱️ 分析超时 ({}ms)，按不匹配处理", ctx, after.as_millis());
                AnalysisResult::failure(ctx.index, &ctx.name, direction, Annotation::Timeout)
            }
            Err(GuardError::Failed(e)) => {
                warn!("{} ⚠️ 分析失败: {}", ctx, e);
                AnalysisResult::failure(
                    ctx.index,
                    &ctx.name,
                    direction,
                    Annotation::OracleFailure(e.to_string()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{Detection, OracleOutput};
    use crate::models::{AnalysisMode, FeatureVector, ReferenceSet};
    use async_trait::async_trait;
    use std::time::Duration;

    struct MoodyOracle;

    #[async_trait]
    impl Oracle for MoodyOracle {
        fn name(&self) -> &str {
            "moody"
        }

        fn is_ready(&self) -> bool {
            true
        }

        async fn analyze(
            &self,
            item: &InputItem,
            _settings: &AnalysisSettings,
        ) -> Result<OracleOutput, OracleError> {
            match item.name() {
                "face.jpg" => Ok(OracleOutput::new(vec![Detection::face(0.9, vec![0.0])])),
                "hang.jpg" => std::future::pending().await,
                "panic.jpg" => panic!("model exploded"),
                _ => Err(OracleError::Decode {
                    name: item.name().to_string(),
                    reason: "not an image".to_string(),
                }),
            }
        }

        async fn describe_reference(
            &self,
            _item: &InputItem,
        ) -> Result<Option<FeatureVector>, OracleError> {
            Ok(None)
        }
    }

    async fn run_one(name: &str) -> AnalysisResult {
        let flow = ItemFlow::new(Arc::new(MoodyOracle), TimeoutGuard::from_millis(1_000));
        let settings =
            AnalysisSettings::new(AnalysisMode::AnyPresence, ReferenceSet::new(), 0.5).unwrap();
        let item = InputItem::new(name, vec![0u8]);
        flow.run(&item, &ItemCtx::new(4, 9, name), &settings).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_classified() {
        let result = run_one("face.jpg").await;
        assert!(result.is_match);
        assert_eq!(result.index, 4);
        assert_eq!(result.annotation, Annotation::Matched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure_result() {
        let started = tokio::time::Instant::now();
        let result = run_one("hang.jpg").await;
        assert!(!result.is_match);
        assert_eq!(result.annotation, Annotation::Timeout);
        assert!(started.elapsed() >= Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_error_becomes_failure_result() {
        let result = run_one("corrupt.jpg").await;
        assert!(!result.is_match);
        assert!(matches!(result.annotation, Annotation::OracleFailure(_)));
        assert!(result.annotation.is_failure());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_becomes_failure_result() {
        let result = run_one("panic.jpg").await;
        assert_eq!(
            result.annotation,
            Annotation::OracleFailure(OracleError::Panicked.to_string())
        );
    }

    #[test]
    fn test_ctx_display() {
        assert_eq!(ItemCtx::new(0, 3, "a.jpg").to_string(), "[图片 1/3 a.jpg]");
    }
}
