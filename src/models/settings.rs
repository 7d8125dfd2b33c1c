//! 分析参数

use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::models::mode::AnalysisMode;
use crate::models::reference::ReferenceSet;

/// 一次运行使用的分析参数，运行期间不可变
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub mode: AnalysisMode,
    pub references: Arc<ReferenceSet>,
    /// 距离模式为最大距离，置信度模式为最低置信度，边界都包含在内
    pub threshold: f32,
}

impl AnalysisSettings {
    pub fn new(
        mode: AnalysisMode,
        references: ReferenceSet,
        threshold: f32,
    ) -> Result<Self, OrchestratorError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(OrchestratorError::InvalidThreshold(threshold));
        }
        Ok(Self {
            mode,
            references: Arc::new(references),
            threshold,
        })
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::TargetSpecific,
            references: Arc::new(ReferenceSet::new()),
            threshold: 0.5,
        }
    }
}
