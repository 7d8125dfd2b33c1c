//! 运行报告写入服务 - 业务能力层
//!
//! 只负责把一次运行的结果写成 JSON 文件

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::models::{AnalysisResult, AnalysisSettings, FinalState, ModeKind};

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    generated_at: String,
    mode: ModeKind,
    mode_label: String,
    threshold: f32,
    reference_count: usize,
    completed: bool,
    processed: usize,
    total: usize,
    kept: usize,
    removed: usize,
    matched: Vec<&'a str>,
    results: &'a [AnalysisResult],
}

/// 运行报告写入服务
pub struct ReportWriter {
    report_file_path: String,
}

impl ReportWriter {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.report_file_path
    }

    /// 生成报告内容
    pub fn render(
        &self,
        settings: &AnalysisSettings,
        final_state: &FinalState,
        results: &[AnalysisResult],
    ) -> Result<String> {
        let report = RunReport {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            mode: settings.mode.kind(),
            mode_label: settings.mode.to_string(),
            threshold: settings.threshold,
            reference_count: settings.references.len(),
            completed: final_state.completed,
            processed: final_state.processed,
            total: final_state.total,
            kept: final_state.kept_count,
            removed: final_state.removed_count,
            matched: final_state.matched_names(),
            results,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// 写入报告文件（覆盖）
    pub async fn write(
        &self,
        settings: &AnalysisSettings,
        final_state: &FinalState,
        results: &[AnalysisResult],
    ) -> Result<()> {
        let content = self.render(settings, final_state, results)?;
        debug!("写入运行报告: {} ({} 字节)", self.report_file_path, content.len());

        fs::write(&self.report_file_path, content)
            .await
            .with_context(|| format!("无法写入运行报告: {}", self.report_file_path))?;

        Ok(())
    }
}
