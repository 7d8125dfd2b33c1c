//! 应用入口 - 宿主层
//!
//! 把配置、分析引擎、参考向量录入、编排器和导出串起来：
//!
//! 1. 加载检测清单，创建分析引擎
//! 2. 指定人物模式下录入参考图片
//! 3. 加载待分类图片并运行编排器（Ctrl-C 请求停止）
//! 4. 写运行报告，导出匹配图片

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{ManifestOracle, Oracle};
use crate::models::{load_images_from_folder, AnalysisMode, FinalState, ReferenceSet};
use crate::orchestrator::{BatchOrchestrator, LoggingSink, OrchestratorOptions};
use crate::services::{enroll_references, FolderExporter, ReportWriter};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    mode: AnalysisMode,
    oracle: Arc<dyn Oracle>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        logging::log_startup(&config);

        let mode = config.analysis_mode()?;
        let oracle = ManifestOracle::load(
            Path::new(&config.manifest_path),
            config.min_detection_confidence,
        )
        .await?;

        Ok(Self {
            config,
            mode,
            oracle: Arc::new(oracle),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<Option<FinalState>> {
        let references = self.load_references().await?;

        info!("\n📁 正在扫描待分类的图片...");
        let items = load_images_from_folder(&self.config.input_folder).await?;
        if items.is_empty() {
            warn!("⚠️ 没有找到待分类的图片，程序结束");
            return Ok(None);
        }

        let orchestrator = BatchOrchestrator::new(
            self.oracle.clone(),
            Arc::new(LoggingSink::new(self.config.verbose_logging)),
            OrchestratorOptions::from_config(&self.config),
        );
        orchestrator.configure(self.mode.clone(), references, self.config.threshold)?;

        let handle = orchestrator.start(items)?;

        let stop = orchestrator.stop_handle();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("收到 Ctrl-C，当前图片完成后停止");
                stop.stop();
            }
        });

        let final_state = handle.wait().await?;
        ctrl_c.abort();

        let report = ReportWriter::new(&self.config.report_file);
        match report
            .write(&orchestrator.settings(), &final_state, &orchestrator.results())
            .await
        {
            Ok(()) => info!("📝 运行报告已保存至: {}", report.path()),
            Err(e) => error!("运行报告写入失败: {:#}", e),
        }

        self.export(&final_state).await;

        Ok(Some(final_state))
    }

    /// 指定人物模式下录入参考向量，其他模式不需要
    async fn load_references(&self) -> Result<ReferenceSet> {
        if !self.mode.needs_references() {
            return Ok(ReferenceSet::new());
        }

        info!("\n🧬 正在分析参考图片...");
        let reference_items = load_images_from_folder(&self.config.reference_folder)
            .await
            .with_context(|| format!("无法加载参考图片: {}", self.config.reference_folder))?;

        let report = enroll_references(
            self.oracle.as_ref(),
            &reference_items,
            Duration::from_millis(self.config.timeout_ms),
        )
        .await;
        logging::log_enrollment(&report);

        Ok(report.references)
    }

    /// 导出匹配图片；失败只记录，不影响运行结果
    async fn export(&self, final_state: &FinalState) {
        if final_state.matched_set.is_empty() {
            info!("没有匹配的图片，跳过导出");
            return;
        }

        let exporter = FolderExporter::new(&self.config.export_folder);
        match exporter.export(&self.mode, &final_state.matched_set).await {
            Ok(report) => info!(
                "📦 已导出 {} 张匹配图片至: {}",
                report.written.len(),
                report.directory.display()
            ),
            Err(e) => error!("导出失败: {}", e),
        }
    }
}
