//! # BioSort
//!
//! 照片分拣：用参考人脸或检测模型把一批图片分成"匹配 / 不匹配"，并导出匹配的图片
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺的推理能力，只暴露能力
//! - `Oracle` - 分析引擎接口（人脸检测 / 识别 / 目标检测）
//! - `TimeoutGuard` - 限时执行，超时的调用结果被丢弃
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单张图片或单次运行的产物
//! - `classify` - 按模式判定匹配
//! - `enroll_references` - 参考向量录入
//! - `FolderExporter` - 导出匹配图片
//! - `ReportWriter` - 写运行报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张图片"的完整处理流程
//! - `ItemCtx` - 上下文封装（序号 + 名称）
//! - `ItemFlow` - 流程编排（限时分析 → 判定 → 失败转换）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_orchestrator` - 批量分类器，管理状态机和协作式停止
//! - `orchestrator/sink` - 结果接收端
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{ConfigError, ExportError, GuardError, OracleError, OrchestratorError};
pub use infrastructure::{guard, Detection, ManifestOracle, Oracle, OracleOutput, TimeoutGuard};
pub use models::{
    AnalysisMode, AnalysisResult, AnalysisSettings, Annotation, Counters, FeatureVector,
    FinalState, InputItem, Progress, ReferenceSet, RunState,
};
pub use orchestrator::{
    BatchOrchestrator, ChannelSink, LoggingSink, OrchestratorOptions, ResultSink, RunEvent,
    StopHandle,
};
pub use workflow::{ItemCtx, ItemFlow};
