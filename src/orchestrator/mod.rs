//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和运行控制，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_orchestrator` - 批量图片分类器
//! - 管理运行状态机（Idle / Running / StopRequested / Finished）
//! - 严格按输入顺序逐张处理（`Vec<InputItem>`）
//! - 协作式停止
//! - 汇总计数器和匹配集合
//!
//! ### `sink` - 结果接收端
//! - 逐张结果、进度、最终状态三类事件
//! - 通道转发 / 日志输出两种实现
//!
//! ## 层次关系
//!
//! ```text
//! batch_orchestrator (处理 Vec<InputItem>)
//!     ↓
//! workflow::ItemFlow (处理单张图片)
//!     ↓
//! services (能力层：classify / enroll / export / report)
//!     ↓
//! infrastructure (基础设施：Oracle / TimeoutGuard)
//! ```

pub mod batch_orchestrator;
pub mod sink;

// 重新导出主要类型
pub use batch_orchestrator::{BatchOrchestrator, OrchestratorOptions, RunHandle, StopHandle};
pub use sink::{ChannelSink, LoggingSink, ResultSink, RunEvent};
