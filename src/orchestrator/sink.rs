//! 结果接收端
//!
//! 编排器只通过这里向外发送事件，从不直接触碰展示状态。
//! 回调在两张图片之间同步调用，调用顺序与输入顺序严格一致。

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::models::{AnalysisResult, FinalState, Progress};

/// 结果接收端
pub trait ResultSink: Send + Sync {
    /// 每处理完一张图片调用一次（成功或失败）
    fn on_item_result(&self, result: &AnalysisResult);

    /// 紧跟在 `on_item_result` 之后调用
    fn on_progress(&self, progress: Progress);

    /// 每次运行结束时调用且只调用一次
    fn on_finished(&self, final_state: &FinalState);
}

/// 运行事件
#[derive(Debug, Clone)]
pub enum RunEvent {
    ItemResult(AnalysisResult),
    Progress(Progress),
    Finished(FinalState),
}

/// 把事件转发到 mpsc 通道
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelSink {
    /// 创建接收端和对应的事件接收器
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: RunEvent) {
        // 接收器已关闭时丢弃事件，运行本身不受影响
        if self.sender.send(event).is_err() {
            debug!("事件接收器已关闭，丢弃事件");
        }
    }
}

impl ResultSink for ChannelSink {
    fn on_item_result(&self, result: &AnalysisResult) {
        self.send(RunEvent::ItemResult(result.clone()));
    }

    fn on_progress(&self, progress: Progress) {
        self.send(RunEvent::Progress(progress));
    }

    fn on_finished(&self, final_state: &FinalState) {
        self.send(RunEvent::Finished(final_state.clone()));
    }
}

/// 把事件输出到日志
#[derive(Debug, Default)]
pub struct LoggingSink {
    verbose: bool,
}

impl LoggingSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ResultSink for LoggingSink {
    fn on_item_result(&self, result: &AnalysisResult) {
        if result.annotation.is_failure() {
            warn!(
                "❌ [{}] {} - {}",
                result.index + 1,
                result.name,
                result.annotation
            );
        } else if result.is_match {
            info!(
                "✅ MATCH [{}] {} - 匹配度: {}% (分数: {:.3})",
                result.index + 1,
                result.name,
                result.match_confidence(),
                result.score
            );
        } else {
            info!(
                "⏭️ SKIP  [{}] {} - {} (分数: {:.3})",
                result.index + 1,
                result.name,
                result.annotation,
                result.score
            );
        }
    }

    fn on_progress(&self, progress: Progress) {
        if self.verbose {
            info!(
                "📊 进度 {}/{} ({}%) | 保留 {} | 移除 {}",
                progress.processed,
                progress.total,
                progress.percent(),
                progress.kept,
                progress.removed
            );
        } else {
            debug!("进度 {}/{}", progress.processed, progress.total);
        }
    }

    fn on_finished(&self, final_state: &FinalState) {
        print_final_stats(final_state);
    }
}

// ========== 日志辅助函数 ==========

fn print_final_stats(final_state: &FinalState) {
    info!("\n{}", "=".repeat(60));
    if final_state.completed {
        info!("📊 全部处理完成统计");
    } else {
        info!("🛑 处理已停止，统计已处理部分");
    }
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 已处理: {}/{}", final_state.processed, final_state.total);
    info!("✅ 保留: {}", final_state.kept_count);
    info!("❌ 移除: {}", final_state.removed_count);
    info!("{}", "=".repeat(60));
}
