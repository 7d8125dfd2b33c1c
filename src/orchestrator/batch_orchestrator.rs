//! 批量图片分类器 - 编排层
//!
//! ## 职责
//!
//! 按输入顺序逐张分析图片，汇总结果，支持协作式停止，
//! 最终给出"保留 / 移除"的划分。
//!
//! ## 状态机
//!
//! ```text
//! Idle / Finished --start--> Running --stop--> StopRequested
//!                              |                   |
//!                              +----(循环结束)------+--> Finished
//! ```
//!
//! ## 设计特点
//!
//! - **严格串行**：同一时刻只有一张图片在分析，分析引擎不允许并发调用
//! - **协作式停止**：只在每张图片开始前检查停止标志，正在分析的图片会正常完成或超时
//! - **失败隔离**：单张图片的超时 / 失败只变成一个"不匹配"结果，批处理继续
//! - **唯一写者**：运行状态只由后台循环修改，外部只能在两张图片之间读取快照

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::infrastructure::{Oracle, TimeoutGuard};
use crate::models::{
    AnalysisMode, AnalysisResult, AnalysisSettings, Counters, FinalState, InputItem, Progress,
    ReferenceSet, RunState,
};
use crate::orchestrator::sink::ResultSink;
use crate::workflow::{ItemCtx, ItemFlow};

/// 编排参数
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    /// 单张图片的分析超时
    pub item_timeout: Duration,
    /// 两张图片之间的停顿，给宿主回收资源和刷新界面的机会
    pub pause_between_items: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            item_timeout: Duration::from_millis(15_000),
            pause_between_items: Duration::from_millis(50),
        }
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            item_timeout: Duration::from_millis(config.timeout_ms),
            pause_between_items: Duration::from_millis(config.pause_between_items_ms),
        }
    }
}

/// 运行状态（只在锁内短暂访问）
#[derive(Debug, Default)]
struct RunData {
    state: RunState,
    settings: AnalysisSettings,
    counters: Counters,
    results: Vec<AnalysisResult>,
    matched: Vec<InputItem>,
    total: usize,
}

#[derive(Debug, Default)]
struct Shared {
    data: Mutex<RunData>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RunData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_requested(&self) -> bool {
        self.lock().state == RunState::StopRequested
    }

    fn request_stop(&self) {
        let mut data = self.lock();
        match data.state {
            RunState::Running => {
                data.state = RunState::StopRequested;
                info!("🛑 已请求停止，当前图片完成后结束");
            }
            state => debug!("忽略停止请求，当前状态: {:?}", state),
        }
    }

    /// 提交一张已经送达接收端的结果
    fn commit(&self, result: &AnalysisResult, item: &InputItem) {
        let mut data = self.lock();
        data.counters.record(result.is_match);
        if result.is_match {
            data.matched.push(item.clone());
        }
        data.results.push(result.clone());
    }

    /// 最终状态快照，不改变运行状态
    fn snapshot(&self, completed: bool) -> FinalState {
        let data = self.lock();
        FinalState {
            completed,
            processed: data.counters.processed(),
            total: data.total,
            kept_count: data.counters.kept,
            removed_count: data.counters.removed,
            matched_set: data.matched.clone(),
        }
    }

    fn finish(&self) {
        self.lock().state = RunState::Finished;
    }
}

/// 停止句柄，可以移交给信号处理或结果接收端
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// 请求协作式停止；不在运行中时什么也不做，可以重复调用
    pub fn stop(&self) {
        self.shared.request_stop();
    }
}

/// 一次运行的句柄
pub struct RunHandle {
    join: JoinHandle<FinalState>,
}

impl RunHandle {
    /// 等待运行结束
    pub async fn wait(self) -> Result<FinalState, OrchestratorError> {
        Ok(self.join.await?)
    }
}

/// 批量图片分类器
///
/// 克隆得到的是同一个编排器的另一个句柄。
#[derive(Clone)]
pub struct BatchOrchestrator {
    oracle: Arc<dyn Oracle>,
    sink: Arc<dyn ResultSink>,
    options: OrchestratorOptions,
    shared: Arc<Shared>,
}

impl BatchOrchestrator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        sink: Arc<dyn ResultSink>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            oracle,
            sink,
            options,
            shared: Arc::new(Shared::default()),
        }
    }

    /// 设置分析参数
    ///
    /// 只能在 `Idle` 或 `Finished` 状态下调用，运行中调用返回 `InvalidState`。
    pub fn configure(
        &self,
        mode: AnalysisMode,
        references: ReferenceSet,
        threshold: f32,
    ) -> Result<(), OrchestratorError> {
        let mut data = self.shared.lock();
        if data.state.is_active() {
            return Err(OrchestratorError::InvalidState {
                action: "configure",
                state: data.state,
            });
        }

        data.settings = AnalysisSettings::new(mode, references, threshold)?;
        info!(
            "⚙️ 分析参数: 模式 {}, 阈值 {}, 参考向量 {} 个",
            data.settings.mode,
            data.settings.threshold,
            data.settings.references.len()
        );
        Ok(())
    }

    /// 开始一次运行
    ///
    /// 同步完成状态检查并清空计数器、结果和匹配集合，然后在 tokio 上启动后台循环。
    /// 必须在 tokio 运行时中调用。
    ///
    /// # 错误
    /// - `InvalidState`：已经在运行
    /// - `Initialization`：分析引擎尚未就绪
    pub fn start(&self, items: Vec<InputItem>) -> Result<RunHandle, OrchestratorError> {
        let settings = {
            let mut data = self.shared.lock();
            if data.state.is_active() {
                return Err(OrchestratorError::InvalidState {
                    action: "start",
                    state: data.state,
                });
            }
            if !self.oracle.is_ready() {
                return Err(OrchestratorError::Initialization {
                    oracle: self.oracle.name().to_string(),
                });
            }

            data.state = RunState::Running;
            data.counters = Counters::default();
            data.results.clear();
            data.matched.clear();
            data.total = items.len();
            data.settings.clone()
        };

        log_run_start(&settings, items.len(), &self.options);

        let task = RunTask {
            shared: self.shared.clone(),
            flow: ItemFlow::new(
                self.oracle.clone(),
                TimeoutGuard::new(self.options.item_timeout),
            ),
            sink: self.sink.clone(),
            settings,
            pause: self.options.pause_between_items,
            items,
        };

        Ok(RunHandle {
            join: tokio::spawn(task.run()),
        })
    }

    /// 开始并等待一次运行结束
    pub async fn run(&self, items: Vec<InputItem>) -> Result<FinalState, OrchestratorError> {
        self.start(items)?.wait().await
    }

    /// 请求协作式停止
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn state(&self) -> RunState {
        self.shared.lock().state
    }

    /// 已送达接收端的结果计数
    ///
    /// 在 `on_item_result` 回调内部读取时还不包含当前这张图片。
    pub fn counters(&self) -> Counters {
        self.shared.lock().counters
    }

    pub fn settings(&self) -> AnalysisSettings {
        self.shared.lock().settings.clone()
    }

    /// 当前（或最近一次）运行的匹配图片，按输入顺序
    pub fn matched_set(&self) -> Vec<InputItem> {
        self.shared.lock().matched.clone()
    }

    /// 当前（或最近一次）运行已产生的结果，按输入顺序
    pub fn results(&self) -> Vec<AnalysisResult> {
        self.shared.lock().results.clone()
    }
}

/// 后台循环
struct RunTask {
    shared: Arc<Shared>,
    flow: ItemFlow,
    sink: Arc<dyn ResultSink>,
    settings: AnalysisSettings,
    pause: Duration,
    items: Vec<InputItem>,
}

impl RunTask {
    async fn run(self) -> FinalState {
        // 循环被 panic 或 abort 打断时，保证状态不会停留在运行中
        let _active = ActiveRun {
            shared: self.shared.clone(),
        };

        let total = self.items.len();
        let mut counters = Counters::default();

        for (index, item) in self.items.iter().enumerate() {
            if self.shared.stop_requested() {
                info!("🛑 停止生效，跳过剩余 {} 张图片", total - index);
                break;
            }

            let ctx = ItemCtx::new(index, total, item.name());
            let result = self.flow.run(item, &ctx, &self.settings).await;

            counters.record(result.is_match);
            let progress = Progress {
                processed: counters.processed(),
                total,
                kept: counters.kept,
                removed: counters.removed,
            };

            // 先送达再提交：访问器看到的计数永远不会超前于已发出的结果
            self.sink.on_item_result(&result);
            self.sink.on_progress(progress);
            self.shared.commit(&result, item);

            if index + 1 < total {
                breathe(self.pause).await;
            }
        }

        // on_finished 返回之前保持运行中，新的 start 只能排在本次运行的事件流之后
        let final_state = self.shared.snapshot(counters.processed() == total);
        self.sink.on_finished(&final_state);
        self.shared.finish();
        final_state
    }
}

struct ActiveRun {
    shared: Arc<Shared>,
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        let mut data = self.shared.lock();
        if data.state.is_active() {
            warn!("⚠️ 批处理循环异常退出，状态重置为 Finished");
            data.state = RunState::Finished;
        }
    }
}

/// 两张图片之间的让步点
async fn breathe(pause: Duration) {
    if pause.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(pause).await;
    }
}

// ========== 日志辅助函数 ==========

fn log_run_start(settings: &AnalysisSettings, total: usize, options: &OrchestratorOptions) {
    info!("\n{}", "=".repeat(60));
    info!("🚀 开始批量分类 - 模式: {}", settings.mode);
    info!(
        "📄 图片总数: {} | 阈值: {} | 单张超时: {}ms",
        total,
        settings.threshold,
        options.item_timeout.as_millis()
    );
    info!("{}", "=".repeat(60));

    if settings.mode.needs_references() && settings.references.is_empty() {
        warn!("⚠️ 参考集合为空，本次运行不会匹配任何图片");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::infrastructure::{Detection, OracleOutput};
    use crate::models::FeatureVector;
    use crate::orchestrator::sink::{ChannelSink, RunEvent};
    use async_trait::async_trait;

    struct EchoOracle {
        ready: bool,
    }

    #[async_trait]
    impl Oracle for EchoOracle {
        fn name(&self) -> &str {
            "echo"
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn analyze(
            &self,
            item: &InputItem,
            _settings: &AnalysisSettings,
        ) -> Result<OracleOutput, OracleError> {
            if item.name().starts_with("face") {
                Ok(OracleOutput::new(vec![Detection::labeled("face", 0.9)]))
            } else {
                Ok(OracleOutput::empty())
            }
        }

        async fn describe_reference(
            &self,
            _item: &InputItem,
        ) -> Result<Option<FeatureVector>, OracleError> {
            Ok(None)
        }
    }

    fn orchestrator(ready: bool) -> (BatchOrchestrator, tokio::sync::mpsc::UnboundedReceiver<RunEvent>) {
        let (sink, receiver) = ChannelSink::channel();
        let options = OrchestratorOptions {
            item_timeout: Duration::from_secs(1),
            pause_between_items: Duration::ZERO,
        };
        let orchestrator = BatchOrchestrator::new(Arc::new(EchoOracle { ready }), Arc::new(sink), options);
        orchestrator
            .configure(AnalysisMode::AnyPresence, ReferenceSet::new(), 0.5)
            .unwrap();
        (orchestrator, receiver)
    }

    fn items(names: &[&str]) -> Vec<InputItem> {
        names.iter().map(|n| InputItem::new(*n, vec![0u8])).collect()
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let (orchestrator, _receiver) = orchestrator(true);
        assert_eq!(orchestrator.state(), RunState::Idle);

        let handle = orchestrator.start(items(&["face1.jpg"])).unwrap();
        assert_eq!(orchestrator.state(), RunState::Running);

        let final_state = handle.wait().await.unwrap();
        assert!(final_state.completed);
        assert_eq!(orchestrator.state(), RunState::Finished);
    }

    #[tokio::test]
    async fn test_refuses_to_start_when_oracle_not_ready() {
        let (orchestrator, _receiver) = orchestrator(false);
        let err = orchestrator.start(items(&["face1.jpg"])).err().unwrap();
        assert!(matches!(err, OrchestratorError::Initialization { .. }));
        assert_eq!(orchestrator.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_configure_rejected_while_running() {
        let (orchestrator, _receiver) = orchestrator(true);
        let handle = orchestrator.start(items(&["face1.jpg", "b.jpg"])).unwrap();

        let err = orchestrator
            .configure(AnalysisMode::TargetSpecific, ReferenceSet::new(), 0.4)
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidState { action: "configure", .. }));

        handle.wait().await.unwrap();
        assert_eq!(orchestrator.settings().mode, AnalysisMode::AnyPresence);
        assert!(orchestrator
            .configure(AnalysisMode::TargetSpecific, ReferenceSet::new(), 0.4)
            .is_ok());
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_threshold() {
        let (orchestrator, _receiver) = orchestrator(true);
        let err = orchestrator
            .configure(AnalysisMode::AnyPresence, ReferenceSet::new(), f32::NAN)
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidThreshold(_)));
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (orchestrator, _receiver) = orchestrator(true);
        orchestrator.stop();
        orchestrator.stop();
        assert_eq!(orchestrator.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_empty_input_finishes_immediately() {
        let (orchestrator, mut receiver) = orchestrator(true);
        let final_state = orchestrator.run(Vec::new()).await.unwrap();
        assert!(final_state.completed);
        assert_eq!(final_state.processed, 0);
        assert!(matches!(receiver.recv().await, Some(RunEvent::Finished(_))));
    }

    #[tokio::test]
    async fn test_events_follow_input_order() {
        let (orchestrator, mut receiver) = orchestrator(true);
        orchestrator
            .run(items(&["face1.jpg", "b.jpg", "face2.jpg"]))
            .await
            .unwrap();

        let mut order = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            match event {
                RunEvent::ItemResult(r) => order.push(format!("item:{}", r.index)),
                RunEvent::Progress(p) => order.push(format!("progress:{}", p.processed)),
                RunEvent::Finished(_) => order.push("finished".to_string()),
            }
        }
        assert_eq!(
            order,
            vec![
                "item:0",
                "progress:1",
                "item:1",
                "progress:2",
                "item:2",
                "progress:3",
                "finished"
            ]
        );
    }
}
