//! 错误类型
//!
//! 按层划分：
//! - `OrchestratorError`：状态误用，同步返回给调用方
//! - `OracleError` / `GuardError`：单张图片的分析失败，只会被转换成结果，不会中断批处理
//! - `ConfigError` / `ReferenceError` / `ExportError`：配置、参考向量和导出

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::RunState;

/// 编排器错误
///
/// 只有状态误用才会以错误形式返回，单张图片的失败永远不会出现在这里。
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// 当前状态下不允许的操作（例如运行中再次 start / configure）
    #[error("当前状态 {state:?} 下无法执行 {action}")]
    InvalidState {
        action: &'static str,
        state: RunState,
    },
    /// 分析引擎尚未就绪
    #[error("分析引擎 {oracle} 尚未初始化，拒绝启动")]
    Initialization { oracle: String },
    /// 阈值不是有限的非负数
    #[error("阈值无效: {0}")]
    InvalidThreshold(f32),
    /// 后台任务异常终止
    #[error("批处理任务异常终止: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// 分析引擎错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    /// 输入无法解码（损坏的图片等）
    #[error("无法解码 {name}: {reason}")]
    Decode { name: String, reason: String },
    /// 没有这张图片的预计算记录
    #[error("没有找到 {name} 的检测记录")]
    MissingRecord { name: String },
    /// 分析调用 panic
    #[error("分析过程中发生 panic")]
    Panicked,
    /// 其他内部错误
    #[error("分析引擎内部错误: {0}")]
    Internal(String),
}

/// 超时保护的结果错误
#[derive(Debug, Error, PartialEq)]
pub enum GuardError<E> {
    /// 计时器先于操作完成，操作结果被丢弃
    #[error("分析超时 ({}ms)", .0.as_millis())]
    TimedOut(Duration),
    /// 操作自身返回的错误，原样转发
    #[error("{0}")]
    Failed(E),
}

impl<E> GuardError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GuardError::TimedOut(_))
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("阈值 {value} 超出范围 [0, 1]")]
    ThresholdOutOfRange { value: f32 },
    #[error("最低检测置信度 {value} 超出范围 [0, 1]")]
    ConfidenceOutOfRange { value: f32 },
    #[error("超时时间必须大于 0")]
    ZeroTimeout,
    #[error("无法识别的分析模式: {value}")]
    UnknownMode { value: String },
    #[error("类别模式需要设置 target_label")]
    MissingTargetLabel,
    #[error("读取配置文件失败 ({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// 参考向量错误
#[derive(Debug, Error, PartialEq)]
pub enum ReferenceError {
    #[error("特征向量为空")]
    EmptyVector,
    #[error("特征向量维度不一致: 期望 {expected}, 实际 {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("没有可导出的匹配图片")]
    NothingToExport,
    #[error("写入导出文件失败 ({path}): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
