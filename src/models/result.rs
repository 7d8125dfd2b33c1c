//! 分析结果、计数器与运行状态

use std::fmt;

use serde::Serialize;

use crate::models::item::InputItem;
use crate::models::mode::{ScoreDirection, NO_MATCH_DISTANCE};

/// 编排器运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    StopRequested,
    Finished,
}

impl RunState {
    /// 是否处于一次运行之中（包括已请求停止但尚未结束）
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::StopRequested)
    }
}

/// 单张图片结果的附注
///
/// 失败类附注（超时 / 分析失败）与正常的"不匹配"区分开，方便展示端区别渲染。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// 匹配
    Matched,
    /// 没有检测到任何目标
    NoDetections,
    /// 参考集合为空
    NoReferences,
    /// 检测到目标但没有可比较的特征向量
    NoDescriptors,
    /// 最佳分数没有达到阈值
    BelowThreshold,
    /// 没有检测到目标类别
    LabelNotFound,
    /// 分析超时
    Timeout,
    /// 分析引擎返回错误
    OracleFailure(String),
}

impl Annotation {
    pub fn is_failure(&self) -> bool {
        matches!(self, Annotation::Timeout | Annotation::OracleFailure(_))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Matched => write!(f, "匹配"),
            Annotation::NoDetections => write!(f, "未检测到目标"),
            Annotation::NoReferences => write!(f, "没有参考向量"),
            Annotation::NoDescriptors => write!(f, "检测结果缺少特征向量"),
            Annotation::BelowThreshold => write!(f, "未达到阈值"),
            Annotation::LabelNotFound => write!(f, "未检测到目标类别"),
            Annotation::Timeout => write!(f, "超时"),
            Annotation::OracleFailure(reason) => write!(f, "分析失败: {}", reason),
        }
    }
}

/// 单张图片的分析结果，产生后不可变
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// 图片在本次输入中的位置
    pub index: usize,
    pub name: String,
    pub is_match: bool,
    pub score: f32,
    pub annotation: Annotation,
    #[serde(skip)]
    pub direction: ScoreDirection,
}

impl AnalysisResult {
    /// 失败结果：计入"移除"，分数取该方向上最差的值
    pub fn failure(
        index: usize,
        name: impl Into<String>,
        direction: ScoreDirection,
        annotation: Annotation,
    ) -> Self {
        let score = match direction {
            ScoreDirection::LowerIsBetter => NO_MATCH_DISTANCE,
            ScoreDirection::HigherIsBetter => 0.0,
        };
        Self {
            index,
            name: name.into(),
            is_match: false,
            score,
            annotation,
            direction,
        }
    }

    /// 展示用的匹配百分比
    ///
    /// 距离模式：`(1 - 距离) * 100`，距离不小于 1 时为 0；置信度模式：`置信度 * 100`。
    pub fn match_confidence(&self) -> u8 {
        let pct = match self.direction {
            ScoreDirection::LowerIsBetter if self.score < 1.0 => (1.0 - self.score) * 100.0,
            ScoreDirection::LowerIsBetter => 0.0,
            ScoreDirection::HigherIsBetter => self.score * 100.0,
        };
        pct.round().clamp(0.0, 100.0) as u8
    }
}

/// 保留 / 移除计数，每次运行开始时清零
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub kept: usize,
    pub removed: usize,
}

impl Counters {
    pub fn record(&mut self, is_match: bool) {
        if is_match {
            self.kept += 1;
        } else {
            self.removed += 1;
        }
    }

    pub fn processed(&self) -> usize {
        self.kept + self.removed
    }
}

/// 进度事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub kept: usize,
    pub removed: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed * 100) / self.total).min(100) as u8
    }
}

/// 一次运行的最终状态，每次运行只产生一次
#[derive(Debug, Clone, PartialEq)]
pub struct FinalState {
    /// 是否处理完全部输入（被停止时为 false）
    pub completed: bool,
    pub processed: usize,
    pub total: usize,
    pub kept_count: usize,
    pub removed_count: usize,
    /// 匹配图片，按输入顺序
    pub matched_set: Vec<InputItem>,
}

impl FinalState {
    pub fn matched_names(&self) -> Vec<&str> {
        self.matched_set.iter().map(InputItem::name).collect()
    }
}
