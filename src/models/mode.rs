//! 分析模式
//!
//! 模式决定"匹配"的含义，以及分数的比较方向

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 指定人物模式下没有算出任何距离时报告的距离
pub const NO_MATCH_DISTANCE: f32 = 1.0;

/// 分数比较方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDirection {
    /// 距离：越小越相似
    LowerIsBetter,
    /// 置信度：越大越可信
    HigherIsBetter,
}

/// 分析模式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnalysisMode {
    /// 只要检测到任意目标就算匹配，不需要参考向量
    AnyPresence,
    /// 与参考向量比较，最小距离不超过阈值算匹配
    TargetSpecific,
    /// 检测到指定类别且置信度不低于阈值算匹配
    ClassSpecific { target_label: String },
}

impl AnalysisMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            AnalysisMode::AnyPresence => ModeKind::AnyPresence,
            AnalysisMode::TargetSpecific => ModeKind::TargetSpecific,
            AnalysisMode::ClassSpecific { .. } => ModeKind::ClassSpecific,
        }
    }

    pub fn direction(&self) -> ScoreDirection {
        match self {
            AnalysisMode::TargetSpecific => ScoreDirection::LowerIsBetter,
            AnalysisMode::AnyPresence | AnalysisMode::ClassSpecific { .. } => {
                ScoreDirection::HigherIsBetter
            }
        }
    }

    /// 是否需要参考向量
    pub fn needs_references(&self) -> bool {
        matches!(self, AnalysisMode::TargetSpecific)
    }

    /// 导出目录名称，由模式唯一确定
    pub fn archive_name(&self) -> String {
        match self {
            AnalysisMode::TargetSpecific => "biosort_matched_photos".to_string(),
            AnalysisMode::AnyPresence => "biosort_any_face".to_string(),
            AnalysisMode::ClassSpecific { target_label } => {
                let label: String = target_label
                    .trim()
                    .chars()
                    .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                    .collect();
                if label.is_empty() {
                    "biosort_class".to_string()
                } else {
                    format!("biosort_{}", label)
                }
            }
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::AnyPresence => write!(f, "任意人脸"),
            AnalysisMode::TargetSpecific => write!(f, "指定人物"),
            AnalysisMode::ClassSpecific { target_label } => write!(f, "指定类别({})", target_label),
        }
    }
}

/// 配置中的模式标签（不带类别参数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    AnyPresence,
    TargetSpecific,
    ClassSpecific,
}

impl ModeKind {
    /// 从字符串解析模式（接受常用别名，忽略大小写）
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "any" | "any_presence" | "anypresence" | "presence" => Ok(ModeKind::AnyPresence),
            "target" | "target_specific" | "targetspecific" | "face" => {
                Ok(ModeKind::TargetSpecific)
            }
            "class" | "class_specific" | "classspecific" | "object" => Ok(ModeKind::ClassSpecific),
            _ => Err(ConfigError::UnknownMode {
                value: s.to_string(),
            }),
        }
    }

    /// 组合出完整模式，类别模式必须提供标签
    pub fn into_mode(self, target_label: Option<&str>) -> Result<AnalysisMode, ConfigError> {
        match self {
            ModeKind::AnyPresence => Ok(AnalysisMode::AnyPresence),
            ModeKind::TargetSpecific => Ok(AnalysisMode::TargetSpecific),
            ModeKind::ClassSpecific => match target_label.map(str::trim) {
                Some(label) if !label.is_empty() => Ok(AnalysisMode::ClassSpecific {
                    target_label: label.to_string(),
                }),
                _ => Err(ConfigError::MissingTargetLabel),
            },
        }
    }
}
