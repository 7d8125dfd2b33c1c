//! 匹配判定 - 业务能力层
//!
//! 只负责把分析引擎的输出按模式规则判定为匹配 / 不匹配，不关心流程。
//!
//! 判定规则：
//! - 任意人脸：至少一个检测结果即匹配，与参考集合无关
//! - 指定人物：所有检测结果到所有参考向量的最小距离 `<=` 阈值即匹配
//! - 指定类别：存在标签相同且置信度 `>=` 阈值的检测结果即匹配

use tracing::trace;

use crate::infrastructure::OracleOutput;
use crate::models::{AnalysisMode, AnalysisSettings, Annotation, NO_MATCH_DISTANCE};

/// 判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_match: bool,
    pub score: f32,
    pub annotation: Annotation,
}

impl Classification {
    fn matched(score: f32) -> Self {
        Self {
            is_match: true,
            score,
            annotation: Annotation::Matched,
        }
    }

    fn rejected(score: f32, annotation: Annotation) -> Self {
        Self {
            is_match: false,
            score,
            annotation,
        }
    }
}

/// 按模式判定一张图片
pub fn classify(settings: &AnalysisSettings, output: &OracleOutput) -> Classification {
    match &settings.mode {
        AnalysisMode::AnyPresence => classify_presence(output),
        AnalysisMode::TargetSpecific => classify_target(settings, output),
        AnalysisMode::ClassSpecific { target_label } => {
            classify_class(target_label, settings.threshold, output)
        }
    }
}

fn classify_presence(output: &OracleOutput) -> Classification {
    let best = output
        .detections
        .iter()
        .map(|d| d.confidence)
        .fold(0.0_f32, f32::max);

    if output.detections.is_empty() {
        Classification::rejected(0.0, Annotation::NoDetections)
    } else {
        Classification::matched(best)
    }
}

fn classify_target(settings: &AnalysisSettings, output: &OracleOutput) -> Classification {
    if output.detections.is_empty() {
        return Classification::rejected(NO_MATCH_DISTANCE, Annotation::NoDetections);
    }
    if settings.references.is_empty() {
        return Classification::rejected(NO_MATCH_DISTANCE, Annotation::NoReferences);
    }

    let best_distance = output
        .detections
        .iter()
        .filter_map(|d| d.descriptor.as_ref())
        .filter_map(|descriptor| settings.references.min_distance(descriptor))
        .fold(None, |best: Option<f32>, dist| Some(best.map_or(dist, |b| b.min(dist))));

    trace!("最小距离: {:?}, 阈值: {}", best_distance, settings.threshold);

    match best_distance {
        Some(dist) if dist <= settings.threshold => Classification::matched(dist),
        Some(dist) => Classification::rejected(dist, Annotation::BelowThreshold),
        None => Classification::rejected(NO_MATCH_DISTANCE, Annotation::NoDescriptors),
    }
}

fn classify_class(target_label: &str, threshold: f32, output: &OracleOutput) -> Classification {
    let best = output
        .detections
        .iter()
        .filter(|d| d.label.as_deref() == Some(target_label))
        .map(|d| d.confidence)
        .fold(None, |best: Option<f32>, c| Some(best.map_or(c, |b| b.max(c))));

    match best {
        Some(confidence) if confidence >= threshold => Classification::matched(confidence),
        Some(confidence) => Classification::rejected(confidence, Annotation::BelowThreshold),
        None if output.detections.is_empty() => {
            Classification::rejected(0.0, Annotation::NoDetections)
        }
        None => Classification::rejected(0.0, Annotation::LabelNotFound),
    }
}
