use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::{AnalysisMode, ModeKind};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 分析模式
    pub mode: ModeKind,
    /// 匹配阈值：指定人物模式为最大距离，类别模式为最低置信度
    pub threshold: f32,
    /// 单张图片的分析超时（毫秒）
    pub timeout_ms: u64,
    /// 类别模式的目标类别
    pub target_label: Option<String>,
    /// 两张图片之间的停顿（毫秒）
    pub pause_between_items_ms: u64,
    /// 最低检测置信度，低于它的检测结果被忽略
    pub min_detection_confidence: f32,
    /// 待分类图片目录
    pub input_folder: String,
    /// 参考图片目录
    pub reference_folder: String,
    /// 预计算检测清单
    pub manifest_path: String,
    /// 导出根目录
    pub export_folder: String,
    /// 运行报告文件
    pub report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ModeKind::TargetSpecific,
            threshold: 0.5,
            timeout_ms: 15_000,
            target_label: None,
            pause_between_items_ms: 50,
            min_detection_confidence: 0.5,
            input_folder: "photos".to_string(),
            reference_folder: "references".to_string(),
            manifest_path: "detections.toml".to_string(),
            export_folder: "export".to_string(),
            report_file: "biosort_report.json".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：`BIOSORT_CONFIG` 指向的 TOML 文件（可选）+ 环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var("BIOSORT_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?.with_env_overrides()?,
            Err(_) => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 只从环境变量读取，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取，未出现的项使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let mode = match std::env::var("BIOSORT_MODE") {
            Ok(value) => ModeKind::parse(&value)?,
            Err(_) => self.mode,
        };

        Ok(Self {
            mode,
            threshold: std::env::var("BIOSORT_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(self.threshold),
            timeout_ms: std::env::var("BIOSORT_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.timeout_ms),
            target_label: std::env::var("BIOSORT_TARGET_LABEL").ok().or(self.target_label),
            pause_between_items_ms: std::env::var("BIOSORT_PAUSE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.pause_between_items_ms),
            min_detection_confidence: std::env::var("BIOSORT_MIN_CONFIDENCE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.min_detection_confidence),
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(self.input_folder),
            reference_folder: std::env::var("REFERENCE_FOLDER").unwrap_or(self.reference_folder),
            manifest_path: std::env::var("MANIFEST_PATH").unwrap_or(self.manifest_path),
            export_folder: std::env::var("EXPORT_FOLDER").unwrap_or(self.export_folder),
            report_file: std::env::var("REPORT_FILE").unwrap_or(self.report_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        })
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(ConfigError::ConfidenceOutOfRange {
                value: self.min_detection_confidence,
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.analysis_mode()?;
        Ok(())
    }

    /// 组合出完整的分析模式
    pub fn analysis_mode(&self) -> Result<AnalysisMode, ConfigError> {
        self.mode.into_mode(self.target_label.as_deref())
    }
}
