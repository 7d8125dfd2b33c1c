/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::EnrollmentReport;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug / info。重复调用是安全的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "biosort=debug" } else { "biosort=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 照片分拣");
    info!("📊 模式: {:?} | 阈值: {}", config.mode, config.threshold);
    info!("⏱️ 单张超时: {}ms", config.timeout_ms);
    info!("{}", "=".repeat(60));
}

/// 记录参考向量录入结果
pub fn log_enrollment(report: &EnrollmentReport) {
    info!(
        "🧬 参考图片: 录入 {} 张, 跳过 {} 张",
        report.accepted.len(),
        report.rejected.len()
    );
    for (name, reason) in &report.rejected {
        info!("   - {}: {}", truncate_text(name, 40), reason);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("abcdefgh", 3), "abc...");
    }

    #[test]
    fn test_init_twice_is_safe() {
        init(false);
        init(true);
    }
}
