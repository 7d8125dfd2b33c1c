//! 超时保护
//!
//! 用计时器和分析调用赛跑。计时器先到时，分析调用的 future 被直接 drop，
//! 它之后的任何结果（成功或失败）都不会再被观察到，也没有机会修改共享状态。
//! 保护本身不做重试。

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::GuardError;

/// 在 `duration` 内等待 `operation`
///
/// - 操作先完成：原样返回它的结果（错误包装为 `GuardError::Failed`）
/// - 计时器先到：返回 `GuardError::TimedOut`，操作被丢弃
pub async fn guard<F, T, E>(duration: Duration, operation: F) -> Result<T, GuardError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(GuardError::Failed(e)),
        Err(_) => {
            debug!("操作超过 {}ms 未完成，结果将被丢弃", duration.as_millis());
            Err(GuardError::TimedOut(duration))
        }
    }
}

/// 固定时长的超时保护
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    duration: Duration,
}

impl TimeoutGuard {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub async fn run<F, T, E>(&self, operation: F) -> Result<T, GuardError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        guard(self.duration, operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_never_resolving_operation_times_out() {
        let started = tokio::time::Instant::now();
        let result: Result<(), GuardError<String>> =
            guard(Duration::from_millis(500), std::future::pending()).await;

        assert_eq!(result, Err(GuardError::TimedOut(Duration::from_millis(500))));
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_operation_is_forwarded() {
        let guard = TimeoutGuard::from_millis(1_000);
        let ok: Result<u32, GuardError<String>> = guard.run(async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: Result<u32, GuardError<String>> =
            guard.run(async { Err("corrupt".to_string()) }).await;
        assert_eq!(err, Err(GuardError::Failed("corrupt".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_is_discarded() {
        let touched = Arc::new(AtomicBool::new(false));
        let flag = touched.clone();

        let result: Result<(), GuardError<String>> = guard(Duration::from_millis(100), async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(result.unwrap_err().is_timeout());

        // 让时间越过原本的完成点，被丢弃的操作不能再生效
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!touched.load(Ordering::SeqCst));
    }
}
