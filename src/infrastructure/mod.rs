//! 基础设施层
//!
//! 持有稀缺的推理能力，只向上暴露"分析一张图片"和"限时执行"两种能力。

pub mod manifest_oracle;
pub mod oracle;
pub mod timeout_guard;

pub use manifest_oracle::ManifestOracle;
pub use oracle::{Detection, Oracle, OracleOutput};
pub use timeout_guard::{guard, TimeoutGuard};
