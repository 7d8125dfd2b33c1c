//! 图片处理上下文
//!
//! 封装"我正在处理第几张图片"这一信息

use std::fmt::Display;

/// 图片处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 图片在输入中的位置（从0开始）
    pub index: usize,

    /// 本次运行的图片总数
    pub total: usize,

    /// 显示名称
    pub name: String,
}

impl ItemCtx {
    pub fn new(index: usize, total: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            total,
            name: name.into(),
        }
    }

    /// 从1开始的序号（用于日志）
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[图片 {}/{} {}]", self.ordinal(), self.total, self.name)
    }
}
