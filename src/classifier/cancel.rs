// ==========================================
// 实验跟踪流水线 - 协作式取消令牌
// ==========================================
// 训练循环与流水线状态切换时轮询,超时后由请求层触发
// ==========================================

use crate::classifier::error::{ClassifierError, ClassifierResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// 已取消则返回 Cancelled
    pub fn check(&self) -> ClassifierResult<()> {
        if self.is_cancelled() {
            Err(ClassifierError::Cancelled)
        } else {
            Ok(())
        }
    }
}
