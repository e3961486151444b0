//! 定时器
//!
//! 定时器在执行器 `spin` 时开始计时（每个定时器对应一个 `crossbeam_channel::tick`），
//! 在 `spin` 开始之后创建的定时器不会被调度。

use crate::callback_group::CallbackGroup;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

pub(crate) struct TimerInner {
    period: Duration,
    callback: Box<dyn Fn() + Send + Sync>,
    group: Arc<CallbackGroup>,
    cancelled: AtomicBool,
    fired: AtomicU64,
}

impl TimerInner {
    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    /// 在回调组内执行一次（已取消时跳过）
    pub(crate) fn fire(&self) {
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }
        self.group.run(|| {
            (self.callback)();
            self.fired.fetch_add(1, Ordering::Relaxed);
        });
    }
}

/// 定时器句柄
///
/// 句柄被丢弃后定时器停止。
pub struct Timer {
    inner: Arc<TimerInner>,
}

impl Timer {
    pub(crate) fn new(
        period: Duration,
        group: Arc<CallbackGroup>,
        callback: Box<dyn Fn() + Send + Sync>,
    ) -> Self {
        Self {
            inner: Arc::new(TimerInner {
                period,
                callback,
                group,
                cancelled: AtomicBool::new(false),
                fired: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<TimerInner> {
        &self.inner
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// 已触发次数
    pub fn fired_count(&self) -> u64 {
        self.inner.fired.load(Ordering::Relaxed)
    }
}
