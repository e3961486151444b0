//! 回调组
//!
//! 执行器的多个工作线程可能同时执行同一节点的回调。回调组决定并发规则：
//!
//! - **MutuallyExclusive**: 组内回调串行执行（节点默认组）
//! - **Reentrant**: 组内回调可并行执行

use parking_lot::Mutex;
use std::sync::Arc;

/// 回调组类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackGroupType {
    #[default]
    MutuallyExclusive,
    Reentrant,
}

/// 回调组
#[derive(Debug, Default)]
pub struct CallbackGroup {
    kind: CallbackGroupType,
    gate: Mutex<()>,
}

impl CallbackGroup {
    pub fn new(kind: CallbackGroupType) -> Self {
        Self {
            kind,
            gate: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> CallbackGroupType {
        self.kind
    }

    /// 按组规则执行回调
    pub(crate) fn run<F: FnOnce()>(&self, f: F) {
        match self.kind {
            CallbackGroupType::MutuallyExclusive => {
                let _gate = self.gate.lock();
                f();
            },
            CallbackGroupType::Reentrant => f(),
        }
    }
}

/// 待执行的回调（执行器就绪队列中的元素）
pub(crate) struct Work {
    group: Arc<CallbackGroup>,
    job: Box<dyn FnOnce() + Send>,
}

impl Work {
    pub(crate) fn new(group: Arc<CallbackGroup>, job: impl FnOnce() + Send + 'static) -> Self {
        Self {
            group,
            job: Box::new(job),
        }
    }

    pub(crate) fn run(self) {
        let Self { group, job } = self;
        group.run(job);
    }
}
