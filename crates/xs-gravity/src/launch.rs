//! 进程入口流程
//!
//! ```text
//! 构造节点 ──Ok──► 创建执行器 → add_node → spin（阻塞）→ shutdown → 退出码 0
//!          └─Err─► FATAL 日志（一次）→ shutdown → 退出码 1
//! ```
//!
//! 运行时在每条路径上恰好关闭一次：`Context::shutdown` 消耗 `Context`。

use crate::error::NodeInitFailure;
use std::process::ExitCode;
use tracing::{debug, error};
use xs_runtime::{Context, Executor, Node};

/// 节点构造失败时的 FATAL 日志内容
pub const INIT_FAILURE_MESSAGE: &str =
    "Failed to initialize the gravity compensation node. Exiting...";

/// 进程运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// 节点正常运行直到关闭
    Completed,
    /// 节点构造失败
    InitFailed,
}

impl LaunchOutcome {
    /// 进程退出码：`Completed` → 0，`InitFailed` → 1
    pub fn code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::InitFailed => 1,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// 构造节点并运行到关闭
///
/// - `factory`：可失败的节点构造
/// - `make_executor`：仅在构造成功后调用
///
/// 执行器运行期间的错误（例如工作线程 panic）只记录日志，不影响退出码。
pub fn launch<N, F, M, E>(context: Context, factory: F, make_executor: M) -> LaunchOutcome
where
    N: Node,
    F: FnOnce(&Context) -> Result<N, NodeInitFailure>,
    M: FnOnce(&Context) -> E,
    E: Executor,
{
    let node = match factory(&context) {
        Ok(node) => node,
        Err(failure) => {
            failure.logger.fatal_with_cause(INIT_FAILURE_MESSAGE, &failure.error);
            context.shutdown();
            return LaunchOutcome::InitFailed;
        },
    };

    let mut executor = make_executor(&context);
    let result = executor.add_node(node.node_handle()).and_then(|()| executor.spin());
    if let Err(e) = result {
        error!("Executor stopped with an error: {}", e);
    }
    debug!("Executor returned, shutting down");

    drop(node);
    context.shutdown();
    LaunchOutcome::Completed
}
