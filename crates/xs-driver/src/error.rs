//! 驱动层错误类型定义

use thiserror::Error;
use xs_runtime::RuntimeError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 运行时错误（节点、话题、服务创建失败）
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// 配置无效
    #[error("Invalid driver config: {0}")]
    InvalidConfig(String),
}
