//! 运行时错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 运行时错误类型
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// 无效的运行时参数（命令行）
    #[error("Invalid runtime argument: {0}")]
    InvalidArgument(String),

    /// 参数文件读取或解析失败
    #[error("Failed to load parameters file {path:?}: {reason}")]
    ParamsFile { path: PathBuf, reason: String },

    /// 无效的节点名/话题名/服务名
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// 话题或服务的消息类型与已注册的不一致
    #[error("Type mismatch on '{name}': registered as {registered}, requested as {requested}")]
    TypeMismatch {
        name: String,
        registered: String,
        requested: String,
    },

    /// 同名服务已存在
    #[error("Service '{0}' already has a server")]
    DuplicateService(String),

    /// 服务端不存在或已退出
    #[error("Service '{0}' is not available")]
    ServiceUnavailable(String),

    /// 服务调用超时
    #[error("Service call to '{name}' timed out after {timeout_ms}ms")]
    ServiceTimeout { name: String, timeout_ms: u64 },

    /// 服务端在响应之前丢弃了请求
    #[error("Service '{0}' dropped the request without a response")]
    ServiceDropped(String),

    /// 参数已声明
    #[error("Parameter '{0}' has already been declared")]
    ParameterAlreadyDeclared(String),

    /// 参数未声明
    #[error("Parameter '{0}' has not been declared")]
    ParameterNotDeclared(String),

    /// 参数类型不匹配
    #[error("Parameter '{name}' expects {expected}, got {actual}")]
    ParameterType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// 节点已经加入执行器
    #[error("Node '{0}' has already been added to this executor")]
    NodeAlreadyAdded(String),

    /// 信号处理器注册失败
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(String),

    /// 执行器工作线程 panic
    #[error("Executor worker panicked: {0}")]
    WorkerPanicked(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 运行时 Result 别名
pub type Result<T> = std::result::Result<T, RuntimeError>;
