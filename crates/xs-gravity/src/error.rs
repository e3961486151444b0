//! 重力补偿错误类型定义

use thiserror::Error;
use xs_dynamics::DynamicsError;
use xs_protocol::ProtocolError;
use xs_runtime::{Logger, RuntimeError};

/// 重力补偿错误类型
#[derive(Error, Debug)]
pub enum GravityCompensationError {
    /// 运行时错误（节点、参数、话题、服务）
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// 动力学模型错误（描述文件、电机参数、求解）
    #[error("Dynamics error: {0}")]
    Dynamics(#[from] DynamicsError),

    /// 消息格式错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 必填参数未设置
    #[error("Required parameter '{0}' is not set")]
    MissingParameter(&'static str),

    /// 参数值无效
    #[error("Parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// 运动链的活动关节与电机参数表不一致
    #[error("Chain joints {chain:?} do not match motor spec joints {motors:?}")]
    JointMismatch {
        chain: Vec<String>,
        motors: Vec<String>,
    },

    /// 关节状态中缺少某个关节
    #[error("Joint '{0}' is missing from the joint state message")]
    MissingJoint(String),

    /// 驱动服务在超时内不可用
    #[error("Service '{service}' is not available after {timeout_ms}ms")]
    ServiceUnavailable { service: String, timeout_ms: u64 },
}

/// 节点构造失败
///
/// 携带节点的日志器（即使初始化失败也可以使用）和失败原因。
#[derive(Error, Debug)]
#[error("{error}")]
pub struct NodeInitFailure {
    pub logger: Logger,
    #[source]
    pub error: GravityCompensationError,
}

impl NodeInitFailure {
    pub fn new(logger: Logger, error: impl Into<GravityCompensationError>) -> Self {
        Self {
            logger,
            error: error.into(),
        }
    }
}
