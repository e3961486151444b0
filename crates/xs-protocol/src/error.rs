//! 协议层错误类型定义

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 未知的工作模式名称
    #[error("Unknown operating mode: '{0}'")]
    UnknownOperatingMode(String),

    /// 无效的工作模式编号
    #[error("Invalid operating mode value: {0}")]
    InvalidOperatingMode(u8),

    /// 未知的命令目标类型
    #[error("Unknown command type: '{0}' (expected 'group' or 'single')")]
    UnknownCommandType(String),

    /// 消息字段长度不一致
    #[error("Field '{field}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}
