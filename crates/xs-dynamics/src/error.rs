//! 动力学错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 动力学错误类型
#[derive(Error, Debug)]
pub enum DynamicsError {
    /// 描述文件读取或解析失败
    #[error("Failed to load {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// 描述内容解析失败
    #[error("Invalid description: {0}")]
    Parse(String),

    /// 运动链为空
    #[error("Kinematic chain has no segments")]
    EmptyChain,

    /// 末端连杆不存在
    #[error("Tip link '{0}' is not part of the chain")]
    UnknownTipLink(String),

    /// 质量无效（非正数或 NaN）
    #[error("Link '{link}' has invalid mass {mass}")]
    InvalidMass { link: String, mass: f64 },

    /// 关节轴为零向量
    #[error("Joint '{0}' has a zero-length axis")]
    ZeroAxis(String),

    /// 关节名重复
    #[error("Joint '{0}' appears more than once")]
    DuplicateJoint(String),

    /// 输入向量长度与活动关节数不一致
    #[error("Expected {expected} values for '{what}', got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 电机参数缺失
    #[error("No motor spec for joint '{0}'")]
    MissingMotorSpec(String),

    /// 电机参数无效
    #[error("Motor spec for joint '{joint}' is invalid: {reason}")]
    InvalidMotorSpec { joint: String, reason: &'static str },
}

/// 动力学 Result 别名
pub type Result<T> = std::result::Result<T, DynamicsError>;
