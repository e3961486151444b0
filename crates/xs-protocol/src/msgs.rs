//! 话题消息定义

use crate::ProtocolError;

/// 关节状态
///
/// 与驱动发布的 `joint_states` 对应。`velocity` 与 `effort` 允许为空，
/// 非空时长度必须与 `name` 一致。
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointState {
    /// 时间戳（微秒，发布方单调时钟）
    pub timestamp_us: u64,
    /// 关节名称
    pub name: Vec<String>,
    /// 关节位置（rad 或 m）
    pub position: Vec<f64>,
    /// 关节速度（rad/s 或 m/s）
    pub velocity: Vec<f64>,
    /// 关节力矩（N·m 或 N）
    pub effort: Vec<f64>,
}

impl JointState {
    /// 检查字段长度一致性
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let expected = self.name.len();
        if self.position.len() != expected {
            return Err(ProtocolError::LengthMismatch {
                field: "position",
                expected,
                actual: self.position.len(),
            });
        }
        for (field, values) in [("velocity", &self.velocity), ("effort", &self.effort)] {
            if !values.is_empty() && values.len() != expected {
                return Err(ProtocolError::LengthMismatch {
                    field,
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    /// 按名称查找关节索引
    pub fn index_of(&self, joint: &str) -> Option<usize> {
        self.name.iter().position(|n| n == joint)
    }

    /// 按名称读取位置
    pub fn position_of(&self, joint: &str) -> Option<f64> {
        self.index_of(joint).and_then(|i| self.position.get(i).copied())
    }

    /// 按名称读取速度（未提供速度时返回 `None`）
    pub fn velocity_of(&self, joint: &str) -> Option<f64> {
        self.index_of(joint).and_then(|i| self.velocity.get(i).copied())
    }
}

/// 关节组命令
///
/// `cmd` 的单位取决于关节组当前的工作模式：电流模式下为电机原始电流单位。
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointGroupCommand {
    /// 关节组名称
    pub name: String,
    /// 按关节组顺序排列的命令值
    pub cmd: Vec<f64>,
}

impl JointGroupCommand {
    pub fn new(name: impl Into<String>, cmd: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            cmd,
        }
    }
}
