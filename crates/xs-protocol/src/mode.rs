//! 电机工作模式定义
//!
//! 数值与舵机控制表中 Operating Mode 寄存器一致，字符串名称与驱动配置文件一致。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 电机工作模式
///
/// # 模式说明
///
/// - **Current**: 电流（力矩）控制，重力补偿使用此模式
/// - **Position**: 单圈位置控制（默认）
/// - **ExtPosition**: 多圈位置控制
/// - **CurrentBasedPosition**: 限流位置控制
/// - **Pwm**: 直接 PWM 输出
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum OperatingMode {
    Current = 0,
    Velocity = 1,
    #[default]
    Position = 3,
    ExtPosition = 4,
    CurrentBasedPosition = 5,
    Pwm = 16,
}

impl OperatingMode {
    /// 从寄存器数值转换
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        Self::try_from(value).map_err(|_| ProtocolError::InvalidOperatingMode(value))
    }

    /// 转换为寄存器数值
    pub fn as_u8(self) -> u8 {
        self.into()
    }

    /// 驱动配置文件中使用的名称
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Velocity => "velocity",
            Self::Position => "position",
            Self::ExtPosition => "ext_position",
            Self::CurrentBasedPosition => "current_based_position",
            Self::Pwm => "pwm",
        }
    }

    /// 是否为力矩类模式（命令单位为电流）
    pub fn is_current(self) -> bool {
        self == Self::Current
    }
}

impl FromStr for OperatingMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "current" => Ok(Self::Current),
            "velocity" => Ok(Self::Velocity),
            "position" => Ok(Self::Position),
            "ext_position" => Ok(Self::ExtPosition),
            "current_based_position" => Ok(Self::CurrentBasedPosition),
            "pwm" => Ok(Self::Pwm),
            other => Err(ProtocolError::UnknownOperatingMode(other.to_string())),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 命令目标类型（作用于关节组或单个关节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandType {
    #[default]
    Group,
    Single,
}

impl FromStr for CommandType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "group" => Ok(Self::Group),
            "single" => Ok(Self::Single),
            other => Err(ProtocolError::UnknownCommandType(other.to_string())),
        }
    }
}

/// 位置模式下的运动曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProfileType {
    /// 以速度/加速度描述曲线
    Velocity,
    /// 以时间（毫秒）描述曲线
    #[default]
    Time,
}
