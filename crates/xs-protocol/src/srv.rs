//! 服务请求/响应定义

use crate::{CommandType, OperatingMode, ProfileType};

/// 设置电机工作模式请求
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperatingModesRequest {
    pub cmd_type: CommandType,
    /// 关节组名或关节名（取决于 `cmd_type`）
    pub name: String,
    pub mode: OperatingMode,
    pub profile_type: ProfileType,
    /// 运动曲线速度（`profile_type` 为 Time 时单位为毫秒）
    pub profile_velocity: i32,
    /// 运动曲线加速度（`profile_type` 为 Time 时单位为毫秒）
    pub profile_acceleration: i32,
}

impl OperatingModesRequest {
    /// 作用于关节组的请求，使用驱动默认的运动曲线
    pub fn group(name: impl Into<String>, mode: OperatingMode) -> Self {
        Self {
            cmd_type: CommandType::Group,
            name: name.into(),
            mode,
            profile_type: ProfileType::Time,
            profile_velocity: 2000,
            profile_acceleration: 300,
        }
    }
}

/// 电机使能请求
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TorqueEnableRequest {
    pub cmd_type: CommandType,
    pub name: String,
    pub enable: bool,
}

impl TorqueEnableRequest {
    pub fn group(name: impl Into<String>, enable: bool) -> Self {
        Self {
            cmd_type: CommandType::Group,
            name: name.into(),
            enable,
        }
    }
}

/// 布尔开关请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetBoolRequest {
    pub data: bool,
}

/// 布尔开关响应
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetBoolResponse {
    pub success: bool,
    pub message: String,
}

impl SetBoolResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
