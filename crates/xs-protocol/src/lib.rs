//! # XS Protocol
//!
//! 机械臂驱动节点与控制节点之间交换的消息与服务类型（无硬件依赖）
//!
//! ## 模块
//!
//! - `mode`: 电机工作模式、命令目标类型
//! - `msgs`: 话题消息（关节状态、关节组命令）
//! - `srv`: 服务请求/响应
//!
//! ## 默认名称
//!
//! 话题与服务名均为相对名，由节点命名空间解析（例如 `/wx250s/joint_states`）。

mod error;
pub mod mode;
pub mod msgs;
pub mod srv;

pub use error::ProtocolError;
pub use mode::{CommandType, OperatingMode, ProfileType};
pub use msgs::{JointGroupCommand, JointState};
pub use srv::{OperatingModesRequest, SetBoolRequest, SetBoolResponse, TorqueEnableRequest};

/// 关节状态话题（驱动 → 控制器）
pub const JOINT_STATES_TOPIC: &str = "joint_states";

/// 关节组命令话题（控制器 → 驱动）
pub const JOINT_GROUP_COMMAND_TOPIC: &str = "commands/joint_group";

/// 设置电机工作模式服务
pub const SET_OPERATING_MODES_SERVICE: &str = "set_operating_modes";

/// 电机使能服务
pub const TORQUE_ENABLE_SERVICE: &str = "torque_enable";

/// 重力补偿开关服务
pub const GRAVITY_COMPENSATION_ENABLE_SERVICE: &str = "gravity_compensation_enable";
