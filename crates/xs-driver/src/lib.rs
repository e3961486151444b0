//! # XS Driver
//!
//! 模拟的 X 系列机械臂驱动节点，用于在没有硬件时运行和测试控制节点。
//!
//! 节点（默认名 `xs_sdk`）：
//!
//! - 发布 `joint_states`
//! - 提供 `set_operating_modes`、`torque_enable` 服务
//! - 订阅 `commands/joint_group`

mod config;
mod error;
mod mock;

pub use config::{DEFAULT_NODE_NAME, JointGroup, MockArmConfig};
pub use error::DriverError;
pub use mock::MockArmDriver;
