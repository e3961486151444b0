//! # XS Gravity
//!
//! X 系列机械臂的重力补偿控制节点。
//!
//! 节点 `gravity_compensation` 订阅驱动发布的关节状态，计算抵消重力（及摩擦）所需的
//! 电机电流，并在开启时以电流模式命令发布给驱动。通过 `gravity_compensation_enable`
//! 服务开关：开启时机械臂可以被手动拖动并停留在任意位置。
//!
//! # 示例
//!
//! ```no_run
//! use xs_gravity::{GravityCompensation, launch};
//! use xs_runtime::{Context, MultiThreadedExecutor, NodeOptions};
//!
//! let context = Context::init(std::env::args()).unwrap();
//! let outcome = launch(
//!     context,
//!     |context| GravityCompensation::new(context, NodeOptions::default()),
//!     MultiThreadedExecutor::new,
//! );
//! std::process::exit(outcome.code().into());
//! ```

mod compensator;
mod error;
mod launch;
mod node;
pub mod params;

pub use compensator::Compensator;
pub use error::{GravityCompensationError, NodeInitFailure};
pub use launch::{INIT_FAILURE_MESSAGE, LaunchOutcome, launch};
pub use node::{GravityCompensation, NODE_NAME};
pub use params::GravityCompensationParams;
