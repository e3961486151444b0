//! # XS Dynamics
//!
//! 串联机械臂的重力补偿计算：
//!
//! - [`Chain`]：从基座到末端的连杆/关节序列，可由 TOML 描述文件加载
//! - [`InverseDynamics`]：递归牛顿-欧拉逆动力学，`gravity_torques(q)` 给出抵消重力所需力矩
//! - [`MotorModel`]：力矩 → 电流指令，含摩擦补偿
//!
//! # 示例
//!
//! ```no_run
//! use xs_dynamics::{InverseDynamics, MotorSpecs, load_chain};
//!
//! # fn main() -> xs_dynamics::Result<()> {
//! let chain = load_chain("config/wx250s.toml")?;
//! let specs = MotorSpecs::load("config/wx250s_motor_specs.toml")?;
//! let models = specs.models_for(&chain.movable_joint_names(), 0.01)?;
//!
//! let dynamics = InverseDynamics::new(chain);
//! let tau = dynamics.gravity_torques(&[0.0; 6])?;
//! let cmd: Vec<f64> = tau
//!     .iter()
//!     .zip(&models)
//!     .map(|(torque, motor)| motor.command(*torque, 0.0, 0.0))
//!     .collect();
//! # let _ = cmd;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod description;
mod error;
pub mod motor;
mod rne;

pub use chain::{Chain, Joint, JointKind, RigidBodyInertia, STANDARD_GRAVITY, Segment};
pub use description::{ChainDescription, load_chain};
pub use error::{DynamicsError, Result};
pub use motor::{MotorModel, MotorSpec, MotorSpecs};
pub use rne::InverseDynamics;
