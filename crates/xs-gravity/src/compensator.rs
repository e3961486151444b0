//! 重力补偿计算（与节点/通信无关）
//!
//! 关节状态 → 重力力矩（逆动力学）→ 叠加摩擦补偿 → 电机原始电流指令。

use crate::error::GravityCompensationError;
use xs_dynamics::{Chain, InverseDynamics, MotorModel, MotorSpecs};
use xs_protocol::JointState;

/// 重力补偿器
#[derive(Debug, Clone)]
pub struct Compensator {
    joints: Vec<String>,
    dynamics: InverseDynamics,
    motors: Vec<MotorModel>,
}

impl Compensator {
    /// 由运动链和电机参数构造
    ///
    /// # Errors
    ///
    /// 运动链的活动关节（顺序敏感）与电机参数表的关节不一致时返回 `JointMismatch`。
    pub fn new(
        chain: Chain,
        specs: &MotorSpecs,
        velocity_threshold: f64,
    ) -> Result<Self, GravityCompensationError> {
        let chain_joints = chain.movable_joint_names();
        let motor_joints = specs.joint_names();
        if chain_joints != motor_joints {
            return Err(GravityCompensationError::JointMismatch {
                chain: chain_joints.iter().map(|s| s.to_string()).collect(),
                motors: motor_joints.iter().map(|s| s.to_string()).collect(),
            });
        }

        let motors = specs.models_for(&chain_joints, velocity_threshold)?;
        let joints = chain_joints.iter().map(|s| s.to_string()).collect();
        Ok(Self {
            joints,
            dynamics: InverseDynamics::new(chain),
            motors,
        })
    }

    /// 受控关节（命令顺序）
    pub fn joint_names(&self) -> &[String] {
        &self.joints
    }

    /// 按关节名从消息中取出位置与速度（缺少速度视为 0）
    fn extract(&self, msg: &JointState) -> Result<(Vec<f64>, Vec<f64>), GravityCompensationError> {
        msg.validate()?;
        let mut q = Vec::with_capacity(self.joints.len());
        let mut qd = Vec::with_capacity(self.joints.len());
        for joint in &self.joints {
            let position = msg
                .position_of(joint)
                .ok_or_else(|| GravityCompensationError::MissingJoint(joint.clone()))?;
            q.push(position);
            qd.push(msg.velocity_of(joint).unwrap_or(0.0));
        }
        Ok((q, qd))
    }

    /// 重力力矩（命令顺序）
    pub fn gravity_torques(&self, msg: &JointState) -> Result<Vec<f64>, GravityCompensationError> {
        let (q, _) = self.extract(msg)?;
        Ok(self.dynamics.gravity_torques(&q)?)
    }

    /// 计算电流指令
    ///
    /// `t` 为节点启动以来的秒数，用于静摩擦抖动。
    pub fn compute(&self, msg: &JointState, t: f64) -> Result<Vec<f64>, GravityCompensationError> {
        let (q, qd) = self.extract(msg)?;
        let torques = self.dynamics.gravity_torques(&q)?;
        Ok(torques
            .iter()
            .zip(&qd)
            .zip(&self.motors)
            .map(|((torque, velocity), motor)| motor.command(*torque, *velocity, t))
            .collect())
    }
}
