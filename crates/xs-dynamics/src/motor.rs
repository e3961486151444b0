//! 电机模型
//!
//! 将关节力矩换算为电流模式下的原始电流指令，并叠加摩擦补偿：
//!
//! - 运动中（|v| 大于速度阈值）：动摩擦 `kinetic · sign(v)`
//! - 接近静止：静摩擦乘以方波抖动 `sign(sin(2π · dither_speed · t))`，
//!   帮助关节脱离静摩擦区
//!
//! 电流换算：
//!
//! ```text
//! amps = τ / Kt + no_load_current · v / no_load_velocity
//! raw  = amps / current_unit   （给出 current_limit 时限幅到 ±current_limit）
//! ```
//!
//! 电机参数文件（TOML）：
//!
//! ```toml
//! [[motors]]
//! joint = "waist"
//! torque_constant = 1.793
//! current_unit = 0.00269
//! no_load_velocity = 5.76
//! no_load_current = 0.2
//! kinetic_friction_coefficient = 0.1
//! static_friction_coefficient = 0.2
//! dither_speed = 0.5
//! current_limit = 1193.0
//! ```

use crate::error::{DynamicsError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::f64::consts::TAU;
use std::path::Path;

/// 单个电机参数
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotorSpec {
    /// 所驱动的关节
    pub joint: String,
    /// 力矩常数 Kt (N·m/A)
    pub torque_constant: f64,
    /// 电流指令单位 (A / raw)
    pub current_unit: f64,
    /// 空载转速 (rad/s)
    #[serde(default)]
    pub no_load_velocity: f64,
    /// 空载电流 (A)
    #[serde(default)]
    pub no_load_current: f64,
    /// 动摩擦补偿 (N·m)
    #[serde(default)]
    pub kinetic_friction_coefficient: f64,
    /// 静摩擦补偿 (N·m)
    #[serde(default)]
    pub static_friction_coefficient: f64,
    /// 静摩擦抖动频率 (Hz)，0 表示不抖动
    #[serde(default)]
    pub dither_speed: f64,
    /// 原始电流指令上限
    #[serde(default)]
    pub current_limit: Option<f64>,
}

impl MotorSpec {
    fn validate(&self) -> Result<()> {
        let invalid = |reason| {
            Err(DynamicsError::InvalidMotorSpec {
                joint: self.joint.clone(),
                reason,
            })
        };
        if !(self.torque_constant.is_finite() && self.torque_constant > 0.0) {
            return invalid("torque_constant must be positive");
        }
        if !(self.current_unit.is_finite() && self.current_unit > 0.0) {
            return invalid("current_unit must be positive");
        }
        let non_negative = |value: f64| value.is_finite() && value >= 0.0;
        if !(non_negative(self.no_load_velocity) && non_negative(self.no_load_current)) {
            return invalid("no-load values must be finite and not negative");
        }
        if !(non_negative(self.kinetic_friction_coefficient)
            && non_negative(self.static_friction_coefficient))
        {
            return invalid("friction coefficients must be finite and not negative");
        }
        if !non_negative(self.dither_speed) {
            return invalid("dither_speed must be finite and not negative");
        }
        if self.current_limit.is_some_and(|limit| !(limit.is_finite() && limit > 0.0)) {
            return invalid("current_limit must be positive");
        }
        Ok(())
    }
}

/// 电机参数表
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MotorSpecs {
    #[serde(default)]
    pub motors: Vec<MotorSpec>,
}

impl MotorSpecs {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |reason: String| DynamicsError::Load {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let specs: Self = toml::from_str(&content).map_err(|e| load_err(e.to_string()))?;
        specs.validate()?;
        Ok(specs)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let specs: Self = toml::from_str(content).map_err(|e| DynamicsError::Parse(e.to_string()))?;
        specs.validate()?;
        Ok(specs)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.motors {
            spec.validate()?;
            if !seen.insert(spec.joint.as_str()) {
                return Err(DynamicsError::DuplicateJoint(spec.joint.clone()));
            }
        }
        Ok(())
    }

    /// 关节名（文件中的顺序）
    pub fn joint_names(&self) -> Vec<&str> {
        self.motors.iter().map(|m| m.joint.as_str()).collect()
    }

    pub fn get(&self, joint: &str) -> Option<&MotorSpec> {
        self.motors.iter().find(|m| m.joint == joint)
    }

    /// 按给定关节顺序构造电机模型
    pub fn models_for(&self, joints: &[&str], velocity_threshold: f64) -> Result<Vec<MotorModel>> {
        joints
            .iter()
            .map(|joint| {
                self.get(joint)
                    .map(|spec| MotorModel::new(spec.clone(), velocity_threshold))
                    .ok_or_else(|| DynamicsError::MissingMotorSpec(joint.to_string()))
            })
            .collect()
    }
}

/// 带摩擦补偿的电机模型
#[derive(Debug, Clone)]
pub struct MotorModel {
    spec: MotorSpec,
    velocity_threshold: f64,
}

impl MotorModel {
    pub fn new(spec: MotorSpec, velocity_threshold: f64) -> Self {
        Self {
            spec,
            velocity_threshold: velocity_threshold.abs(),
        }
    }

    pub fn spec(&self) -> &MotorSpec {
        &self.spec
    }

    /// 摩擦补偿力矩
    ///
    /// `t` 为自启动以来的时间（秒），用于静摩擦抖动。
    pub fn friction_torque(&self, velocity: f64, t: f64) -> f64 {
        if velocity.abs() > self.velocity_threshold {
            return self.spec.kinetic_friction_coefficient * sign(velocity);
        }
        if self.spec.dither_speed == 0.0 {
            return 0.0;
        }
        self.spec.static_friction_coefficient * sign((TAU * self.spec.dither_speed * t).sin())
    }

    /// 力矩 → 原始电流指令
    pub fn current_command(&self, torque: f64, velocity: f64) -> f64 {
        let mut amps = torque / self.spec.torque_constant;
        if self.spec.no_load_velocity > 0.0 {
            amps += self.spec.no_load_current * velocity / self.spec.no_load_velocity;
        }
        let raw = amps / self.spec.current_unit;
        match self.spec.current_limit {
            Some(limit) => raw.clamp(-limit, limit),
            None => raw,
        }
    }

    /// 重力力矩 + 摩擦补偿 → 原始电流指令
    pub fn command(&self, gravity_torque: f64, velocity: f64, t: f64) -> f64 {
        let torque = gravity_torque + self.friction_torque(velocity, t);
        self.current_command(torque, velocity)
    }
}

/// 符号函数（0 → 0）
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
