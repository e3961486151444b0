//! 机器人描述文件（TOML）
//!
//! 按从基座到末端的顺序列出每一节：
//!
//! ```toml
//! name = "wx250s"
//! tip_link = "ee_gripper_link"
//! gravity = [0.0, 0.0, -9.80665]
//!
//! [[segments]]
//! name = "shoulder_link"
//! joint = { name = "waist", type = "revolute", axis = [0.0, 0.0, 1.0] }
//! origin = { xyz = [0.0, 0.0, 0.072], rpy = [0.0, 0.0, 0.0] }
//! inertial = { mass = 0.48, com = [0.0, 0.0, 0.0026], inertia = [0.0006, 0.0005, 0.0009, 0.0, 0.0, 0.0] }
//! ```
//!
//! `inertia` 为关于质心的 `[ixx, iyy, izz, ixy, ixz, iyz]`。
//! `tip_link` 可选，给出时链在该连杆处截断。

use crate::chain::{Chain, Joint, RigidBodyInertia, STANDARD_GRAVITY, Segment};
use crate::error::{DynamicsError, Result};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

fn default_gravity() -> [f64; 3] {
    [0.0, 0.0, -STANDARD_GRAVITY]
}

fn default_axis() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

/// 关节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    Revolute,
    /// 无限位旋转关节，动力学上与 `Revolute` 相同
    Continuous,
    Prismatic,
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JointDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: JointType,
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OriginDescription {
    #[serde(default)]
    pub xyz: [f64; 3],
    /// 固定轴 roll-pitch-yaw
    #[serde(default)]
    pub rpy: [f64; 3],
}

impl OriginDescription {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let [x, y, z] = self.xyz;
        let [roll, pitch, yaw] = self.rpy;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InertialDescription {
    pub mass: f64,
    #[serde(default)]
    pub com: [f64; 3],
    #[serde(default)]
    pub inertia: [f64; 6],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentDescription {
    /// 连杆名
    pub name: String,
    pub joint: JointDescription,
    #[serde(default)]
    pub origin: OriginDescription,
    pub inertial: InertialDescription,
}

/// 运动链描述
#[derive(Debug, Clone, Deserialize)]
pub struct ChainDescription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tip_link: Option<String>,
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 3],
    #[serde(default)]
    pub segments: Vec<SegmentDescription>,
}

impl ChainDescription {
    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DynamicsError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| DynamicsError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DynamicsError::Parse(e.to_string()))
    }

    /// 构造运动链（应用 `tip_link` 截断并校验）
    pub fn into_chain(self) -> Result<Chain> {
        let mut segments = self.segments;
        if let Some(tip) = &self.tip_link {
            let end = segments
                .iter()
                .position(|s| &s.name == tip)
                .ok_or_else(|| DynamicsError::UnknownTipLink(tip.clone()))?;
            segments.truncate(end + 1);
        }

        let segments = segments
            .into_iter()
            .map(SegmentDescription::into_segment)
            .collect::<Result<Vec<_>>>()?;
        let chain = Chain::new(segments, Vector3::from(self.gravity))?;
        debug!(
            "Loaded chain '{}': {} segment(s), {} movable joint(s), {:.3} kg",
            self.name,
            chain.segments().len(),
            chain.dof(),
            chain.total_mass()
        );
        Ok(chain)
    }
}

impl SegmentDescription {
    fn into_segment(self) -> Result<Segment> {
        let axis = Vector3::from(self.joint.axis);
        let joint = match self.joint.kind {
            JointType::Revolute | JointType::Continuous => Joint::revolute(self.joint.name, axis)?,
            JointType::Prismatic => Joint::prismatic(self.joint.name, axis)?,
            JointType::Fixed => Joint::fixed(self.joint.name),
        };
        let inertial = RigidBodyInertia::new(
            self.inertial.mass,
            Vector3::from(self.inertial.com),
            RigidBodyInertia::inertia_from_components(self.inertial.inertia),
        );
        Ok(Segment {
            name: self.name,
            joint,
            origin: self.origin.to_isometry(),
            inertial,
        })
    }
}

/// 加载描述文件并构造运动链
pub fn load_chain(path: impl AsRef<Path>) -> Result<Chain> {
    ChainDescription::load(path)?.into_chain()
}
