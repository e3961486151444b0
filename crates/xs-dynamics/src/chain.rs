//! 串联运动链
//!
//! 每个 `Segment` 由一个关节和其后的刚体连杆组成。`origin` 是关节坐标系
//! 相对于父连杆坐标系的位姿（关节变量为 0 时），关节运动叠加在 `origin` 之后：
//!
//! ```text
//! T(parent → child) = origin · joint(q)
//! ```
//!
//! 连杆的质心与惯量都在关节（子）坐标系下表示。

use crate::error::{DynamicsError, Result};
use nalgebra::{Isometry3, Matrix3, Translation3, Unit, UnitQuaternion, Vector3};
use std::collections::HashSet;

/// 标准重力加速度 (m/s²)
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// 关节类型
#[derive(Debug, Clone, PartialEq)]
pub enum JointKind {
    /// 绕轴旋转
    Revolute(Unit<Vector3<f64>>),
    /// 沿轴平移
    Prismatic(Unit<Vector3<f64>>),
    /// 固定连接（不产生关节变量）
    Fixed,
}

/// 关节
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub kind: JointKind,
}

impl Joint {
    /// 创建旋转关节
    ///
    /// # Errors
    ///
    /// 轴为零向量时返回 `DynamicsError::ZeroAxis`。
    pub fn revolute(name: impl Into<String>, axis: Vector3<f64>) -> Result<Self> {
        let name = name.into();
        let axis = normalize_axis(&name, axis)?;
        Ok(Self {
            name,
            kind: JointKind::Revolute(axis),
        })
    }

    /// 创建平移关节
    pub fn prismatic(name: impl Into<String>, axis: Vector3<f64>) -> Result<Self> {
        let name = name.into();
        let axis = normalize_axis(&name, axis)?;
        Ok(Self {
            name,
            kind: JointKind::Prismatic(axis),
        })
    }

    pub fn fixed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Fixed,
        }
    }

    /// 是否为活动关节
    pub fn is_movable(&self) -> bool {
        !matches!(self.kind, JointKind::Fixed)
    }

    /// 关节轴（固定关节为 `None`）
    pub fn axis(&self) -> Option<&Unit<Vector3<f64>>> {
        match &self.kind {
            JointKind::Revolute(axis) | JointKind::Prismatic(axis) => Some(axis),
            JointKind::Fixed => None,
        }
    }

    /// 关节变量 `q` 产生的变换
    pub fn transform(&self, q: f64) -> Isometry3<f64> {
        match &self.kind {
            JointKind::Revolute(axis) => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, q),
            ),
            JointKind::Prismatic(axis) => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * q),
                UnitQuaternion::identity(),
            ),
            JointKind::Fixed => Isometry3::identity(),
        }
    }
}

fn normalize_axis(joint: &str, axis: Vector3<f64>) -> Result<Unit<Vector3<f64>>> {
    Unit::try_new(axis, 1e-9).ok_or_else(|| DynamicsError::ZeroAxis(joint.to_string()))
}

/// 刚体惯性参数
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyInertia {
    /// 质量 (kg)
    pub mass: f64,
    /// 质心位置（连杆坐标系）
    pub com: Vector3<f64>,
    /// 关于质心的惯量张量
    pub inertia: Matrix3<f64>,
}

impl RigidBodyInertia {
    pub fn new(mass: f64, com: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        Self { mass, com, inertia }
    }

    /// 质点（惯量为零）
    pub fn point_mass(mass: f64, com: Vector3<f64>) -> Self {
        Self::new(mass, com, Matrix3::zeros())
    }

    /// 由 `[ixx, iyy, izz, ixy, ixz, iyz]` 构造对称惯量张量
    pub fn inertia_from_components(c: [f64; 6]) -> Matrix3<f64> {
        let [ixx, iyy, izz, ixy, ixz, iyz] = c;
        Matrix3::new(ixx, ixy, ixz, ixy, iyy, iyz, ixz, iyz, izz)
    }
}

/// 运动链中的一节：关节 + 连杆
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// 连杆名
    pub name: String,
    pub joint: Joint,
    pub origin: Isometry3<f64>,
    pub inertial: RigidBodyInertia,
}

/// 从基座到末端的串联运动链
#[derive(Debug, Clone)]
pub struct Chain {
    segments: Vec<Segment>,
    gravity: Vector3<f64>,
}

impl Chain {
    /// 创建并校验运动链
    ///
    /// # Errors
    ///
    /// - `EmptyChain`：没有任何连杆
    /// - `InvalidMass`：质量非正或非有限值
    /// - `DuplicateJoint`：关节名重复
    pub fn new(segments: Vec<Segment>, gravity: Vector3<f64>) -> Result<Self> {
        if segments.is_empty() {
            return Err(DynamicsError::EmptyChain);
        }

        let mut seen = HashSet::new();
        for segment in &segments {
            let mass = segment.inertial.mass;
            if !mass.is_finite() || mass <= 0.0 {
                return Err(DynamicsError::InvalidMass {
                    link: segment.name.clone(),
                    mass,
                });
            }
            if !seen.insert(segment.joint.name.as_str()) {
                return Err(DynamicsError::DuplicateJoint(segment.joint.name.clone()));
            }
        }

        Ok(Self { segments, gravity })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 重力加速度（基座坐标系）
    pub fn gravity(&self) -> &Vector3<f64> {
        &self.gravity
    }

    /// 活动关节数
    pub fn dof(&self) -> usize {
        self.segments.iter().filter(|s| s.joint.is_movable()).count()
    }

    /// 活动关节名（从基座到末端）
    pub fn movable_joint_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter(|s| s.joint.is_movable())
            .map(|s| s.joint.name.as_str())
            .collect()
    }

    /// 总质量
    pub fn total_mass(&self) -> f64 {
        self.segments.iter().map(|s| s.inertial.mass).sum()
    }
}
