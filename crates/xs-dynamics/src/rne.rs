//! 递归牛顿-欧拉逆动力学
//!
//! 前向递推（基座 → 末端）计算各连杆的角速度、角加速度和线加速度，
//! 后向递推（末端 → 基座）累加连杆受到的力和力矩，投影到关节轴上得到关节力/力矩。
//!
//! 重力通过基座加速度 `a₀ = -g` 引入，因此 `gravity_torques(q)` 就是
//! `qd = qdd = 0` 时的逆动力学结果。所有量都在各连杆自身坐标系下表示。

use crate::chain::{Chain, JointKind};
use crate::error::{DynamicsError, Result};
use nalgebra::{Matrix3, Vector3};

/// 单个连杆在前向递推中的中间量
struct LinkState {
    /// 父坐标系 → 本坐标系的旋转（本坐标系基向量在父坐标系下的表示）
    rotation: Matrix3<f64>,
    /// 本坐标系原点在父坐标系下的位置
    position: Vector3<f64>,
    /// 作用在连杆质心上的合力
    force: Vector3<f64>,
    /// 关于质心的合力矩
    moment: Vector3<f64>,
}

/// 逆动力学求解器
#[derive(Debug, Clone)]
pub struct InverseDynamics {
    chain: Chain,
}

impl InverseDynamics {
    pub fn new(chain: Chain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// 活动关节数
    pub fn dof(&self) -> usize {
        self.chain.dof()
    }

    /// 抵消重力所需的关节力/力矩
    ///
    /// # Errors
    ///
    /// `q` 的长度不等于活动关节数时返回 `DimensionMismatch`。
    pub fn gravity_torques(&self, q: &[f64]) -> Result<Vec<f64>> {
        let zeros = vec![0.0; self.dof()];
        self.torques(q, &zeros, &zeros)
    }

    /// 完整逆动力学 `τ = M(q)·qdd + C(q, qd)·qd + G(q)`
    pub fn torques(&self, q: &[f64], qd: &[f64], qdd: &[f64]) -> Result<Vec<f64>> {
        let dof = self.dof();
        check_len("q", dof, q.len())?;
        check_len("qd", dof, qd.len())?;
        check_len("qdd", dof, qdd.len())?;

        let segments = self.chain.segments();
        let mut states = Vec::with_capacity(segments.len());

        let mut omega = Vector3::<f64>::zeros();
        let mut alpha = Vector3::<f64>::zeros();
        let mut accel = -self.chain.gravity();
        let mut index = 0;

        for segment in segments {
            let (qi, qdi, qddi) = if segment.joint.is_movable() {
                let values = (q[index], qd[index], qdd[index]);
                index += 1;
                values
            } else {
                (0.0, 0.0, 0.0)
            };

            let pose = segment.origin * segment.joint.transform(qi);
            let rotation = pose.rotation.to_rotation_matrix().into_inner();
            let position = pose.translation.vector;
            let rt = rotation.transpose();

            // 父坐标系原点加速度 → 本坐标系原点加速度
            let origin_accel = rt
                * (accel + alpha.cross(&position) + omega.cross(&omega.cross(&position)));

            let (new_omega, new_alpha, new_accel) = match &segment.joint.kind {
                JointKind::Revolute(axis) => {
                    let z = axis.into_inner();
                    let w = rt * omega + z * qdi;
                    let a = rt * alpha + z * qddi + w.cross(&(z * qdi));
                    (w, a, origin_accel)
                },
                JointKind::Prismatic(axis) => {
                    let z = axis.into_inner();
                    let w = rt * omega;
                    let a = rt * alpha;
                    let lin = origin_accel + w.cross(&(z * qdi)) * 2.0 + z * qddi;
                    (w, a, lin)
                },
                JointKind::Fixed => (rt * omega, rt * alpha, origin_accel),
            };
            omega = new_omega;
            alpha = new_alpha;
            accel = new_accel;

            let inertial = &segment.inertial;
            let com = inertial.com;
            let com_accel = accel + alpha.cross(&com) + omega.cross(&omega.cross(&com));
            let force = com_accel * inertial.mass;
            let moment = inertial.inertia * alpha + omega.cross(&(inertial.inertia * omega));

            states.push(LinkState {
                rotation,
                position,
                force,
                moment,
            });
        }

        // 后向递推
        let mut torques = vec![0.0; dof];
        let mut child_force = Vector3::<f64>::zeros();
        let mut child_moment = Vector3::<f64>::zeros();
        let mut child_rotation = Matrix3::<f64>::identity();
        let mut child_position = Vector3::<f64>::zeros();
        let mut output = dof;

        for (segment, state) in segments.iter().zip(&states).rev() {
            let transmitted = child_rotation * child_force;
            let f = transmitted + state.force;
            let n = state.moment
                + child_rotation * child_moment
                + segment.inertial.com.cross(&state.force)
                + child_position.cross(&transmitted);

            match &segment.joint.kind {
                JointKind::Revolute(axis) => {
                    output -= 1;
                    torques[output] = n.dot(&axis.into_inner());
                },
                JointKind::Prismatic(axis) => {
                    output -= 1;
                    torques[output] = f.dot(&axis.into_inner());
                },
                JointKind::Fixed => {},
            }

            child_force = f;
            child_moment = n;
            child_rotation = state.rotation;
            child_position = state.position;
        }

        Ok(torques)
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DynamicsError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
