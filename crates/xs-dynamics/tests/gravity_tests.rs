//! 重力力矩测试
//!
//! 与解析解对比，并用 proptest 验证物理不变量。

use approx::assert_relative_eq;
use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion, Vector3};
use proptest::prelude::*;
use xs_dynamics::{
    Chain, ChainDescription, InverseDynamics, Joint, RigidBodyInertia, STANDARD_GRAVITY, Segment,
};

const G: f64 = STANDARD_GRAVITY;

/// 平面两连杆（绕 y 轴），连杆沿 x 方向
fn two_link(m1: f64, m2: f64, l1: f64, r1: f64, r2: f64) -> InverseDynamics {
    let chain = Chain::new(
        vec![
            Segment {
                name: "upper".to_string(),
                joint: Joint::revolute("shoulder", Vector3::y()).unwrap(),
                origin: Isometry3::identity(),
                inertial: RigidBodyInertia::point_mass(m1, Vector3::new(r1, 0.0, 0.0)),
            },
            Segment {
                name: "lower".to_string(),
                joint: Joint::revolute("elbow", Vector3::y()).unwrap(),
                origin: Isometry3::translation(l1, 0.0, 0.0),
                inertial: RigidBodyInertia::point_mass(m2, Vector3::new(r2, 0.0, 0.0)),
            },
        ],
        Vector3::new(0.0, 0.0, -G),
    )
    .unwrap();
    InverseDynamics::new(chain)
}

/// 类似 WidowX 的六轴臂：竖直腰关节 + 五个俯仰/滚转关节
const SIX_DOF: &str = r#"
name = "six_dof"

[[segments]]
name = "shoulder_link"
joint = { name = "waist", type = "revolute", axis = [0.0, 0.0, 1.0] }
origin = { xyz = [0.0, 0.0, 0.072] }
inertial = { mass = 0.48, com = [0.0, 0.0, 0.003], inertia = [0.0006, 0.0005, 0.0009, 0.0, 0.0, 0.0] }

[[segments]]
name = "upper_arm_link"
joint = { name = "shoulder", type = "revolute", axis = [0.0, 1.0, 0.0] }
origin = { xyz = [0.0, 0.0, 0.039] }
inertial = { mass = 0.43, com = [0.018, 0.0, 0.19], inertia = [0.0022, 0.0021, 0.0003, 0.0, 0.0002, 0.0] }

[[segments]]
name = "upper_forearm_link"
joint = { name = "elbow", type = "revolute", axis = [0.0, 1.0, 0.0] }
origin = { xyz = [0.05, 0.0, 0.25] }
inertial = { mass = 0.23, com = [0.12, 0.0, 0.0], inertia = [0.0001, 0.0007, 0.0007, 0.0, 0.0, 0.0] }

[[segments]]
name = "lower_forearm_link"
joint = { name = "forearm_roll", type = "revolute", axis = [1.0, 0.0, 0.0] }
origin = { xyz = [0.175, 0.0, 0.0] }
inertial = { mass = 0.17, com = [0.1, 0.004, 0.0], inertia = [0.0001, 0.0004, 0.0004, 0.0, 0.0, 0.0] }

[[segments]]
name = "wrist_link"
joint = { name = "wrist_angle", type = "revolute", axis = [0.0, 1.0, 0.0] }
origin = { xyz = [0.075, 0.0, 0.0] }
inertial = { mass = 0.08, com = [0.04, 0.0, 0.01], inertia = [0.00003, 0.00003, 0.00003, 0.0, 0.0, 0.0] }

[[segments]]
name = "gripper_link"
joint = { name = "wrist_rotate", type = "revolute", axis = [1.0, 0.0, 0.0] }
origin = { xyz = [0.065, 0.0, 0.0] }
inertial = { mass = 0.1, com = [0.02, 0.0, 0.01], inertia = [0.00005, 0.00005, 0.00005, 0.0, 0.0, 0.0] }

[[segments]]
name = "ee_arm_link"
joint = { name = "ee_arm", type = "fixed" }
origin = { xyz = [0.043, 0.0, 0.0] }
inertial = { mass = 0.03, com = [0.01, 0.0, 0.0] }
"#;

fn six_dof() -> InverseDynamics {
    InverseDynamics::new(ChainDescription::parse(SIX_DOF).unwrap().into_chain().unwrap())
}

#[test]
fn test_two_link_closed_form() {
    let (m1, m2, l1, r1, r2) = (1.2, 0.8, 0.4, 0.2, 0.15);
    let dynamics = two_link(m1, m2, l1, r1, r2);

    for (q1, q2) in [(0.0, 0.0), (0.5, -0.3), (1.2, 0.9), (-0.7, 2.0)] {
        let tau = dynamics.gravity_torques(&[q1, q2]).unwrap();
        let expected2 = -m2 * G * r2 * (q1 + q2).cos();
        let expected1 = -(m1 * r1 + m2 * l1) * G * q1.cos() + expected2;
        assert_relative_eq!(tau[0], expected1, epsilon = 1e-9);
        assert_relative_eq!(tau[1], expected2, epsilon = 1e-9);
    }
}

#[test]
fn test_gravity_independent_of_rotational_inertia() {
    // 静止时惯量张量不影响重力力矩
    let with_inertia = Chain::new(
        vec![Segment {
            name: "link".to_string(),
            joint: Joint::revolute("hinge", Vector3::y()).unwrap(),
            origin: Isometry3::identity(),
            inertial: RigidBodyInertia::new(
                2.0,
                Vector3::new(0.3, 0.0, 0.0),
                Matrix3::from_diagonal(&Vector3::new(0.01, 0.02, 0.03)),
            ),
        }],
        Vector3::new(0.0, 0.0, -G),
    )
    .unwrap();
    let tau = InverseDynamics::new(with_inertia).gravity_torques(&[0.4]).unwrap();
    assert_relative_eq!(tau[0], -2.0 * G * 0.3 * 0.4_f64.cos(), epsilon = 1e-9);
}

#[test]
fn test_fixed_segment_mass_is_carried() {
    // 末端固定连杆的质量计入上游关节，但不产生输出
    let chain = Chain::new(
        vec![
            Segment {
                name: "arm".to_string(),
                joint: Joint::revolute("hinge", Vector3::y()).unwrap(),
                origin: Isometry3::identity(),
                inertial: RigidBodyInertia::point_mass(1.0, Vector3::new(0.5, 0.0, 0.0)),
            },
            Segment {
                name: "payload".to_string(),
                joint: Joint::fixed("tool"),
                origin: Isometry3::from_parts(
                    Translation3::new(1.0, 0.0, 0.0),
                    UnitQuaternion::from_euler_angles(0.3, -0.2, 1.0),
                ),
                inertial: RigidBodyInertia::point_mass(0.5, Vector3::zeros()),
            },
        ],
        Vector3::new(0.0, 0.0, -G),
    )
    .unwrap();
    let dynamics = InverseDynamics::new(chain);
    assert_eq!(dynamics.dof(), 1);

    let q = 0.2_f64;
    let tau = dynamics.gravity_torques(&[q]).unwrap();
    assert_eq!(tau.len(), 1);
    assert_relative_eq!(tau[0], -(1.0 * 0.5 + 0.5 * 1.0) * G * q.cos(), epsilon = 1e-9);
}

#[test]
fn test_zero_gravity_gives_zero_torque() {
    let mut description = ChainDescription::parse(SIX_DOF).unwrap();
    description.gravity = [0.0; 3];
    let dynamics = InverseDynamics::new(description.into_chain().unwrap());
    let tau = dynamics.gravity_torques(&[0.3, -0.5, 0.8, 0.1, -0.2, 0.4]).unwrap();
    for t in tau {
        assert_relative_eq!(t, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_waist_carries_no_gravity_load() {
    let dynamics = six_dof();
    let tau = dynamics.gravity_torques(&[0.3, -0.5, 0.8, 0.1, -0.2, 0.4]).unwrap();
    assert_eq!(tau.len(), 6);
    assert_relative_eq!(tau[0], 0.0, epsilon = 1e-9);
}

proptest! {
    /// 绕竖直轴转动腰关节不改变其余关节的重力力矩
    #[test]
    fn waist_rotation_leaves_gravity_torques_unchanged(
        waist in -3.0..3.0f64,
        rest in prop::array::uniform5(-1.5..1.5f64),
    ) {
        let dynamics = six_dof();
        let mut q0 = vec![0.0];
        q0.extend_from_slice(&rest);
        let mut q1 = vec![waist];
        q1.extend_from_slice(&rest);

        let t0 = dynamics.gravity_torques(&q0).unwrap();
        let t1 = dynamics.gravity_torques(&q1).unwrap();
        for (a, b) in t0.iter().zip(&t1).skip(1) {
            prop_assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
    }

    /// 重力力矩与重力加速度成正比
    #[test]
    fn gravity_torques_scale_with_gravity(
        q in prop::array::uniform6(-2.0..2.0f64),
        scale in 0.1..3.0f64,
    ) {
        let base = six_dof();
        let mut description = ChainDescription::parse(SIX_DOF).unwrap();
        description.gravity = [0.0, 0.0, -G * scale];
        let scaled = InverseDynamics::new(description.into_chain().unwrap());

        let t0 = base.gravity_torques(&q).unwrap();
        let t1 = scaled.gravity_torques(&q).unwrap();
        for (a, b) in t0.iter().zip(&t1) {
            prop_assert!((a * scale - b).abs() < 1e-9);
        }
    }
}
