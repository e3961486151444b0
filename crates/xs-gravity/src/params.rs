//! 节点参数
//!
//! | 参数 | 类型 | 默认值 |
//! |------|------|--------|
//! | `arm_group_name` | string | `arm` |
//! | `motor_specs` | string（路径，必填） | `""` |
//! | `robot_description` | string（路径，必填） | `""` |
//! | `joint_state_topic` | string | `joint_states` |
//! | `joint_command_topic` | string | `commands/joint_group` |
//! | `velocity_threshold` | double (rad/s) | `0.01` |
//! | `service_timeout` | double (s) | `5.0` |

use crate::error::GravityCompensationError;
use std::path::PathBuf;
use std::time::Duration;
use xs_protocol::{JOINT_GROUP_COMMAND_TOPIC, JOINT_STATES_TOPIC};
use xs_runtime::NodeHandle;

pub const ARM_GROUP_NAME: &str = "arm_group_name";
pub const MOTOR_SPECS: &str = "motor_specs";
pub const ROBOT_DESCRIPTION: &str = "robot_description";
pub const JOINT_STATE_TOPIC: &str = "joint_state_topic";
pub const JOINT_COMMAND_TOPIC: &str = "joint_command_topic";
pub const VELOCITY_THRESHOLD: &str = "velocity_threshold";
pub const SERVICE_TIMEOUT: &str = "service_timeout";

/// 重力补偿节点参数
#[derive(Debug, Clone, PartialEq)]
pub struct GravityCompensationParams {
    pub arm_group_name: String,
    pub motor_specs: PathBuf,
    pub robot_description: PathBuf,
    pub joint_state_topic: String,
    pub joint_command_topic: String,
    pub velocity_threshold: f64,
    pub service_timeout: Duration,
}

impl GravityCompensationParams {
    /// 在节点上声明全部参数并读取生效值
    ///
    /// # Errors
    ///
    /// - `MissingParameter`: 必填路径为空
    /// - `InvalidParameter`: 阈值或超时为负数/非有限值
    /// - `Runtime`: 参数类型不匹配、重复声明
    pub fn declare(node: &NodeHandle) -> Result<Self, GravityCompensationError> {
        let arm_group_name = node.declare_parameter(ARM_GROUP_NAME, "arm".to_string())?;
        let motor_specs = node.declare_parameter(MOTOR_SPECS, String::new())?;
        let robot_description = node.declare_parameter(ROBOT_DESCRIPTION, String::new())?;
        let joint_state_topic =
            node.declare_parameter(JOINT_STATE_TOPIC, JOINT_STATES_TOPIC.to_string())?;
        let joint_command_topic =
            node.declare_parameter(JOINT_COMMAND_TOPIC, JOINT_GROUP_COMMAND_TOPIC.to_string())?;
        let velocity_threshold = node.declare_parameter(VELOCITY_THRESHOLD, 0.01)?;
        let service_timeout = node.declare_parameter(SERVICE_TIMEOUT, 5.0)?;

        if arm_group_name.is_empty() {
            return Err(GravityCompensationError::MissingParameter(ARM_GROUP_NAME));
        }
        if motor_specs.is_empty() {
            return Err(GravityCompensationError::MissingParameter(MOTOR_SPECS));
        }
        if robot_description.is_empty() {
            return Err(GravityCompensationError::MissingParameter(ROBOT_DESCRIPTION));
        }
        if !(velocity_threshold.is_finite() && velocity_threshold >= 0.0) {
            return Err(GravityCompensationError::InvalidParameter {
                name: VELOCITY_THRESHOLD,
                reason: format!("{velocity_threshold} is not a non-negative number"),
            });
        }
        let service_timeout = Duration::try_from_secs_f64(service_timeout).map_err(|e| {
            GravityCompensationError::InvalidParameter {
                name: SERVICE_TIMEOUT,
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            arm_group_name,
            motor_specs: PathBuf::from(motor_specs),
            robot_description: PathBuf::from(robot_description),
            joint_state_topic,
            joint_command_topic,
            velocity_threshold,
            service_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xs_runtime::{Context, NodeOptions, ParameterValue};

    fn node_with(overrides: &[(&str, ParameterValue)]) -> (Context, NodeHandle) {
        let context = Context::init(["test"]).unwrap();
        let options = overrides
            .iter()
            .fold(NodeOptions::default(), |options, (name, value)| {
                options.parameter_override(*name, value.clone())
            });
        let node = context.create_node("gravity_compensation", options).unwrap();
        (context, node)
    }

    fn paths() -> Vec<(&'static str, ParameterValue)> {
        vec![
            (MOTOR_SPECS, ParameterValue::String("specs.toml".into())),
            (ROBOT_DESCRIPTION, ParameterValue::String("robot.toml".into())),
        ]
    }

    #[test]
    fn test_defaults() {
        let (_context, node) = node_with(&paths());
        let params = GravityCompensationParams::declare(&node).unwrap();
        assert_eq!(params.arm_group_name, "arm");
        assert_eq!(params.motor_specs, PathBuf::from("specs.toml"));
        assert_eq!(params.joint_state_topic, "joint_states");
        assert_eq!(params.joint_command_topic, "commands/joint_group");
        assert_eq!(params.velocity_threshold, 0.01);
        assert_eq!(params.service_timeout, Duration::from_secs(5));
        assert_eq!(node.parameter_names().len(), 7);
    }

    #[test]
    fn test_required_paths() {
        let (_context, node) = node_with(&[]);
        assert!(matches!(
            GravityCompensationParams::declare(&node),
            Err(GravityCompensationError::MissingParameter(MOTOR_SPECS))
        ));

        let (_context, node) = node_with(&paths()[..1]);
        assert!(matches!(
            GravityCompensationParams::declare(&node),
            Err(GravityCompensationError::MissingParameter(ROBOT_DESCRIPTION))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut overrides = paths();
        overrides.push((SERVICE_TIMEOUT, ParameterValue::Double(-1.0)));
        let (_context, node) = node_with(&overrides);
        assert!(matches!(
            GravityCompensationParams::declare(&node),
            Err(GravityCompensationError::InvalidParameter { name: SERVICE_TIMEOUT, .. })
        ));

        let mut overrides = paths();
        overrides.push((VELOCITY_THRESHOLD, ParameterValue::String("fast".into())));
        let (_context, node) = node_with(&overrides);
        assert!(matches!(
            GravityCompensationParams::declare(&node),
            Err(GravityCompensationError::Runtime(_))
        ));
    }
}
