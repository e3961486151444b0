//! 模拟驱动配置

use crate::error::DriverError;
use std::time::Duration;

/// 默认驱动节点名
pub const DEFAULT_NODE_NAME: &str = "xs_sdk";

/// 关节组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointGroup {
    pub name: String,
    pub joints: Vec<String>,
}

impl JointGroup {
    pub fn new<I, S>(name: impl Into<String>, joints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            joints: joints.into_iter().map(Into::into).collect(),
        }
    }
}

/// 模拟驱动配置
///
/// # Example
///
/// ```
/// use xs_driver::{JointGroup, MockArmConfig};
///
/// let config = MockArmConfig::default()
///     .with_namespace("wx250s")
///     .with_group(JointGroup::new("gripper", ["left_finger"]))
///     .with_publish_rate(100.0);
/// assert_eq!(config.joint_names().len(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct MockArmConfig {
    /// 节点名
    pub node_name: String,
    /// 节点命名空间
    pub namespace: String,
    /// 关节组（关节状态按组顺序发布）
    pub groups: Vec<JointGroup>,
    /// 关节状态发布频率 (Hz)
    pub publish_rate: f64,
    /// 服务响应前的人为延迟
    pub response_delay: Duration,
}

impl Default for MockArmConfig {
    /// WidowX-250 6DOF 机械臂
    fn default() -> Self {
        Self {
            node_name: DEFAULT_NODE_NAME.to_string(),
            namespace: String::new(),
            groups: vec![JointGroup::new(
                "arm",
                [
                    "waist",
                    "shoulder",
                    "elbow",
                    "forearm_roll",
                    "wrist_angle",
                    "wrist_rotate",
                ],
            )],
            publish_rate: 50.0,
            response_delay: Duration::ZERO,
        }
    }
}

impl MockArmConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_node_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = name.into();
        self
    }

    /// 追加关节组（同名组被替换）
    pub fn with_group(mut self, group: JointGroup) -> Self {
        self.groups.retain(|g| g.name != group.name);
        self.groups.push(group);
        self
    }

    pub fn with_publish_rate(mut self, hz: f64) -> Self {
        self.publish_rate = hz;
        self
    }

    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    /// 所有关节（按组顺序，去重）
    pub fn joint_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for joint in self.groups.iter().flat_map(|g| &g.joints) {
            if !names.contains(joint) {
                names.push(joint.clone());
            }
        }
        names
    }

    /// 关节状态发布周期
    pub fn publish_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.publish_rate)
    }

    pub(crate) fn validate(&self) -> Result<(), DriverError> {
        if !(self.publish_rate.is_finite() && self.publish_rate > 0.0) {
            return Err(DriverError::InvalidConfig(
                "publish_rate must be positive".to_string(),
            ));
        }
        if self.groups.iter().any(|g| g.joints.is_empty()) {
            return Err(DriverError::InvalidConfig(
                "joint groups must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
