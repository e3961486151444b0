//! 模拟机械臂驱动节点
//!
//! 提供与真实驱动相同的接口：
//!
//! - 按 `publish_rate` 发布 `joint_states`
//! - 服务 `set_operating_modes`、`torque_enable`
//! - 订阅 `commands/joint_group`
//!
//! 所有请求与收到的命令都会被记录，供测试检查。关节位置不会随命令变化，
//! 需要时由 `set_joint_state` 手动设置。

use crate::config::MockArmConfig;
use crate::error::DriverError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use tracing::{debug, info};
use xs_protocol::{
    CommandType, JOINT_GROUP_COMMAND_TOPIC, JOINT_STATES_TOPIC, JointGroupCommand, JointState,
    OperatingMode, OperatingModesRequest, SET_OPERATING_MODES_SERVICE, TORQUE_ENABLE_SERVICE,
    TorqueEnableRequest,
};
use xs_runtime::{
    CallbackGroupType, Context, Logger, Node, NodeHandle, NodeOptions, Publisher, Service,
    Subscription, Timer,
};

/// 单个关节的模拟电机状态
#[derive(Debug, Clone, Copy, PartialEq)]
struct MotorState {
    position: f64,
    velocity: f64,
    effort: f64,
    mode: OperatingMode,
    torque_enabled: bool,
}

impl Default for MotorState {
    fn default() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            effort: 0.0,
            mode: OperatingMode::Position,
            torque_enabled: true,
        }
    }
}

/// 驱动共享状态（回调与外部访问）
struct DriverState {
    config: MockArmConfig,
    joints: Vec<String>,
    motors: RwLock<HashMap<String, MotorState>>,
    last_command: Mutex<Option<JointGroupCommand>>,
    mode_requests: Mutex<Vec<OperatingModesRequest>>,
    torque_requests: Mutex<Vec<TorqueEnableRequest>>,
    commands_received: AtomicU64,
    states_published: AtomicU64,
    logger: Logger,
}

impl DriverState {
    /// 请求名对应的关节（未知名称返回 `None`）
    fn resolve_targets(&self, cmd_type: CommandType, name: &str) -> Option<Vec<String>> {
        match cmd_type {
            CommandType::Group => self
                .config
                .groups
                .iter()
                .find(|g| g.name == name)
                .map(|g| g.joints.clone()),
            CommandType::Single => self
                .joints
                .iter()
                .any(|j| j == name)
                .then(|| vec![name.to_string()]),
        }
    }

    fn group_joints(&self, group: &str) -> Option<&[String]> {
        self.config
            .groups
            .iter()
            .find(|g| g.name == group)
            .map(|g| g.joints.as_slice())
    }

    fn respond_delay(&self) {
        if !self.config.response_delay.is_zero() {
            thread::sleep(self.config.response_delay);
        }
    }

    fn handle_operating_modes(&self, request: OperatingModesRequest) {
        self.respond_delay();
        let Some(targets) = self.resolve_targets(request.cmd_type, &request.name) else {
            self.logger.warn(format_args!(
                "Ignoring operating mode request for unknown {:?} '{}'",
                request.cmd_type, request.name
            ));
            self.mode_requests.lock().push(request);
            return;
        };

        {
            let mut motors = self.motors.write();
            for joint in &targets {
                if let Some(motor) = motors.get_mut(joint) {
                    motor.mode = request.mode;
                    motor.velocity = 0.0;
                }
            }
        }
        self.logger.info(format_args!(
            "The operating mode for the '{}' {:?} was changed to '{}'",
            request.name, request.cmd_type, request.mode
        ));
        self.mode_requests.lock().push(request);
    }

    fn handle_torque_enable(&self, request: TorqueEnableRequest) {
        self.respond_delay();
        let Some(targets) = self.resolve_targets(request.cmd_type, &request.name) else {
            self.logger.warn(format_args!(
                "Ignoring torque request for unknown {:?} '{}'",
                request.cmd_type, request.name
            ));
            self.torque_requests.lock().push(request);
            return;
        };

        {
            let mut motors = self.motors.write();
            for joint in &targets {
                if let Some(motor) = motors.get_mut(joint) {
                    motor.torque_enabled = request.enable;
                }
            }
        }
        self.logger.info(format_args!(
            "{} torque for the '{}' {:?}",
            if request.enable { "Enabled" } else { "Disabled" },
            request.name,
            request.cmd_type
        ));
        self.torque_requests.lock().push(request);
    }

    fn handle_command(&self, command: JointGroupCommand) {
        let Some(joints) = self.group_joints(&command.name) else {
            self.logger.warn(format_args!(
                "Ignoring command for unknown group '{}'",
                command.name
            ));
            return;
        };
        if joints.len() != command.cmd.len() {
            self.logger.warn(format_args!(
                "Ignoring command for group '{}': expected {} values, got {}",
                command.name,
                joints.len(),
                command.cmd.len()
            ));
            return;
        }

        {
            let mut motors = self.motors.write();
            for (joint, value) in joints.iter().zip(&command.cmd) {
                if let Some(motor) = motors.get_mut(joint)
                    && motor.torque_enabled
                    && motor.mode.is_current()
                {
                    motor.effort = *value;
                }
            }
        }
        self.commands_received.fetch_add(1, Ordering::Relaxed);
        *self.last_command.lock() = Some(command);
    }

    fn snapshot(&self, timestamp_us: u64) -> JointState {
        let motors = self.motors.read();
        let mut msg = JointState {
            timestamp_us,
            name: Vec::with_capacity(self.joints.len()),
            position: Vec::with_capacity(self.joints.len()),
            velocity: Vec::with_capacity(self.joints.len()),
            effort: Vec::with_capacity(self.joints.len()),
        };
        for joint in &self.joints {
            let motor = motors.get(joint).copied().unwrap_or_default();
            msg.name.push(joint.clone());
            msg.position.push(motor.position);
            msg.velocity.push(motor.velocity);
            msg.effort.push(motor.effort);
        }
        msg
    }
}

/// 模拟机械臂驱动
///
/// # Example
///
/// ```no_run
/// use xs_driver::{MockArmConfig, MockArmDriver};
/// use xs_runtime::{Context, Executor, MultiThreadedExecutor};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let context = Context::init(std::env::args())?;
/// let driver = MockArmDriver::new(&context, MockArmConfig::default())?;
///
/// let mut executor = MultiThreadedExecutor::new(&context);
/// executor.add_node(driver.node())?;
/// executor.spin()?;
/// # Ok(())
/// # }
/// ```
pub struct MockArmDriver {
    node: NodeHandle,
    state: Arc<DriverState>,
    publisher: Publisher<JointState>,
    _timer: Timer,
    _command_sub: Subscription<JointGroupCommand>,
    _modes_service: Service<OperatingModesRequest, ()>,
    _torque_service: Service<TorqueEnableRequest, ()>,
}

impl MockArmDriver {
    /// 创建驱动节点并注册话题/服务
    ///
    /// # Errors
    ///
    /// - `DriverError::InvalidConfig`: 发布频率非正或关节组为空
    /// - `DriverError::Runtime`: 节点名无效、服务名已被占用等
    pub fn new(context: &Context, config: MockArmConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let node = context.create_node(
            &config.node_name,
            NodeOptions::default().namespace(config.namespace.clone()),
        )?;

        let joints = config.joint_names();
        let motors = joints
            .iter()
            .map(|j| (j.clone(), MotorState::default()))
            .collect();
        let period = config.publish_period();
        let state = Arc::new(DriverState {
            config,
            joints,
            motors: RwLock::new(motors),
            last_command: Mutex::new(None),
            mode_requests: Mutex::new(Vec::new()),
            torque_requests: Mutex::new(Vec::new()),
            commands_received: AtomicU64::new(0),
            states_published: AtomicU64::new(0),
            logger: node.logger().clone(),
        });

        // 服务回调可能带有延迟，放入可重入组，避免阻塞状态发布
        let service_group = node.create_callback_group(CallbackGroupType::Reentrant);

        let s = Arc::clone(&state);
        let modes_service = node.create_service(
            SET_OPERATING_MODES_SERVICE,
            Some(&service_group),
            move |request: OperatingModesRequest| s.handle_operating_modes(request),
        )?;

        let s = Arc::clone(&state);
        let torque_service = node.create_service(
            TORQUE_ENABLE_SERVICE,
            Some(&service_group),
            move |request: TorqueEnableRequest| s.handle_torque_enable(request),
        )?;

        let s = Arc::clone(&state);
        let command_sub = node.create_subscription(
            JOINT_GROUP_COMMAND_TOPIC,
            1,
            None,
            move |command: JointGroupCommand| s.handle_command(command),
        )?;

        let publisher = node.create_publisher::<JointState>(JOINT_STATES_TOPIC)?;
        let timer = {
            let state = Arc::clone(&state);
            let publisher = publisher.clone();
            let started = std::time::Instant::now();
            node.create_timer(period, None, move || {
                let timestamp_us = started.elapsed().as_micros() as u64;
                publisher.publish(&state.snapshot(timestamp_us));
                state.states_published.fetch_add(1, Ordering::Relaxed);
            })?
        };

        info!(
            "Mock arm driver '{}' ready: {} joint(s), publishing at {:.1} Hz",
            node.fully_qualified_name(),
            state.joints.len(),
            state.config.publish_rate
        );

        Ok(Self {
            node,
            state,
            publisher,
            _timer: timer,
            _command_sub: command_sub,
            _modes_service: modes_service,
            _torque_service: torque_service,
        })
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// 所有关节名（发布顺序）
    pub fn joint_names(&self) -> &[String] {
        &self.state.joints
    }

    /// 设置关节位置/速度（未给出的关节保持不变）
    pub fn set_joint_state(&self, joint: &str, position: f64, velocity: f64) -> bool {
        let mut motors = self.state.motors.write();
        match motors.get_mut(joint) {
            Some(motor) => {
                motor.position = position;
                motor.velocity = velocity;
                true
            },
            None => false,
        }
    }

    /// 立即发布一次关节状态
    pub fn publish_joint_states(&self) -> usize {
        let msg = self.state.snapshot(0);
        debug!("Publishing joint states on demand");
        let delivered = self.publisher.publish(&msg);
        self.state.states_published.fetch_add(1, Ordering::Relaxed);
        delivered
    }

    /// 关节组当前工作模式（组内不一致或组不存在时返回 `None`）
    pub fn operating_mode(&self, group: &str) -> Option<OperatingMode> {
        self.group_value(group, |m| m.mode)
    }

    /// 关节组是否全部使能（组内不一致或组不存在时返回 `None`）
    pub fn torque_enabled(&self, group: &str) -> Option<bool> {
        self.group_value(group, |m| m.torque_enabled)
    }

    /// 最近收到的关节组命令
    pub fn last_command(&self) -> Option<JointGroupCommand> {
        self.state.last_command.lock().clone()
    }

    pub fn commands_received(&self) -> u64 {
        self.state.commands_received.load(Ordering::Relaxed)
    }

    pub fn states_published(&self) -> u64 {
        self.state.states_published.load(Ordering::Relaxed)
    }

    /// 收到的工作模式请求（按到达顺序）
    pub fn operating_mode_requests(&self) -> Vec<OperatingModesRequest> {
        self.state.mode_requests.lock().clone()
    }

    /// 收到的使能请求（按到达顺序）
    pub fn torque_requests(&self) -> Vec<TorqueEnableRequest> {
        self.state.torque_requests.lock().clone()
    }

    fn group_value<T, F>(&self, group: &str, f: F) -> Option<T>
    where
        T: PartialEq,
        F: Fn(&MotorState) -> T,
    {
        let joints = self.state.group_joints(group)?;
        let motors = self.state.motors.read();
        let mut values = joints.iter().filter_map(|j| motors.get(j)).map(&f);
        let first = values.next()?;
        values.all(|v| v == first).then_some(first)
    }
}

impl Node for MockArmDriver {
    fn node_handle(&self) -> &NodeHandle {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> (Context, MockArmDriver) {
        let context = Context::init(["test"]).unwrap();
        let driver = MockArmDriver::new(&context, MockArmConfig::default()).unwrap();
        (context, driver)
    }

    #[test]
    fn test_initial_state() {
        let (_context, driver) = driver();
        assert_eq!(driver.node().fully_qualified_name(), "/xs_sdk");
        assert_eq!(driver.operating_mode("arm"), Some(OperatingMode::Position));
        assert_eq!(driver.torque_enabled("arm"), Some(true));
        assert_eq!(driver.operating_mode("gripper"), None);
        assert!(driver.last_command().is_none());
    }

    #[test]
    fn test_group_and_single_requests() {
        let (_context, driver) = driver();
        let state = &driver.state;

        state.handle_operating_modes(OperatingModesRequest::group("arm", OperatingMode::Current));
        assert_eq!(driver.operating_mode("arm"), Some(OperatingMode::Current));

        let mut single = OperatingModesRequest::group("waist", OperatingMode::Velocity);
        single.cmd_type = CommandType::Single;
        state.handle_operating_modes(single);
        // 组内模式不一致
        assert_eq!(driver.operating_mode("arm"), None);

        state.handle_torque_enable(TorqueEnableRequest::group("arm", false));
        assert_eq!(driver.torque_enabled("arm"), Some(false));
        assert_eq!(driver.operating_mode_requests().len(), 2);
        assert_eq!(driver.torque_requests().len(), 1);
    }

    #[test]
    fn test_unknown_group_ignored() {
        let (_context, driver) = driver();
        driver
            .state
            .handle_operating_modes(OperatingModesRequest::group("legs", OperatingMode::Current));
        assert_eq!(driver.operating_mode("arm"), Some(OperatingMode::Position));
        // 请求仍被记录
        assert_eq!(driver.operating_mode_requests()[0].name, "legs");
    }

    #[test]
    fn test_commands_recorded() {
        let (_context, driver) = driver();
        let state = &driver.state;

        state.handle_command(JointGroupCommand::new("arm", vec![1.0; 6]));
        assert_eq!(driver.commands_received(), 1);
        assert_eq!(driver.last_command().unwrap().cmd, vec![1.0; 6]);

        // 长度不符、未知组都被忽略
        state.handle_command(JointGroupCommand::new("arm", vec![1.0; 5]));
        state.handle_command(JointGroupCommand::new("legs", vec![1.0; 6]));
        assert_eq!(driver.commands_received(), 1);
    }

    #[test]
    fn test_effort_follows_current_commands_only() {
        let (_context, driver) = driver();
        let state = &driver.state;

        state.handle_command(JointGroupCommand::new("arm", vec![5.0; 6]));
        assert!(state.snapshot(0).effort.iter().all(|e| *e == 0.0));

        state.handle_operating_modes(OperatingModesRequest::group("arm", OperatingMode::Current));
        state.handle_command(JointGroupCommand::new("arm", vec![5.0; 6]));
        assert!(state.snapshot(0).effort.iter().all(|e| *e == 5.0));
    }

    #[test]
    fn test_joint_state_snapshot() {
        let (_context, driver) = driver();
        assert!(driver.set_joint_state("elbow", 0.5, -0.1));
        assert!(!driver.set_joint_state("knee", 0.5, 0.0));

        let msg = driver.state.snapshot(42);
        assert!(msg.validate().is_ok());
        assert_eq!(msg.timestamp_us, 42);
        assert_eq!(msg.position_of("elbow"), Some(0.5));
        assert_eq!(msg.velocity_of("elbow"), Some(-0.1));
        assert_eq!(msg.name, driver.joint_names());
    }

    #[test]
    fn test_duplicate_driver_rejected() {
        let (context, _driver) = driver();
        let second = MockArmDriver::new(&context, MockArmConfig::default());
        assert!(matches!(second, Err(DriverError::Runtime(_))));
    }
}
