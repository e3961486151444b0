//! 重力补偿节点
//!
//! 订阅关节状态，计算每个关节的重力补偿电流，在开启时发布到关节组命令话题。
//! 开关服务切换驱动的工作模式：
//!
//! ```text
//! enable  = true : set_operating_modes(arm, current) → torque_enable(arm, on) → 开始发布
//! enable  = false: 停止发布 → set_operating_modes(arm, position)
//! ```
//!
//! 关节状态回调与开关服务位于不同的互斥回调组：开关服务阻塞等待驱动响应时，
//! 补偿计算不受影响（需要多线程执行器）。

use crate::compensator::Compensator;
use crate::error::{GravityCompensationError, NodeInitFailure};
use crate::params::GravityCompensationParams;
use arc_swap::ArcSwapOption;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use xs_dynamics::{MotorSpecs, load_chain};
use xs_protocol::{
    GRAVITY_COMPENSATION_ENABLE_SERVICE, JointGroupCommand, JointState, OperatingMode,
    OperatingModesRequest, SET_OPERATING_MODES_SERVICE, SetBoolRequest, SetBoolResponse,
    TORQUE_ENABLE_SERVICE, TorqueEnableRequest,
};
use xs_runtime::{
    CallbackGroupType, Client, Context, Logger, Node, NodeHandle, NodeOptions, Publisher,
    Service, Subscription,
};

/// 节点名
pub const NODE_NAME: &str = "gravity_compensation";

struct Shared {
    params: GravityCompensationParams,
    compensator: Compensator,
    logger: Logger,
    publisher: Publisher<JointGroupCommand>,
    modes_client: Client<OperatingModesRequest, ()>,
    torque_client: Client<TorqueEnableRequest, ()>,
    /// 发布开关；发布期间持有读锁，关闭时取写锁
    enabled: RwLock<bool>,
    /// 串行化开关请求
    switching: Mutex<()>,
    latest_command: ArcSwapOption<JointGroupCommand>,
    published: AtomicU64,
    skipped: AtomicU64,
    started_at: Instant,
}

impl Shared {
    fn on_joint_state(&self, msg: JointState) {
        let t = self.started_at.elapsed().as_secs_f64();
        let cmd = match self.compensator.compute(&msg, t) {
            Ok(cmd) => cmd,
            Err(e) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                self.logger.warn(format_args!("Skipping joint state: {e}"));
                return;
            },
        };

        let command = Arc::new(JointGroupCommand::new(&self.params.arm_group_name, cmd));
        {
            let enabled = self.enabled.read();
            if *enabled {
                self.publisher.publish(&command);
                self.published.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.latest_command.store(Some(command));
    }

    fn on_enable(&self, request: SetBoolRequest) -> SetBoolResponse {
        let _switching = self.switching.lock();
        let enable = request.data;
        let state = if enable { "enabled" } else { "disabled" };

        if *self.enabled.read() == enable {
            return SetBoolResponse::ok(format!("Gravity compensation is already {state}"));
        }

        let result = if enable {
            self.switch_on()
        } else {
            self.switch_off()
        };
        match result {
            Ok(()) => {
                self.logger.info(format_args!("Gravity compensation {state}"));
                SetBoolResponse::ok(format!("Gravity compensation {state}"))
            },
            Err(e) => {
                self.logger.error(format_args!(
                    "Failed to switch gravity compensation to {state}: {e}"
                ));
                SetBoolResponse::failed(e.to_string())
            },
        }
    }

    fn switch_on(&self) -> Result<(), GravityCompensationError> {
        let group = &self.params.arm_group_name;
        self.set_operating_mode(OperatingMode::Current)?;
        if let Err(e) = self.torque_client.call_timeout(
            TorqueEnableRequest::group(group.as_str(), true),
            self.params.service_timeout,
        ) {
            // 上电失败时不能停留在电流模式
            if let Err(restore) = self.set_operating_mode(OperatingMode::Position) {
                self.logger.error(format_args!(
                    "Failed to restore position mode after torque enable failed: {restore}"
                ));
            }
            return Err(e.into());
        }
        *self.enabled.write() = true;
        Ok(())
    }

    fn switch_off(&self) -> Result<(), GravityCompensationError> {
        // 写锁返回后不会再有命令发出，再切回位置模式
        *self.enabled.write() = false;
        if let Err(e) = self.set_operating_mode(OperatingMode::Position) {
            *self.enabled.write() = true;
            return Err(e);
        }
        Ok(())
    }

    fn set_operating_mode(&self, mode: OperatingMode) -> Result<(), GravityCompensationError> {
        self.modes_client.call_timeout(
            OperatingModesRequest::group(self.params.arm_group_name.as_str(), mode),
            self.params.service_timeout,
        )?;
        Ok(())
    }
}

/// 重力补偿节点
pub struct GravityCompensation {
    node: NodeHandle,
    shared: Arc<Shared>,
    _joint_state_sub: Subscription<JointState>,
    _enable_service: Service<SetBoolRequest, SetBoolResponse>,
}

impl GravityCompensation {
    /// 创建节点
    ///
    /// 声明参数、加载电机参数与机器人描述、等待驱动服务，然后创建话题和服务。
    ///
    /// # Errors
    ///
    /// 任一步骤失败时返回 `NodeInitFailure`，其中携带节点日志器与失败原因。
    pub fn new(context: &Context, options: NodeOptions) -> Result<Self, NodeInitFailure> {
        let node = context
            .create_node(NODE_NAME, options)
            .map_err(|e| NodeInitFailure::new(Logger::new(NODE_NAME), e))?;
        let logger = node.logger().clone();
        Self::build(node).map_err(|e| NodeInitFailure::new(logger, e))
    }

    fn build(node: NodeHandle) -> Result<Self, GravityCompensationError> {
        let logger = node.logger().clone();
        let params = GravityCompensationParams::declare(&node)?;

        let specs = MotorSpecs::load(&params.motor_specs)?;
        let chain = load_chain(&params.robot_description)?;
        let compensator = Compensator::new(chain, &specs, params.velocity_threshold)?;
        logger.info(format_args!(
            "Loaded {} joint(s) for group '{}': {:?}",
            compensator.joint_names().len(),
            params.arm_group_name,
            compensator.joint_names()
        ));

        let modes_client =
            node.create_client::<OperatingModesRequest, ()>(SET_OPERATING_MODES_SERVICE)?;
        let torque_client = node.create_client::<TorqueEnableRequest, ()>(TORQUE_ENABLE_SERVICE)?;
        // 两个服务共用同一个等待期限
        let deadline = Instant::now() + params.service_timeout;
        wait_for(&logger, modes_client.service_name(), params.service_timeout, || {
            modes_client.wait_for_service(deadline.saturating_duration_since(Instant::now()))
        })?;
        wait_for(&logger, torque_client.service_name(), params.service_timeout, || {
            torque_client.wait_for_service(deadline.saturating_duration_since(Instant::now()))
        })?;

        let publisher = node.create_publisher::<JointGroupCommand>(&params.joint_command_topic)?;
        let joint_state_topic = params.joint_state_topic.clone();

        let shared = Arc::new(Shared {
            params,
            compensator,
            logger: logger.clone(),
            publisher,
            modes_client,
            torque_client,
            enabled: RwLock::new(false),
            switching: Mutex::new(()),
            latest_command: ArcSwapOption::empty(),
            published: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            started_at: Instant::now(),
        });

        let state_group = node.create_callback_group(CallbackGroupType::MutuallyExclusive);
        let s = Arc::clone(&shared);
        let joint_state_sub = node.create_subscription(
            &joint_state_topic,
            1,
            Some(&state_group),
            move |msg: JointState| s.on_joint_state(msg),
        )?;

        let enable_group = node.create_callback_group(CallbackGroupType::MutuallyExclusive);
        let s = Arc::clone(&shared);
        let enable_service = node.create_service(
            GRAVITY_COMPENSATION_ENABLE_SERVICE,
            Some(&enable_group),
            move |request: SetBoolRequest| s.on_enable(request),
        )?;

        logger.info("Gravity compensation node initialized (disabled)");
        Ok(Self {
            node,
            shared,
            _joint_state_sub: joint_state_sub,
            _enable_service: enable_service,
        })
    }

    pub fn params(&self) -> &GravityCompensationParams {
        &self.shared.params
    }

    /// 受控关节（命令顺序）
    pub fn joint_names(&self) -> &[String] {
        self.shared.compensator.joint_names()
    }

    /// 是否正在发布补偿命令
    pub fn is_enabled(&self) -> bool {
        *self.shared.enabled.read()
    }

    /// 直接调用开关逻辑（与服务回调相同）
    pub fn set_enabled(&self, enable: bool) -> SetBoolResponse {
        self.shared.on_enable(SetBoolRequest { data: enable })
    }

    /// 最近一次计算出的命令（无论是否发布）
    pub fn latest_command(&self) -> Option<Arc<JointGroupCommand>> {
        self.shared.latest_command.load_full()
    }

    /// 已发布的命令数
    pub fn published_count(&self) -> u64 {
        self.shared.published.load(Ordering::Relaxed)
    }

    /// 因消息不完整而跳过的关节状态数
    pub fn skipped_count(&self) -> u64 {
        self.shared.skipped.load(Ordering::Relaxed)
    }
}

impl Node for GravityCompensation {
    fn node_handle(&self) -> &NodeHandle {
        &self.node
    }
}

fn wait_for(
    logger: &Logger,
    service: &str,
    timeout: Duration,
    wait: impl FnOnce() -> bool,
) -> Result<(), GravityCompensationError> {
    logger.debug(format_args!("Waiting for service '{service}'"));
    if wait() {
        Ok(())
    } else {
        Err(GravityCompensationError::ServiceUnavailable {
            service: service.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}
