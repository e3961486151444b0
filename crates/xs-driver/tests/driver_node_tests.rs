//! 模拟驱动节点测试（在执行器上运行）

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use xs_driver::{MockArmConfig, MockArmDriver};
use xs_protocol::{
    JOINT_GROUP_COMMAND_TOPIC, JOINT_STATES_TOPIC, JointGroupCommand, JointState, OperatingMode,
    OperatingModesRequest, SET_OPERATING_MODES_SERVICE, TORQUE_ENABLE_SERVICE,
    TorqueEnableRequest,
};
use xs_runtime::{Context, Executor, MultiThreadedExecutor, NodeOptions};

fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_driver_serves_requests_on_executor() {
    let context = Context::init(["test"]).unwrap();
    let driver = MockArmDriver::new(
        &context,
        MockArmConfig::default().with_namespace("wx250s"),
    )
    .unwrap();
    let client_node = context
        .create_node("client", NodeOptions::default().namespace("wx250s"))
        .unwrap();

    let states = Arc::new(Mutex::new(Vec::<JointState>::new()));
    let sink = states.clone();
    let _sub = client_node
        .create_subscription(JOINT_STATES_TOPIC, 10, None, move |msg: JointState| {
            sink.lock().push(msg)
        })
        .unwrap();
    let modes = client_node
        .create_client::<OperatingModesRequest, ()>(SET_OPERATING_MODES_SERVICE)
        .unwrap();
    let torque = client_node
        .create_client::<TorqueEnableRequest, ()>(TORQUE_ENABLE_SERVICE)
        .unwrap();
    let commands = client_node
        .create_publisher::<JointGroupCommand>(JOINT_GROUP_COMMAND_TOPIC)
        .unwrap();
    assert_eq!(modes.service_name(), "/wx250s/set_operating_modes");
    assert!(modes.wait_for_service(Duration::from_millis(10)));

    let mut executor = MultiThreadedExecutor::with_threads(&context, 2).unwrap();
    executor.add_node(driver.node()).unwrap();
    executor.add_node(&client_node).unwrap();
    let handle = context.shutdown_handle();
    let spinner = thread::spawn(move || executor.spin());

    // 周期发布
    assert!(wait_until(Duration::from_secs(2), || states.lock().len() >= 3));
    {
        let states = states.lock();
        let first = &states[0];
        assert_eq!(first.name, driver.joint_names());
        assert!(first.validate().is_ok());
    }

    modes
        .call_timeout(
            OperatingModesRequest::group("arm", OperatingMode::Current),
            Duration::from_secs(1),
        )
        .unwrap();
    assert_eq!(driver.operating_mode("arm"), Some(OperatingMode::Current));

    torque
        .call_timeout(TorqueEnableRequest::group("arm", false), Duration::from_secs(1))
        .unwrap();
    assert_eq!(driver.torque_enabled("arm"), Some(false));

    commands.publish(&JointGroupCommand::new("arm", vec![12.0; 6]));
    assert!(wait_until(Duration::from_secs(1), || driver.commands_received() == 1));
    assert_eq!(driver.last_command().unwrap().cmd, vec![12.0; 6]);

    handle.request();
    spinner.join().unwrap().unwrap();
    assert!(driver.states_published() >= 3);
}

#[test]
fn test_on_demand_publish() {
    let context = Context::init(["test"]).unwrap();
    let driver = MockArmDriver::new(&context, MockArmConfig::default()).unwrap();
    let listener = context.create_node("listener", NodeOptions::default()).unwrap();
    let sub = listener
        .create_subscription(JOINT_STATES_TOPIC, 5, None, |_: JointState| {})
        .unwrap();

    driver.set_joint_state("shoulder", -0.4, 0.0);
    assert_eq!(driver.publish_joint_states(), 1);
    assert_eq!(sub.pending(), 1);
}

#[test]
fn test_slow_driver_times_out_callers() {
    let context = Context::init(["test"]).unwrap();
    let driver = MockArmDriver::new(
        &context,
        MockArmConfig::default().with_response_delay(Duration::from_millis(300)),
    )
    .unwrap();
    let client_node = context.create_node("client", NodeOptions::default()).unwrap();
    let torque = client_node
        .create_client::<TorqueEnableRequest, ()>(TORQUE_ENABLE_SERVICE)
        .unwrap();

    let mut executor = MultiThreadedExecutor::with_threads(&context, 2).unwrap();
    executor.add_node(driver.node()).unwrap();
    let handle = context.shutdown_handle();
    let spinner = thread::spawn(move || executor.spin());

    let result = torque.call_timeout(TorqueEnableRequest::group("arm", false), Duration::from_millis(20));
    assert!(matches!(result, Err(xs_runtime::RuntimeError::ServiceTimeout { .. })));

    handle.request();
    spinner.join().unwrap().unwrap();
}
