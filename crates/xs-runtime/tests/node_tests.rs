//! 节点测试：参数优先级、名称重映射、话题/服务注册规则

use std::io::Write;
use std::time::Duration;
use xs_runtime::{Context, NodeOptions, ParameterValue, RuntimeError};

fn params_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_parameter_default_when_no_override() {
    let context = Context::init(["test"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();

    assert_eq!(node.declare_parameter("rate", 100_i64).unwrap(), 100);
    assert_eq!(
        node.declare_parameter("group", "arm".to_string()).unwrap(),
        "arm"
    );
    assert_eq!(
        node.get_parameter("rate"),
        Some(ParameterValue::Integer(100))
    );
    assert_eq!(node.parameter_names(), vec!["group", "rate"]);
}

#[test]
fn test_parameter_priority_chain() {
    let file = params_file(
        r#"
["/**"]
a = 1.0
b = 1.0
c = 1.0
d = 1.0

[node]
b = 2.0
c = 2.0
d = 2.0
"#,
    );
    let path = file.path().to_str().unwrap();
    let context = Context::init([
        "test",
        "--runtime-args",
        "--params-file",
        path,
        "-p",
        "c:=3.0",
        "-p",
        "d:=3.0",
        "-p",
        "node:d:=4.0",
        "--",
    ])
    .unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();

    assert_eq!(node.declare_parameter("a", 0.0).unwrap(), 1.0);
    assert_eq!(node.declare_parameter("b", 0.0).unwrap(), 2.0);
    assert_eq!(node.declare_parameter("c", 0.0).unwrap(), 3.0);
    assert_eq!(node.declare_parameter("d", 0.0).unwrap(), 4.0);
    assert_eq!(node.declare_parameter("e", 0.0).unwrap(), 0.0);
}

#[test]
fn test_node_options_override_wins() {
    let context = Context::init(["test", "--runtime-args", "-p", "rate:=10"]).unwrap();
    let options = NodeOptions::default().parameter_override("rate", ParameterValue::Integer(20));
    let node = context.create_node("node", options).unwrap();
    assert_eq!(node.declare_parameter("rate", 0_i64).unwrap(), 20);
}

#[test]
fn test_node_scoped_override_ignores_other_nodes() {
    let context = Context::init(["test", "--runtime-args", "-p", "other:rate:=10"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();
    assert_eq!(node.declare_parameter("rate", 1_i64).unwrap(), 1);
}

#[test]
fn test_global_arguments_can_be_disabled() {
    let context = Context::init(["test", "--runtime-args", "-p", "rate:=10"]).unwrap();
    let node = context
        .create_node("node", NodeOptions::default().use_global_arguments(false))
        .unwrap();
    assert_eq!(node.declare_parameter("rate", 1_i64).unwrap(), 1);
}

#[test]
fn test_parameter_type_errors() {
    let context = Context::init(["test", "--runtime-args", "-p", "name:=true"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();

    let err = node.declare_parameter("name", String::new()).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::ParameterType { expected: "string", actual: "bool", .. }
    ));

    node.declare_parameter("threshold", 0.01).unwrap();
    assert!(matches!(
        node.declare_parameter("threshold", 0.02),
        Err(RuntimeError::ParameterAlreadyDeclared(_))
    ));
    assert!(matches!(
        node.set_parameter("threshold", ParameterValue::Bool(false)),
        Err(RuntimeError::ParameterType { .. })
    ));
    node.set_parameter("threshold", ParameterValue::Double(0.5)).unwrap();
    assert_eq!(
        node.get_parameter("threshold"),
        Some(ParameterValue::Double(0.5))
    );
    assert!(matches!(
        node.set_parameter("missing", ParameterValue::Bool(true)),
        Err(RuntimeError::ParameterNotDeclared(_))
    ));
}

#[test]
fn test_integer_override_accepted_for_double() {
    let context = Context::init(["test", "--runtime-args", "-p", "timeout:=5"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();
    assert_eq!(node.declare_parameter("timeout", 1.0).unwrap(), 5.0);
}

#[test]
fn test_node_name_and_namespace_remap() {
    let context = Context::init([
        "test",
        "--runtime-args",
        "-r",
        "__node:=renamed",
        "-r",
        "__ns:=/robot",
    ])
    .unwrap();
    let node = context.create_node("original", NodeOptions::default()).unwrap();
    assert_eq!(node.name(), "renamed");
    assert_eq!(node.namespace(), "/robot");
    assert_eq!(node.fully_qualified_name(), "/robot/renamed");
    assert_eq!(node.logger().name(), "robot.renamed");
}

#[test]
fn test_topic_remap_applies_to_publishers_and_subscriptions() {
    let context = Context::init([
        "test",
        "--runtime-args",
        "-r",
        "listener:input:=/shared",
        "-r",
        "output:=/shared",
    ])
    .unwrap();
    let talker = context.create_node("talker", NodeOptions::default()).unwrap();
    let listener = context.create_node("listener", NodeOptions::default()).unwrap();

    let publisher = talker.create_publisher::<u8>("output").unwrap();
    let _sub = listener.create_subscription("input", 1, None, |_: u8| {}).unwrap();
    assert_eq!(publisher.topic_name(), "/shared");
    assert_eq!(publisher.subscription_count(), 1);

    // 节点限定的重映射不影响其他节点
    assert_eq!(talker.resolve_name("input").unwrap(), "/input");
}

#[test]
fn test_private_names_resolve_under_node() {
    let context = Context::init(["test"]).unwrap();
    let node = context
        .create_node("driver", NodeOptions::default().namespace("arm"))
        .unwrap();
    assert_eq!(node.resolve_name("~/status").unwrap(), "/arm/driver/status");
    assert_eq!(node.resolve_name("joint_states").unwrap(), "/arm/joint_states");
    assert_eq!(node.resolve_name("/global").unwrap(), "/global");
}

#[test]
fn test_invalid_node_name_rejected() {
    let context = Context::init(["test"]).unwrap();
    assert!(matches!(
        context.create_node("bad name", NodeOptions::default()),
        Err(RuntimeError::InvalidName { .. })
    ));
    assert!(context.create_node("", NodeOptions::default()).is_err());
}

#[test]
fn test_topic_type_mismatch() {
    let context = Context::init(["test"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();
    let _publisher = node.create_publisher::<u32>("data").unwrap();
    assert!(matches!(
        node.create_publisher::<String>("data"),
        Err(RuntimeError::TypeMismatch { .. })
    ));
}

#[test]
fn test_duplicate_service_and_reregistration() {
    let context = Context::init(["test"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();

    let service = node.create_service("echo", None, |x: u8| x).unwrap();
    assert_eq!(service.service_name(), "/echo");
    assert!(matches!(
        node.create_service("echo", None, |x: u8| x),
        Err(RuntimeError::DuplicateService(_))
    ));
    assert_eq!(node.service_names(), vec!["/echo"]);

    drop(service);
    assert!(node.service_names().is_empty());
    assert!(node.create_service("echo", None, |x: u8| x).is_ok());
}

#[test]
fn test_client_without_server() {
    let context = Context::init(["test"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();
    let client = node.create_client::<u8, u8>("nobody").unwrap();

    assert!(!client.service_is_ready());
    assert!(!client.wait_for_service(Duration::from_millis(30)));
    assert!(matches!(
        client.call(1),
        Err(RuntimeError::ServiceUnavailable(_))
    ));
}

#[test]
fn test_wait_for_service_aborts_on_shutdown() {
    let context = Context::init(["test"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();
    let client = node.create_client::<u8, u8>("nobody").unwrap();

    context.shutdown_handle().request();
    let started = std::time::Instant::now();
    assert!(!client.wait_for_service(Duration::from_secs(5)));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_pending_call_dropped_with_server() {
    let context = Context::init(["test"]).unwrap();
    let node = context.create_node("node", NodeOptions::default()).unwrap();
    let service = node.create_service("echo", None, |x: u8| x).unwrap();
    let client = node.create_client::<u8, u8>("echo").unwrap();

    let pending = client.call(7).unwrap();
    assert!(pending.try_take().is_none());
    drop(service);
    drop(node);

    // 请求仍在就绪队列中，但服务端已下线
    let err = pending.wait_timeout(Duration::from_millis(50)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::ServiceTimeout { .. } | RuntimeError::ServiceDropped(_)
    ));
}
