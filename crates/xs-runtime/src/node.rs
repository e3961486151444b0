//! 节点
//!
//! `NodeHandle` 是节点的运行时部分：名称、日志器、回调组、参数，
//! 以及就绪队列（订阅消息和服务请求在这里排队，等待执行器处理）。
//! 句柄可廉价克隆，所有克隆共享同一节点。

use crate::callback_group::{CallbackGroup, CallbackGroupType, Work};
use crate::context::ContextShared;
use crate::error::{Result, RuntimeError};
use crate::graph::Message;
use crate::logging::Logger;
use crate::names;
use crate::params::{ParameterType, ParameterValue};
use crate::service::{Client, Service};
use crate::timer::{Timer, TimerInner};
use crate::topic::{Publisher, Subscription};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// 节点创建选项
#[derive(Debug, Clone)]
pub struct NodeOptions {
    /// 命名空间（空串表示根）
    pub namespace: String,
    /// 参数覆盖（优先级最高）
    pub parameter_overrides: Vec<(String, ParameterValue)>,
    /// 是否应用命令行的重映射与参数覆盖
    pub use_global_arguments: bool,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            parameter_overrides: Vec::new(),
            use_global_arguments: true,
        }
    }
}

impl NodeOptions {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn parameter_override(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.parameter_overrides.push((name.into(), value));
        self
    }

    pub fn use_global_arguments(mut self, enabled: bool) -> Self {
        self.use_global_arguments = enabled;
        self
    }
}

/// 由执行器驱动的节点
pub trait Node: Send + Sync {
    fn node_handle(&self) -> &NodeHandle;

    fn logger(&self) -> &Logger {
        self.node_handle().logger()
    }
}

pub(crate) struct NodeInner {
    name: String,
    namespace: String,
    fqn: String,
    logger: Logger,
    options: NodeOptions,
    shared: Arc<ContextShared>,
    ready_tx: Sender<Work>,
    ready_rx: Receiver<Work>,
    default_group: Arc<CallbackGroup>,
    timers: Mutex<Vec<Weak<TimerInner>>>,
    parameters: RwLock<BTreeMap<String, ParameterValue>>,
}

/// 节点句柄
#[derive(Clone)]
pub struct NodeHandle {
    inner: Arc<NodeInner>,
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle").field("name", &self.inner.fqn).finish()
    }
}

impl NodeHandle {
    pub(crate) fn new(
        shared: Arc<ContextShared>,
        name: String,
        namespace: String,
        options: NodeOptions,
    ) -> Result<Self> {
        let fqn = names::fully_qualified_name(&namespace, &name);
        let (ready_tx, ready_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            inner: Arc::new(NodeInner {
                logger: Logger::for_node(&fqn),
                name,
                namespace,
                fqn,
                options,
                shared,
                ready_tx,
                ready_rx,
                default_group: Arc::new(CallbackGroup::new(CallbackGroupType::MutuallyExclusive)),
                timers: Mutex::new(Vec::new()),
                parameters: RwLock::new(BTreeMap::new()),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.inner.fqn
    }

    pub fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    /// 两个句柄是否指向同一节点
    pub fn same_node(&self, other: &NodeHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn default_callback_group(&self) -> Arc<CallbackGroup> {
        Arc::clone(&self.inner.default_group)
    }

    pub fn create_callback_group(&self, kind: CallbackGroupType) -> Arc<CallbackGroup> {
        Arc::new(CallbackGroup::new(kind))
    }

    /// 解析话题/服务名并应用重映射
    pub fn resolve_name(&self, name: &str) -> Result<String> {
        let resolved = names::resolve(&self.inner.namespace, &self.inner.name, name)?;
        if !self.inner.options.use_global_arguments {
            return Ok(resolved);
        }
        for remap in self.inner.shared.args.remaps.iter().rev() {
            if remap.is_special() || !remap.applies_to(&self.inner.name) {
                continue;
            }
            let from = names::resolve(&self.inner.namespace, &self.inner.name, &remap.from)?;
            if from == resolved {
                return names::resolve(&self.inner.namespace, &self.inner.name, &remap.to);
            }
        }
        Ok(resolved)
    }

    pub fn create_publisher<T: Message>(&self, topic: &str) -> Result<Publisher<T>> {
        let name = self.resolve_name(topic)?;
        let entry = self.inner.shared.graph.topic::<T>(&name)?;
        Ok(Publisher::new(entry))
    }

    /// 创建订阅
    ///
    /// `depth` 为保留的最近消息数（至少 1）；`group` 为 `None` 时使用节点默认组。
    pub fn create_subscription<T, F>(
        &self,
        topic: &str,
        depth: usize,
        group: Option<&Arc<CallbackGroup>>,
        callback: F,
    ) -> Result<Subscription<T>>
    where
        T: Message,
        F: Fn(T) + Send + Sync + 'static,
    {
        let name = self.resolve_name(topic)?;
        let entry = self.inner.shared.graph.topic::<T>(&name)?;
        Ok(Subscription::new(
            &entry,
            depth,
            self.group_or_default(group),
            self.inner.ready_tx.clone(),
            Box::new(callback),
        ))
    }

    pub fn create_service<Req, Resp, F>(
        &self,
        service: &str,
        group: Option<&Arc<CallbackGroup>>,
        callback: F,
    ) -> Result<Service<Req, Resp>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        F: Fn(Req) -> Resp + Send + Sync + 'static,
    {
        let name = self.resolve_name(service)?;
        Service::register(
            &self.inner.shared,
            name,
            self.group_or_default(group),
            self.inner.ready_tx.clone(),
            Box::new(callback),
        )
    }

    pub fn create_client<Req, Resp>(&self, service: &str) -> Result<Client<Req, Resp>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let name = self.resolve_name(service)?;
        Ok(Client::new(Arc::clone(&self.inner.shared), name))
    }

    /// 创建周期定时器
    pub fn create_timer<F>(
        &self,
        period: Duration,
        group: Option<&Arc<CallbackGroup>>,
        callback: F,
    ) -> Result<Timer>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if period.is_zero() {
            return Err(RuntimeError::InvalidArgument(
                "timer period must be greater than zero".to_string(),
            ));
        }
        let timer = Timer::new(period, self.group_or_default(group), Box::new(callback));
        let mut timers = self.inner.timers.lock();
        timers.retain(|t| t.strong_count() > 0);
        timers.push(Arc::downgrade(timer.inner()));
        Ok(timer)
    }

    /// 声明参数，返回生效值
    pub fn declare_parameter<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: ParameterType,
    {
        let mut parameters = self.inner.parameters.write();
        if parameters.contains_key(name) {
            return Err(RuntimeError::ParameterAlreadyDeclared(name.to_string()));
        }

        let value = match self.parameter_override(name) {
            Some(value) => T::from_value(&value).ok_or_else(|| RuntimeError::ParameterType {
                name: name.to_string(),
                expected: T::TYPE_NAME,
                actual: value.type_name(),
            })?,
            None => default,
        };
        let value = value.into_value();
        let typed = T::from_value(&value).ok_or_else(|| RuntimeError::ParameterType {
            name: name.to_string(),
            expected: T::TYPE_NAME,
            actual: value.type_name(),
        })?;
        self.inner.logger.debug(format_args!("Parameter '{name}' = {value}"));
        parameters.insert(name.to_string(), value);
        Ok(typed)
    }

    pub fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        self.inner.parameters.read().get(name).cloned()
    }

    /// 修改已声明参数（类型必须一致）
    pub fn set_parameter(&self, name: &str, value: ParameterValue) -> Result<()> {
        let mut parameters = self.inner.parameters.write();
        let current = parameters
            .get_mut(name)
            .ok_or_else(|| RuntimeError::ParameterNotDeclared(name.to_string()))?;
        if std::mem::discriminant(current) != std::mem::discriminant(&value) {
            return Err(RuntimeError::ParameterType {
                name: name.to_string(),
                expected: current.type_name(),
                actual: value.type_name(),
            });
        }
        *current = value;
        Ok(())
    }

    /// 已声明参数名
    pub fn parameter_names(&self) -> Vec<String> {
        self.inner.parameters.read().keys().cloned().collect()
    }

    /// 进程内已知话题
    pub fn topic_names(&self) -> Vec<String> {
        self.inner.shared.graph.topic_names()
    }

    /// 进程内存活服务
    pub fn service_names(&self) -> Vec<String> {
        self.inner.shared.graph.service_names()
    }

    pub(crate) fn ready_receiver(&self) -> Receiver<Work> {
        self.inner.ready_rx.clone()
    }

    pub(crate) fn live_timers(&self) -> Vec<Arc<TimerInner>> {
        self.inner.timers.lock().iter().filter_map(Weak::upgrade).collect()
    }

    fn group_or_default(&self, group: Option<&Arc<CallbackGroup>>) -> Arc<CallbackGroup> {
        group.map_or_else(|| self.default_callback_group(), Arc::clone)
    }

    fn parameter_override(&self, name: &str) -> Option<ParameterValue> {
        let inner = &self.inner;
        inner
            .options
            .parameter_overrides
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .or_else(|| {
                inner
                    .options
                    .use_global_arguments
                    .then(|| inner.shared.parameter_override(&inner.name, &inner.fqn, name))
                    .flatten()
            })
    }
}

impl Node for NodeHandle {
    fn node_handle(&self) -> &NodeHandle {
        self
    }
}
