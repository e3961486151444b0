//! 运行时上下文
//!
//! 每个进程初始化一次。`Context` 拥有进程级资源（通信图、参数覆盖、关闭信号），
//! 通过 `shutdown(self)` 消耗自身完成关闭；忘记调用时由 `Drop` 兜底，
//! 关闭回调在任何路径上都恰好执行一次。

use crate::args::RuntimeArgs;
use crate::error::{Result, RuntimeError};
use crate::graph::Graph;
use crate::names;
use crate::node::{NodeHandle, NodeOptions};
use crate::params::{ParameterValue, ParamsFile};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

type ShutdownCallback = Box<dyn FnOnce() + Send>;

/// 关闭请求句柄（可克隆，跨线程使用）
///
/// 请求关闭时丢弃内部 Sender，所有 `receiver()` 立即返回 `Disconnected`，
/// 因此可以直接参与 `crossbeam_channel::Select`。
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

struct ShutdownInner {
    requested: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl ShutdownHandle {
    fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(ShutdownInner {
                requested: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
                signal: rx,
            }),
        }
    }

    /// 请求关闭（幂等）
    pub fn request(&self) {
        if !self.inner.requested.swap(true, Ordering::AcqRel) {
            drop(self.inner.trigger.lock().take());
            debug!("Shutdown requested");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }

    /// 关闭信号接收端（关闭后 `recv` 返回 `Err`）
    pub fn receiver(&self) -> Receiver<()> {
        self.inner.signal.clone()
    }

    /// 等待关闭请求，返回 `true` 表示已请求关闭
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        !matches!(
            self.inner.signal.recv_timeout(timeout),
            Err(RecvTimeoutError::Timeout)
        )
    }
}

impl std::fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("requested", &self.is_requested())
            .finish()
    }
}

/// 节点共享的上下文部分
pub(crate) struct ContextShared {
    pub(crate) args: RuntimeArgs,
    pub(crate) params_files: Vec<ParamsFile>,
    pub(crate) graph: Graph,
    pub(crate) shutdown: ShutdownHandle,
    pub(crate) started_at: Instant,
}

impl ContextShared {
    /// 查找参数覆盖值（命令行优先于参数文件，后出现的优先）
    pub(crate) fn parameter_override(
        &self,
        node_name: &str,
        fqn: &str,
        param: &str,
    ) -> Option<ParameterValue> {
        let overrides = &self.args.parameter_overrides;
        overrides
            .iter()
            .rev()
            .find(|o| o.name == param && o.node.as_deref() == Some(node_name))
            .or_else(|| {
                overrides.iter().rev().find(|o| o.name == param && o.node.is_none())
            })
            .map(|o| o.value.clone())
            .or_else(|| {
                self.params_files
                    .iter()
                    .rev()
                    .find_map(|file| file.lookup(node_name, fqn, param))
                    .cloned()
            })
    }
}

/// 运行时上下文
pub struct Context {
    shared: Arc<ContextShared>,
    app_args: Vec<String>,
    on_shutdown: Mutex<Vec<ShutdownCallback>>,
    shut_down: AtomicBool,
}

impl Context {
    /// 使用进程参数初始化运行时
    ///
    /// # 示例
    ///
    /// ```
    /// use xs_runtime::Context;
    ///
    /// let context = Context::init(["prog", "--runtime-args", "-p", "rate:=10"]).unwrap();
    /// assert_eq!(context.application_args(), ["prog"]);
    /// context.shutdown();
    /// ```
    pub fn init<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (app_args, runtime_args) = RuntimeArgs::split(args)?;
        let params_files = runtime_args
            .params_files
            .iter()
            .map(|path| ParamsFile::load(path))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Runtime initialized: {} parameter override(s), {} params file(s), {} remap(s)",
            runtime_args.parameter_overrides.len(),
            params_files.len(),
            runtime_args.remaps.len()
        );

        Ok(Self {
            shared: Arc::new(ContextShared {
                args: runtime_args,
                params_files,
                graph: Graph::default(),
                shutdown: ShutdownHandle::new(),
                started_at: Instant::now(),
            }),
            app_args,
            on_shutdown: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// 未被运行时消费的参数（第一个元素为程序名）
    pub fn application_args(&self) -> &[String] {
        &self.app_args
    }

    /// `--log-level` 指定的日志级别
    pub fn log_level(&self) -> Option<&str> {
        self.shared.args.log_level.as_deref()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shared.shutdown.clone()
    }

    /// 运行时是否仍在运行（未请求关闭）
    pub fn ok(&self) -> bool {
        !self.shared.shutdown.is_requested()
    }

    /// 自初始化以来的时间
    pub fn elapsed(&self) -> Duration {
        self.shared.started_at.elapsed()
    }

    /// 注册 SIGINT/SIGTERM 处理器：收到信号时请求关闭
    ///
    /// 每个进程只能注册一次。
    pub fn install_signal_handler(&self) -> Result<()> {
        let handle = self.shutdown_handle();
        ctrlc::set_handler(move || {
            info!("Received interrupt signal. Shutting down...");
            handle.request();
        })
        .map_err(|e| RuntimeError::SignalHandler(e.to_string()))
    }

    /// 注册关闭回调（在 `shutdown` 时按注册顺序执行）
    pub fn on_shutdown(&self, callback: impl FnOnce() + Send + 'static) {
        self.on_shutdown.lock().push(Box::new(callback));
    }

    /// 创建节点
    ///
    /// 节点名与命名空间会先应用 `__node` / `__ns` 重映射。
    pub fn create_node(&self, name: &str, options: NodeOptions) -> Result<NodeHandle> {
        names::validate_node_name(name)?;

        let (node_name, namespace) = if options.use_global_arguments {
            let node_name = self.shared.args.node_name_remap(name).unwrap_or(name).to_string();
            let namespace = self
                .shared
                .args
                .namespace_remap(name)
                .map(str::to_string)
                .unwrap_or_else(|| options.namespace.clone());
            (node_name, namespace)
        } else {
            (name.to_string(), options.namespace.clone())
        };
        names::validate_node_name(&node_name)?;
        let namespace = names::normalize_namespace(&namespace)?;

        NodeHandle::new(Arc::clone(&self.shared), node_name, namespace, options)
    }

    /// 关闭运行时
    ///
    /// 请求关闭（唤醒所有执行器），并执行关闭回调。
    pub fn shutdown(self) {
        self.shutdown_once();
    }

    fn shutdown_once(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.shutdown.request();
        let callbacks = std::mem::take(&mut *self.on_shutdown.lock());
        for callback in callbacks {
            callback();
        }
        info!("Runtime shut down");
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.shutdown_once();
    }
}
