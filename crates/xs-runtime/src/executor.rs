//! 执行器
//!
//! `MultiThreadedExecutor` 启动 N 个工作线程，每个线程在以下来源上 `select`：
//!
//! - 关闭信号（请求关闭后立即退出）
//! - 各节点的就绪队列（订阅消息、服务请求）
//! - 各节点定时器的 tick 通道
//!
//! 回调的并发规则由回调组决定，执行器本身不做额外串行化。

use crate::context::{Context, ShutdownHandle};
use crate::error::{Result, RuntimeError};
use crate::node::NodeHandle;
use crate::callback_group::Work;
use crate::timer::TimerInner;
use crossbeam_channel::{Receiver, Select};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

/// 回调执行器
pub trait Executor {
    /// 注册节点（必须在 `spin` 之前）
    fn add_node(&mut self, node: &NodeHandle) -> Result<()>;

    /// 阻塞执行回调，直到运行时请求关闭
    fn spin(&mut self) -> Result<()>;
}

enum Source {
    Ready(Receiver<Work>),
    Timer {
        tick: Receiver<Instant>,
        timer: Weak<TimerInner>,
    },
}

/// 默认工作线程数下限
///
/// 阻塞等待服务响应的回调需要另一个线程执行服务端回调。
pub const MIN_DEFAULT_THREADS: usize = 2;

/// 多线程执行器
pub struct MultiThreadedExecutor {
    shutdown: ShutdownHandle,
    threads: usize,
    nodes: Vec<NodeHandle>,
}

impl MultiThreadedExecutor {
    /// 使用 CPU 核数作为工作线程数（不少于 [`MIN_DEFAULT_THREADS`]）
    pub fn new(context: &Context) -> Self {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(MIN_DEFAULT_THREADS)
            .max(MIN_DEFAULT_THREADS);
        Self {
            shutdown: context.shutdown_handle(),
            threads,
            nodes: Vec::new(),
        }
    }

    /// 指定工作线程数（至少 1）
    pub fn with_threads(context: &Context, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(RuntimeError::InvalidArgument(
                "executor needs at least one worker thread".to_string(),
            ));
        }
        Ok(Self {
            shutdown: context.shutdown_handle(),
            threads,
            nodes: Vec::new(),
        })
    }

    pub fn number_of_threads(&self) -> usize {
        self.threads
    }

    fn collect_sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        for node in &self.nodes {
            sources.push(Source::Ready(node.ready_receiver()));
            for timer in node.live_timers() {
                sources.push(Source::Timer {
                    tick: crossbeam_channel::tick(timer.period()),
                    timer: Arc::downgrade(&timer),
                });
            }
        }
        sources
    }
}

impl Executor for MultiThreadedExecutor {
    fn add_node(&mut self, node: &NodeHandle) -> Result<()> {
        if self.nodes.iter().any(|n| n.same_node(node)) {
            return Err(RuntimeError::NodeAlreadyAdded(
                node.fully_qualified_name().to_string(),
            ));
        }
        debug!("Executor: added node '{}'", node.fully_qualified_name());
        self.nodes.push(node.clone());
        Ok(())
    }

    fn spin(&mut self) -> Result<()> {
        if self.shutdown.is_requested() {
            return Ok(());
        }

        let sources = self.collect_sources();
        let shutdown_rx = self.shutdown.receiver();
        info!(
            "Executor spinning with {} worker thread(s), {} node(s)",
            self.threads,
            self.nodes.len()
        );

        let shutdown = &self.shutdown;
        let sources = &sources;
        let shutdown_rx = &shutdown_rx;

        let panics = thread::scope(|scope| -> Result<Vec<String>> {
            let mut workers = Vec::with_capacity(self.threads);
            for index in 0..self.threads {
                let spawned = thread::Builder::new()
                    .name(format!("xs-executor-{index}"))
                    .spawn_scoped(scope, move || worker_loop(sources, shutdown_rx, shutdown));
                match spawned {
                    Ok(handle) => workers.push(handle),
                    Err(e) => {
                        // 已启动的工作线程需要退出，scope 才能结束
                        shutdown.request();
                        return Err(RuntimeError::Io(e));
                    },
                }
            }

            Ok(workers
                .into_iter()
                .filter_map(|worker| worker.join().err())
                .map(|payload| panic_message(payload.as_ref()))
                .collect())
        })?;

        if let Some(message) = panics.into_iter().next() {
            error!("Executor worker panicked: {}", message);
            return Err(RuntimeError::WorkerPanicked(message));
        }

        info!("Executor stopped");
        Ok(())
    }
}

/// 工作线程 panic 时请求关闭，让其他工作线程退出
struct PanicGuard<'a>(&'a ShutdownHandle);

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.request();
        }
    }
}

fn worker_loop(sources: &[Source], shutdown_rx: &Receiver<()>, shutdown: &ShutdownHandle) {
    let _guard = PanicGuard(shutdown);

    let mut select = Select::new();
    let shutdown_index = select.recv(shutdown_rx);
    // Select 索引 → sources 索引
    let mut index_map = vec![usize::MAX; sources.len() + 1];
    for (i, source) in sources.iter().enumerate() {
        let index = match source {
            Source::Ready(rx) => select.recv(rx),
            Source::Timer { tick, .. } => select.recv(tick),
        };
        if index >= index_map.len() {
            index_map.resize(index + 1, usize::MAX);
        }
        index_map[index] = i;
    }

    loop {
        let op = select.select();
        let index = op.index();
        if index == shutdown_index {
            let _ = op.recv(shutdown_rx);
            return;
        }

        match &sources[index_map[index]] {
            Source::Ready(rx) => match op.recv(rx) {
                Ok(work) => work.run(),
                // 节点已销毁
                Err(_) => select.remove(index),
            },
            Source::Timer { tick, timer } => {
                if op.recv(tick).is_ok() {
                    match timer.upgrade() {
                        Some(timer) => timer.fire(),
                        None => select.remove(index),
                    }
                }
            },
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
