//! 服务：请求/响应
//!
//! 客户端调用时，请求被封装为执行任务投递到服务端节点的就绪队列，
//! 在服务的回调组内执行，响应通过一次性通道返回。

use crate::callback_group::{CallbackGroup, Work};
use crate::context::ContextShared;
use crate::error::{Result, RuntimeError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// 服务端实现
pub(crate) struct ServiceInner<Req, Resp> {
    name: String,
    callback: Box<dyn Fn(Req) -> Resp + Send + Sync>,
    group: Arc<CallbackGroup>,
    ready: Sender<Work>,
    handled: AtomicU64,
}

/// 图中保存的服务端弱引用
pub(crate) struct ServiceSlot<Req, Resp> {
    server: Weak<ServiceInner<Req, Resp>>,
}

impl<Req, Resp> ServiceSlot<Req, Resp> {
    pub(crate) fn new(server: Weak<ServiceInner<Req, Resp>>) -> Self {
        Self { server }
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<ServiceInner<Req, Resp>>> {
        self.server.upgrade()
    }
}

/// 服务端句柄
///
/// 句柄被丢弃后服务下线，同名服务可以重新注册。
pub struct Service<Req, Resp> {
    inner: Arc<ServiceInner<Req, Resp>>,
}

impl<Req, Resp> Service<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub(crate) fn register(
        shared: &ContextShared,
        name: String,
        group: Arc<CallbackGroup>,
        ready: Sender<Work>,
        callback: Box<dyn Fn(Req) -> Resp + Send + Sync>,
    ) -> Result<Self> {
        let inner = Arc::new(ServiceInner {
            name,
            callback,
            group,
            ready,
            handled: AtomicU64::new(0),
        });
        shared.graph.register_service(&inner.name, &inner)?;
        debug!("Service '{}' registered", inner.name);
        Ok(Self { inner })
    }

    pub fn service_name(&self) -> &str {
        &self.inner.name
    }

    /// 已处理的请求数
    pub fn handled_count(&self) -> u64 {
        self.inner.handled.load(Ordering::Relaxed)
    }
}

/// 服务客户端
pub struct Client<Req, Resp> {
    name: String,
    shared: Arc<ContextShared>,
    _marker: std::marker::PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> Clone for Client<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shared: Arc::clone(&self.shared),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<Req, Resp> Client<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub(crate) fn new(shared: Arc<ContextShared>, name: String) -> Self {
        Self {
            name,
            shared,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.name
    }

    /// 服务端是否存在
    pub fn service_is_ready(&self) -> bool {
        matches!(self.shared.graph.service::<Req, Resp>(&self.name), Ok(Some(_)))
    }

    /// 等待服务端上线
    ///
    /// 返回 `false` 表示超时或运行时已请求关闭。
    pub fn wait_for_service(&self, timeout: Duration) -> bool {
        const POLL_INTERVAL: Duration = Duration::from_millis(10);
        let deadline = Instant::now() + timeout;
        loop {
            if self.service_is_ready() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if self.shared.shutdown.wait_timeout(POLL_INTERVAL.min(deadline - now)) {
                return false;
            }
        }
    }

    /// 发起异步调用
    pub fn call(&self, request: Req) -> Result<PendingResponse<Resp>> {
        let server = self
            .shared
            .graph
            .service::<Req, Resp>(&self.name)?
            .ok_or_else(|| RuntimeError::ServiceUnavailable(self.name.clone()))?;

        let (tx, rx) = crossbeam_channel::bounded(1);
        let handler = Arc::downgrade(&server);
        let work = Work::new(Arc::clone(&server.group), move || {
            // 服务端已下线：丢弃 tx，调用方得到 ServiceDropped
            let Some(handler) = handler.upgrade() else {
                return;
            };
            let response = (handler.callback)(request);
            handler.handled.fetch_add(1, Ordering::Relaxed);
            let _ = tx.send(response);
        });
        server
            .ready
            .send(work)
            .map_err(|_| RuntimeError::ServiceUnavailable(self.name.clone()))?;

        Ok(PendingResponse {
            name: self.name.clone(),
            rx,
        })
    }

    /// 同步调用（等待响应直到超时）
    pub fn call_timeout(&self, request: Req, timeout: Duration) -> Result<Resp> {
        self.call(request)?.wait_timeout(timeout)
    }
}

/// 未完成的服务调用
pub struct PendingResponse<Resp> {
    name: String,
    rx: Receiver<Resp>,
}

impl<Resp> PendingResponse<Resp> {
    /// 等待响应
    pub fn wait_timeout(self, timeout: Duration) -> Result<Resp> {
        match self.rx.recv_timeout(timeout) {
            Ok(response) => Ok(response),
            Err(RecvTimeoutError::Timeout) => Err(RuntimeError::ServiceTimeout {
                name: self.name,
                timeout_ms: timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(RuntimeError::ServiceDropped(self.name)),
        }
    }

    /// 非阻塞检查响应
    pub fn try_take(&self) -> Option<Resp> {
        self.rx.try_recv().ok()
    }
}
