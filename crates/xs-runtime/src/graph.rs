//! 进程内通信图：话题与服务的注册表

use crate::error::{Result, RuntimeError};
use crate::service::{ServiceInner, ServiceSlot};
use crate::topic::TopicEntry;
use parking_lot::Mutex;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// 可在话题上传输的消息
pub trait Message: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Message for T {}

struct RegisteredTopic {
    type_name: &'static str,
    entry: Arc<dyn Any + Send + Sync>,
}

struct RegisteredService {
    type_name: String,
    entry: Arc<dyn Any + Send + Sync>,
    alive: Box<dyn Fn() -> bool + Send>,
}

/// 话题与服务注册表
#[derive(Default)]
pub(crate) struct Graph {
    topics: Mutex<HashMap<String, RegisteredTopic>>,
    services: Mutex<HashMap<String, RegisteredService>>,
}

impl Graph {
    /// 获取（或创建）话题
    pub(crate) fn topic<T: Message>(&self, name: &str) -> Result<Arc<TopicEntry<T>>> {
        let mut topics = self.topics.lock();
        let registered = topics.entry(name.to_string()).or_insert_with(|| RegisteredTopic {
            type_name: type_name::<T>(),
            entry: Arc::new(TopicEntry::<T>::new(name)),
        });
        Arc::clone(&registered.entry)
            .downcast::<TopicEntry<T>>()
            .map_err(|_| RuntimeError::TypeMismatch {
                name: name.to_string(),
                registered: registered.type_name.to_string(),
                requested: type_name::<T>().to_string(),
            })
    }

    /// 注册服务端（同名服务端仍存活时失败）
    pub(crate) fn register_service<Req, Resp>(
        &self,
        name: &str,
        server: &Arc<ServiceInner<Req, Resp>>,
    ) -> Result<()>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let mut services = self.services.lock();
        if services.get(name).is_some_and(|existing| (existing.alive)()) {
            return Err(RuntimeError::DuplicateService(name.to_string()));
        }

        let weak: Weak<ServiceInner<Req, Resp>> = Arc::downgrade(server);
        let liveness = weak.clone();
        services.insert(
            name.to_string(),
            RegisteredService {
                type_name: service_type_name::<Req, Resp>(),
                entry: Arc::new(ServiceSlot::new(weak)),
                alive: Box::new(move || liveness.strong_count() > 0),
            },
        );
        Ok(())
    }

    /// 查找存活的服务端
    pub(crate) fn service<Req, Resp>(&self, name: &str) -> Result<Option<Arc<ServiceInner<Req, Resp>>>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let services = self.services.lock();
        let Some(registered) = services.get(name) else {
            return Ok(None);
        };
        if !(registered.alive)() {
            return Ok(None);
        }
        match Arc::clone(&registered.entry).downcast::<ServiceSlot<Req, Resp>>() {
            Ok(slot) => Ok(slot.upgrade()),
            Err(_) => Err(RuntimeError::TypeMismatch {
                name: name.to_string(),
                registered: registered.type_name.clone(),
                requested: service_type_name::<Req, Resp>(),
            }),
        }
    }

    /// 已注册的话题名（排序）
    pub(crate) fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.topics.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// 存活服务的名称（排序）
    pub(crate) fn service_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .services
            .lock()
            .iter()
            .filter(|(_, registered)| (registered.alive)())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

fn service_type_name<Req, Resp>() -> String {
    format!("{} -> {}", type_name::<Req>(), type_name::<Resp>())
}
