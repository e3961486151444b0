//! 话题：发布者与订阅者
//!
//! 发布时把消息放入每个订阅者自己的队列（保留最近 `depth` 条）。
//! 队列变长时向订阅者所在节点的就绪队列投递一个执行任务，挤掉旧消息时不投递，
//! 因此未执行的任务数始终等于队列长度，不超过 `depth`。
//! 执行任务运行时从队列取出一条消息并调用回调。

use crate::callback_group::{CallbackGroup, Work};
use crate::graph::Message;
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

/// 话题（图中按名称唯一）
pub(crate) struct TopicEntry<T> {
    name: String,
    subscribers: RwLock<Vec<Weak<SubscriptionInner<T>>>>,
    published: AtomicU64,
}

impl<T: Message> TopicEntry<T> {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: RwLock::new(Vec::new()),
            published: AtomicU64::new(0),
        }
    }

    fn attach(&self, subscriber: &Arc<SubscriptionInner<T>>) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|s| s.strong_count() > 0);
        subscribers.push(Arc::downgrade(subscriber));
    }

    /// 发布消息，返回投递到的订阅者数量
    fn publish(&self, msg: &T) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let mut delivered = 0;
        let mut stale = false;
        for weak in self.subscribers.read().iter() {
            match weak.upgrade() {
                Some(subscriber) => {
                    subscriber.deliver(msg.clone());
                    delivered += 1;
                },
                None => stale = true,
            }
        }
        if stale {
            self.subscribers.write().retain(|s| s.strong_count() > 0);
        }
        trace!("Published on '{}' to {} subscriber(s)", self.name, delivered);
        delivered
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.read().iter().filter(|s| s.strong_count() > 0).count()
    }
}

pub(crate) struct SubscriptionInner<T> {
    topic: String,
    depth: usize,
    queue: Mutex<VecDeque<T>>,
    callback: Box<dyn Fn(T) + Send + Sync>,
    group: Arc<CallbackGroup>,
    ready: Sender<Work>,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl<T: Message> SubscriptionInner<T> {
    fn deliver(self: &Arc<Self>, msg: T) {
        self.received.fetch_add(1, Ordering::Relaxed);
        let replaced = {
            let mut queue = self.queue.lock();
            let full = queue.len() >= self.depth;
            if full {
                queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(msg);
            full
        };
        // 被挤掉的消息已有对应任务，由它处理新消息
        if replaced {
            return;
        }

        let weak = Arc::downgrade(self);
        let work = Work::new(Arc::clone(&self.group), move || {
            if let Some(subscription) = weak.upgrade() {
                subscription.take_and_run();
            }
        });
        if self.ready.send(work).is_err() {
            trace!("Subscriber node of '{}' is gone, dropping message", self.topic);
        }
    }

    fn take_and_run(&self) {
        let msg = self.queue.lock().pop_front();
        if let Some(msg) = msg {
            (self.callback)(msg);
        }
    }
}

/// 发布者句柄
pub struct Publisher<T> {
    topic: Arc<TopicEntry<T>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            topic: Arc::clone(&self.topic),
        }
    }
}

impl<T: Message> Publisher<T> {
    pub(crate) fn new(topic: Arc<TopicEntry<T>>) -> Self {
        Self { topic }
    }

    /// 发布消息，返回投递到的订阅者数量
    pub fn publish(&self, msg: &T) -> usize {
        self.topic.publish(msg)
    }

    pub fn topic_name(&self) -> &str {
        &self.topic.name
    }

    /// 当前存活的订阅者数量
    pub fn subscription_count(&self) -> usize {
        self.topic.subscriber_count()
    }

    /// 已发布消息总数
    pub fn published_count(&self) -> u64 {
        self.topic.published.load(Ordering::Relaxed)
    }
}

/// 订阅句柄
///
/// 句柄被丢弃后不再接收消息。
pub struct Subscription<T> {
    inner: Arc<SubscriptionInner<T>>,
}

impl<T: Message> Subscription<T> {
    pub(crate) fn new(
        topic: &Arc<TopicEntry<T>>,
        depth: usize,
        group: Arc<CallbackGroup>,
        ready: Sender<Work>,
        callback: Box<dyn Fn(T) + Send + Sync>,
    ) -> Self {
        let inner = Arc::new(SubscriptionInner {
            topic: topic.name.clone(),
            depth: depth.max(1),
            queue: Mutex::new(VecDeque::new()),
            callback,
            group,
            ready,
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        });
        topic.attach(&inner);
        Self { inner }
    }

    pub fn topic_name(&self) -> &str {
        &self.inner.topic
    }

    /// 收到的消息总数
    pub fn received_count(&self) -> u64 {
        self.inner.received.load(Ordering::Relaxed)
    }

    /// 因队列溢出而丢弃的消息数
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// 队列中等待处理的消息数
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Context, NodeOptions};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_idle_node_ready_queue_bounded_by_depth() {
        let context = Context::init(["test"]).unwrap();
        let node = context.create_node("idle", NodeOptions::default()).unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let sub = node
            .create_subscription("chatter", 2, None, move |msg: u32| sink.lock().push(msg))
            .unwrap();
        let publisher = node.create_publisher::<u32>("chatter").unwrap();

        for i in 0..1000 {
            publisher.publish(&i);
        }
        assert_eq!(sub.pending(), 2);
        assert_eq!(sub.dropped_count(), 998);

        let ready = node.ready_receiver();
        assert_eq!(ready.len(), 2);
        while let Ok(work) = ready.try_recv() {
            work.run();
        }
        assert_eq!(*received.lock(), vec![998, 999]);
        assert_eq!(sub.pending(), 0);
    }
}
