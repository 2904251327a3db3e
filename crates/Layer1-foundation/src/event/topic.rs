//! Topic - 이름 기반 발행/구독
//!
//! Topic은 이름으로 조회하며, 없으면 생성됩니다 (get-or-create).
//! 디스패치는 동기적으로 이루어지므로 일반 함수/클래스 메서드에서
//! 바로 발행할 수 있습니다.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// 구독자 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

/// 단일 Topic - 구독자 목록을 보관
#[derive(Default, Clone)]
pub struct Topic {
    subscribers: Vec<(SubscriberId, Callback)>,
}

impl Topic {
    /// 모든 구독자에게 payload 전달
    fn fire(&self, payload: &Value) {
        for (id, callback) in &self.subscribers {
            trace!(subscriber = %id, "delivering topic payload");
            callback(payload);
        }
    }
}

/// Topic 버스 - 이름별 Topic 관리
pub struct TopicBus {
    topics: RwLock<HashMap<String, Topic>>,
    subscriber_counter: AtomicU64,
}

impl TopicBus {
    /// 새 버스 생성
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            subscriber_counter: AtomicU64::new(0),
        }
    }

    /// Topic 구독. 반환된 id로 구독 해제 가능
    pub fn subscribe<F>(&self, topic: impl Into<String>, callback: F) -> SubscriberId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.subscriber_counter.fetch_add(1, Ordering::SeqCst));
        let mut topics = self.topics.write();
        topics
            .entry(topic.into())
            .or_default()
            .subscribers
            .push((id, Arc::new(callback)));
        id
    }

    /// 구독 해제
    pub fn unsubscribe(&self, topic: &str, id: SubscriberId) -> bool {
        let mut topics = self.topics.write();
        if let Some(entry) = topics.get_mut(topic) {
            let before = entry.subscribers.len();
            entry.subscribers.retain(|(sid, _)| *sid != id);
            return entry.subscribers.len() != before;
        }
        false
    }

    /// Topic 발행. Topic이 없으면 생성만 하고 아무에게도 전달되지 않음
    pub fn publish(&self, topic: &str, payload: Value) {
        // clone the snapshot so subscribers may re-enter the bus
        let snapshot = {
            let mut topics = self.topics.write();
            topics.entry(topic.to_string()).or_default().clone()
        };
        snapshot.fire(&payload);
    }

    /// 해당 Topic의 구독자 수
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map(|t| t.subscribers.len())
            .unwrap_or(0)
    }
}

impl Default for TopicBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_publish_reaches_subscribers() {
        let bus = TopicBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        bus.subscribe("unit.loaded", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish("unit.loaded", json!({"namespace": "app.util.Topic"}));
        bus.publish("unit.loaded", json!({"namespace": "app.util.Mask"}));

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = TopicBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let id = bus.subscribe("tick", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish("tick", Value::Null);
        assert!(bus.unsubscribe("tick", id));
        bus.publish("tick", Value::Null);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count("tick"), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = TopicBus::new();
        bus.publish("nobody.listens", Value::Null);
        assert_eq!(bus.subscriber_count("nobody.listens"), 0);
    }

    #[test]
    fn test_subscriber_may_reenter_bus() {
        let bus = Arc::new(TopicBus::new());
        let count = Arc::new(AtomicUsize::new(0));

        let inner_bus = Arc::clone(&bus);
        let c = Arc::clone(&count);
        bus.subscribe("outer", move |_| {
            // re-entrant publish must not deadlock
            inner_bus.publish("inner", Value::Null);
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish("outer", Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
