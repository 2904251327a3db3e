//! Event System - Topic 발행/구독 + 전역 fatal sink
//!
//! ## 사용법
//!
//! ```ignore
//! use kiln_foundation::event::TopicBus;
//! use serde_json::json;
//!
//! let bus = TopicBus::new();
//!
//! // 구독
//! let id = bus.subscribe("screen.changed", |payload| {
//!     println!("screen changed: {payload}");
//! });
//!
//! // 발행
//! bus.publish("screen.changed", json!({"name": "Home"}));
//!
//! // 구독 해제
//! bus.unsubscribe("screen.changed", id);
//! ```

pub mod fatal;
pub mod topic;

// Re-exports
pub use fatal::{
    fatal_sink_installed, install_fatal_sink, report_fatal, FatalReport, FatalSink,
};
pub use topic::{SubscriberId, Topic, TopicBus};
