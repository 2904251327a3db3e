//! kiln-core: Core Runtime for Kiln
//!
//! Layer2 - 런타임 커널 레이어
//!
//! # 주요 모듈
//!
//! - `class`: 런타임 클래스 합성 (extend / call_base / lifecycle hook)
//! - `registry`: 네임스페이스 레지스트리 + live object graph + kind 카탈로그
//! - `loader`: 동기/비동기 이중 모드 리소스 로더 (import protocol)
//! - `bootstrap`: startup 리소스의 dependency-ordered one-shot 로더
//!
//! # 사용 예시
//!
//! ```ignore
//! use kiln_core::{ClassRegistry, HttpTransport, ResourceLoader};
//! use kiln_core::registry::Namespace;
//! use kiln_foundation::KilnConfig;
//! use std::sync::Arc;
//!
//! let config = KilnConfig::default().with_base_url("https://cdn.example.com/app/");
//! let registry = Arc::new(ClassRegistry::new());
//! let loader = ResourceLoader::new(registry, Arc::new(HttpTransport::new(&config)?));
//!
//! // 동기 로드: 다음 줄에서 바로 사용 가능
//! let home = Namespace::new("app.screen.Home")?;
//! loader.load(&home)?;
//! assert!(loader.registry().is_registered(&home));
//! ```

// Core modules
pub mod bootstrap;
pub mod class;
pub mod loader;
pub mod registry;

// Re-exports: Class Engine
pub use class::{Call, ClassDescriptor, Instance, MemberSet, StaticCall, StaticSet};

// Re-exports: Registry
pub use registry::{
    ClassRegistry, KindCatalog, Namespace, ResourceKind, StyleSheet, TransferFormat, Unit,
};

// Re-exports: Loader
pub use loader::{HttpTransport, LoadOutcome, MemoryTransport, OnComplete, ResourceLoader, Transport};

// Re-exports: Bootstrap
pub use bootstrap::{
    platform_manifest, BootstrapLoader, BootstrapObserver, BootstrapReport, BootstrapSink,
    ResourceLoadTask,
};
