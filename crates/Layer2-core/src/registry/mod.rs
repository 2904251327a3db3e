//! Class Registry - 네임스페이스 로드 상태 + live object graph
//!
//! 레지스트리는 두 가지를 들고 있습니다:
//!
//! 1. **로드 상태 맵**: 네임스페이스가 등록되어 있으면 로드된 것으로
//!    간주합니다. 엔트리는 성공한 load(또는 fetch 없이 선점하는
//!    [`ClassRegistry::reserve`])가 만들고 unload가 지웁니다.
//! 2. **live object graph**: 네임스페이스 경로를 따라 중첩된 컨테이너와
//!    말단에 바인딩된 unit. 병합 번들로 메모리에 이미 올라온 unit을
//!    리플렉션 없이 조회하기 위한 명시적 구조입니다.
//!
//! 레지스트리는 프로세스 수명 동안 유지되는 명시적 인스턴스이며, 로더와
//! 부트스트랩에 참조로 주입됩니다 (전역 싱글턴 아님).

pub mod kind;
pub mod namespace;

pub use kind::{
    KindCatalog, KindLoadedHook, KindUnloadedHook, ResourceKind, StyleSheet, TransferFormat,
    KIND_CLASS, KIND_REMOTE_PROC, KIND_STYLE, KIND_TEMPLATE,
};
pub use namespace::Namespace;

use kiln_foundation::Result;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Unit - 로드 가능한 단위의 optional-capability lifecycle
// ============================================================================

/// A loadable unit bound into the object graph.
///
/// The lifecycle methods default to no-ops, so a unit only participates in
/// the hooks it actually defines.
pub trait Unit: Send + Sync {
    /// Called after the unit's namespace is registered by a fetch-path load.
    fn post_construct(&self) -> Result<()> {
        Ok(())
    }

    /// Called before the unit's namespace is deregistered by an unload.
    fn pre_destroy(&self) -> Result<()> {
        Ok(())
    }

    /// Downcasting helper for consumers that know the concrete unit type.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Live object graph
// ============================================================================

#[derive(Default)]
struct Container {
    children: HashMap<String, Container>,
    unit: Option<Arc<dyn Unit>>,
}

impl Container {
    fn node(&self, namespace: &Namespace) -> Option<&Container> {
        let mut current = self;
        for segment in namespace.segments() {
            current = current.children.get(segment)?;
        }
        Some(current)
    }

    fn node_mut(&mut self, namespace: &Namespace) -> &mut Container {
        let mut current = self;
        for segment in namespace.segments() {
            current = current.children.entry(segment.to_string()).or_default();
        }
        current
    }
}

// ============================================================================
// ClassRegistry
// ============================================================================

/// Process-wide namespace registry: load-state map plus live object graph.
pub struct ClassRegistry {
    catalog: Arc<KindCatalog>,
    entries: RwLock<HashMap<Namespace, Arc<ResourceKind>>>,
    root: RwLock<Container>,
}

impl ClassRegistry {
    /// 표준 kind 카탈로그로 생성
    pub fn new() -> Self {
        Self::with_catalog(KindCatalog::standard())
    }

    /// 커스텀 카탈로그로 생성 (hook을 바꾼 카탈로그 등)
    pub fn with_catalog(catalog: Arc<KindCatalog>) -> Self {
        Self {
            catalog,
            entries: RwLock::new(HashMap::new()),
            root: RwLock::new(Container::default()),
        }
    }

    /// 이 레지스트리의 kind 카탈로그
    pub fn catalog(&self) -> &Arc<KindCatalog> {
        &self.catalog
    }

    // ========================================================================
    // 로드 상태 맵
    // ========================================================================

    pub fn is_registered(&self, namespace: &Namespace) -> bool {
        self.entries.read().contains_key(namespace)
    }

    /// 순수 맵 삽입. 이미 등록된 네임스페이스의 재등록은 부작용 없이 엔트리만
    /// 덮어씁니다.
    pub fn register(&self, namespace: Namespace, kind: Arc<ResourceKind>) {
        info!(%namespace, kind = kind.name(), "registered");
        self.entries.write().insert(namespace, kind);
    }

    /// 순수 맵 삭제
    pub fn deregister(&self, namespace: &Namespace) -> bool {
        let removed = self.entries.write().remove(namespace).is_some();
        if removed {
            info!(%namespace, "deregistered");
        } else {
            warn!(%namespace, "deregister of unknown namespace");
        }
        removed
    }

    /// 등록된 네임스페이스의 kind
    pub fn kind_of(&self, namespace: &Namespace) -> Option<Arc<ResourceKind>> {
        self.entries.read().get(namespace).cloned()
    }

    /// 등록된 (namespace, kind) 목록 (정렬됨)
    pub fn registered(&self) -> Vec<(Namespace, Arc<ResourceKind>)> {
        let mut all: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(ns, kind)| (ns.clone(), Arc::clone(kind)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    // ========================================================================
    // Reserve - fetch 없이 네임스페이스 선점
    // ========================================================================

    /// Pre-claim a namespace without any fetch.
    ///
    /// Creates intermediate empty containers for every segment (existing
    /// segments are left untouched), then marks the namespace registered with
    /// the `class` kind. Self-registering units shipped in a merged bundle
    /// call this to opt out of network loading.
    pub fn reserve(&self, namespace: &Namespace) {
        self.root.write().node_mut(namespace);
        debug!(%namespace, "reserved");
        self.register(namespace.clone(), self.catalog.class());
    }

    // ========================================================================
    // Live object graph
    // ========================================================================

    /// Bind a unit at the namespace's leaf, creating containers along the way.
    pub fn bind(&self, namespace: &Namespace, unit: Arc<dyn Unit>) {
        debug!(%namespace, "bound unit");
        self.root.write().node_mut(namespace).unit = Some(unit);
    }

    /// The unit bound at the namespace, if any.
    pub fn resolve(&self, namespace: &Namespace) -> Option<Arc<dyn Unit>> {
        self.root
            .read()
            .node(namespace)
            .and_then(|node| node.unit.clone())
    }

    /// Empty the leaf binding; parent containers are kept.
    pub fn clear_binding(&self, namespace: &Namespace) -> bool {
        let mut root = self.root.write();
        let node = root.node_mut(namespace);
        let had_unit = node.unit.take().is_some();
        if had_unit {
            debug!(%namespace, "cleared binding");
        }
        had_unit
    }

    /// Whether a container exists at the namespace (bound or empty).
    pub fn container_exists(&self, namespace: &Namespace) -> bool {
        self.root.read().node(namespace).is_some()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(raw: &str) -> Namespace {
        Namespace::new(raw).unwrap()
    }

    struct Marker;

    impl Unit for Marker {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_register_deregister() {
        let registry = ClassRegistry::new();
        let namespace = ns("app.util.Topic");

        assert!(!registry.is_registered(&namespace));
        registry.register(namespace.clone(), registry.catalog().class());
        assert!(registry.is_registered(&namespace));
        assert_eq!(
            registry.kind_of(&namespace).unwrap().name(),
            KIND_CLASS
        );

        assert!(registry.deregister(&namespace));
        assert!(!registry.is_registered(&namespace));
        assert!(!registry.deregister(&namespace));
    }

    #[test]
    fn test_reserve_creates_intermediate_containers() {
        let registry = ClassRegistry::new();
        registry.reserve(&ns("a.b.c"));

        // containers exist for every segment, nothing is bound
        assert!(registry.container_exists(&ns("a")));
        assert!(registry.container_exists(&ns("a.b")));
        assert!(registry.container_exists(&ns("a.b.c")));
        assert!(registry.resolve(&ns("a.b.c")).is_none());

        // registered as class kind, without any fetch
        assert!(registry.is_registered(&ns("a.b.c")));
        assert_eq!(registry.kind_of(&ns("a.b.c")).unwrap().name(), KIND_CLASS);
    }

    #[test]
    fn test_reserve_leaves_existing_segments_untouched() {
        let registry = ClassRegistry::new();
        registry.bind(&ns("a.b"), Arc::new(Marker));
        registry.reserve(&ns("a.b.c"));

        // the pre-existing binding at a.b survives
        assert!(registry.resolve(&ns("a.b")).is_some());
    }

    #[test]
    fn test_bind_resolve_clear() {
        let registry = ClassRegistry::new();
        let namespace = ns("app.screen.Home");

        registry.bind(&namespace, Arc::new(Marker));
        assert!(registry.resolve(&namespace).is_some());

        assert!(registry.clear_binding(&namespace));
        assert!(registry.resolve(&namespace).is_none());
        // the leaf container and its parents survive the clear
        assert!(registry.container_exists(&namespace));
        assert!(registry.container_exists(&ns("app.screen")));

        assert!(!registry.clear_binding(&namespace));
    }

    #[test]
    fn test_registered_listing_is_sorted() {
        let registry = ClassRegistry::new();
        registry.register(ns("b.Second"), registry.catalog().class());
        registry.register(ns("a.First"), registry.catalog().style());

        let listed = registry.registered();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0.as_str(), "a.First");
        assert_eq!(listed[1].0.as_str(), "b.Second");
    }
}
