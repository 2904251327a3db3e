//! Resource Loader - 네임스페이스 단위 lazy 로딩
//!
//! 로더는 레지스트리로 fetch 필요 여부를 판단하고, fetch 후 lifecycle hook을
//! 순서대로 호출합니다: kind `on_loaded` -> unit `post_construct` -> 등록.
//!
//! ## 동기/비동기 이중 모드
//!
//! 이 계약은 공개 인터페이스의 일부입니다:
//!
//! - [`ResourceLoader::load`] / [`ResourceLoader::load_kind`]는 fetch가 끝날
//!   때까지 호출 스레드를 **블로킹**합니다. 호출자는 바로 다음 줄에서 막
//!   로드된 unit을 참조할 수 있습니다. async 런타임 안에서 호출하면 안
//!   됩니다.
//! - [`ResourceLoader::load_async`]는 완료 시 `on_complete` 콜백을 정확히 한
//!   번 호출합니다. fetch가 영구 실패하면 콜백은 호출되지 않고 fatal 경로가
//!   대신 발화합니다.
//!
//! 실패한 fetch는 재시도되지 않으며, 해당 네임스페이스는 미등록 상태로
//! 남습니다. 진행 중인 로드를 취소하는 수단은 없습니다.

pub mod transport;

pub use transport::{HttpTransport, MemoryTransport, Transport};

use crate::registry::{ClassRegistry, Namespace, ResourceKind, KIND_REMOTE_PROC};
use kiln_foundation::{report_fatal, Error, FatalReport, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// What a load call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Fetched over the transport; hooks ran; carries the payload.
    Fetched(String),

    /// Namespace was already registered; nothing ran.
    AlreadyRegistered,

    /// Namespace resolved against the live object graph and was registered
    /// **without invoking any lifecycle hook** (see [`ResourceLoader::load`]).
    AlreadyResolvable,
}

/// Completion callback of an asynchronous load. Receives the namespace the
/// call was made with and the outcome.
pub type OnComplete = Box<dyn FnOnce(&Namespace, &LoadOutcome) + Send>;

/// Lazy namespace loader over an injected registry and transport.
pub struct ResourceLoader {
    registry: Arc<ClassRegistry>,
    transport: Arc<dyn Transport>,
}

impl ResourceLoader {
    pub fn new(registry: Arc<ClassRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// Load a namespace as the `class` kind, blocking until it is available.
    ///
    /// Known asymmetry, kept intentionally: when the namespace is already
    /// resolvable in the live object graph (shipped in a merged bundle and
    /// bound via [`ClassRegistry::bind`]/[`ClassRegistry::reserve`]), it is
    /// registered **without** running `on_loaded` or `post_construct`. Units
    /// that self-register must do their own post-construct work.
    pub fn load(&self, namespace: &Namespace) -> Result<LoadOutcome> {
        let kind = self.registry.catalog().class();
        self.load_kind(namespace, &kind)
    }

    /// Load a namespace as an explicit kind, blocking until it is available.
    pub fn load_kind(&self, namespace: &Namespace, kind: &Arc<ResourceKind>) -> Result<LoadOutcome> {
        let key = Self::effective_key(namespace, kind);
        if let Some(outcome) = self.pre_fetch(&key, kind) {
            return Ok(outcome);
        }
        let location = kind.url_for(&key);
        let payload = self
            .transport
            .fetch_blocking(&location)
            .map_err(|e| self.fatal_transfer(&key, e))?;
        self.finish_load(&key, kind, payload)
    }

    /// Load a namespace asynchronously. `on_complete` is invoked exactly once
    /// when the namespace is available - immediately if it already is. On
    /// fetch failure the callback is never invoked; the error is reported to
    /// the fatal sink and returned.
    pub async fn load_async(
        &self,
        namespace: &Namespace,
        kind: &Arc<ResourceKind>,
        on_complete: OnComplete,
    ) -> Result<()> {
        let key = Self::effective_key(namespace, kind);
        if let Some(outcome) = self.pre_fetch(&key, kind) {
            on_complete(namespace, &outcome);
            return Ok(());
        }
        let location = kind.url_for(&key);
        let payload = self
            .transport
            .fetch(&location)
            .await
            .map_err(|e| self.fatal_transfer(&key, e))?;
        let outcome = self.finish_load(&key, kind, payload)?;
        on_complete(namespace, &outcome);
        Ok(())
    }

    /// Remote-procedure stubs are keyed by short name, not full path.
    fn effective_key(namespace: &Namespace, kind: &Arc<ResourceKind>) -> Namespace {
        if kind.name() == KIND_REMOTE_PROC {
            namespace.leaf_namespace()
        } else {
            namespace.clone()
        }
    }

    /// Registration checks shared by both modes. `Some` short-circuits the
    /// fetch.
    fn pre_fetch(&self, key: &Namespace, kind: &Arc<ResourceKind>) -> Option<LoadOutcome> {
        if self.registry.is_registered(key) {
            debug!(namespace = %key, "already registered");
            return Some(LoadOutcome::AlreadyRegistered);
        }
        // in memory but not registered: register without hooks
        if self.registry.resolve(key).is_some() {
            debug!(namespace = %key, "already resolvable, registering without hooks");
            self.registry.register(key.clone(), Arc::clone(kind));
            return Some(LoadOutcome::AlreadyResolvable);
        }
        None
    }

    /// Hook sequence after a successful fetch.
    fn finish_load(
        &self,
        key: &Namespace,
        kind: &Arc<ResourceKind>,
        payload: String,
    ) -> Result<LoadOutcome> {
        kind.run_on_loaded(&self.registry, key, &payload)?;
        if let Some(unit) = self.registry.resolve(key) {
            unit.post_construct()?;
        }
        self.registry.register(key.clone(), Arc::clone(kind));
        info!(namespace = %key, kind = kind.name(), "loaded");
        Ok(LoadOutcome::Fetched(payload))
    }

    fn fatal_transfer(&self, key: &Namespace, cause: Error) -> Error {
        let error = Error::transfer(key.as_str(), cause.to_string());
        report_fatal(FatalReport::new("loader", error.to_string()));
        error
    }

    // ========================================================================
    // Unload
    // ========================================================================

    /// Unload a namespace: unit `pre_destroy`, kind `on_unloaded`, deregister,
    /// then clear the leaf binding (parent containers survive). No-op when the
    /// namespace is not registered.
    ///
    /// The loader does no reference counting; callers must ensure no live
    /// consumer still holds the unit.
    pub fn unload(&self, namespace: &Namespace) -> Result<bool> {
        let Some(kind) = self.registry.kind_of(namespace) else {
            debug!(%namespace, "unload of unregistered namespace, ignoring");
            return Ok(false);
        };
        if let Some(unit) = self.registry.resolve(namespace) {
            unit.pre_destroy()?;
        }
        kind.run_on_unloaded(&self.registry, namespace)?;
        self.registry.deregister(namespace);
        self.registry.clear_binding(namespace);
        info!(%namespace, "unloaded");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{KindCatalog, ResourceKind, StyleSheet, TransferFormat, Unit};
    use parking_lot::Mutex;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ns(raw: &str) -> Namespace {
        Namespace::new(raw).unwrap()
    }

    struct Probe {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Unit for Probe {
        fn post_construct(&self) -> Result<()> {
            self.log.lock().push("unit post_construct".into());
            Ok(())
        }

        fn pre_destroy(&self) -> Result<()> {
            self.log.lock().push("unit pre_destroy".into());
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Kind whose on_loaded binds a probe unit and records hook order.
    fn probed_kind(log: Arc<Mutex<Vec<String>>>) -> Arc<ResourceKind> {
        let bind_log = Arc::clone(&log);
        Arc::new(
            ResourceKind::new("class", "script/", ".js", TransferFormat::Script)
                .with_on_loaded(move |registry, namespace, _payload| {
                    bind_log.lock().push("kind on_loaded".into());
                    registry.bind(
                        namespace,
                        Arc::new(Probe {
                            log: Arc::clone(&bind_log),
                        }),
                    );
                    Ok(())
                }),
        )
    }

    fn loader_with(transport: MemoryTransport) -> ResourceLoader {
        ResourceLoader::new(Arc::new(ClassRegistry::new()), Arc::new(transport))
    }

    #[test]
    fn test_sync_load_registers_immediately() {
        let loader = loader_with(
            MemoryTransport::new().with_resource("script/app/util/Topic.js", "topic module"),
        );
        let namespace = ns("app.util.Topic");

        let outcome = loader.load(&namespace).unwrap();
        // registered on the very next line - the synchronous contract
        assert!(loader.registry().is_registered(&namespace));
        assert_eq!(outcome, LoadOutcome::Fetched("topic module".into()));
    }

    #[test]
    fn test_hooks_run_in_order_then_register() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport =
            MemoryTransport::new().with_resource("script/app/util/Mask.js", "mask module");
        let loader = loader_with(transport);
        let kind = probed_kind(Arc::clone(&log));

        loader.load_kind(&ns("app.util.Mask"), &kind).unwrap();

        assert_eq!(
            *log.lock(),
            vec!["kind on_loaded".to_string(), "unit post_construct".to_string()]
        );
    }

    #[test]
    fn test_unload_then_reload_fetches_again() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport =
            MemoryTransport::new().with_resource("script/app/util/Mask.js", "mask module");
        let fetches = Arc::new(transport);
        let shared: Arc<dyn Transport> = fetches.clone();
        let loader = ResourceLoader::new(Arc::new(ClassRegistry::new()), shared);
        let kind = probed_kind(Arc::clone(&log));
        let namespace = ns("app.util.Mask");

        loader.load_kind(&namespace, &kind).unwrap();
        assert!(loader.unload(&namespace).unwrap());
        assert!(!loader.registry().is_registered(&namespace));

        loader.load_kind(&namespace, &kind).unwrap();
        assert_eq!(fetches.fetch_count(), 2);
        assert_eq!(
            *log.lock(),
            vec![
                "kind on_loaded".to_string(),
                "unit post_construct".to_string(),
                "unit pre_destroy".to_string(),
                "kind on_loaded".to_string(),
                "unit post_construct".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_async_callback_on_already_registered_skips_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport =
            MemoryTransport::new().with_resource("script/app/util/Mask.js", "mask module");
        let loader = loader_with(transport);
        let kind = probed_kind(Arc::clone(&log));
        let namespace = ns("app.util.Mask");

        loader.load_kind(&namespace, &kind).unwrap();
        let hook_calls = log.lock().len();

        let called = Arc::new(AtomicUsize::new(0));
        let called_in_cb = Arc::clone(&called);
        loader
            .load_async(
                &namespace,
                &kind,
                Box::new(move |_, outcome| {
                    assert_eq!(*outcome, LoadOutcome::AlreadyRegistered);
                    called_in_cb.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();

        assert_eq!(called.load(Ordering::SeqCst), 1);
        // no hook re-invocation for a registered namespace
        assert_eq!(log.lock().len(), hook_calls);
    }

    #[tokio::test]
    async fn test_async_load_invokes_callback_once_with_payload() {
        let loader = loader_with(
            MemoryTransport::new().with_resource("script/app/screen/Home.js", "home module"),
        );
        let kind = loader.registry().catalog().class();
        let namespace = ns("app.screen.Home");

        let called = Arc::new(AtomicUsize::new(0));
        let called_in_cb = Arc::clone(&called);
        loader
            .load_async(
                &namespace,
                &kind,
                Box::new(move |loaded_ns, outcome| {
                    assert_eq!(loaded_ns.as_str(), "app.screen.Home");
                    assert_eq!(*outcome, LoadOutcome::Fetched("home module".into()));
                    called_in_cb.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap();

        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert!(loader.registry().is_registered(&namespace));
    }

    #[tokio::test]
    async fn test_async_failure_never_invokes_callback() {
        let loader = loader_with(MemoryTransport::new());
        let kind = loader.registry().catalog().class();
        let namespace = ns("app.screen.Missing");

        let called = Arc::new(AtomicUsize::new(0));
        let called_in_cb = Arc::clone(&called);
        let result = loader
            .load_async(
                &namespace,
                &kind,
                Box::new(move |_, _| {
                    called_in_cb.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;

        assert!(matches!(result, Err(Error::Transfer { .. })));
        assert_eq!(called.load(Ordering::SeqCst), 0);
        assert!(!loader.registry().is_registered(&namespace));
    }

    #[test]
    fn test_transfer_failure_is_fatal_and_unregistered() {
        let loader = loader_with(MemoryTransport::new());
        let namespace = ns("app.screen.Missing");

        let error = loader.load(&namespace).unwrap_err();
        assert!(error.is_fatal());
        assert!(error.to_string().contains("app.screen.Missing"));
        assert!(!loader.registry().is_registered(&namespace));
    }

    #[test]
    fn test_already_resolvable_fast_path_skips_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let loader = loader_with(MemoryTransport::new());
        let kind = probed_kind(Arc::clone(&log));
        let namespace = ns("app.util.Inline");

        // shipped in a merged bundle: bound but never registered
        loader.registry().bind(
            &namespace,
            Arc::new(Probe {
                log: Arc::clone(&log),
            }),
        );

        let outcome = loader.load_kind(&namespace, &kind).unwrap();
        assert_eq!(outcome, LoadOutcome::AlreadyResolvable);
        assert!(loader.registry().is_registered(&namespace));
        // the asymmetry under test: no on_loaded, no post_construct
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_remote_proc_keyed_by_short_name() {
        let loader = loader_with(
            MemoryTransport::new().with_resource("AccountService.js", "stub"),
        );
        let kind = loader.registry().catalog().remote_proc();

        loader
            .load_kind(&ns("app.rpc.AccountService"), &kind)
            .unwrap();

        assert!(loader.registry().is_registered(&ns("AccountService")));
        assert!(!loader.registry().is_registered(&ns("app.rpc.AccountService")));
    }

    #[test]
    fn test_style_kind_binds_stylesheet_unit() {
        let loader = loader_with(
            MemoryTransport::new().with_resource("app/theme/Dark.gss", "body { color: #eee }"),
        );
        let kind = loader.registry().catalog().style();
        let namespace = ns("app.theme.Dark");

        loader.load_kind(&namespace, &kind).unwrap();

        let unit = loader.registry().resolve(&namespace).unwrap();
        let sheet = unit.as_any().downcast_ref::<StyleSheet>().unwrap();
        assert_eq!(sheet.source(), "body { color: #eee }");

        // unload clears the binding but keeps the parent container
        loader.unload(&namespace).unwrap();
        assert!(loader.registry().resolve(&namespace).is_none());
        assert!(loader.registry().container_exists(&ns("app.theme")));
    }

    #[test]
    fn test_unload_unregistered_is_noop() {
        let loader = loader_with(MemoryTransport::new());
        assert!(!loader.unload(&ns("app.Never")).unwrap());
    }

    #[test]
    fn test_custom_catalog_flows_through_registry() {
        let catalog = KindCatalog::standard();
        let registry = Arc::new(ClassRegistry::with_catalog(catalog));
        let loader = ResourceLoader::new(
            registry,
            Arc::new(MemoryTransport::new().with_resource("script/a/B.js", "b")),
        );
        loader.load(&ns("a.B")).unwrap();
        assert!(loader.registry().is_registered(&ns("a.B")));
    }
}
