//! Class Engine - 런타임 클래스 합성
//!
//! 고정된 Rust 타입이 아니라 런타임에 합성되는 클래스 계층을 제공합니다.
//! [`ClassDescriptor::extend`]가 베이스 클래스 위에 인스턴스/스태틱 멤버를
//! 얹어 새 클래스를 만들고, 오버라이드된 메서드는 합성 시점에 캡처된 베이스
//! 구현을 [`Call::call_base`]로 호출할 수 있습니다.
//!
//! ```ignore
//! use kiln_core::class::{ClassDescriptor, MemberSet, StaticSet};
//! use serde_json::json;
//!
//! let widget = ClassDescriptor::root().extend(
//!     MemberSet::new()
//!         .method("init", |call| {
//!             let label = call.arg(0);
//!             call.this().set("label", label);
//!             Ok(json!(null))
//!         })
//!         .method("render", |call| {
//!             Ok(call.this().get("label").unwrap_or_default())
//!         }),
//!     StaticSet::new(),
//! );
//!
//! let button = widget.extend(
//!     MemberSet::new().method("render", |call| {
//!         let inner = call.call_base(&[])?;
//!         Ok(json!(format!("[{}]", inner.as_str().unwrap_or(""))))
//!     }),
//!     StaticSet::new(),
//! );
//!
//! let mut ok = button.construct(&[json!("OK")])?;
//! assert_eq!(ok.call("render", &[])?, json!("[OK]"));
//! ```

pub mod instance;
pub mod method;

pub use instance::Instance;
pub use method::{Call, Method, StaticCall, StaticMethod};

use crate::registry::Unit;
use kiln_foundation::{Error, Result};
use method::{MethodBody, StaticMethodBody};
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 생성자로 쓰이는 멤버 이름 (convention)
pub const INIT_MEMBER: &str = "init";

/// 디스크립터 단위 lifecycle hook
pub type LifecycleFn = Arc<dyn Fn(&ClassDescriptor) -> Result<()> + Send + Sync>;

// ============================================================================
// MemberSet / StaticSet - extend 입력
// ============================================================================

/// Instance members handed to [`ClassDescriptor::extend`].
#[derive(Default)]
pub struct MemberSet {
    methods: Vec<(String, MethodBody)>,
    values: Vec<(String, Value)>,
}

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callable member.
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Call<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.push((name.into(), Arc::new(body)));
        self
    }

    /// Add a data member.
    pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

/// Static members handed to [`ClassDescriptor::extend`].
#[derive(Default)]
pub struct StaticSet {
    methods: Vec<(String, StaticMethodBody)>,
    values: Vec<(String, Value)>,
    post_construct: Option<LifecycleFn>,
    pre_destroy: Option<LifecycleFn>,
}

impl StaticSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callable static member.
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut StaticCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.push((name.into(), Arc::new(body)));
        self
    }

    /// Add a static data member (mutable through [`ClassDescriptor::set_static`]).
    pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.push((name.into(), value));
        self
    }

    /// Hook invoked right after the class's namespace is loaded.
    pub fn post_construct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassDescriptor) -> Result<()> + Send + Sync + 'static,
    {
        self.post_construct = Some(Arc::new(hook));
        self
    }

    /// Hook invoked right before the class's namespace is unloaded.
    pub fn pre_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassDescriptor) -> Result<()> + Send + Sync + 'static,
    {
        self.pre_destroy = Some(Arc::new(hook));
        self
    }
}

// ============================================================================
// ClassDescriptor
// ============================================================================

/// A runtime-composed class: two facets (instance and static) that delegate
/// to the base class's facets, plus optional lifecycle hooks.
pub struct ClassDescriptor {
    name: Option<String>,
    base: Option<Arc<ClassDescriptor>>,

    instance_methods: HashMap<String, Arc<Method>>,
    instance_values: HashMap<String, Value>,

    static_methods: HashMap<String, Arc<StaticMethod>>,
    static_values: RwLock<HashMap<String, Value>>,

    post_construct: Option<LifecycleFn>,
    pre_destroy: Option<LifecycleFn>,
}

impl ClassDescriptor {
    /// The do-nothing base of every chain.
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            name: Some("Class".to_string()),
            base: None,
            instance_methods: HashMap::new(),
            instance_values: HashMap::new(),
            static_methods: HashMap::new(),
            static_values: RwLock::new(HashMap::new()),
            post_construct: None,
            pre_destroy: None,
        })
    }

    /// Compose a new class on top of this one.
    ///
    /// `extend` is an inherent method, so the chain is open-ended: every
    /// descriptor returned here can itself be extended. Members whose name
    /// shadows a callable on the inherited facet are composed with a capture
    /// of that implementation, reachable through `call_base` on their frame;
    /// everything else is copied unwrapped.
    pub fn extend(self: &Arc<Self>, members: MemberSet, statics: StaticSet) -> Arc<Self> {
        let mut instance_methods = HashMap::new();
        for (name, body) in members.methods {
            let method = match self.instance_method(&name) {
                Some(inherited) => Method::with_base(&name, body, inherited),
                None => Method::new(&name, body),
            };
            instance_methods.insert(name, method);
        }

        let mut static_methods = HashMap::new();
        for (name, body) in statics.methods {
            let method = match self.static_method(&name) {
                Some(inherited) => StaticMethod::with_base(&name, body, inherited),
                None => StaticMethod::new(&name, body),
            };
            static_methods.insert(name, method);
        }

        Arc::new(Self {
            name: None,
            base: Some(Arc::clone(self)),
            instance_methods,
            instance_values: members.values.into_iter().collect(),
            static_methods,
            static_values: RwLock::new(statics.values.into_iter().collect()),
            post_construct: statics.post_construct,
            pre_destroy: statics.pre_destroy,
        })
    }

    /// Attach a display name (usually the namespace the class is bound to).
    pub fn named(self: Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        let mut this = Arc::try_unwrap(self).unwrap_or_else(|arc| Self {
            name: arc.name.clone(),
            base: arc.base.clone(),
            instance_methods: arc.instance_methods.clone(),
            instance_values: arc.instance_values.clone(),
            static_methods: arc.static_methods.clone(),
            static_values: RwLock::new(arc.static_values.read().clone()),
            post_construct: arc.post_construct.clone(),
            pre_destroy: arc.pre_destroy.clone(),
        });
        this.name = Some(name.into());
        Arc::new(this)
    }

    /// Display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Immediate base class.
    pub fn base(&self) -> Option<&Arc<ClassDescriptor>> {
        self.base.as_ref()
    }

    /// Whether this class is `other` or transitively extends it.
    pub fn derives_from(self: &Arc<Self>, other: &Arc<ClassDescriptor>) -> bool {
        let mut current = Some(Arc::clone(self));
        while let Some(class) = current {
            if Arc::ptr_eq(&class, other) {
                return true;
            }
            current = class.base.clone();
        }
        false
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Construct an instance. Delegates to the `init` member when present.
    pub fn construct(self: &Arc<Self>, args: &[Value]) -> Result<Instance> {
        let mut instance = Instance::new(Arc::clone(self));
        if let Some(init) = self.instance_method(INIT_MEMBER) {
            init.invoke(&mut instance, args)?;
        }
        Ok(instance)
    }

    // ========================================================================
    // Facet lookup (own map first, then the base chain)
    // ========================================================================

    /// Resolve an instance method along the facet chain.
    pub fn instance_method(&self, name: &str) -> Option<Arc<Method>> {
        if let Some(method) = self.instance_methods.get(name) {
            return Some(Arc::clone(method));
        }
        // a data member shadows an inherited callable
        if self.instance_values.contains_key(name) {
            return None;
        }
        self.base.as_ref()?.instance_method(name)
    }

    /// Resolve an instance data member along the facet chain.
    pub fn instance_value(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.instance_values.get(name) {
            return Some(value.clone());
        }
        if self.instance_methods.contains_key(name) {
            return None;
        }
        self.base.as_ref()?.instance_value(name)
    }

    /// Resolve a static method along the facet chain.
    pub fn static_method(&self, name: &str) -> Option<Arc<StaticMethod>> {
        if let Some(method) = self.static_methods.get(name) {
            return Some(Arc::clone(method));
        }
        if self.static_values.read().contains_key(name) {
            return None;
        }
        self.base.as_ref()?.static_method(name)
    }

    // ========================================================================
    // Statics
    // ========================================================================

    /// Invoke a static method on this class.
    pub fn call_static(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value> {
        let method = self
            .static_method(name)
            .ok_or_else(|| Error::MemberNotFound(name.to_string()))?;
        method.invoke(self, args)
    }

    /// Read a static value; inherited statics are visible.
    pub fn get_static(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.static_values.read().get(name) {
            return Some(value.clone());
        }
        if self.static_methods.contains_key(name) {
            return None;
        }
        self.base.as_ref()?.get_static(name)
    }

    /// Write a static value on this class (shadows the base's).
    pub fn set_static(&self, name: impl Into<String>, value: Value) {
        self.static_values.write().insert(name.into(), value);
    }

    // ========================================================================
    // Lifecycle (inherited along the chain, invoked with the derived class)
    // ========================================================================

    fn resolve_post_construct(&self) -> Option<&LifecycleFn> {
        self.post_construct
            .as_ref()
            .or_else(|| self.base.as_ref()?.resolve_post_construct())
    }

    fn resolve_pre_destroy(&self) -> Option<&LifecycleFn> {
        self.pre_destroy
            .as_ref()
            .or_else(|| self.base.as_ref()?.resolve_pre_destroy())
    }

    /// Run the nearest `post_construct` hook in the chain, if any.
    pub fn run_post_construct(&self) -> Result<()> {
        if let Some(hook) = self.resolve_post_construct() {
            debug!(class = self.name.as_deref().unwrap_or("<anonymous>"), "post_construct");
            hook(self)?;
        }
        Ok(())
    }

    /// Run the nearest `pre_destroy` hook in the chain, if any.
    pub fn run_pre_destroy(&self) -> Result<()> {
        if let Some(hook) = self.resolve_pre_destroy() {
            debug!(class = self.name.as_deref().unwrap_or("<anonymous>"), "pre_destroy");
            hook(self)?;
        }
        Ok(())
    }
}

impl Unit for ClassDescriptor {
    fn post_construct(&self) -> Result<()> {
        self.run_post_construct()
    }

    fn pre_destroy(&self) -> Result<()> {
        self.run_pre_destroy()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("instance_members", &self.instance_methods.len())
            .field("static_members", &self.static_methods.len())
            .field("has_base", &self.base.is_some())
            .finish()
    }
}
