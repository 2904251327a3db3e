//! Dynamic methods and call frames.
//!
//! A method body is a boxed closure over a [`Call`] frame. When `extend`
//! detects an override, it captures the immediate base implementation on the
//! new method at composition time; the binding is exposed to the body through
//! [`Call::call_base`]. Because the binding lives on the call frame and not on
//! the receiver or the type, it is released on every exit path (normal return,
//! error return, unwind) and reentrant calls each get their own binding.

use super::instance::Instance;
use super::ClassDescriptor;
use kiln_foundation::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Boxed body of an instance method.
pub type MethodBody = Arc<dyn Fn(&mut Call<'_>) -> Result<Value> + Send + Sync>;

/// Boxed body of a static method.
pub type StaticMethodBody = Arc<dyn Fn(&mut StaticCall<'_>) -> Result<Value> + Send + Sync>;

// ============================================================================
// Instance methods
// ============================================================================

/// An instance method, optionally composed over the implementation it
/// overrides.
pub struct Method {
    name: String,
    body: MethodBody,
    base: Option<Arc<Method>>,
}

impl Method {
    pub(crate) fn new(name: impl Into<String>, body: MethodBody) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            body,
            base: None,
        })
    }

    pub(crate) fn with_base(
        name: impl Into<String>,
        body: MethodBody,
        base: Arc<Method>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            body,
            base: Some(base),
        })
    }

    /// Method name as declared on its facet.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this method overrides an inherited implementation.
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Invoke with a fresh call frame.
    pub fn invoke(&self, receiver: &mut Instance, args: &[Value]) -> Result<Value> {
        let mut call = Call {
            receiver,
            args,
            base: self.base.clone(),
            name: &self.name,
        };
        (self.body)(&mut call)
    }
}

/// Call frame of one instance-method invocation.
pub struct Call<'a> {
    receiver: &'a mut Instance,
    args: &'a [Value],
    base: Option<Arc<Method>>,
    name: &'a str,
}

impl<'a> Call<'a> {
    /// The receiving instance.
    pub fn this(&mut self) -> &mut Instance {
        self.receiver
    }

    /// All arguments of this invocation.
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Argument by position; `Null` when absent.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Null)
    }

    /// Whether an overridden base implementation is bound to this frame.
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Invoke the immediate base implementation with the given arguments.
    ///
    /// Resolution is fixed at composition time: a three-level chain reaches
    /// exactly one level up per frame, regardless of the receiver's concrete
    /// class.
    pub fn call_base(&mut self, args: &[Value]) -> Result<Value> {
        match self.base.clone() {
            Some(base) => base.invoke(&mut *self.receiver, args),
            None => Err(Error::NoBaseImplementation(self.name.to_string())),
        }
    }
}

// ============================================================================
// Static methods
// ============================================================================

/// A static method on the type-level facet.
pub struct StaticMethod {
    name: String,
    body: StaticMethodBody,
    base: Option<Arc<StaticMethod>>,
}

impl StaticMethod {
    pub(crate) fn new(name: impl Into<String>, body: StaticMethodBody) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            body,
            base: None,
        })
    }

    pub(crate) fn with_base(
        name: impl Into<String>,
        body: StaticMethodBody,
        base: Arc<StaticMethod>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            body,
            base: Some(base),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Invoke against a class. The class passed in is the one the call was
    /// made on, so inherited statics see the derived type.
    pub fn invoke(&self, class: &Arc<ClassDescriptor>, args: &[Value]) -> Result<Value> {
        let mut call = StaticCall {
            class,
            args,
            base: self.base.clone(),
            name: &self.name,
        };
        (self.body)(&mut call)
    }
}

/// Call frame of one static-method invocation.
pub struct StaticCall<'a> {
    class: &'a Arc<ClassDescriptor>,
    args: &'a [Value],
    base: Option<Arc<StaticMethod>>,
    name: &'a str,
}

impl<'a> StaticCall<'a> {
    /// The class the call was made on.
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        self.class
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Null)
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Invoke the immediate base implementation.
    pub fn call_base(&mut self, args: &[Value]) -> Result<Value> {
        match self.base.clone() {
            Some(base) => base.invoke(self.class, args),
            None => Err(Error::NoBaseImplementation(self.name.to_string())),
        }
    }
}
