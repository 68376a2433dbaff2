//! Value records describing hook specifications and implementations.
//!
//! A [`HookSpec`] is the host-published declaration of an extension point:
//! its name, the argument names a call must supply, and option flags. A
//! [`HookImpl`] is one plugin's contribution to that extension point. The
//! dispatch engine owns ordered collections of these records; everything in
//! this module is a plain value with cheap-clone callable payloads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::introspect::Namespace;
use crate::outcome::{Next, Outcome};

/// Named arguments of a hook call, keyed by argument name.
pub type Kwargs = serde_json::Map<String, Value>;

/// Type-erased error crossing the impl/host seam.
///
/// Implementations fail with whatever error type they like; the engine
/// propagates it unchanged through wrappers to the caller of the hook.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A leaf hook implementation.
///
/// Receives exactly the arguments its declaration requested. Returning
/// [`Value::Null`] means "no result" — the engine skips it when collecting.
pub type HookFn = Arc<dyn Fn(&Kwargs) -> Result<Value, BoxError> + Send + Sync>;

/// A wrapper implementation bracketing all inner implementations.
///
/// The wrapper runs its before-half, calls [`Next::call`] exactly once to
/// execute the inner chain, and may inspect or replace the returned
/// [`Outcome`] before handing it outward.
pub type WrapperFn = Arc<dyn Fn(&Kwargs, Next<'_>) -> Outcome + Send + Sync>;

/// Callback invoked with each non-null result of a historic call.
pub type ResultCallback = Arc<dyn Fn(&Value) + Send + Sync>;

// =============================================================================
// Callables
// =============================================================================

/// The callable payload of a [`HookImpl`].
#[derive(Clone)]
pub enum HookFunction {
    /// Ordinary implementation, executed in band order.
    Leaf(HookFn),
    /// Wrapper implementation, bracketing the inner chain.
    Wrapper(WrapperFn),
}

impl HookFunction {
    /// Returns `true` for the wrapper variant.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, HookFunction::Wrapper(_))
    }
}

impl fmt::Debug for HookFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookFunction::Leaf(_) => f.write_str("HookFunction::Leaf"),
            HookFunction::Wrapper(_) => f.write_str("HookFunction::Wrapper"),
        }
    }
}

// =============================================================================
// Option flags
// =============================================================================

/// Option flags carried by a hook implementation.
///
/// `hookwrapper` is set by [`HookimplMarker::wrapper`] and always agrees
/// with the [`HookFunction`] variant; the remaining flags control band
/// placement and pending-spec validation.
///
/// [`HookimplMarker::wrapper`]: crate::marker::HookimplMarker::wrapper
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookimplOpts {
    /// Implementation is a wrapper around the inner chain.
    pub hookwrapper: bool,
    /// Run before the normal band.
    pub tryfirst: bool,
    /// Run after the normal band.
    pub trylast: bool,
    /// Do not fail `check_pending` when no spec exists for this hook.
    pub optionalhook: bool,
}

/// Option flags carried by a hook specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookspecOpts {
    /// Calls are memoized and replayed to implementations registered later.
    pub historic: bool,
    /// Dispatch stops at the first non-null result and returns it as a scalar.
    pub firstresult: bool,
    /// Notice emitted whenever an implementation registers against this spec.
    pub warn_on_impl: Option<String>,
}

// =============================================================================
// Plugin handle
// =============================================================================

/// Stable identity of a registered plugin, derived from its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginKey(usize);

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque, hashable reference to a host plugin object.
///
/// Two handles are equal iff they refer to the same allocation; the
/// registry keys its tables on this identity, so registering the same
/// object twice is detected regardless of the name used.
#[derive(Clone)]
pub struct PluginHandle {
    inner: Arc<dyn Namespace>,
}

impl PluginHandle {
    /// Wraps an already-shared plugin object.
    pub fn new(plugin: Arc<dyn Namespace>) -> Self {
        Self { inner: plugin }
    }

    /// Wraps an owned plugin object.
    pub fn from_value<P: Namespace>(plugin: P) -> Self {
        Self {
            inner: Arc::new(plugin),
        }
    }

    /// Identity key of the underlying allocation.
    pub fn key(&self) -> PluginKey {
        PluginKey(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    /// The plugin object behind this handle.
    pub fn namespace(&self) -> &dyn Namespace {
        self.inner.as_ref()
    }

    /// Recovers the concrete host type, if it matches.
    pub fn downcast<P: Any + Send + Sync>(&self) -> Option<Arc<P>> {
        Arc::clone(&self.inner).as_any().downcast::<P>().ok()
    }
}

impl<P: Namespace> From<Arc<P>> for PluginHandle {
    fn from(plugin: Arc<P>) -> Self {
        Self { inner: plugin }
    }
}

impl From<Arc<dyn Namespace>> for PluginHandle {
    fn from(plugin: Arc<dyn Namespace>) -> Self {
        Self { inner: plugin }
    }
}

impl PartialEq for PluginHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PluginHandle {}

impl std::hash::Hash for PluginHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("key", &self.key())
            .field("name", &self.inner.name())
            .finish()
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// One implementation attached to a named hook.
#[derive(Clone)]
pub struct HookImpl {
    /// Hook this implementation contributes to.
    pub hook_name: String,
    /// Owning plugin.
    pub plugin: PluginHandle,
    /// Canonical name the plugin is registered under.
    pub plugin_name: String,
    /// The callable payload.
    pub function: HookFunction,
    /// Argument names the callable consumes, in declaration order.
    pub argnames: Vec<String>,
    /// Option flags parsed from the marker (or empty for prefix discovery).
    pub opts: HookimplOpts,
}

impl fmt::Debug for HookImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookImpl")
            .field("hook_name", &self.hook_name)
            .field("plugin_name", &self.plugin_name)
            .field("argnames", &self.argnames)
            .field("opts", &self.opts)
            .finish()
    }
}

/// The published declaration of a hook.
#[derive(Debug, Clone)]
pub struct HookSpec {
    /// Name of the extension point.
    pub hook_name: String,
    /// Argument names a call is expected to supply.
    pub argnames: Vec<String>,
    /// Values for argnames that may be omitted at call time.
    pub defaults: Kwargs,
    /// Option flags parsed from the marker.
    pub opts: HookspecOpts,
    /// Display name of the namespace that published the spec.
    pub namespace: String,
}

/// One memoized invocation of a historic hook.
#[derive(Clone)]
pub struct HistoricCall {
    /// Arguments the call was made with.
    pub kwargs: Kwargs,
    /// Callback recorded alongside the call, if any.
    pub callback: Option<ResultCallback>,
}

impl fmt::Debug for HistoricCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoricCall")
            .field("kwargs", &self.kwargs)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::StaticNamespace;

    #[test]
    fn test_handle_identity() {
        let a = PluginHandle::from_value(StaticNamespace::new());
        let b = PluginHandle::from_value(StaticNamespace::new());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.clone().key(), a.key());
    }

    #[test]
    fn test_handle_downcast() {
        struct Marked {
            x: i64,
        }
        impl Namespace for Marked {
            fn attributes(&self) -> Vec<crate::introspect::NamespaceAttr> {
                Vec::new()
            }
            fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
                self
            }
        }

        let handle = PluginHandle::from_value(Marked { x: 42 });
        assert_eq!(handle.downcast::<Marked>().unwrap().x, 42);
        assert!(handle.downcast::<StaticNamespace>().is_none());
    }

    #[test]
    fn test_opts_default_is_empty() {
        let opts = HookimplOpts::default();
        assert!(!opts.hookwrapper && !opts.tryfirst && !opts.trylast && !opts.optionalhook);
    }
}
