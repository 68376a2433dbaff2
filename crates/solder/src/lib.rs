//! # Solder
//!
//! A hook-based plugin dispatch runtime.
//!
//! A host publishes named *hook specifications* (extension points);
//! independently authored plugins contribute *hook implementations* for
//! those names. At call time the engine multiplexes one invocation across
//! every matching implementation with a deterministic ordering and
//! wrapping discipline, collecting the results.
//!
//! ```text
//! ┌──────────┐ register  ┌───────────────┐ attach  ┌────────────┐
//! │  Plugin  │──────────▶│ PluginManager │────────▶│ HookCaller │──▶ impls
//! └──────────┘           │  (registry)   │────────▶│ HookCaller │──▶ impls
//!                        └───────────────┘         └────────────┘
//! ```
//!
//! - **Markers** annotate functions as implementations or specs; the
//!   introspection adapter turns a plugin's attribute table into
//!   declaration records.
//! - **Ordering** is a three-band list (`trylast` / normal / `tryfirst`)
//!   consumed from the tail, so the most recently registered
//!   implementation of a band runs earliest.
//! - **Wrappers** bracket the whole dispatch and may inspect or replace
//!   the [`Outcome`].
//! - **Historic hooks** memoize every call and replay the history to
//!   implementations registered afterwards.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use solder::{
//!     HookimplMarker, HookspecMarker, PluginHandle, PluginManager, StaticNamespace, kwargs,
//! };
//!
//! let hookspec = HookspecMarker::new("example");
//! let hookimpl = HookimplMarker::new("example");
//!
//! let pm = PluginManager::new("example");
//! let specs = StaticNamespace::named("Hooks").attr(hookspec.spec("he_method1", &["arg"]));
//! pm.add_hookspecs(&specs).unwrap();
//!
//! pm.register(PluginHandle::from_value(
//!     StaticNamespace::new().attr(hookimpl.leaf("he_method1", &["arg"], |kw| Ok(kw["arg"].clone()))),
//! ))
//! .unwrap();
//!
//! let results = pm.hook("he_method1").unwrap().call(kwargs!(arg = 1)).unwrap();
//! assert_eq!(results, serde_json::json!([1]));
//! ```
//!
//! Dispatch is strictly sequential within a call and the runtime performs
//! no cross-thread scheduling of its own; hosts that share a manager
//! across threads serialize their registry mutations.

pub mod entrypoint;
pub mod hook;
pub mod manager;
pub mod trace;

pub use entrypoint::{DistInfo, EntryPoint, EntryPointLoader, EntryPointProvider, LoadError};
pub use hook::{ExtraImpl, HookCaller};
pub use manager::PluginManager;
pub use trace::{AfterFn, BeforeFn, MonitorGuard, TraceRoot, TraceWriter};

// Re-export the core surface so hosts depend on one crate.
pub use solder_core::{
    AttrKind, BoxError, HistoricCall, HookCallError, HookError, HookFn, HookFunction, HookImpl,
    HookSpec, HookimplMarker, HookimplOpts, HookspecMarker, HookspecOpts, ImplDef, Kwargs,
    Namespace, NamespaceAttr, Next, Outcome, PluginError, PluginHandle, PluginKey, PluginResult,
    ResultCallback, SpecDef, StaticNamespace, ValidationError, ValidationKind, WrapperFn,
    extract_impls, extract_specs, kwargs,
};
