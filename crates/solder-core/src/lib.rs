//! # Solder Core
//!
//! Core declarations and seam traits for the Solder hook dispatch runtime.
//!
//! This crate defines the value records the engine operates on and the
//! contracts between the engine and its host:
//!
//! - **Declarations**: [`HookImpl`] / [`HookSpec`] records with their
//!   option flags ([`HookimplOpts`], [`HookspecOpts`]).
//! - **Markers**: [`HookimplMarker`] / [`HookspecMarker`] produce the
//!   opts-carrying annotations the introspection adapter consumes.
//! - **Introspection seam**: the [`Namespace`] trait and the
//!   [`extract_impls`] / [`extract_specs`] adapter functions.
//! - **Dispatch values**: [`Outcome`] and the [`Next`] continuation that
//!   wrapper implementations bracket the inner chain with.
//! - **Errors**: the full taxonomy from duplicate registration through
//!   dispatch-time argument failures.
//!
//! The engine itself — `HookCaller`, `PluginManager`, tracing, entry-point
//! loading — lives in the `solder` crate.

pub mod decl;
pub mod error;
pub mod introspect;
pub mod macros;
pub mod marker;
pub mod outcome;

pub use decl::{
    BoxError, HistoricCall, HookFn, HookFunction, HookImpl, HookSpec, HookimplOpts, HookspecOpts,
    Kwargs, PluginHandle, PluginKey, ResultCallback, WrapperFn,
};
pub use error::{
    HookCallError, HookError, PluginError, PluginResult, ValidationError, ValidationKind,
};
pub use introspect::{
    AttrKind, ImplDef, Namespace, NamespaceAttr, SpecDef, StaticNamespace, extract_impls,
    extract_specs,
};
pub use marker::{HookimplMarker, HookspecMarker};
pub use outcome::{Next, Outcome};

// ─── Macro-internal re-export (needed by kwargs! at call sites) ──────────────
#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
