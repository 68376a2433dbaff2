//! Unified error types for the Solder dispatch runtime.
//!
//! Registry-level failures (`PluginError`) surface at `register`,
//! `add_hookspecs`, `check_pending`, and the entry-point loader — never
//! silently deferred. Dispatch-level failures travel as [`BoxError`] so an
//! implementation's own error type reaches the hook caller unchanged;
//! [`HookCallError`] and [`HookError`] are the engine-originated values a
//! host can downcast out of that stream.

use thiserror::Error;

use crate::decl::{BoxError, PluginHandle};

// =============================================================================
// Registry errors
// =============================================================================

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin object is already registered (under `name`).
    #[error("plugin is already registered under name '{name}'")]
    DuplicatePlugin {
        /// Name the existing registration holds.
        name: String,
    },

    /// The requested name is held by a different plugin.
    #[error("plugin name '{name}' is already in use")]
    DuplicateName {
        /// The contested name.
        name: String,
    },

    /// `add_hookspecs` found no hook specifications in the namespace.
    #[error("namespace '{namespace}' contributes no hook specifications")]
    NoSpecs {
        /// Display name of the offending namespace.
        namespace: String,
    },

    /// `load_entrypoints` was called without an installed provider.
    #[error("no entry point provider is installed")]
    ProviderUnavailable,

    /// The entry point provider itself failed while iterating a group.
    #[error("entry point provider failed: {0}")]
    Provider(BoxError),

    /// Historic replay of a memoized call failed while registering a plugin.
    #[error("historic replay of hook '{hook}' failed: {error}")]
    Replay {
        /// Hook whose history was being replayed.
        hook: String,
        /// The propagated failure.
        error: BoxError,
    },

    /// A plugin failed validation against a hook specification.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result alias for registry operations.
pub type PluginResult<T> = Result<T, PluginError>;

// =============================================================================
// Validation errors
// =============================================================================

/// A plugin failed validation, with the offending plugin attached.
#[derive(Debug, Error)]
#[error("plugin '{plugin_name}': {kind}")]
pub struct ValidationError {
    /// Handle of the offending plugin, when one exists.
    pub plugin: Option<PluginHandle>,
    /// Name of the offending plugin.
    pub plugin_name: String,
    /// What went wrong.
    pub kind: ValidationKind,
}

/// The specific validation failure.
#[derive(Debug, Error)]
pub enum ValidationKind {
    /// Implementation requests an argument the spec does not declare.
    #[error(
        "hook '{hook_name}' argument '{argname}' is not declared in the spec \
         (declared: {spec_argnames:?})"
    )]
    SignatureMismatch {
        /// The hook in question.
        hook_name: String,
        /// The undeclared argument.
        argname: String,
        /// Arguments the spec declares.
        spec_argnames: Vec<String>,
    },

    /// Implementation exists but no spec was ever published for the hook.
    #[error("hook '{hook_name}' has no matching hook specification")]
    MissingSpec {
        /// The unspecified hook.
        hook_name: String,
    },

    /// Wrapper implementations are forbidden on historic hooks.
    #[error("hook '{hook_name}' is historic and cannot accept a wrapper implementation")]
    HistoricWrapper {
        /// The historic hook.
        hook_name: String,
    },

    /// An entry point failed to load its plugin.
    #[error("could not be loaded: {reason}!")]
    EntryPointLoad {
        /// Message from the underlying loader failure.
        reason: String,
    },
}

// =============================================================================
// Dispatch errors
// =============================================================================

/// A hook call omitted an argument an implementation requires.
///
/// Raised inside dispatch, so it propagates through wrappers as the
/// outcome's error; downcast from [`BoxError`] to observe it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("hook '{hook}' call is missing required argument '{argname}'")]
pub struct HookCallError {
    /// The hook being dispatched.
    pub hook: String,
    /// The missing argument name.
    pub argname: String,
}

/// Misuse of a hook caller's invocation surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookError {
    /// `call` on a historic hook; use `call_historic`.
    #[error("hook '{0}' is historic and cannot be called directly")]
    Historic(String),

    /// `call_historic` on a hook whose spec is not historic.
    #[error("hook '{0}' is not historic")]
    NotHistoric(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = HookCallError {
            hook: "he_method1".into(),
            argname: "arg".into(),
        };
        assert_eq!(
            err.to_string(),
            "hook 'he_method1' call is missing required argument 'arg'"
        );

        let err = ValidationError {
            plugin: None,
            plugin_name: "myname".into(),
            kind: ValidationKind::EntryPointLoad {
                reason: "Some conflict".into(),
            },
        };
        assert_eq!(err.to_string(), "plugin 'myname': could not be loaded: Some conflict!");
    }

    #[test]
    fn test_boxed_call_error_downcasts() {
        let boxed: BoxError = Box::new(HookCallError {
            hook: "h".into(),
            argname: "a".into(),
        });
        assert!(boxed.downcast_ref::<HookCallError>().is_some());
    }
}
