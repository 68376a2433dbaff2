//! Plugin registration, validation, and the central hook table.
//!
//! [`PluginManager`] is the owner of all registry state. It:
//!
//! - Accepts plugin objects, derives their canonical name, and attaches
//!   every extracted implementation to the right [`HookCaller`] (creating
//!   callers lazily for hooks no spec has declared yet).
//! - Binds hook specifications from spec namespaces and validates every
//!   implementation against them — at registration time when the spec is
//!   already known, retroactively when the spec arrives later, and at
//!   [`check_pending`](PluginManager::check_pending) for anything still
//!   unmatched.
//! - Tracks blocked names: a blocked name silently refuses registration
//!   (a benign `Ok(None)`, never an error) and survives unregistration.
//! - Hands out live subset views and installs call monitors and tracing.
//! - Ingests externally discovered plugins through an injected
//!   [`EntryPointProvider`].
//!
//! The manager serializes nothing across threads by itself beyond its own
//! bookkeeping; dispatch is strictly sequential within a call, and no
//! internal lock is held while plugin code runs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use solder_core::{
    HookImpl, HookSpec, Kwargs, Namespace, Outcome, PluginError, PluginHandle, PluginKey,
    PluginResult, ValidationError, ValidationKind, extract_impls, extract_specs,
};

use crate::entrypoint::{DistInfo, EntryPoint, EntryPointProvider, LoadError};
use crate::hook::HookCaller;
use crate::trace::{ExecCore, MonitorGuard, TraceRoot};

#[derive(Default)]
struct RegistryState {
    name2plugin: HashMap<String, PluginHandle>,
    plugin2name: HashMap<PluginKey, String>,
    blocked: HashSet<String>,
    hooks: HashMap<String, HookCaller>,
    dist_info: Vec<(PluginHandle, Option<DistInfo>)>,
}

/// Central registry of plugins, hook specifications, and hook callers.
///
/// One manager serves one *project*: only marker annotations created for
/// the same project name are recognized during extraction.
pub struct PluginManager {
    project: String,
    impl_prefix: Option<String>,
    exec: Arc<ExecCore>,
    state: RwLock<RegistryState>,
    provider: Mutex<Option<Arc<dyn EntryPointProvider>>>,
}

impl PluginManager {
    /// Creates a manager for `project` using marker-based discovery.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            impl_prefix: None,
            exec: Arc::new(ExecCore::new()),
            state: RwLock::new(RegistryState::default()),
            provider: Mutex::new(None),
        }
    }

    /// Creates a manager that additionally collects unmarked functions
    /// whose attribute name starts with `prefix`.
    ///
    /// Deprecated discovery mode; prefer marker annotations.
    pub fn with_prefix(project: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        warn!(
            deprecated = true,
            prefix = %prefix,
            "prefix-based hook discovery is deprecated; use marker annotations"
        );
        Self {
            impl_prefix: Some(prefix),
            ..Self::new(project)
        }
    }

    /// The project this manager recognizes markers for.
    pub fn project_name(&self) -> &str {
        &self.project
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Registers a plugin under its canonical name.
    ///
    /// Returns the assigned name, or `Ok(None)` when the name is blocked.
    /// Fails when the object is already registered or the name is taken.
    /// Implementations attached to historic hooks have the memoized
    /// history replayed to them before this method returns.
    pub fn register(&self, plugin: impl Into<PluginHandle>) -> PluginResult<Option<String>> {
        self.register_inner(plugin.into(), None)
    }

    /// Registers a plugin under an explicit name.
    pub fn register_as(
        &self,
        plugin: impl Into<PluginHandle>,
        name: &str,
    ) -> PluginResult<Option<String>> {
        self.register_inner(plugin.into(), Some(name))
    }

    fn register_inner(
        &self,
        handle: PluginHandle,
        name: Option<&str>,
    ) -> PluginResult<Option<String>> {
        let plugin_name = match name {
            Some(name) => name.to_owned(),
            None => canonical_name(&handle),
        };

        {
            let state = self.state.read();
            if state.blocked.contains(&plugin_name) {
                debug!(plugin = %plugin_name, "registration refused, name is blocked");
                return Ok(None);
            }
            if let Some(existing) = state.plugin2name.get(&handle.key()) {
                return Err(PluginError::DuplicatePlugin {
                    name: existing.clone(),
                });
            }
            if state.name2plugin.contains_key(&plugin_name) {
                return Err(PluginError::DuplicateName { name: plugin_name });
            }
        }
        {
            let mut state = self.state.write();
            state.name2plugin.insert(plugin_name.clone(), handle.clone());
            state.plugin2name.insert(handle.key(), plugin_name.clone());
        }

        for def in extract_impls(&self.project, self.impl_prefix.as_deref(), handle.namespace()) {
            let hook = self.hook_or_create(&def.hook_name);
            let imp = HookImpl {
                hook_name: def.hook_name,
                plugin: handle.clone(),
                plugin_name: plugin_name.clone(),
                function: def.function,
                argnames: def.argnames,
                opts: def.opts,
            };
            if let Some(spec) = hook.spec() {
                verify_hookimpl(&spec, &imp).map_err(|kind| ValidationError {
                    plugin: Some(handle.clone()),
                    plugin_name: plugin_name.clone(),
                    kind,
                })?;
                hook.apply_history_to(&imp)
                    .map_err(|error| PluginError::Replay {
                        hook: hook.name().to_owned(),
                        error,
                    })?;
            }
            hook.add(imp);
        }

        info!(plugin = %plugin_name, "plugin registered");
        Ok(Some(plugin_name))
    }

    /// Removes a plugin and strips its implementations from every hook.
    ///
    /// Historic replay state is not rewound. Returns the handle, or `None`
    /// when the plugin is not registered.
    pub fn unregister(&self, plugin: &PluginHandle) -> Option<PluginHandle> {
        self.unregister_inner(Some(plugin), None)
    }

    /// Like [`unregister`](Self::unregister), resolving by name.
    pub fn unregister_name(&self, name: &str) -> Option<PluginHandle> {
        self.unregister_inner(None, Some(name))
    }

    fn unregister_inner(
        &self,
        plugin: Option<&PluginHandle>,
        name: Option<&str>,
    ) -> Option<PluginHandle> {
        let (plugin_name, handle, hooks) = {
            let mut state = self.state.write();
            let (plugin_name, handle) = match (plugin, name) {
                (Some(plugin), _) => {
                    let plugin_name = state.plugin2name.get(&plugin.key())?.clone();
                    (plugin_name, plugin.clone())
                }
                (None, Some(name)) => {
                    let handle = state.name2plugin.get(name)?.clone();
                    (name.to_owned(), handle)
                }
                (None, None) => return None,
            };
            state.plugin2name.remove(&handle.key());
            state.name2plugin.remove(&plugin_name);
            let hooks: Vec<HookCaller> = state.hooks.values().cloned().collect();
            (plugin_name, handle, hooks)
        };

        for hook in hooks {
            hook.remove_plugin(handle.key());
        }
        info!(plugin = %plugin_name, "plugin unregistered");
        Some(handle)
    }

    /// Blocks `name` from ever being registered (again), unregistering
    /// any current occupant first.
    pub fn set_blocked(&self, name: &str) {
        self.unregister_name(name);
        self.state.write().blocked.insert(name.to_owned());
        info!(name = %name, "plugin name blocked");
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// `true` when the plugin object is currently registered.
    pub fn is_registered(&self, plugin: &PluginHandle) -> bool {
        self.state.read().plugin2name.contains_key(&plugin.key())
    }

    /// `true` when `name` is blocked.
    pub fn is_blocked(&self, name: &str) -> bool {
        self.state.read().blocked.contains(name)
    }

    /// `true` when a plugin is registered under `name`.
    pub fn has_plugin(&self, name: &str) -> bool {
        self.state.read().name2plugin.contains_key(name)
    }

    /// The plugin registered under `name`.
    pub fn get_plugin(&self, name: &str) -> Option<PluginHandle> {
        self.state.read().name2plugin.get(name).cloned()
    }

    /// The canonical name the plugin is registered under.
    pub fn get_name(&self, plugin: &PluginHandle) -> Option<String> {
        self.state.read().plugin2name.get(&plugin.key()).cloned()
    }

    /// Every registered plugin.
    pub fn get_plugins(&self) -> Vec<PluginHandle> {
        self.state.read().name2plugin.values().cloned().collect()
    }

    /// `(name, plugin)` pairs for every registered plugin, sorted by name.
    pub fn list_name_plugin(&self) -> Vec<(String, PluginHandle)> {
        let mut pairs: Vec<(String, PluginHandle)> = self
            .state
            .read()
            .name2plugin
            .iter()
            .map(|(name, plugin)| (name.clone(), plugin.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    // ─── Specs and validation ────────────────────────────────────────────────

    /// Publishes every hook specification `namespace` contributes.
    ///
    /// Each spec is bound to its caller (created if missing) and every
    /// already-attached implementation is validated against it.
    pub fn add_hookspecs(&self, namespace: &dyn Namespace) -> PluginResult<()> {
        let namespace_name = namespace.name().unwrap_or("<namespace>").to_owned();
        let defs = extract_specs(&self.project, namespace);
        if defs.is_empty() {
            return Err(PluginError::NoSpecs {
                namespace: namespace_name,
            });
        }
        for def in defs {
            let hook = self.hook_or_create(&def.hook_name);
            let spec = HookSpec {
                hook_name: def.hook_name,
                argnames: def.argnames,
                defaults: def.defaults,
                opts: def.opts,
                namespace: namespace_name.clone(),
            };
            hook.bind_spec(spec.clone());
            for imp in hook.impls_raw() {
                verify_hookimpl(&spec, &imp).map_err(|kind| ValidationError {
                    plugin: Some(imp.plugin.clone()),
                    plugin_name: imp.plugin_name.clone(),
                    kind,
                })?;
            }
        }
        info!(namespace = %namespace_name, "hook specifications added");
        Ok(())
    }

    /// Fails for any implementation whose hook still has no spec, unless
    /// the implementation opted in with `optionalhook`.
    pub fn check_pending(&self) -> PluginResult<()> {
        let hooks: Vec<HookCaller> = self.state.read().hooks.values().cloned().collect();
        for hook in hooks {
            if hook.has_spec() {
                continue;
            }
            for imp in hook.impls_raw() {
                if !imp.opts.optionalhook {
                    return Err(ValidationError {
                        plugin: Some(imp.plugin.clone()),
                        plugin_name: imp.plugin_name.clone(),
                        kind: ValidationKind::MissingSpec {
                            hook_name: hook.name().to_owned(),
                        },
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    // ─── Hook access ─────────────────────────────────────────────────────────

    /// The caller for `name`, if any spec or implementation referenced it.
    pub fn hook(&self, name: &str) -> Option<HookCaller> {
        self.state.read().hooks.get(name).cloned()
    }

    /// Every caller holding at least one implementation from `plugin`,
    /// sorted by hook name.
    pub fn get_hookcallers(&self, plugin: &PluginHandle) -> Vec<HookCaller> {
        let mut hooks: Vec<HookCaller> = self
            .state
            .read()
            .hooks
            .values()
            .filter(|hook| hook.has_impl_of(plugin.key()))
            .cloned()
            .collect();
        hooks.sort_by(|a, b| a.name().cmp(b.name()));
        hooks
    }

    /// Implementations of `name` in the exact order they will execute.
    pub fn get_hookimpls(&self, name: &str) -> Vec<HookImpl> {
        self.hook(name).map(|hook| hook.hookimpls()).unwrap_or_default()
    }

    /// A live view over `name` that excludes every plugin in `remove`.
    ///
    /// The view tracks later registrations and unregistrations on this
    /// manager; only the excluded plugins are filtered out.
    pub fn subset_hook_caller(
        &self,
        name: &str,
        remove: &[PluginHandle],
    ) -> Option<HookCaller> {
        self.hook(name)
            .map(|hook| hook.subset(remove.iter().map(|plugin| plugin.key())))
    }

    fn hook_or_create(&self, name: &str) -> HookCaller {
        let mut state = self.state.write();
        state
            .hooks
            .entry(name.to_owned())
            .or_insert_with(|| HookCaller::new(name, Arc::clone(&self.exec)))
            .clone()
    }

    // ─── Monitoring and tracing ──────────────────────────────────────────────

    /// Installs a monitor pair around every dispatch.
    ///
    /// `before` runs in installation order with a snapshot of the
    /// implementations about to execute; `after` runs in reverse order
    /// with the outcome. Multiple monitors compose; the returned guard
    /// removes exactly this pair.
    pub fn add_hookcall_monitoring<B, A>(&self, before: B, after: A) -> MonitorGuard
    where
        B: Fn(&str, &[HookImpl], &Kwargs) + Send + Sync + 'static,
        A: Fn(&Outcome, &str, &[HookImpl], &Kwargs) + Send + Sync + 'static,
    {
        self.exec.add_monitoring(Arc::new(before), Arc::new(after))
    }

    /// Installs a monitor pair that writes indented trace lines through
    /// the [trace root](Self::trace_root)'s writer.
    pub fn enable_tracing(&self) -> MonitorGuard {
        self.exec.enable_tracing()
    }

    /// This registry's trace root.
    pub fn trace_root(&self) -> Arc<TraceRoot> {
        self.exec.trace_root()
    }

    // ─── Entry points ────────────────────────────────────────────────────────

    /// Injects the external package discovery collaborator.
    pub fn set_entrypoint_provider(&self, provider: Arc<dyn EntryPointProvider>) {
        *self.provider.lock() = Some(provider);
    }

    /// Loads and registers every entry point of `group`; returns how many
    /// were loaded.
    ///
    /// A version conflict while loading becomes a validation error naming
    /// the plugin; any other provider or loader failure propagates
    /// unmasked. Fails when no provider is installed.
    pub fn load_entrypoints(&self, group: &str) -> PluginResult<usize> {
        let provider = self
            .provider
            .lock()
            .clone()
            .ok_or(PluginError::ProviderUnavailable)?;
        let entry_points = provider.entry_points(group).map_err(PluginError::Provider)?;

        let mut count = 0;
        for entry_point in entry_points {
            let EntryPoint { name, dist, loader } = entry_point;
            let plugin = match loader() {
                Ok(plugin) => plugin,
                Err(LoadError::VersionConflict(reason)) => {
                    return Err(ValidationError {
                        plugin: None,
                        plugin_name: name,
                        kind: ValidationKind::EntryPointLoad { reason },
                    }
                    .into());
                }
                Err(LoadError::Other(error)) => return Err(PluginError::Provider(error)),
            };
            let handle = PluginHandle::new(plugin);
            self.register_inner(handle.clone(), Some(&name))?;
            self.state.write().dist_info.push((handle, dist));
            count += 1;
        }
        info!(group = %group, count, "entry points loaded");
        Ok(count)
    }

    /// `(plugin, dist)` pairs recorded by
    /// [`load_entrypoints`](Self::load_entrypoints), in load order.
    pub fn list_plugin_distinfo(&self) -> Vec<(PluginHandle, Option<DistInfo>)> {
        self.state.read().dist_info.clone()
    }
}

fn canonical_name(handle: &PluginHandle) -> String {
    match handle.namespace().name() {
        Some(name) => name.to_owned(),
        None => handle.key().to_string(),
    }
}

/// Validates one implementation against the spec of its hook.
fn verify_hookimpl(spec: &HookSpec, imp: &HookImpl) -> Result<(), ValidationKind> {
    if spec.opts.historic && imp.opts.hookwrapper {
        return Err(ValidationKind::HistoricWrapper {
            hook_name: spec.hook_name.clone(),
        });
    }
    for argname in &imp.argnames {
        if !spec.argnames.contains(argname) {
            return Err(ValidationKind::SignatureMismatch {
                hook_name: spec.hook_name.clone(),
                argname: argname.clone(),
                spec_argnames: spec.argnames.clone(),
            });
        }
    }
    if let Some(message) = &spec.opts.warn_on_impl {
        warn!(
            hook = %spec.hook_name,
            plugin = %imp.plugin_name,
            deprecated = true,
            "{message}"
        );
    }
    Ok(())
}
