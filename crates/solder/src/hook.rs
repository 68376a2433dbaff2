//! Per-hook callers: ordering, the multi-call protocol, and historic replay.
//!
//! A [`HookCaller`] owns everything the engine knows about one hook name:
//! the optional spec, the ordered implementation list, and — for historic
//! hooks — the memoized call history. Callers are cheap-clone handles over
//! shared state; a subset view obtained from
//! [`PluginManager::subset_hook_caller`] is the same type with a
//! remove-set applied at snapshot time, which keeps the view live across
//! later registrations and unregistrations.
//!
//! # Ordering
//!
//! The implementation list is maintained as three bands — `trylast`,
//! normal, `tryfirst` — and consumed from the tail backwards at dispatch
//! time, so `tryfirst` implementations run first and, within a band, the
//! most recently added runs earlier (`trylast` is the mirror image: the
//! most recently added runs later).
//!
//! [`PluginManager::subset_hook_caller`]: crate::manager::PluginManager::subset_hook_caller

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

use solder_core::{
    BoxError, HistoricCall, HookCallError, HookError, HookFn, HookFunction, HookImpl, HookSpec,
    HookimplOpts, Kwargs, Next, Outcome, PluginHandle, PluginKey, ResultCallback, StaticNamespace,
};

use crate::trace::ExecCore;

// =============================================================================
// HookCaller
// =============================================================================

#[derive(Default)]
struct HookState {
    spec: Option<HookSpec>,
    impls: Vec<HookImpl>,
    history: Vec<HistoricCall>,
}

struct HookInner {
    name: String,
    exec: Arc<ExecCore>,
    state: RwLock<HookState>,
}

/// The caller for one named hook.
///
/// Cloning yields another handle to the same underlying hook; state
/// changes through the registry are visible to every handle.
#[derive(Clone)]
pub struct HookCaller {
    inner: Arc<HookInner>,
    removed: Arc<HashSet<PluginKey>>,
}

impl HookCaller {
    pub(crate) fn new(name: impl Into<String>, exec: Arc<ExecCore>) -> Self {
        Self {
            inner: Arc::new(HookInner {
                name: name.into(),
                exec,
                state: RwLock::new(HookState::default()),
            }),
            removed: Arc::new(HashSet::new()),
        }
    }

    /// The hook name this caller dispatches.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// `true` once a spec has been bound.
    pub fn has_spec(&self) -> bool {
        self.inner.state.read().spec.is_some()
    }

    /// The bound spec, if any.
    pub fn spec(&self) -> Option<HookSpec> {
        self.inner.state.read().spec.clone()
    }

    /// `true` when the bound spec is historic.
    pub fn is_historic(&self) -> bool {
        self.inner
            .state
            .read()
            .spec
            .as_ref()
            .is_some_and(|spec| spec.opts.historic)
    }

    /// Implementations in the exact order they will execute.
    ///
    /// Wrappers appear at their traversal position; subset views exclude
    /// their removed plugins.
    pub fn hookimpls(&self) -> Vec<HookImpl> {
        let (mut impls, _) = self.snapshot();
        impls.reverse();
        impls
    }

    // ─── Dispatch ────────────────────────────────────────────────────────────

    /// Dispatches the hook across every matching implementation.
    ///
    /// Returns the collected non-null results as a `Value::Array`, or the
    /// first non-null result as a scalar when the spec is `firstresult`.
    /// Direct calls on historic hooks are rejected; use
    /// [`call_historic`](Self::call_historic).
    pub fn call(&self, kwargs: Kwargs) -> Result<Value, BoxError> {
        let (impls, spec) = self.snapshot();
        if let Some(spec) = &spec {
            if spec.opts.historic {
                return Err(Box::new(HookError::Historic(self.inner.name.clone())));
            }
            warn_argument_mismatches(spec, &kwargs);
        }
        let firstresult = spec.as_ref().is_some_and(|spec| spec.opts.firstresult);
        self.dispatch(impls, spec.as_ref(), &kwargs, firstresult)
    }

    /// Dispatches with `extra` one-off implementations merged into the
    /// normal band, leaving the caller itself untouched.
    pub fn call_extra(&self, extra: Vec<ExtraImpl>, kwargs: Kwargs) -> Result<Value, BoxError> {
        let (mut impls, spec) = self.snapshot();
        if let Some(spec) = &spec {
            if spec.opts.historic {
                return Err(Box::new(HookError::Historic(self.inner.name.clone())));
            }
            warn_argument_mismatches(spec, &kwargs);
        }
        for extra in extra {
            let plugin = PluginHandle::from_value(StaticNamespace::named(extra.name.clone()));
            insert_in_band(
                &mut impls,
                HookImpl {
                    hook_name: self.inner.name.clone(),
                    plugin,
                    plugin_name: extra.name,
                    function: HookFunction::Leaf(extra.function),
                    argnames: extra.argnames,
                    opts: HookimplOpts::default(),
                },
            );
        }
        let firstresult = spec.as_ref().is_some_and(|spec| spec.opts.firstresult);
        self.dispatch(impls, spec.as_ref(), &kwargs, firstresult)
    }

    /// Memoizes `kwargs` and dispatches to the currently attached
    /// implementations.
    ///
    /// The call is appended to the history *before* dispatching.
    /// `result_callback` is invoked with each non-null result now, and
    /// again for every implementation registered later when the history
    /// is replayed to it. Historic dispatch always collects the full
    /// result list; a `firstresult` flag on the spec is ignored here.
    pub fn call_historic(
        &self,
        kwargs: Kwargs,
        result_callback: Option<ResultCallback>,
    ) -> Result<(), BoxError> {
        if !self.is_historic() {
            return Err(Box::new(HookError::NotHistoric(self.inner.name.clone())));
        }
        self.inner.state.write().history.push(HistoricCall {
            kwargs: kwargs.clone(),
            callback: result_callback.clone(),
        });

        let (impls, spec) = self.snapshot();
        let result = self.dispatch(impls, spec.as_ref(), &kwargs, false)?;
        if let Some(callback) = result_callback
            && let Value::Array(results) = result
        {
            for value in &results {
                callback(value);
            }
        }
        Ok(())
    }

    fn dispatch(
        &self,
        impls: Vec<HookImpl>,
        spec: Option<&HookSpec>,
        kwargs: &Kwargs,
        firstresult: bool,
    ) -> Result<Value, BoxError> {
        let span = tracing::trace_span!("dispatch", hook = %self.inner.name);
        let _enter = span.enter();

        self.inner
            .exec
            .surround(&self.inner.name, &impls, kwargs, || {
                multicall(&impls, spec, kwargs, firstresult)
            })
            .into_result()
    }

    // ─── Registry-facing state changes ───────────────────────────────────────

    pub(crate) fn bind_spec(&self, spec: HookSpec) {
        self.inner.state.write().spec = Some(spec);
    }

    /// Inserts an implementation into its band.
    pub(crate) fn add(&self, imp: HookImpl) {
        insert_in_band(&mut self.inner.state.write().impls, imp);
    }

    /// Strips every implementation owned by `key`; returns whether any
    /// was present.
    pub(crate) fn remove_plugin(&self, key: PluginKey) -> bool {
        let mut state = self.inner.state.write();
        let before = state.impls.len();
        state.impls.retain(|imp| imp.plugin.key() != key);
        state.impls.len() != before
    }

    /// Unfiltered implementation list in insertion-band order.
    pub(crate) fn impls_raw(&self) -> Vec<HookImpl> {
        self.inner.state.read().impls.clone()
    }

    pub(crate) fn has_impl_of(&self, key: PluginKey) -> bool {
        self.inner
            .state
            .read()
            .impls
            .iter()
            .any(|imp| imp.plugin.key() == key)
    }

    /// Replays the memoized history, in insertion order, to `imp` alone.
    ///
    /// Called while registering a plugin against a historic hook, before
    /// the implementation joins the list. Each replay runs through the
    /// monitor stack like any dispatch and, like `call_historic`, always
    /// collects a result list.
    pub(crate) fn apply_history_to(&self, imp: &HookImpl) -> Result<(), BoxError> {
        if !self.is_historic() {
            return Ok(());
        }
        let (history, spec) = {
            let state = self.inner.state.read();
            (state.history.clone(), state.spec.clone())
        };
        let single = vec![imp.clone()];
        for call in history {
            let result = self.dispatch(single.clone(), spec.as_ref(), &call.kwargs, false)?;
            if let Some(callback) = &call.callback
                && let Value::Array(results) = result
                && let Some(value) = results.first()
            {
                callback(value);
            }
        }
        Ok(())
    }

    /// A live view excluding `remove` in addition to anything this view
    /// already excludes.
    pub(crate) fn subset(&self, remove: impl IntoIterator<Item = PluginKey>) -> HookCaller {
        let mut removed: HashSet<PluginKey> = (*self.removed).clone();
        removed.extend(remove);
        HookCaller {
            inner: Arc::clone(&self.inner),
            removed: Arc::new(removed),
        }
    }

    fn snapshot(&self) -> (Vec<HookImpl>, Option<HookSpec>) {
        let state = self.inner.state.read();
        let impls = state
            .impls
            .iter()
            .filter(|imp| !self.removed.contains(&imp.plugin.key()))
            .cloned()
            .collect();
        (impls, state.spec.clone())
    }
}

impl fmt::Debug for HookCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("HookCaller")
            .field("name", &self.inner.name)
            .field("has_spec", &state.spec.is_some())
            .field("impl_count", &state.impls.len())
            .field("removed", &self.removed.len())
            .finish()
    }
}

// =============================================================================
// call_extra support
// =============================================================================

/// A one-off implementation supplied to [`HookCaller::call_extra`].
pub struct ExtraImpl {
    name: String,
    argnames: Vec<String>,
    function: HookFn,
}

impl ExtraImpl {
    /// Wraps a function for a single dispatch.
    pub fn new<F>(name: impl Into<String>, argnames: &[&str], function: F) -> Self
    where
        F: Fn(&Kwargs) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            argnames: argnames.iter().map(|s| s.to_string()).collect(),
            function: Arc::new(function),
        }
    }
}

// =============================================================================
// Ordering and the multi-call protocol
// =============================================================================

/// Band insertion: `trylast` prepends, `tryfirst` appends, normal entries
/// land at the end of the normal band (just below any `tryfirst` tail).
pub(crate) fn insert_in_band(impls: &mut Vec<HookImpl>, imp: HookImpl) {
    if imp.opts.trylast {
        impls.insert(0, imp);
    } else if imp.opts.tryfirst {
        impls.push(imp);
    } else {
        let mut at = impls.len();
        while at > 0 && impls[at - 1].opts.tryfirst {
            at -= 1;
        }
        impls.insert(at, imp);
    }
}

/// Executes one dispatch: wrappers nest outer-to-inner from the list
/// tail, leaves run tail-to-head inside them.
fn multicall(
    impls: &[HookImpl],
    spec: Option<&HookSpec>,
    kwargs: &Kwargs,
    firstresult: bool,
) -> Outcome {
    let (wrappers, leaves): (Vec<&HookImpl>, Vec<&HookImpl>) =
        impls.iter().partition(|imp| imp.function.is_wrapper());
    run_wrapped(&wrappers, &leaves, spec, kwargs, firstresult)
}

fn run_wrapped(
    wrappers: &[&HookImpl],
    leaves: &[&HookImpl],
    spec: Option<&HookSpec>,
    kwargs: &Kwargs,
    firstresult: bool,
) -> Outcome {
    let Some((outer, inner)) = wrappers.split_last() else {
        return run_leaves(leaves, spec, kwargs, firstresult);
    };
    let args = match extract_args(outer, spec, kwargs) {
        Ok(args) => args,
        Err(error) => return Outcome::err(error),
    };
    match &outer.function {
        HookFunction::Wrapper(wrap) => {
            let mut next = || run_wrapped(inner, leaves, spec, kwargs, firstresult);
            wrap(&args, Next::new(&mut next))
        }
        HookFunction::Leaf(_) => run_wrapped(inner, leaves, spec, kwargs, firstresult),
    }
}

fn run_leaves(
    leaves: &[&HookImpl],
    spec: Option<&HookSpec>,
    kwargs: &Kwargs,
    firstresult: bool,
) -> Outcome {
    let mut results = Vec::new();
    for imp in leaves.iter().rev() {
        let args = match extract_args(imp, spec, kwargs) {
            Ok(args) => args,
            Err(error) => return Outcome::err(error),
        };
        let HookFunction::Leaf(function) = &imp.function else {
            continue;
        };
        match function(&args) {
            Ok(Value::Null) => {}
            Ok(value) => {
                if firstresult {
                    return Outcome::ok(value);
                }
                results.push(value);
            }
            Err(error) => return Outcome::err(error),
        }
    }
    if firstresult {
        Outcome::ok(Value::Null)
    } else {
        Outcome::ok(Value::Array(results))
    }
}

/// Builds the argument map one implementation requested, falling back to
/// spec defaults for omitted names.
fn extract_args(
    imp: &HookImpl,
    spec: Option<&HookSpec>,
    kwargs: &Kwargs,
) -> Result<Kwargs, BoxError> {
    let mut args = Kwargs::new();
    for name in &imp.argnames {
        if let Some(value) = kwargs.get(name) {
            args.insert(name.clone(), value.clone());
        } else if let Some(default) = spec.and_then(|spec| spec.defaults.get(name)) {
            args.insert(name.clone(), default.clone());
        } else {
            return Err(Box::new(HookCallError {
                hook: imp.hook_name.clone(),
                argname: name.clone(),
            }));
        }
    }
    Ok(args)
}

fn warn_argument_mismatches(spec: &HookSpec, kwargs: &Kwargs) {
    for argname in &spec.argnames {
        if !kwargs.contains_key(argname) && !spec.defaults.contains_key(argname) {
            warn!(
                hook = %spec.hook_name,
                argument = %argname,
                "hook spec declares an argument the call does not supply"
            );
        }
    }
    for supplied in kwargs.keys() {
        if !spec.argnames.iter().any(|argname| argname == supplied) {
            warn!(
                hook = %spec.hook_name,
                argument = %supplied,
                "call supplies an argument the hook spec does not declare"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use solder_core::{HookspecOpts, kwargs};

    fn caller(name: &str) -> HookCaller {
        HookCaller::new(name, Arc::new(ExecCore::new()))
    }

    fn leaf(
        hook: &str,
        plugin_name: &str,
        opts: HookimplOpts,
        f: impl Fn(&Kwargs) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> HookImpl {
        HookImpl {
            hook_name: hook.into(),
            plugin: PluginHandle::from_value(StaticNamespace::named(plugin_name)),
            plugin_name: plugin_name.into(),
            function: HookFunction::Leaf(Arc::new(f)),
            argnames: vec!["arg".into()],
            opts,
        }
    }

    fn spec(hook: &str, opts: HookspecOpts) -> HookSpec {
        HookSpec {
            hook_name: hook.into(),
            argnames: vec!["arg".into()],
            defaults: Kwargs::new(),
            opts,
            namespace: "Hooks".into(),
        }
    }

    #[test]
    fn test_recent_registration_runs_first() {
        let hook = caller("he_method1");
        hook.add(leaf("he_method1", "p1", HookimplOpts::default(), |kw| {
            Ok(kw["arg"].clone())
        }));
        hook.add(leaf("he_method1", "p2", HookimplOpts::default(), |kw| {
            Ok(json!(kw["arg"].as_i64().unwrap() * 10))
        }));

        assert_eq!(hook.call(kwargs!(arg = 1)).unwrap(), json!([10, 1]));
    }

    #[test]
    fn test_three_band_ordering() {
        let first = HookimplOpts {
            tryfirst: true,
            ..Default::default()
        };
        let last = HookimplOpts {
            trylast: true,
            ..Default::default()
        };
        let normal = HookimplOpts::default();

        let hook = caller("h");
        for (name, opts) in [
            ("normal1", normal),
            ("last1", last),
            ("first1", first),
            ("normal2", normal),
            ("last2", last),
            ("first2", first),
        ] {
            hook.add(leaf("h", name, opts, |_| Ok(Value::Null)));
        }

        let order: Vec<String> = hook
            .hookimpls()
            .iter()
            .map(|imp| imp.plugin_name.clone())
            .collect();
        assert_eq!(
            order,
            ["first2", "first1", "normal2", "normal1", "last1", "last2"]
        );
    }

    #[test]
    fn test_firstresult_stops_at_first_value() {
        let hook = caller("he_method1");
        hook.bind_spec(spec(
            "he_method1",
            HookspecOpts {
                firstresult: true,
                ..Default::default()
            },
        ));
        let late_ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&late_ran);
        hook.add(leaf("he_method1", "p1", HookimplOpts::default(), move |_| {
            *flag.lock() = true;
            Ok(json!(1))
        }));
        hook.add(leaf("he_method1", "p2", HookimplOpts::default(), |_| Ok(Value::Null)));
        hook.add(leaf("he_method1", "p3", HookimplOpts::default(), |_| Ok(json!(3))));

        assert_eq!(hook.call(kwargs!(arg = 0)).unwrap(), json!(3));
        assert!(!*late_ran.lock());
    }

    #[test]
    fn test_missing_argument_is_hook_call_error() {
        let hook = caller("he_method1");
        hook.add(leaf("he_method1", "p1", HookimplOpts::default(), |_| {
            panic!("implementation must not run without its arguments")
        }));

        let error = hook.call(kwargs!()).unwrap_err();
        let call_error = error.downcast_ref::<HookCallError>().unwrap();
        assert_eq!(call_error.argname, "arg");
    }

    #[test]
    fn test_spec_default_fills_missing_argument() {
        let hook = caller("he_method1");
        let mut with_default = spec("he_method1", HookspecOpts::default());
        with_default.defaults = kwargs!(arg = 7);
        hook.bind_spec(with_default);
        hook.add(leaf("he_method1", "p1", HookimplOpts::default(), |kw| {
            Ok(kw["arg"].clone())
        }));

        assert_eq!(hook.call(kwargs!()).unwrap(), json!([7]));
    }

    #[test]
    fn test_wrappers_nest_and_can_force_result() {
        let hook = caller("h");
        let log = Arc::new(Mutex::new(Vec::new()));

        let leaf_log = Arc::clone(&log);
        hook.add(leaf("h", "leaf", HookimplOpts::default(), move |_| {
            leaf_log.lock().push("leaf");
            Ok(json!(1))
        }));
        for tag in ["inner", "outer"] {
            let before_log = Arc::clone(&log);
            hook.add(HookImpl {
                hook_name: "h".into(),
                plugin: PluginHandle::from_value(StaticNamespace::named(tag)),
                plugin_name: tag.into(),
                function: HookFunction::Wrapper(Arc::new(move |_, next| {
                    before_log.lock().push(if tag == "outer" { "outer-before" } else { "inner-before" });
                    let outcome = next.call();
                    before_log.lock().push(if tag == "outer" { "outer-after" } else { "inner-after" });
                    outcome
                })),
                argnames: Vec::new(),
                opts: HookimplOpts {
                    hookwrapper: true,
                    ..Default::default()
                },
            });
        }

        assert_eq!(hook.call(kwargs!(arg = 0)).unwrap(), json!([1]));
        assert_eq!(
            *log.lock(),
            ["outer-before", "inner-before", "leaf", "inner-after", "outer-after"]
        );
    }

    #[test]
    fn test_wrapper_suppresses_leaf_failure() {
        let hook = caller("h");
        hook.add(leaf("h", "bad", HookimplOpts::default(), |_| Err("boom".into())));
        hook.add(HookImpl {
            hook_name: "h".into(),
            plugin: PluginHandle::from_value(StaticNamespace::named("wrap")),
            plugin_name: "wrap".into(),
            function: HookFunction::Wrapper(Arc::new(|_, next| {
                let mut outcome = next.call();
                if outcome.is_failure() {
                    outcome.force_result(json!(["recovered"]));
                }
                outcome
            })),
            argnames: Vec::new(),
            opts: HookimplOpts {
                hookwrapper: true,
                ..Default::default()
            },
        });

        assert_eq!(hook.call(kwargs!(arg = 0)).unwrap(), json!(["recovered"]));
    }

    #[test]
    fn test_leaf_failure_aborts_remaining_leaves() {
        let hook = caller("h");
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        hook.add(leaf("h", "earlier", HookimplOpts::default(), move |_| {
            *flag.lock() = true;
            Ok(Value::Null)
        }));
        hook.add(leaf("h", "failing", HookimplOpts::default(), |_| Err("boom".into())));

        assert!(hook.call(kwargs!(arg = 0)).is_err());
        assert!(!*ran.lock());
    }

    #[test]
    fn test_call_extra_merges_into_normal_band() {
        let hook = caller("he_method1");
        hook.add(leaf("he_method1", "p1", HookimplOpts::default(), |kw| {
            Ok(kw["arg"].clone())
        }));

        let extra = ExtraImpl::new("extra", &["arg"], |kw: &Kwargs| {
            Ok(json!(kw["arg"].as_i64().unwrap() * 10))
        });
        assert_eq!(
            hook.call_extra(vec![extra], kwargs!(arg = 1)).unwrap(),
            json!([10, 1])
        );
        // the caller itself is untouched
        assert_eq!(hook.hookimpls().len(), 1);
    }

    #[test]
    fn test_historic_direct_call_rejected() {
        let hook = caller("he_method1");
        hook.bind_spec(spec(
            "he_method1",
            HookspecOpts {
                historic: true,
                ..Default::default()
            },
        ));
        let error = hook.call(kwargs!(arg = 1)).unwrap_err();
        assert!(error.downcast_ref::<HookError>().is_some());

        let plain = caller("other");
        assert!(plain.call_historic(kwargs!(arg = 1), None).is_err());
    }

    #[test]
    fn test_history_replay_to_new_impl() {
        let hook = caller("he_method1");
        hook.bind_spec(spec(
            "he_method1",
            HookspecOpts {
                historic: true,
                ..Default::default()
            },
        ));
        hook.call_historic(kwargs!(arg = 1), None).unwrap();

        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&out);
        let imp = leaf("he_method1", "p1", HookimplOpts::default(), move |kw| {
            sink.lock().push(kw["arg"].clone());
            Ok(Value::Null)
        });
        hook.apply_history_to(&imp).unwrap();
        hook.add(imp);

        assert_eq!(*out.lock(), [json!(1)]);
    }

    #[test]
    fn test_historic_ignores_firstresult() {
        let hook = caller("he_method1");
        hook.bind_spec(spec(
            "he_method1",
            HookspecOpts {
                historic: true,
                firstresult: true,
                ..Default::default()
            },
        ));
        hook.add(leaf("he_method1", "p1", HookimplOpts::default(), |kw| {
            Ok(json!(kw["arg"].as_i64().unwrap() * 10))
        }));
        hook.add(leaf("he_method1", "p2", HookimplOpts::default(), |kw| {
            Ok(json!(kw["arg"].as_i64().unwrap() * 20))
        }));

        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&out);
        hook.call_historic(
            kwargs!(arg = 1),
            Some(Arc::new(move |value: &Value| sink.lock().push(value.clone()))),
        )
        .unwrap();
        // every result reaches the callback, not just the first
        assert_eq!(*out.lock(), [json!(20), json!(10)]);

        let imp = leaf("he_method1", "p3", HookimplOpts::default(), |kw| {
            Ok(json!(kw["arg"].as_i64().unwrap() * 30))
        });
        hook.apply_history_to(&imp).unwrap();
        hook.add(imp);
        assert_eq!(*out.lock(), [json!(20), json!(10), json!(30)]);
    }

    #[test]
    fn test_subset_view_is_live() {
        let hook = caller("h");
        let p1 = PluginHandle::from_value(StaticNamespace::named("p1"));
        hook.add(HookImpl {
            hook_name: "h".into(),
            plugin: p1.clone(),
            plugin_name: "p1".into(),
            function: HookFunction::Leaf(Arc::new(|_| Ok(json!(1)))),
            argnames: Vec::new(),
            opts: HookimplOpts::default(),
        });
        let view = hook.subset([p1.key()]);
        assert!(view.hookimpls().is_empty());

        // registrations after the view was taken are still visible
        hook.add(leaf("h", "p2", HookimplOpts::default(), |kw| Ok(kw["arg"].clone())));
        assert_eq!(view.call(kwargs!(arg = 2)).unwrap(), json!([2]));
    }
}
