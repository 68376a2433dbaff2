//! Call monitoring and human-readable dispatch tracing.
//!
//! Every dispatch is bracketed by a stack of monitor pairs: each `before`
//! runs in registration order with a defensive snapshot of the
//! implementations about to execute, each `after` runs in reverse order
//! with the [`Outcome`] — unconditionally, also when the outcome is a
//! failure. [`PluginManager::enable_tracing`] installs a pair that writes
//! indented lines through the per-registry [`TraceRoot`]; nested dispatches
//! raise the indent so the output reads hierarchically.
//!
//! [`PluginManager::enable_tracing`]: crate::manager::PluginManager::enable_tracing

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use solder_core::{HookImpl, Kwargs, Outcome};

/// Monitor callback invoked before a dispatch.
pub type BeforeFn = Arc<dyn Fn(&str, &[HookImpl], &Kwargs) + Send + Sync>;

/// Monitor callback invoked after a dispatch, with its outcome.
pub type AfterFn = Arc<dyn Fn(&Outcome, &str, &[HookImpl], &Kwargs) + Send + Sync>;

/// Sink for trace lines produced by [`enable_tracing`].
///
/// [`enable_tracing`]: crate::manager::PluginManager::enable_tracing
pub type TraceWriter = Arc<dyn Fn(&str) + Send + Sync>;

// =============================================================================
// TraceRoot
// =============================================================================

/// Per-registry trace state: the nesting indent and the line writer.
///
/// The indent is raised before a dispatch and lowered after it, failure or
/// not, and is readable by implementations mid-call — a nested dispatch
/// therefore observes a deeper indent than its parent.
pub struct TraceRoot {
    indent: AtomicUsize,
    writer: Mutex<Option<TraceWriter>>,
}

impl TraceRoot {
    fn new() -> Self {
        Self {
            indent: AtomicUsize::new(0),
            writer: Mutex::new(None),
        }
    }

    /// Current nesting depth.
    pub fn indent(&self) -> usize {
        self.indent.load(Ordering::Relaxed)
    }

    /// Installs the line writer trace output goes to.
    pub fn set_writer<W>(&self, writer: W)
    where
        W: Fn(&str) + Send + Sync + 'static,
    {
        *self.writer.lock() = Some(Arc::new(writer));
    }

    fn raise(&self) -> usize {
        self.indent.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lower(&self) {
        self.indent.fetch_sub(1, Ordering::Relaxed);
    }

    fn write(&self, line: &str) {
        if let Some(writer) = self.writer.lock().clone() {
            writer(line);
        }
    }
}

// =============================================================================
// ExecCore
// =============================================================================

struct MonitorPair {
    id: u64,
    before: BeforeFn,
    after: AfterFn,
}

impl Clone for MonitorPair {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            before: Arc::clone(&self.before),
            after: Arc::clone(&self.after),
        }
    }
}

/// Shared execution spine of one registry: the monitor stack and the
/// trace root, referenced by every hook caller the registry creates.
pub(crate) struct ExecCore {
    monitors: RwLock<Vec<MonitorPair>>,
    next_id: AtomicU64,
    trace: Arc<TraceRoot>,
}

impl ExecCore {
    pub(crate) fn new() -> Self {
        Self {
            monitors: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            trace: Arc::new(TraceRoot::new()),
        }
    }

    pub(crate) fn trace_root(&self) -> Arc<TraceRoot> {
        Arc::clone(&self.trace)
    }

    pub(crate) fn add_monitoring(
        self: &Arc<Self>,
        before: BeforeFn,
        after: AfterFn,
    ) -> MonitorGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.monitors.write().push(MonitorPair { id, before, after });
        MonitorGuard {
            core: Arc::clone(self),
            id,
        }
    }

    pub(crate) fn enable_tracing(self: &Arc<Self>) -> MonitorGuard {
        let trace_before = self.trace_root();
        let trace_after = self.trace_root();

        let before: BeforeFn = Arc::new(move |hook_name, _impls, kwargs| {
            let indent = trace_before.raise();
            let args = Value::Object(kwargs.clone());
            trace_before.write(&format!("{}{} [{}]\n", "  ".repeat(indent), hook_name, args));
        });
        let after: AfterFn = Arc::new(move |outcome, hook_name, _impls, _kwargs| {
            if let Ok(result) = outcome.get_result() {
                let indent = trace_after.indent();
                trace_after.write(&format!(
                    "{}finish {} --> {}\n",
                    "  ".repeat(indent),
                    hook_name,
                    result
                ));
            }
            trace_after.lower();
        });

        self.add_monitoring(before, after)
    }

    /// Runs `exec` inside the monitor stack: befores in registration
    /// order, afters in reverse, both over the same impl snapshot.
    pub(crate) fn surround(
        &self,
        hook_name: &str,
        impls: &[HookImpl],
        kwargs: &Kwargs,
        exec: impl FnOnce() -> Outcome,
    ) -> Outcome {
        let monitors: Vec<MonitorPair> = self.monitors.read().clone();
        for monitor in &monitors {
            (monitor.before)(hook_name, impls, kwargs);
        }
        let outcome = exec();
        for monitor in monitors.iter().rev() {
            (monitor.after)(&outcome, hook_name, impls, kwargs);
        }
        outcome
    }
}

// =============================================================================
// MonitorGuard
// =============================================================================

/// Handle to one installed monitor pair.
///
/// Returned by [`add_hookcall_monitoring`] and [`enable_tracing`];
/// consuming it with [`undo`](MonitorGuard::undo) removes exactly that
/// pair, leaving any other installed monitors in place.
///
/// [`add_hookcall_monitoring`]: crate::manager::PluginManager::add_hookcall_monitoring
/// [`enable_tracing`]: crate::manager::PluginManager::enable_tracing
#[must_use = "dropping the guard keeps the monitor installed; call undo() to remove it"]
pub struct MonitorGuard {
    core: Arc<ExecCore>,
    id: u64,
}

impl MonitorGuard {
    /// Removes the monitor pair this guard was issued for.
    pub fn undo(self) {
        self.core.monitors.write().retain(|m| m.id != self.id);
    }
}
