//! Marker values that annotate functions as hook implementations or specs.
//!
//! A marker is instantiated once per project and produces opts-carrying
//! [`NamespaceAttr`] values for the introspection adapter to consume. The
//! registry only ever sees the resulting attribute table; how a host
//! attaches the annotation is its own business.
//!
//! ```rust,ignore
//! let hookimpl = HookimplMarker::new("example");
//!
//! // inside Namespace::attributes():
//! vec![
//!     hookimpl.leaf("he_method1", &["arg"], |kw| Ok(kw["arg"].clone())),
//!     hookimpl.clone().tryfirst().leaf("he_method2", &[], |_| Ok(Value::Null)),
//! ]
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::decl::{BoxError, HookFunction, HookimplOpts, HookspecOpts, Kwargs};
use crate::introspect::{AttrKind, NamespaceAttr};
use crate::outcome::{Next, Outcome};

// =============================================================================
// HookimplMarker
// =============================================================================

/// Produces implementation annotations for one project.
#[derive(Clone, Debug)]
pub struct HookimplMarker {
    project: String,
    opts: HookimplOpts,
}

impl HookimplMarker {
    /// A marker for `project` with empty opts.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            opts: HookimplOpts::default(),
        }
    }

    /// The project this marker annotates for.
    pub fn project_name(&self) -> &str {
        &self.project
    }

    /// Run before the normal band.
    pub fn tryfirst(mut self) -> Self {
        self.opts.tryfirst = true;
        self
    }

    /// Run after the normal band.
    pub fn trylast(mut self) -> Self {
        self.opts.trylast = true;
        self
    }

    /// Tolerate a missing spec at `check_pending` time.
    pub fn optionalhook(mut self) -> Self {
        self.opts.optionalhook = true;
        self
    }

    /// Annotates a leaf implementation.
    pub fn leaf<F>(&self, name: impl Into<String>, argnames: &[&str], function: F) -> NamespaceAttr
    where
        F: Fn(&Kwargs) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        NamespaceAttr {
            name: name.into(),
            kind: AttrKind::HookImpl {
                project: self.project.clone(),
                opts: self.opts,
                argnames: argnames.iter().map(|s| s.to_string()).collect(),
                function: HookFunction::Leaf(Arc::new(function)),
            },
        }
    }

    /// Annotates a wrapper implementation; sets the `hookwrapper` flag.
    pub fn wrapper<F>(
        &self,
        name: impl Into<String>,
        argnames: &[&str],
        function: F,
    ) -> NamespaceAttr
    where
        F: Fn(&Kwargs, Next<'_>) -> Outcome + Send + Sync + 'static,
    {
        let mut opts = self.opts;
        opts.hookwrapper = true;
        NamespaceAttr {
            name: name.into(),
            kind: AttrKind::HookImpl {
                project: self.project.clone(),
                opts,
                argnames: argnames.iter().map(|s| s.to_string()).collect(),
                function: HookFunction::Wrapper(Arc::new(function)),
            },
        }
    }
}

// =============================================================================
// HookspecMarker
// =============================================================================

/// Produces specification annotations for one project.
#[derive(Clone, Debug)]
pub struct HookspecMarker {
    project: String,
    opts: HookspecOpts,
    defaults: Kwargs,
}

impl HookspecMarker {
    /// A marker for `project` with empty opts.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            opts: HookspecOpts::default(),
            defaults: Kwargs::new(),
        }
    }

    /// The project this marker annotates for.
    pub fn project_name(&self) -> &str {
        &self.project
    }

    /// Memoize calls and replay them to late-registered implementations.
    ///
    /// Historic dispatch always collects the full result list; a
    /// [`firstresult`](Self::firstresult) flag on the same spec only
    /// applies to direct calls, which historic hooks reject anyway.
    pub fn historic(mut self) -> Self {
        self.opts.historic = true;
        self
    }

    /// Stop dispatch at the first non-null result.
    pub fn firstresult(mut self) -> Self {
        self.opts.firstresult = true;
        self
    }

    /// Emit `message` whenever an implementation registers against the spec.
    pub fn warn_on_impl(mut self, message: impl Into<String>) -> Self {
        self.opts.warn_on_impl = Some(message.into());
        self
    }

    /// Declares `name` optional at call time, filled with `value` when the
    /// call omits it.
    pub fn default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Annotates a hook specification.
    pub fn spec(&self, name: impl Into<String>, argnames: &[&str]) -> NamespaceAttr {
        NamespaceAttr {
            name: name.into(),
            kind: AttrKind::HookSpec {
                project: self.project.clone(),
                opts: self.opts.clone(),
                argnames: argnames.iter().map(|s| s.to_string()).collect(),
                defaults: self.defaults.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impl_marker_opts_compose() {
        let marker = HookimplMarker::new("example").tryfirst().optionalhook();
        let attr = marker.leaf("he_method1", &["arg"], |_| Ok(Value::Null));
        let AttrKind::HookImpl { opts, project, .. } = attr.kind else {
            panic!("expected a hookimpl attribute");
        };
        assert_eq!(project, "example");
        assert!(opts.tryfirst && opts.optionalhook);
        assert!(!opts.hookwrapper && !opts.trylast);
    }

    #[test]
    fn test_wrapper_sets_flag() {
        let marker = HookimplMarker::new("example");
        let attr = marker.wrapper("he_method1", &[], |_, next| next.call());
        let AttrKind::HookImpl { opts, function, .. } = attr.kind else {
            panic!("expected a hookimpl attribute");
        };
        assert!(opts.hookwrapper);
        assert!(function.is_wrapper());
    }

    #[test]
    fn test_spec_marker_flags() {
        let marker = HookspecMarker::new("example").historic();
        let attr = marker.spec("he_method1", &["arg"]);
        let AttrKind::HookSpec { opts, argnames, .. } = attr.kind else {
            panic!("expected a hookspec attribute");
        };
        assert!(opts.historic && !opts.firstresult);
        assert_eq!(argnames, ["arg"]);
    }

    #[test]
    fn test_spec_marker_defaults_accumulate() {
        let marker = HookspecMarker::new("example")
            .firstresult()
            .default("timeout", 30)
            .default("label", "x");
        let attr = marker.spec("he_method1", &["arg", "timeout", "label"]);
        let AttrKind::HookSpec { opts, defaults, .. } = attr.kind else {
            panic!("expected a hookspec attribute");
        };
        assert!(opts.firstresult);
        assert_eq!(defaults["timeout"], 30);
        assert_eq!(defaults["label"], "x");
    }
}
