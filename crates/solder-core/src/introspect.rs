//! Namespace introspection — how the engine discovers declarations.
//!
//! The registry never inspects host objects directly. A plugin (or a spec
//! module) implements [`Namespace`] and hands back a table of
//! [`NamespaceAttr`] entries; [`extract_impls`] and [`extract_specs`] turn
//! that table into declaration records. Because the table is materialized
//! by the host, extraction is idempotent and attribute access can never
//! fail — entries the host cannot describe safely are simply absent.
//!
//! Marker-annotated attributes are authoritative. The deprecated prefix
//! discovery mode additionally collects unmarked plain functions whose
//! attribute name starts with the configured prefix; module-typed
//! attributes are never collected, whatever their name.

use std::any::Any;
use std::sync::Arc;

use tracing::warn;

use crate::decl::{HookFunction, HookimplOpts, HookspecOpts, Kwargs};

/// A plugin object or spec module, as seen by the engine.
///
/// The `as_any` upcast follows the usual type-erasure pattern so hosts can
/// recover their concrete type from a registered handle:
///
/// ```rust,ignore
/// impl Namespace for MyPlugin {
///     fn attributes(&self) -> Vec<NamespaceAttr> {
///         vec![hookimpl.leaf("he_method1", &["arg"], |kw| Ok(kw["arg"].clone()))]
///     }
///     fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
///         self
///     }
/// }
/// ```
pub trait Namespace: Any + Send + Sync {
    /// Canonical-name hint; when absent, the registry derives a name from
    /// the handle's identity.
    fn name(&self) -> Option<&str> {
        None
    }

    /// The attribute table extraction runs over.
    fn attributes(&self) -> Vec<NamespaceAttr>;

    /// Upcast for host-side downcasting of registered handles.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// One named attribute of a namespace.
#[derive(Clone, Debug)]
pub struct NamespaceAttr {
    /// Attribute name; doubles as the hook name for impl/spec attributes.
    pub name: String,
    /// What the attribute is.
    pub kind: AttrKind,
}

/// Classification of a namespace attribute.
#[derive(Clone, Debug)]
pub enum AttrKind {
    /// Callable annotated by a [`HookimplMarker`](crate::marker::HookimplMarker).
    HookImpl {
        /// Project the marker belongs to.
        project: String,
        /// Flags the marker carried.
        opts: HookimplOpts,
        /// Argument names the callable consumes.
        argnames: Vec<String>,
        /// The callable payload.
        function: HookFunction,
    },
    /// Declaration annotated by a [`HookspecMarker`](crate::marker::HookspecMarker).
    HookSpec {
        /// Project the marker belongs to.
        project: String,
        /// Flags the marker carried.
        opts: HookspecOpts,
        /// Argument names a call is expected to supply.
        argnames: Vec<String>,
        /// Values for argnames that may be omitted at call time.
        defaults: Kwargs,
    },
    /// Plain unmarked callable; collected only by prefix discovery.
    Function {
        /// Argument names the callable consumes.
        argnames: Vec<String>,
        /// The callable payload.
        function: HookFunction,
    },
    /// Nested module object; never collected.
    Module,
    /// Arbitrary data; never collected.
    Value,
}

/// An implementation declaration not yet bound to a registered plugin.
#[derive(Clone, Debug)]
pub struct ImplDef {
    /// Hook the implementation targets.
    pub hook_name: String,
    /// Argument names the callable consumes.
    pub argnames: Vec<String>,
    /// Parsed option flags.
    pub opts: HookimplOpts,
    /// The callable payload.
    pub function: HookFunction,
}

/// A specification declaration not yet bound to its caller.
#[derive(Clone, Debug)]
pub struct SpecDef {
    /// Name of the extension point.
    pub hook_name: String,
    /// Argument names a call is expected to supply.
    pub argnames: Vec<String>,
    /// Values for argnames that may be omitted at call time.
    pub defaults: Kwargs,
    /// Parsed option flags.
    pub opts: HookspecOpts,
}

/// Collects every implementation `plugin` contributes to `project`.
///
/// Marker-annotated attributes with a matching project are collected with
/// their marker opts. With `prefix` set, unmarked [`AttrKind::Function`]
/// attributes whose name starts with the prefix are collected with empty
/// opts; the full attribute name becomes the hook name.
pub fn extract_impls(
    project: &str,
    prefix: Option<&str>,
    plugin: &dyn Namespace,
) -> Vec<ImplDef> {
    let mut out = Vec::new();
    for attr in plugin.attributes() {
        match attr.kind {
            AttrKind::HookImpl {
                project: p,
                opts,
                argnames,
                function,
            } if p == project => {
                out.push(ImplDef {
                    hook_name: attr.name,
                    argnames,
                    opts,
                    function,
                });
            }
            AttrKind::Function { argnames, function } => {
                if let Some(prefix) = prefix
                    && attr.name.starts_with(prefix)
                {
                    warn!(
                        deprecated = true,
                        attr = %attr.name,
                        prefix = %prefix,
                        "prefix-based hook discovery is deprecated; \
                         annotate the function with a HookimplMarker"
                    );
                    out.push(ImplDef {
                        hook_name: attr.name,
                        argnames,
                        opts: HookimplOpts::default(),
                        function,
                    });
                }
            }
            _ => {}
        }
    }
    out
}

/// Collects every specification `namespace` publishes for `project`.
///
/// Returns an empty vector when the namespace contributes none; the
/// registry turns that into its no-specs error.
pub fn extract_specs(project: &str, namespace: &dyn Namespace) -> Vec<SpecDef> {
    let mut out = Vec::new();
    for attr in namespace.attributes() {
        if let AttrKind::HookSpec {
            project: p,
            opts,
            argnames,
            defaults,
        } = attr.kind
            && p == project
        {
            out.push(SpecDef {
                hook_name: attr.name,
                argnames,
                defaults,
                opts,
            });
        }
    }
    out
}

// =============================================================================
// StaticNamespace
// =============================================================================

/// A namespace built from a literal attribute table.
///
/// Convenient for hosts that assemble plugins programmatically and for
/// registering objects that contribute nothing at all.
#[derive(Clone, Default)]
pub struct StaticNamespace {
    name: Option<String>,
    attrs: Vec<NamespaceAttr>,
}

impl StaticNamespace {
    /// An anonymous namespace with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A named namespace with no attributes.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attrs: Vec::new(),
        }
    }

    /// Appends an attribute (builder pattern).
    pub fn attr(mut self, attr: NamespaceAttr) -> Self {
        self.attrs.push(attr);
        self
    }
}

impl Namespace for StaticNamespace {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn attributes(&self) -> Vec<NamespaceAttr> {
        self.attrs.clone()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
