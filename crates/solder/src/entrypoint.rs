//! External package discovery seam.
//!
//! The engine never scans a package index itself. A host injects an
//! [`EntryPointProvider`] which yields [`EntryPoint`] records for a group;
//! [`PluginManager::load_entrypoints`] loads each one, registers the
//! resulting plugin, and records its distribution descriptor. Loader
//! failures are translated into the core error taxonomy; a missing or
//! failing provider is surfaced as-is, never masked.
//!
//! [`PluginManager::load_entrypoints`]: crate::manager::PluginManager::load_entrypoints

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use solder_core::{BoxError, Namespace};

/// Distribution metadata attached to an externally discovered plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistInfo {
    /// Name of the distribution the plugin ships in.
    pub project_name: String,
    /// Version of that distribution.
    pub version: String,
}

/// Deferred plugin construction for one entry point.
pub type EntryPointLoader = Box<dyn FnOnce() -> Result<Arc<dyn Namespace>, LoadError> + Send>;

/// One discoverable plugin in a provider's index.
pub struct EntryPoint {
    /// Name the plugin will be registered under.
    pub name: String,
    /// Distribution the entry point came from, when known.
    pub dist: Option<DistInfo>,
    /// Loads the plugin object.
    pub loader: EntryPointLoader,
}

impl EntryPoint {
    /// Builds an entry point from a load closure.
    pub fn new<F>(name: impl Into<String>, dist: Option<DistInfo>, loader: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn Namespace>, LoadError> + Send + 'static,
    {
        Self {
            name: name.into(),
            dist,
            loader: Box::new(loader),
        }
    }
}

/// Failure while loading one entry point.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The installed distribution does not satisfy the plugin's
    /// requirements; translated into a validation error naming the plugin.
    #[error("version conflict: {0}")]
    VersionConflict(String),

    /// Any other loader failure; propagated unchanged.
    #[error("{0}")]
    Other(BoxError),
}

/// Iterates the entry points of a group.
///
/// Implementations typically wrap whatever package index the host uses;
/// the engine only relies on this contract.
pub trait EntryPointProvider: Send + Sync {
    /// Entry points registered under `group`.
    fn entry_points(&self, group: &str) -> Result<Vec<EntryPoint>, BoxError>;
}
