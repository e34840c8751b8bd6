//! Error types for configuration parsing, resolution, and delegation.

use std::io;

/// Result type alias for meta-plugin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving and delegating a network config.
///
/// None of these are retried: each is a deterministic function of the
/// invocation's inputs, so a retry with the same configuration document
/// would fail the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The stdin document is not a well-formed configuration document.
    #[error("failed to parse config: {0}")]
    ConfigParse(serde_json::Error),

    /// CNI_ARGS carried no Kubernetes namespace.
    #[error("Kubernetes namespace argument missing or empty")]
    MissingNamespace,

    /// No per-namespace entry matched and no default is configured.
    #[error("config for namespace {namespace:?} not found, and no default given")]
    NoConfigForNamespace { namespace: String },

    /// The resolved config has no usable "type" field to delegate on.
    #[error("delegate config has a missing or non-string \"type\" field")]
    MissingPluginType,

    /// The resolved config could not be re-serialized for the delegate.
    #[error("failed to marshal delegate config: {0}")]
    Serialize(serde_json::Error),

    /// No plugin binary with the requested name on the search path.
    #[error("failed to find plugin {plugin_type:?} in path {path:?}")]
    PluginNotFound { plugin_type: String, path: String },

    /// Spawning or feeding the delegate process failed.
    #[error("failed to invoke plugin {plugin_type:?}: {error}")]
    Invoke { plugin_type: String, error: io::Error },

    /// The delegate plugin ran and reported failure.
    #[error("plugin {plugin_type:?} failed: {message}")]
    Delegation { plugin_type: String, message: String },
}
