//! Namespace-scoped CNI meta-plugin for Kubernetes
//!
//! This implementation performs no network setup itself. Per invocation it:
//! - Parses a configuration document mapping Kubernetes namespaces to
//!   delegate network configs, with an optional default fallback
//! - Resolves the pod's namespace from CNI_ARGS to one of those configs
//! - Re-serializes the selected config and delegates ADD/DEL to the CNI
//!   plugin named by its "type" field, relaying its result or error

pub mod commands;
pub mod config;
pub mod delegate;
pub mod error;
pub mod plugin;
pub mod types;

// Re-export commonly used items
pub use commands::{cmd_add, cmd_del, run_cni};
pub use config::{NetConf, NetworkConfig};
pub use delegate::{delegate_add, delegate_del, DelegateOp, ExecInvoker, PluginInvoker};
pub use error::{Error, Result};
pub use plugin::NamespacePlugin;
