use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, Level};

use crate::error::{Error, Result};

/// CNI_ARGS key under which Kubernetes passes the pod's namespace.
pub const POD_NAMESPACE_ARG: &str = "K8S_POD_NAMESPACE";
/// CNI_ARGS key under which Kubernetes passes the pod's name. Used for log
/// context only.
pub const POD_NAME_ARG: &str = "K8S_POD_NAME";

/// An opaque delegate network configuration.
///
/// Only the "type" field is interpreted here; everything else belongs to
/// the delegate plugin and is forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkConfig(Map<String, Value>);

impl NetworkConfig {
    /// True when the object has no fields. An empty `default` counts as no
    /// default during resolution.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a raw field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The delegate plugin identifier. A missing or non-string "type" is a
    /// delegation failure, never silently ignored.
    pub fn plugin_type(&self) -> Result<&str> {
        self.0
            .get("type")
            .and_then(Value::as_str)
            .ok_or(Error::MissingPluginType)
    }

    /// Re-serialize the object for handoff to the delegate plugin.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Serialize)
    }
}

/// Top-level configuration document for the meta-plugin.
///
/// Parsed fresh from stdin once per invocation and discarded afterwards;
/// nothing is cached across invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetConf {
    /// Name of this plugin instance's own network
    pub name: String,
    /// Type of this plugin itself, used by the invoking runtime
    #[serde(rename = "type")]
    pub plugin_type: String,
    /// Log severity hint (trace, debug, info, warn, error)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Fallback network config for namespaces without an entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<NetworkConfig>,
    /// Per-namespace network configs
    #[serde(default)]
    pub namespaces: HashMap<String, NetworkConfig>,
}

impl NetConf {
    /// Parse a configuration document from raw stdin bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Error::ConfigParse)
    }

    /// Return the network config for the pod's namespace, or the default
    /// config if no per-namespace entry is found. If no entry is found for
    /// the namespace and no default is given, return an error.
    ///
    /// A per-namespace entry always wins over the default. That precedence
    /// is what keeps isolated namespaces isolated.
    pub fn netconf_for(&self, args: &HashMap<String, String>) -> Result<&NetworkConfig> {
        let namespace = args.get(POD_NAMESPACE_ARG).map(String::as_str).unwrap_or("");
        let pod = args.get(POD_NAME_ARG).map(String::as_str).unwrap_or("");

        if namespace.is_empty() {
            return Err(Error::MissingNamespace);
        }

        if let Some(conf) = self.namespaces.get(namespace) {
            debug!(namespace, pod, config = ?conf, "Using namespace specific config");
            return Ok(conf);
        }

        match &self.default {
            Some(default) if !default.is_empty() => {
                debug!(namespace, pod, config = ?default, "Per-namespace config not found. Using default");
                Ok(default)
            }
            _ => Err(Error::NoConfigForNamespace {
                namespace: namespace.to_string(),
            }),
        }
    }
}

/// Parse a log severity the way the document spells it. Returns `None` for
/// unrecognized values; the caller degrades to the default level.
pub fn parse_level(raw: &str) -> Option<Level> {
    match raw.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
