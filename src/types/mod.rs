use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// CNI command arguments
#[derive(Debug, Clone)]
pub struct CmdArgs {
    /// Container ID
    pub container_id: String,
    /// Network namespace path (may be empty on DEL)
    pub netns: String,
    /// Interface name
    pub ifname: String,
    /// Parsed CNI_ARGS key-value pairs
    pub args: HashMap<String, String>,
    /// Plugin search path (CNI_PATH)
    pub path: String,
    /// Standard input data
    pub stdin_data: Vec<u8>,
}

/// CNI error object, printed to stdout before a non-zero exit so the
/// invoking runtime can surface it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CniError {
    /// CNI specification version
    #[serde(rename = "cniVersion")]
    pub cni_version: String,
    /// Numeric error code
    pub code: u32,
    /// Human-readable error message
    pub msg: String,
    /// Additional detail, if any
    #[serde(default)]
    pub details: String,
}

impl CniError {
    /// Create an error object with the generic plugin error code.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            cni_version: "0.2.0".to_string(),
            code: 100,
            msg: msg.into(),
            details: String::new(),
        }
    }

    /// Print the error in CNI wire format on stdout.
    pub fn print(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        println!("{}", json);
        Ok(())
    }
}
