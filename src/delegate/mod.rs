use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::debug;

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::types::CniError;

/// Lifecycle verb forwarded to a delegate plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateOp {
    Add,
    Del,
}

impl DelegateOp {
    /// The CNI_COMMAND value the delegate sees.
    pub fn as_str(self) -> &'static str {
        match self {
            DelegateOp::Add => "ADD",
            DelegateOp::Del => "DEL",
        }
    }
}

/// Capability boundary for invoking a delegate plugin.
///
/// Production code execs a binary found on the CNI search path; tests
/// substitute an in-process registry.
pub trait PluginInvoker {
    /// Run the plugin named `plugin_type` with `netconf` on its stdin and
    /// return its stdout on success.
    fn invoke(&self, plugin_type: &str, op: DelegateOp, netconf: &[u8]) -> Result<Vec<u8>>;
}

impl<T: PluginInvoker + ?Sized> PluginInvoker for &T {
    fn invoke(&self, plugin_type: &str, op: DelegateOp, netconf: &[u8]) -> Result<Vec<u8>> {
        (**self).invoke(plugin_type, op, netconf)
    }
}

/// Invokes delegate plugins as child processes, following the standard CNI
/// search-and-exec convention.
#[derive(Debug, Clone)]
pub struct ExecInvoker {
    path: String,
}

impl ExecInvoker {
    /// `path` is the CNI_PATH search list, ':'-separated directories.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the plugin binary by name in the search path.
    pub fn find_plugin(&self, plugin_type: &str) -> Result<PathBuf> {
        for dir in self.path.split(':').filter(|d| !d.is_empty()) {
            let candidate = Path::new(dir).join(plugin_type);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(Error::PluginNotFound {
            plugin_type: plugin_type.to_string(),
            path: self.path.clone(),
        })
    }
}

impl PluginInvoker for ExecInvoker {
    fn invoke(&self, plugin_type: &str, op: DelegateOp, netconf: &[u8]) -> Result<Vec<u8>> {
        let bin = self.find_plugin(plugin_type)?;
        debug!(plugin = %bin.display(), op = op.as_str(), "Invoking delegate plugin");

        let io_err = |error| Error::Invoke {
            plugin_type: plugin_type.to_string(),
            error,
        };

        // The child inherits this invocation's CNI_* environment
        // (CNI_CONTAINERID, CNI_NETNS, CNI_IFNAME, CNI_ARGS); only the verb
        // and search path are set explicitly.
        let mut child = Command::new(&bin)
            .env("CNI_COMMAND", op.as_str())
            .env("CNI_PATH", &self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(netconf).map_err(io_err)?;
        }

        let output = child.wait_with_output().map_err(io_err)?;

        if !output.status.success() {
            return Err(Error::Delegation {
                plugin_type: plugin_type.to_string(),
                message: failure_message(&output),
            });
        }

        Ok(output.stdout)
    }
}

/// Prefer the structured CNI error a failing plugin writes to stdout; fall
/// back to its stderr text.
fn failure_message(output: &Output) -> String {
    if let Ok(err) = serde_json::from_slice::<CniError>(&output.stdout) {
        if !err.msg.is_empty() {
            return err.msg;
        }
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

/// Re-serialize `netconf` and hand it to the plugin named by its "type"
/// field for ADD. The delegate's result payload is returned verbatim.
pub fn delegate_add<I: PluginInvoker>(invoker: &I, netconf: &NetworkConfig) -> Result<Vec<u8>> {
    let plugin_type = netconf.plugin_type()?;
    let bytes = netconf.to_bytes()?;
    invoker.invoke(plugin_type, DelegateOp::Add, &bytes)
}

/// Counterpart of [`delegate_add`] for DEL. A teardown has no result
/// payload; only success or failure propagates.
pub fn delegate_del<I: PluginInvoker>(invoker: &I, netconf: &NetworkConfig) -> Result<()> {
    let plugin_type = netconf.plugin_type()?;
    let bytes = netconf.to_bytes()?;
    invoker.invoke(plugin_type, DelegateOp::Del, &bytes)?;
    Ok(())
}
