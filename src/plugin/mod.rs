use tracing::{info, info_span};

use crate::config::NetConf;
use crate::delegate::{delegate_add, delegate_del, ExecInvoker, PluginInvoker};
use crate::error::Result;
use crate::types::CmdArgs;

/// Namespace meta-plugin state for one invocation: the parsed configuration
/// document and the command arguments it applies to.
pub struct NamespacePlugin<I = ExecInvoker> {
    /// Configuration document
    config: NetConf,
    /// Command arguments
    args: CmdArgs,
    /// Delegate plugin invoker
    invoker: I,
}

impl NamespacePlugin<ExecInvoker> {
    /// Create a plugin that execs delegates from the invocation's CNI_PATH.
    pub fn new(config: NetConf, args: CmdArgs) -> Self {
        let invoker = ExecInvoker::new(args.path.clone());
        Self {
            config,
            args,
            invoker,
        }
    }
}

impl<I: PluginInvoker> NamespacePlugin<I> {
    /// Create a plugin with a caller-supplied invoker.
    pub fn with_invoker(config: NetConf, args: CmdArgs, invoker: I) -> Self {
        Self {
            config,
            args,
            invoker,
        }
    }

    /// Set up pod networking: resolve the namespace's network config and
    /// delegate ADD, returning the delegate's result bytes unmodified.
    pub fn add_network(&self) -> Result<Vec<u8>> {
        let span = info_span!("add_network", container_id = %self.args.container_id);
        let _enter = span.enter();
        info!("Configuring pod networking");

        let netconf = self.config.netconf_for(&self.args.args)?;
        delegate_add(&self.invoker, netconf)
    }

    /// Tear down pod networking for the same resolution.
    pub fn del_network(&self) -> Result<()> {
        let span = info_span!("del_network", container_id = %self.args.container_id);
        let _enter = span.enter();
        info!("Removing pod networking");

        let netconf = self.config.netconf_for(&self.args.args)?;
        delegate_del(&self.invoker, netconf)
    }
}
