use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::io::{self, Read, Write};
use tracing::{warn, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::config::{self, NetConf};
use crate::plugin::NamespacePlugin;
use crate::types::CmdArgs;

/// Parse command arguments from the CNI environment contract.
pub fn parse_args() -> Result<CmdArgs> {
    let container_id =
        env::var("CNI_CONTAINERID").context("CNI_CONTAINERID not found in environment")?;

    // The runtime may omit the namespace path on DEL after the sandbox is
    // already gone.
    let netns = env::var("CNI_NETNS").unwrap_or_default();

    let ifname = env::var("CNI_IFNAME").context("CNI_IFNAME not found in environment")?;

    let path = env::var("CNI_PATH").context("CNI_PATH not found in environment")?;

    let args_str = env::var("CNI_ARGS").unwrap_or_default();
    let args = parse_cni_args(&args_str);

    // Read stdin data
    let mut stdin_data = Vec::new();
    io::stdin()
        .read_to_end(&mut stdin_data)
        .context("Failed to read from stdin")?;

    Ok(CmdArgs {
        container_id,
        netns,
        ifname,
        args,
        path,
        stdin_data,
    })
}

/// Parse the CNI_ARGS string into key-value pairs. Kubernetes uses this to
/// pass the pod name and namespace. Segments without a '=' are dropped;
/// values may themselves contain '='.
pub fn parse_cni_args(args_str: &str) -> HashMap<String, String> {
    let mut args = HashMap::new();

    if !args_str.is_empty() {
        for pair in args_str.split(';') {
            if let Some(idx) = pair.find('=') {
                let key = pair[..idx].to_string();
                let value = pair[idx + 1..].to_string();
                args.insert(key, value);
            }
        }
    }

    args
}

/// Install the stderr subscriber at the level the document asks for.
/// Best-effort: an unrecognized level degrades to INFO with a warning,
/// never a hard failure. stdout stays reserved for the delegate's result.
fn init_logging(conf: &NetConf) {
    let mut level = Level::INFO;
    let mut unknown = None;

    if let Some(raw) = &conf.log_level {
        match config::parse_level(raw) {
            Some(parsed) => level = parsed,
            None => unknown = Some(raw.clone()),
        }
    }

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    if let Some(raw) = unknown {
        warn!("Unknown log level {:?}. Using default: INFO", raw);
    }
}

/// Execute the ADD command: resolve the namespace's network config,
/// delegate setup, and forward the delegate's result to stdout.
pub fn cmd_add() -> Result<()> {
    let args = parse_args()?;

    let conf = NetConf::parse(&args.stdin_data)?;
    init_logging(&conf);

    let plugin = NamespacePlugin::new(conf, args);
    let result = plugin.add_network()?;

    io::stdout()
        .write_all(&result)
        .context("Failed to write result to stdout")?;

    Ok(())
}

/// Execute the DEL command: resolve the same way ADD does and delegate
/// teardown. No result payload on success.
pub fn cmd_del() -> Result<()> {
    let args = parse_args()?;

    let conf = NetConf::parse(&args.stdin_data)?;
    init_logging(&conf);

    let plugin = NamespacePlugin::new(conf, args);
    plugin.del_network()?;

    Ok(())
}

/// Main entry point for the CNI plugin
pub fn run_cni() -> Result<()> {
    let cmd = env::var("CNI_COMMAND").context("CNI_COMMAND not found in environment")?;

    match cmd.as_str() {
        "ADD" => cmd_add(),
        "DEL" => cmd_del(),
        "VERSION" => {
            // Output supported CNI versions
            println!(r#"{{"cniVersion":"0.2.0","supportedVersions":["0.1.0","0.2.0"]}}"#);
            Ok(())
        }
        _ => anyhow::bail!("Unknown CNI command: {}", cmd),
    }
}
