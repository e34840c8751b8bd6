use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use nscni::commands::parse_cni_args;
use nscni::config::{NetConf, POD_NAMESPACE_ARG, POD_NAME_ARG};

/// A command line tool to inspect namespace CNI configuration documents
#[derive(Parser)]
#[command(name = "nscni-ctl", author, version, about)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a configuration document parses
    Validate {
        /// Path to the configuration document
        #[arg(long)]
        file: PathBuf,
    },

    /// Show the network config a pod in a namespace would receive
    Resolve {
        /// Path to the configuration document
        #[arg(long)]
        file: PathBuf,

        /// Kubernetes namespace to resolve
        #[arg(long)]
        namespace: String,

        /// Pod name, for log context only
        #[arg(long)]
        pod: Option<String>,
    },

    /// Generate a sample configuration document
    Generate {
        /// Network name
        #[arg(long, default_value = "namespace-network")]
        name: String,

        /// Output file path; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_conf(path: &Path) -> Result<NetConf> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let conf = NetConf::parse(&bytes)?;
    Ok(conf)
}

fn sample_conf(name: &str) -> Result<NetConf> {
    let doc = serde_json::json!({
        "name": name,
        "type": "nscni",
        "log_level": "info",
        "namespaces": {
            "isolated": {
                "name": "isolated",
                "type": "bridge",
                "bridge": "isolated0",
                "isGateway": true,
                "ipMasq": true,
                "ipam": {
                    "type": "host-local",
                    "subnet": "10.2.0.0/16",
                    "routes": [ { "dst": "0.0.0.0/0" } ]
                }
            }
        },
        "default": {
            "name": "default-bridge",
            "type": "bridge",
            "bridge": "cni0",
            "isGateway": true,
            "ipMasq": true,
            "ipam": {
                "type": "host-local",
                "subnet": "10.1.0.0/16",
                "routes": [ { "dst": "0.0.0.0/0" } ]
            }
        }
    });

    let conf = serde_json::from_value(doc).context("Failed to build sample config")?;
    Ok(conf)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging based on verbosity
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    match cli.command {
        Commands::Validate { file } => {
            let conf = load_conf(&file)?;

            println!(
                "{}: valid ({} namespace entries, default {})",
                file.display(),
                conf.namespaces.len(),
                if conf.default.as_ref().is_some_and(|d| !d.is_empty()) {
                    "present"
                } else {
                    "absent"
                }
            );
        }

        Commands::Resolve {
            file,
            namespace,
            pod,
        } => {
            let conf = load_conf(&file)?;

            // Drive the exact production path: a synthetic CNI_ARGS string
            // through the argument parser and resolver.
            let mut cni_args = format!("{}={}", POD_NAMESPACE_ARG, namespace);
            if let Some(pod) = pod {
                cni_args.push_str(&format!(";{}={}", POD_NAME_ARG, pod));
            }

            let args = parse_cni_args(&cni_args);
            let netconf = conf.netconf_for(&args)?;

            println!("{}", serde_json::to_string_pretty(netconf)?);
        }

        Commands::Generate { name, output } => {
            let conf = sample_conf(&name)?;
            let json = serde_json::to_string_pretty(&conf)?;

            if let Some(path) = output {
                fs::write(&path, json)
                    .with_context(|| format!("Failed to write config to {}", path.display()))?;
                println!("Configuration written to {}", path.display());
            } else {
                println!("{}", json);
            }
        }
    }

    Ok(())
}
