use tracing::error;
use tracing_subscriber::EnvFilter;

use nscni::commands::run_cni;
use nscni::types::CniError;

fn main() {
    if let Err(err) = run_cni() {
        // Failures before the config document is parsed happen with no
        // subscriber installed yet.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();

        error!("CNI plugin error: {:#}", err);

        // Report the failure in CNI error format on stdout
        if CniError::new(format!("{:#}", err)).print().is_err() {
            eprintln!("{:#}", err);
        }

        std::process::exit(1);
    }
}
