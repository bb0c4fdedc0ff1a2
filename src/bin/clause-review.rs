//! clause-review -- contract review server over stdio.
//!
//! Usage: clause-review [--workspace <path>] [--state-dir <path>] [--storage-key <key>]

use std::path::{Path, PathBuf};

use clause_review::server::ServerConfig;

const STATE_DIR_ENV: &str = "CLAUSE_REVIEW_STATE_DIR";

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().skip_while(|a| a.as_str() != flag).nth(1).cloned()
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with protocol output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let defaults = ServerConfig::default();

    let workspace = arg_value(&args, "--workspace").unwrap_or_else(|| ".".to_owned());
    let workspace = Path::new(&workspace).canonicalize()?;

    let state_dir = arg_value(&args, "--state-dir")
        .or_else(|| std::env::var(STATE_DIR_ENV).ok())
        .map_or_else(|| workspace.join(&defaults.state_dir), PathBuf::from);

    let storage_key = arg_value(&args, "--storage-key").unwrap_or(defaults.storage_key);

    let config = ServerConfig {
        workspace,
        state_dir,
        storage_key,
    };

    clause_review::run_server(config)
}
