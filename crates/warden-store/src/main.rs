//! warden operator binary
//!
//! `warden [CONFIG] [PATH POLICY...]`
//! - loads the store config (default `warden.yaml`)
//! - reconciles built-in policies and loads seed files
//! - with PATH and policy names, prints the effective capabilities on PATH

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use warden_core::{Result, PolicyType};
use warden_store::{apply_seed_policies, config, reconcile_builtin_policies, PolicyStore};

const DEFAULT_CONFIG: &str = "warden.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "warden failed");
            eprintln!("warden: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<()> {
    let config_path = args.first().map(String::as_str).unwrap_or(DEFAULT_CONFIG);
    let cfg = config::load_from_file(config_path)?;

    let store = PolicyStore::open(&cfg).await?;
    let report = reconcile_builtin_policies(&store).await?;
    let seeded = apply_seed_policies(&store, &cfg.seed).await?;

    let names = store.list_policies(PolicyType::Acl).await?;
    tracing::info!(
        config = %config_path,
        default_written = report.default_written,
        response_wrapping_written = report.response_wrapping_written,
        seeded,
        policies = ?names,
        "warden ready"
    );

    if let Some((path, policies)) = args.get(1..).and_then(|rest| rest.split_first()) {
        let acl = store.build_acl(policies).await?;
        let caps = acl.capabilities(path);
        println!("{path}: {}", caps.names().join(", "));
    }
    Ok(())
}
