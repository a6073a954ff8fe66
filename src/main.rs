//! Payslip portal main entry point

use anyhow::Context;
use clap::Parser;
use payslip_portal_api::{start_server, AppState};
use payslip_portal_config::Config;
use payslip_portal_core::{RecordServiceRef, ReportRenderer};
use payslip_portal_rpc::JsonRpcClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "payslip-portal")]
#[command(version = "0.1.0")]
#[command(about = "Employee portal listing finalized payslips per working year", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print a default configuration file and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = Config::load(args.config.clone())
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    // RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!(
        "Config loaded: backend={} database={}",
        config.backend.url,
        config.backend.database
    );

    let rt = Runtime::new()?;
    rt.block_on(async {
        let client = Arc::new(
            JsonRpcClient::new(&config.backend).context("Failed to build backend client")?,
        );

        if let Err(e) = client.authenticate().await {
            log::warn!("Backend login failed, will retry on first request: {}", e);
        }

        let service: RecordServiceRef = client.clone();
        let renderer: Arc<dyn ReportRenderer> = client;
        let state = AppState::new(config, service, renderer);

        start_server(state).await.context("Server error")
    })
}
