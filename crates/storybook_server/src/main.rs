//! Storybook HTTP server.

use clap::Parser;
use std::path::PathBuf;
use storybook_server::{AppConfig, init_telemetry, serve};

#[derive(Parser, Debug)]
#[command(name = "storybook-server")]
#[command(about = "Storybook generation backend", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./storybook.toml when present)
    #[arg(short, long, env = "STORYBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON logs regardless of configuration
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.observability.json_logs |= args.json_logs;
    let telemetry = init_telemetry(&config.observability)?;

    let result = serve(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Server exited with error");
    }
    telemetry.shutdown();
    Ok(result?)
}
