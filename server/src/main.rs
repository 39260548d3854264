use clap::Parser;
use server::session::SessionOrchestrator;
use server::stats::JsonFileSink;
use shared::GameConfig;
use std::path::PathBuf;

/// Main-method of the application.
/// Parses command-line arguments, then runs trivia sessions back to back
/// until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// First TCP port to try binding (overrides the config file)
        #[clap(short, long)]
        port: Option<u16>,
        /// Path to the JSON game config; defaults are used when omitted
        #[clap(short, long)]
        config: Option<PathBuf>,
        /// Where cumulative statistics are kept
        #[clap(short, long, default_value = "statistics.json")]
        stats: PathBuf,
    }

    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(port) = args.port {
        config.tcp_port = port;
    }

    let sink = JsonFileSink::new(args.stats);
    let mut orchestrator = SessionOrchestrator::bind(&args.host, config, Box::new(sink)).await?;

    tokio::select! {
        result = orchestrator.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
