use clap::Parser;
use client::game::GameClient;
use client::provider::{AnswerProvider, HumanInput, RandomBot};
use rand::seq::SliceRandom;
use shared::GameConfig;
use std::path::PathBuf;

/// Main-method of the application.
/// Parses command-line arguments, then joins a game as a human player or
/// an automated one.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Player display name; bots pick one from the config when omitted
        name: Option<String>,
        /// Answer randomly instead of reading from stdin
        #[clap(short, long)]
        bot: bool,
        /// Path to the JSON game config; defaults are used when omitted
        #[clap(short, long)]
        config: Option<PathBuf>,
    }

    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let name = match args.name {
        Some(name) => name,
        None if args.bot => {
            let picked = config
                .bot_names
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_else(|| "BOT".to_string());
            format!("BOT:{picked}")
        }
        None => return Err("a player name is required (or pass --bot)".into()),
    };

    let provider: Box<dyn AnswerProvider> = if args.bot {
        Box::new(RandomBot::new(&config))
    } else {
        Box::new(HumanInput)
    };

    let mut game = GameClient::new(name, config, provider);
    game.run().await?;
    Ok(())
}
