use block_race::cli::{Cli, Commands};
use anyhow::Context;
use block_race::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Only a missing file falls back; a broken one is fatal
    let config = match Config::load_if_exists(&cli.config)
        .with_context(|| format!("invalid configuration in {}", cli.config))?
    {
        Some(config) => config,
        None => {
            eprintln!("Warning: {} not found", cli.config);
            eprintln!("Using example configuration");
            Config::from_toml(include_str!("../config.toml.example"))?
        }
    };

    block_race::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting block race");
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Contestants:");
            for contestant in &config.contestants {
                let marker = if contestant.name == config.race.primary {
                    " (primary)"
                } else {
                    ""
                };
                println!("    {}{}: {}", contestant.name, marker, contestant.ws_url);
            }
            println!(
                "  Aggregate every {} blocks",
                config.race.blocks_per_aggregate
            );
            println!(
                "  Reconnects: {} (0 = unlimited)",
                config.feed.max_reconnects
            );
            println!("  Report: {:?}", config.report.format);
        }
    }

    Ok(())
}
