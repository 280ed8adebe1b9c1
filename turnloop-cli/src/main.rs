use anyhow::Result;
use clap::Parser;
use turnloop_cli::cli::{Cli, Commands};
use turnloop_cli::{config, run_guess, run_refine, run_research};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    turnloop_telemetry::init_telemetry_with("turnloop", cli.log_format.into())
        .map_err(|e| anyhow::anyhow!("failed to initialize telemetry: {e}"))?;

    let report = match cli.command {
        Commands::Guess { max_iterations, guesses } => run_guess(guesses, max_iterations).await?,
        Commands::Refine { topic, config } => {
            let config = config::load_refiner_config(config)?;
            run_refine(&topic, &config).await?
        }
        Commands::Research { topic } => run_research(&topic).await?,
    };

    tracing::debug!(
        scenario = report.scenario,
        stop_reason = %report.outcome.stop_reason,
        iterations = report.outcome.iterations,
        "scenario finished"
    );
    println!("{report}");
    Ok(())
}
