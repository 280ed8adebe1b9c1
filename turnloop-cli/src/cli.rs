use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use turnloop_telemetry::LogFormat;

#[derive(Parser)]
#[command(name = "turnloop")]
#[command(about = "Run bounded loops steered by an iteration controller", long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Guess a number until the guess contains 42
    Guess {
        /// Maximum number of rounds
        #[arg(short, long, default_value_t = turnloop_workflow::DEFAULT_MAX_ITERATIONS)]
        max_iterations: u32,

        /// Scripted guesses, used in order and repeated
        #[arg(short, long, value_delimiter = ',', default_value = "Is it 7?,Is it 13?,Is it 42?")]
        guesses: Vec<String>,
    },

    /// Refine a draft until the critic is satisfied
    Refine {
        /// Topic to write about
        #[arg(short, long, default_value = "artificial intelligence ethics")]
        topic: String,

        /// Loop configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Research a topic from several sources in parallel, then merge
    Research {
        /// Topic to research
        #[arg(short, long, default_value = "quantum computing")]
        topic: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_defaults() {
        let cli = Cli::parse_from(["turnloop", "guess"]);
        match cli.command {
            Commands::Guess { max_iterations, guesses } => {
                assert_eq!(max_iterations, 5);
                assert_eq!(guesses, vec!["Is it 7?", "Is it 13?", "Is it 42?"]);
            }
            _ => panic!("expected guess command"),
        }
        assert_eq!(cli.log_format, LogFormatArg::Pretty);
    }

    #[test]
    fn test_refine_with_config() {
        let cli = Cli::parse_from([
            "turnloop",
            "--log-format",
            "json",
            "refine",
            "--topic",
            "rust",
            "--config",
            "loop.toml",
        ]);
        assert_eq!(cli.log_format, LogFormatArg::Json);
        match cli.command {
            Commands::Refine { topic, config } => {
                assert_eq!(topic, "rust");
                assert_eq!(config, Some(PathBuf::from("loop.toml")));
            }
            _ => panic!("expected refine command"),
        }
    }
}
