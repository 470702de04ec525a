use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use doninai_bot::{Config, Strategy};
use std::str::FromStr;
use tracing::{error, info, Level};

fn command() -> Command {
    Command::new("doninai-bot")
        .about("Play doninai against a game server.")
        .arg(Arg::new("config").long("config").required(false))
        .arg(Arg::new("http_endpoint").long("http_endpoint").required(false))
        .arg(
            Arg::new("player")
                .long("player")
                .value_parser(value_parser!(u32))
                .required(false),
        )
        .arg(
            Arg::new("rounds")
                .long("rounds")
                .value_parser(value_parser!(u32))
                .required(false),
        )
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .value_parser(Strategy::from_str)
                .required(false),
        )
        .arg(Arg::new("log-level").long("log-level").required(false))
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .value_parser(value_parser!(u64))
                .required(false),
        )
}

/// Load the config file (if any) and apply flag overrides.
fn build_config(matches: &ArgMatches) -> Result<Config> {
    let endpoint = matches.get_one::<String>("http_endpoint");
    let player = matches.get_one::<u32>("player");
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let file = std::fs::read_to_string(path)
                .with_context(|| format!("could not read config file {path}"))?;
            serde_yaml::from_str(&file)
                .with_context(|| format!("could not parse config file {path}"))?
        }
        None => {
            let endpoint = endpoint.ok_or_else(|| anyhow!("--http_endpoint is required"))?;
            let player = player.ok_or_else(|| anyhow!("--player is required"))?;
            Config::new(endpoint.as_str(), *player)
        }
    };

    if let Some(endpoint) = endpoint {
        config.http_endpoint = endpoint.clone();
    }
    if let Some(player) = player {
        config.player = *player;
    }
    if let Some(rounds) = matches.get_one::<u32>("rounds") {
        config.rounds = *rounds;
    }
    if let Some(strategy) = matches.get_one::<Strategy>("strategy") {
        config.strategy = Some(*strategy);
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level = level.clone();
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout-ms") {
        config.response_timeout_ms = Some(*timeout);
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = command().get_matches();
    let config = build_config(&matches)?;

    // Setup logging
    let level = Level::from_str(&config.log_level)
        .map_err(|_| anyhow!("invalid log level: {}", config.log_level))?;
    tracing_subscriber::fmt().with_max_level(level).init();
    info!(
        endpoint = %config.http_endpoint,
        player = config.player,
        rounds = config.rounds,
        strategy = %config.strategy(),
        "Starting doninai-bot"
    );

    match doninai_bot::play(&config).await {
        Ok(record) => {
            info!(
                wins = record.wins,
                losses = record.losses,
                ties = record.ties,
                "Finished"
            );
            Ok(())
        }
        Err(err) => {
            error!(?err, "Session failed");
            std::process::exit(1);
        }
    }
}
