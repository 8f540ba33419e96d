//! Tubecast Player (tubecast-player) - Main entry point
//!
//! Runs the playlist coordinator against the simulated backend and drives it
//! from commands read line by line on stdin.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubecast_common::config::resolve_config_path;
use tubecast_common::time::{format_position, secs_f64_to_position};
use tubecast_player::{MediaPlayer, PlayerConfig, ReplySlot, SimulatedBackend, StaticResolver};

const HELP: &str = "commands: play | pause | seek <secs> | stop | volume <n>|+n|-n | \
                    jump <id> [secs] | queue <id> | list | quit";

/// Command-line arguments for tubecast-player
#[derive(Parser, Debug)]
#[command(name = "tubecast-player")]
#[command(about = "Playlist playback coordinator with a simulated backend")]
#[command(version)]
struct Args {
    /// Config file (overrides TUBECAST_CONFIG and the default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Video ids making up the initial playlist
    ids: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = PlayerConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tubecast_player={}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    let backend = Arc::new(SimulatedBackend::new(
        Duration::from_secs(config.simulation.track_length_secs),
        config.simulation.initial_volume,
    ));
    let resolver =
        Arc::new(StaticResolver::new(config.streams.clone()).with_fallback("sim://{id}"));

    let (player, mut events, mut task) = MediaPlayer::start(backend, resolver, &config)
        .await
        .context("Failed to start player")?;

    tokio::spawn(async move {
        while let Some(change) = events.recv().await {
            info!("Player is {}", change);
        }
    });

    if !args.ids.is_empty() {
        player.set_playlist(args.ids, 0, Duration::ZERO).await;
    }

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            outcome = &mut task => {
                let outcome = outcome.context("Player task panicked")?;
                return outcome.context("Player stopped");
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    stdin_open = false;
                    player.quit().await;
                    continue;
                };
                if let Err(e) = run_command(&player, line.trim()).await {
                    warn!("{}", e);
                }
            }
        }
    }
}

async fn run_command(player: &MediaPlayer, line: &str) -> Result<()> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(());
    };

    match command {
        "play" => player.play().await,
        "pause" => player.pause().await,
        "stop" => player.stop().await,
        "quit" => player.quit().await,
        "seek" => {
            let secs = parse_secs(words.next()).context("usage: seek <secs>")?;
            player.seek(secs).await;
        }
        "volume" => {
            let arg = words.next().context("usage: volume <n>|+n|-n")?;
            let (reply, mut volume) = ReplySlot::new();
            if arg.starts_with('+') || arg.starts_with('-') {
                let delta: i32 = arg.parse().context("invalid volume delta")?;
                player.change_volume(delta, &reply).await;
            } else {
                let value: i32 = arg.parse().context("invalid volume")?;
                player.set_volume(value, &reply).await;
            }
            if let Some(volume) = volume.try_recv() {
                println!("volume {}", volume);
            }
        }
        "jump" => {
            let id = words.next().context("usage: jump <id> [secs]")?;
            let position = match words.next() {
                Some(secs) => parse_secs(Some(secs))?,
                None => Duration::ZERO,
            };
            player.set_current_track(id, position).await;
        }
        "queue" => {
            let id = words.next().context("usage: queue <id>")?;
            let (reply, mut snapshot) = ReplySlot::new();
            player.query_playlist(&reply);
            drop(reply);
            let Some(mut snapshot) = snapshot.recv().await else {
                bail!("player stopped");
            };
            snapshot.playlist.push(id.to_string());
            player.update_playlist(snapshot.playlist).await;
        }
        "list" => {
            let (reply, mut snapshot) = ReplySlot::new();
            player.query_playlist(&reply);
            drop(reply);
            let Some(snapshot) = snapshot.recv().await else {
                bail!("player stopped");
            };
            println!(
                "{} at {} (track {} of {})",
                snapshot.state,
                format_position(snapshot.position),
                snapshot.index + 1,
                snapshot.playlist.len()
            );
            for (i, id) in snapshot.playlist.iter().enumerate() {
                let marker = if i == snapshot.index { '>' } else { ' ' };
                println!("{} {}", marker, id);
            }
        }
        "help" => println!("{}", HELP),
        other => bail!("unknown command '{}' ({})", other, HELP),
    }
    Ok(())
}

fn parse_secs(arg: Option<&str>) -> Result<Duration> {
    let secs: f64 = arg
        .context("missing seconds")?
        .parse()
        .context("invalid seconds")?;
    Ok(secs_f64_to_position(secs))
}
