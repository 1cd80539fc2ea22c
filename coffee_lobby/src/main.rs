// CLI entry point for the Coffee lobby.
//
// `serve` runs one match on a map loaded from disk (PPM or JSON) or
// generated from a seed, then exits once the match is over. `generate`
// prints a random map as a PPM image, ready to be fed back to `serve`.
//
// Usage:
//   coffee-lobby serve (--map <FILE> | --random-seed <N>) [--config <FILE>]
//                      [--bind <ADDR>] [--port <PORT>] [--max-turns <N>]
//                      [--turn-ms <MS>]
//   coffee-lobby generate [--seed <N>] [--width <W>] [--height <H>]
//                         [--max-plots <N>]
//
// Log verbosity follows `RUST_LOG` (default `info`); set
// `RUST_LOG=coffee_lobby=debug` to see every board after each claim.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use coffee_lobby::{LobbyConfig, LobbyError, LobbyEvent, LobbyState, load_map, start_lobby};
use coffee_map::{GenerateParams, generate_map};

#[derive(Parser)]
#[command(name = "coffee-lobby", version, about = "Two-player Coffee match lobby over UDP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve one match, then exit.
    Serve {
        /// Map file (`.json`, otherwise PPM).
        #[arg(long, conflicts_with = "random_seed", required_unless_present = "random_seed")]
        map: Option<PathBuf>,
        /// Generate the map from this seed instead of loading one.
        #[arg(long)]
        random_seed: Option<u64>,
        /// JSON config file; flags below override it.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Total turns, both players counted.
        #[arg(long)]
        max_turns: Option<u32>,
        /// Per-turn budget in milliseconds.
        #[arg(long)]
        turn_ms: Option<u64>,
    },
    /// Print a random map as a PPM image.
    Generate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 10)]
        width: u32,
        #[arg(long, default_value_t = 10)]
        height: u32,
        #[arg(long, default_value_t = 17)]
        max_plots: u16,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), LobbyError> {
    match cli.command {
        Command::Serve {
            map,
            random_seed,
            config,
            bind,
            port,
            max_turns,
            turn_ms,
        } => {
            let mut lobby_config = match config {
                Some(path) => LobbyConfig::load(&path)?,
                None => LobbyConfig::default(),
            };
            if let Some(bind) = bind {
                lobby_config.bind_address = bind;
            }
            if let Some(port) = port {
                lobby_config.port = port;
            }
            if let Some(n) = max_turns {
                lobby_config.max_turn_count = n;
            }
            if let Some(ms) = turn_ms {
                lobby_config.max_turn_duration_ms = ms;
            }
            let lobby_config = lobby_config.normalized();

            let definition = match (map, random_seed) {
                (Some(path), _) => load_map(&path)?,
                // clap requires one of the two.
                (None, seed) => generate_map(&GenerateParams::default(), seed.unwrap_or_default())?,
            };
            info!(
                width = definition.width(),
                height = definition.height(),
                plots = definition.plot_count(),
                "map loaded\n{definition}"
            );

            let (handle, addr) = start_lobby(Arc::new(definition), &lobby_config)?;
            info!(%addr, "match created, waiting for players");

            let mut started = false;
            for event in handle.events().iter() {
                match event {
                    LobbyEvent::StateChanged(LobbyState::FirstTurn) if !started => {
                        started = true;
                        info!("both players connected");
                    }
                    LobbyEvent::StateChanged(LobbyState::Completed) => break,
                    _ => {}
                }
            }
            handle.join();
            Ok(())
        }
        Command::Generate {
            seed,
            width,
            height,
            max_plots,
        } => {
            let params = GenerateParams {
                width,
                height,
                max_plots,
                ..GenerateParams::default()
            };
            print!("{}", generate_map(&params, seed)?.to_ppm());
            Ok(())
        }
    }
}
