// coffee_lobby: UDP lobby that referees one two-player Coffee match.
//
// A lobby binds one UDP port, waits for two players to register (first one
// in plays first), sends both the map, then alternates turns until the board
// runs out of legal moves, the turn limit is reached, or a player takes
// longer than the per-turn budget. The final tally goes to both players and
// the port is released.
//
// Module overview:
// - `session.rs`:  Lobby state machine. Pure: takes datagrams and fired
//                  deadlines with a timestamp, returns `Effect`s.
// - `server.rs`:   UDP socket, reader thread, and the main event loop that
//                  applies effects and runs the turn timer via
//                  `recv_timeout`.
// - `player.rs`:   `PlayerHandle`, a registered player's name, render mode
//                  and pinned address.
// - `client.rs`:   `LobbyClient` for bots and integration tests.
// - `config.rs`:   `LobbyConfig` (JSON + defaults) and map file loading.
// - `error.rs`:    `LobbyError`.
//
// Dependencies: `coffee_map` (board and map definition) and
// `coffee_protocol` (wire texts). The lobby runs as a standalone binary
// (`main.rs`) or embedded through `start_lobby`.

pub mod client;
pub mod config;
pub mod error;
pub mod player;
pub mod server;
pub mod session;

pub use client::{LobbyClient, WelcomeInfo};
pub use config::{LobbyConfig, load_map};
pub use error::LobbyError;
pub use server::{LobbyHandle, start_lobby};
pub use session::{LobbyEvent, LobbyState, MatchLimits, Session};
