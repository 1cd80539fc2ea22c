// Errors surfaced by the lobby library and binary.
//
// Only start-up and client-side failures are errors. Once a match runs, bad
// datagrams are dropped and send failures are logged; neither stops the
// event loop.

use std::path::PathBuf;

use coffee_map::MapError;

#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid map: {0}")]
    Map(#[from] MapError),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("handshake failed: {0}")]
    Handshake(String),
}
