// coffee_protocol: wire protocol between the Coffee lobby and its players.
//
// Every message is one UTF-8 text datagram. Server messages start with a
// two-digit code (`01`, `10`, `20`, `21`, `22`, `88`); client datagrams are
// raw: a display name (optionally prefixed with `#` to ask for the compact
// map encoding) while registering, then cell tokens such as `C:4`.
//
// Module overview:
// - `types.rs`:    `CellToken` (column letter + 1-based row) and `Outcome`.
// - `message.rs`:  `ServerMessage` encode/decode and client `Registration`.
// - `framing.rs`:  Datagram size limit and bytes -> text extraction.
// - `error.rs`:    `ProtocolError`.
//
// The crate knows nothing about maps or sessions; the lobby converts between
// board coordinates and `CellToken`s, and decides which message to send.

pub mod error;
pub mod framing;
pub mod message;
pub mod types;

pub use error::ProtocolError;
pub use framing::{MAX_DATAGRAM_SIZE, datagram_text};
pub use message::{COMPACT_MARKER, Registration, ServerMessage};
pub use types::{CellToken, Outcome};
