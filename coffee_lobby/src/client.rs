// UDP client for playing a match against a lobby.
//
// Architecture mirrors the server side:
// - `connect()` sends the registration datagram and blocks (with a timeout)
//   until the lobby answers with `Welcome`, then spawns a background reader.
// - The reader thread decodes every datagram that comes from the lobby
//   address into a `ServerMessage` and pushes it into an `mpsc` channel.
//   Datagrams from anyone else, or that do not decode, are dropped.
// - `poll()` drains the inbox without blocking; `recv_timeout()` waits for
//   the next message.
//
// Used by the integration tests and by anyone writing a bot in Rust. Raw
// sends (`send_raw`) exist so tests can exercise malformed input.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use coffee_protocol::{CellToken, MAX_DATAGRAM_SIZE, Registration, ServerMessage, datagram_text};

use crate::error::LobbyError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const READ_POLL: Duration = Duration::from_millis(50);

/// Information returned by a successful `connect()` handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WelcomeInfo {
    pub seat: u8,
    pub name: String,
}

pub struct LobbyClient {
    socket: UdpSocket,
    server: SocketAddr,
    inbox: Receiver<ServerMessage>,
    keep_running: Arc<AtomicBool>,
    reader_thread: Option<JoinHandle<()>>,
}

impl LobbyClient {
    /// Register with the lobby at `server` and wait for the welcome.
    pub fn connect(
        server: SocketAddr,
        registration: &Registration,
    ) -> Result<(Self, WelcomeInfo), LobbyError> {
        let bind_addr = if server.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.send_to(registration.encode().as_bytes(), server)?;

        let welcome = match recv_from_server(&socket, server, HANDSHAKE_TIMEOUT)? {
            Some(ServerMessage::Welcome { seat, name }) => WelcomeInfo { seat, name },
            Some(other) => {
                return Err(LobbyError::Handshake(format!(
                    "expected a welcome, got {other:?}"
                )));
            }
            None => return Err(LobbyError::Handshake("no answer from lobby".into())),
        };

        socket.set_read_timeout(Some(READ_POLL))?;
        let reader_socket = socket.try_clone()?;
        let keep_running = Arc::new(AtomicBool::new(true));
        let keep_running_reader = keep_running.clone();
        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(reader_socket, server, tx, keep_running_reader);
        });

        Ok((
            Self {
                socket,
                server,
                inbox: rx,
                keep_running,
                reader_thread: Some(reader_thread),
            },
            welcome,
        ))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, LobbyError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn send_move(&self, cell: CellToken) -> Result<(), LobbyError> {
        self.send_raw(&cell.to_string())
    }

    /// Send arbitrary text to the lobby.
    pub fn send_raw(&self, text: &str) -> Result<(), LobbyError> {
        self.socket.send_to(text.as_bytes(), self.server)?;
        Ok(())
    }

    /// Drain all queued messages without blocking.
    pub fn poll(&self) -> Vec<ServerMessage> {
        self.inbox.try_iter().collect()
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ServerMessage> {
        self.inbox.recv_timeout(timeout).ok()
    }
}

impl Drop for LobbyClient {
    fn drop(&mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Blocking receive of one decodable message from `server`, skipping
/// anything else, until `timeout` elapses.
fn recv_from_server(
    socket: &UdpSocket,
    server: SocketAddr,
    timeout: Duration,
) -> Result<Option<ServerMessage>, LobbyError> {
    let give_up = Instant::now() + timeout;
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        let remaining = give_up.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        socket.set_read_timeout(Some(remaining))?;
        match socket.recv_from(&mut buf) {
            Ok((n, from)) if from == server => {
                if let Some(message) = decode(&buf[..n]) {
                    return Ok(Some(message));
                }
            }
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => return Err(e.into()),
        }
    }
}

fn reader_loop(
    socket: UdpSocket,
    server: SocketAddr,
    tx: Sender<ServerMessage>,
    keep_running: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    while keep_running.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((n, from)) if from == server => {
                let Some(message) = decode(&buf[..n]) else {
                    continue;
                };
                if tx.send(message).is_err() {
                    break;
                }
            }
            Ok((_, from)) => debug!(%from, "ignoring datagram from non-lobby address"),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => {
                debug!("client socket read failed: {e}");
                break;
            }
        }
    }
}

fn decode(bytes: &[u8]) -> Option<ServerMessage> {
    let decoded = datagram_text(bytes).and_then(ServerMessage::decode);
    match decoded {
        Ok(message) => Some(message),
        Err(e) => {
            debug!("dropping undecodable lobby datagram: {e}");
            None
        }
    }
}
