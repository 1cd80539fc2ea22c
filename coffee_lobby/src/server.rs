// UDP server and main event loop for one lobby.
//
// Architecture: one reader thread plus the main loop thread, joined by an
// `mpsc` channel.
//
// - **Reader thread** (`UdpSocket::recv_from()` loop on a cloned socket):
//   forwards each datagram with its source address as
//   `InternalEvent::Datagram`. The socket has a short read timeout so the
//   thread notices shutdown.
// - **Main thread**: owns the `Session` and the only armed deadline. It
//   waits on the channel with `recv_timeout` up to that deadline; once the
//   deadline has passed it is delivered to the session as fired. This
//   gives us the turn timer without a separate timer thread.
//
// The main thread is the only writer to the socket. It applies the
// session's `Effect`s in order: sends go out fire-and-forget (failures are
// logged and the match goes on), deadline effects replace or clear the armed
// deadline, events go to the `LobbyHandle` observer channel, and `Close`
// ends the loop. Leaving the loop stops the reader and drops both socket
// handles, releasing the port.
//
// Shutdown: `LobbyHandle::stop` clears `keep_running`; both threads check it
// at least every `POLL_INTERVAL`.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use coffee_map::MapDefinition;
use coffee_protocol::MAX_DATAGRAM_SIZE;

use crate::config::LobbyConfig;
use crate::error::LobbyError;
use crate::session::{Deadline, Effect, LobbyEvent, LobbyState, Session};

/// Upper bound on how long either thread goes without checking
/// `keep_running`.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Events sent from the reader thread to the main thread.
enum InternalEvent {
    Datagram { bytes: Vec<u8>, from: SocketAddr },
}

/// Handle returned by `start_lobby` to control and observe the running
/// lobby.
pub struct LobbyHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
    events: Receiver<LobbyEvent>,
}

impl LobbyHandle {
    /// Signal the lobby to stop and wait for it to shut down.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.join_thread();
    }

    /// Wait for the match to finish on its own.
    pub fn join(mut self) {
        self.join_thread();
    }

    /// Observer channel. Disconnects once the lobby thread has exited.
    pub fn events(&self) -> &Receiver<LobbyEvent> {
        &self.events
    }

    /// Consume events until the lobby enters `state`. Returns false on
    /// timeout or if the lobby exits first.
    pub fn wait_for(&self, state: LobbyState, timeout: Duration) -> bool {
        let give_up = Instant::now() + timeout;
        loop {
            let remaining = give_up.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(LobbyEvent::StateChanged(s)) if s == state => return true,
                Ok(_) => {}
                Err(_) => return false,
            }
        }
    }

    fn join_thread(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Bind the lobby socket and start serving one match on `map`. Returns the
/// handle and the bound address (useful with port 0).
pub fn start_lobby(
    map: Arc<MapDefinition>,
    config: &LobbyConfig,
) -> Result<(LobbyHandle, SocketAddr), LobbyError> {
    let config = config.clone().normalized();
    let socket = UdpSocket::bind((config.bind_address.as_str(), config.port))?;
    let addr = socket.local_addr()?;
    let reader_socket = socket.try_clone()?;
    reader_socket.set_read_timeout(Some(POLL_INTERVAL))?;

    let session = Session::new(map, config.limits());
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();
    let (events_tx, events_rx) = mpsc::channel();

    info!(
        %addr,
        max_turn_count = config.max_turn_count,
        max_turn_duration_ms = config.max_turn_duration_ms,
        "lobby listening"
    );
    let thread = thread::spawn(move || {
        run_lobby(socket, reader_socket, session, keep_running_clone, events_tx);
    });

    Ok((
        LobbyHandle {
            keep_running,
            thread: Some(thread),
            events: events_rx,
        },
        addr,
    ))
}

/// Main lobby loop. Runs until the match completes or `keep_running` is
/// cleared.
fn run_lobby(
    socket: UdpSocket,
    reader_socket: UdpSocket,
    mut session: Session,
    keep_running: Arc<AtomicBool>,
    events: Sender<LobbyEvent>,
) {
    let (tx, rx) = mpsc::channel();
    let keep_running_reader = keep_running.clone();
    let reader = thread::spawn(move || {
        reader_loop(reader_socket, tx, keep_running_reader);
    });

    let mut deadline: Option<Deadline> = None;
    while keep_running.load(Ordering::SeqCst) {
        let now = Instant::now();
        // A due deadline goes first, even if datagrams keep arriving.
        if let Some(due) = deadline.filter(|d| now >= d.at) {
            let effects = session.handle_deadline(due.token, now);
            if effects.is_empty() {
                deadline = None;
                continue;
            }
            if apply_effects(&socket, &session, effects, &mut deadline, &events) {
                break;
            }
            continue;
        }

        let wait = deadline.map_or(POLL_INTERVAL, |d| {
            d.at.saturating_duration_since(now).min(POLL_INTERVAL)
        });
        let effects = match rx.recv_timeout(wait) {
            Ok(InternalEvent::Datagram { bytes, from }) => {
                session.handle_datagram(&bytes, from, Instant::now())
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("reader thread exited; closing lobby");
                break;
            }
        };
        if apply_effects(&socket, &session, effects, &mut deadline, &events) {
            break;
        }
    }

    keep_running.store(false, Ordering::SeqCst);
    let _ = reader.join();
    info!(state = %session.state(), "lobby closed");
}

/// Apply effects in order. Returns true once `Effect::Close` was seen.
fn apply_effects(
    socket: &UdpSocket,
    session: &Session,
    effects: Vec<Effect>,
    deadline: &mut Option<Deadline>,
    events: &Sender<LobbyEvent>,
) -> bool {
    let mut closed = false;
    for effect in effects {
        match effect {
            Effect::Send { side, message } => {
                let Some(player) = session.player(side) else {
                    warn!(%side, "no player to send to");
                    continue;
                };
                if let Err(e) = player.send(socket, &message) {
                    warn!(%side, to = %player.address(), "send failed: {e}");
                }
            }
            Effect::ArmDeadline(d) => *deadline = Some(d),
            Effect::CancelDeadline(token) => {
                if deadline.is_some_and(|d| d.token == token) {
                    *deadline = None;
                }
            }
            Effect::Notify(event) => {
                // Nobody may be listening; that's fine.
                let _ = events.send(event);
            }
            Effect::Close => closed = true,
        }
    }
    closed
}

/// Reader thread: forward datagrams until shutdown or a fatal socket error.
fn reader_loop(socket: UdpSocket, tx: Sender<InternalEvent>, keep_running: Arc<AtomicBool>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    while keep_running.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((n, from)) => {
                let event = InternalEvent::Datagram {
                    bytes: buf[..n].to_vec(),
                    from,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            // An earlier send hit a closed port (reported on some platforms).
            Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                debug!("ignoring connection reset on lobby socket");
            }
            Err(e) => {
                warn!("lobby socket read failed: {e}");
                break;
            }
        }
    }
}
