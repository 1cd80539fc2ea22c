// Test-only player for end-to-end match tests.
//
// Wraps the real `LobbyClient` (from `coffee_lobby::client`) in a
// synchronous, panicking API: every `expect_*` call blocks until the next
// message arrives and asserts on it. All networking goes through the same
// code paths a real bot would use; only the blocking wrappers are
// test-specific.
//
// See also: `tests/full_match.rs` for the scenarios.

use std::net::SocketAddr;
use std::time::Duration;

use coffee_lobby::LobbyClient;
use coffee_protocol::{CellToken, Outcome, Registration, ServerMessage};

/// Default timeout for blocking receives.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestPlayer {
    client: LobbyClient,
    pub seat: u8,
    pub name: String,
}

impl TestPlayer {
    /// Register with `text` exactly as a player would type it (a leading
    /// `#` asks for the compact map).
    pub fn connect(addr: SocketAddr, text: &str) -> Self {
        let registration = Registration::parse(text).expect("bad registration text");
        let (client, welcome) =
            LobbyClient::connect(addr, &registration).expect("TestPlayer::connect failed");
        Self {
            client,
            seat: welcome.seat,
            name: welcome.name,
        }
    }

    pub fn play(&self, token: &str) {
        self.client.send_raw(token).expect("send failed");
    }

    pub fn play_cell(&self, cell: CellToken) {
        self.client.send_move(cell).expect("send failed");
    }

    /// Next message, or panic after the timeout.
    pub fn next(&self) -> ServerMessage {
        self.client
            .recv_timeout(RECV_TIMEOUT)
            .unwrap_or_else(|| panic!("{}: timed out waiting for a message", self.name))
    }

    pub fn expect(&self, expected: ServerMessage) {
        assert_eq!(self.next(), expected, "{} got an unexpected message", self.name);
    }

    pub fn expect_your_turn(&self) {
        self.expect(ServerMessage::YourTurn);
    }

    /// Wait for the match start and return the map text.
    pub fn expect_match_start(&self) -> String {
        match self.next() {
            ServerMessage::MatchStart { map } => map,
            other => panic!("{}: expected match start, got {other:?}", self.name),
        }
    }

    pub fn expect_match_end(&self, own: u32, opponent: u32) {
        self.expect(ServerMessage::MatchEnd {
            outcome: Outcome::from_tally(own, opponent),
            own,
            opponent,
        });
    }

    /// Assert that nothing arrives within `window`.
    pub fn expect_silence(&self, window: Duration) {
        if let Some(message) = self.client.recv_timeout(window) {
            panic!("{}: unexpected {message:?}", self.name);
        }
    }
}
