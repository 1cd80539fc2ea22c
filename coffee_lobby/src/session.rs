// Lobby state machine for one match.
//
// `Session` is the central data structure that `server.rs` drives. It owns
// the `MatchBoard`, the two registered players and the turn clock. It never
// touches a socket or a timer: every input (a datagram, a fired deadline)
// comes in with the current `Instant`, and every output goes back as a list
// of `Effect`s (sends, deadline arm/cancel, observer events, close) that the
// server applies in order. That keeps all game logic single-threaded and
// testable with fake addresses and fake clocks.
//
// States and transitions:
//
//   WaitingFirstPlayer  --registration-->          WaitingSecondPlayer
//   WaitingSecondPlayer --registration-->          FirstTurn (MatchStart to both)
//   FirstTurn/SecondTurn --move or deadline-->     the other turn, or Completed
//   Completed           (absorbing; sends MatchEnd to both, then Close)
//
// Leaving a turn always cancels its deadline. The match completes when no
// legal move is left, when the turn that just ended was turn number
// `max_turn_count`, or when that turn ran past `max_turn_duration`.
//
// A turn-state datagram is only considered if it comes from the player whose
// turn it is; anything else (the waiting player, strangers, spoofed ports)
// is dropped without touching the state. A move that arrives after its
// turn's budget is not applied and ends the match. A token that does not
// parse is dropped and the turn keeps running; a well-formed token that
// fails the claim rule (or lies off the grid) consumes the turn.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use coffee_map::{MapDefinition, MatchBoard, RenderMode, Side};
use coffee_protocol::{CellToken, Outcome, Registration, ServerMessage, datagram_text};

use crate::player::PlayerHandle;

/// Turn limits for a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchLimits {
    pub max_turn_count: u32,
    pub max_turn_duration: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LobbyState {
    WaitingFirstPlayer,
    WaitingSecondPlayer,
    FirstTurn,
    SecondTurn,
    Completed,
}

impl LobbyState {
    /// Side expected to move, in the two turn states.
    pub fn mover(self) -> Option<Side> {
        match self {
            LobbyState::FirstTurn => Some(Side::First),
            LobbyState::SecondTurn => Some(Side::Second),
            _ => None,
        }
    }

    fn turn_of(side: Side) -> Self {
        match side {
            Side::First => LobbyState::FirstTurn,
            Side::Second => LobbyState::SecondTurn,
        }
    }
}

impl std::fmt::Display for LobbyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LobbyState::WaitingFirstPlayer => "waiting for first player",
            LobbyState::WaitingSecondPlayer => "waiting for second player",
            LobbyState::FirstTurn => "first player's turn",
            LobbyState::SecondTurn => "second player's turn",
            LobbyState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Identifies one armed deadline. Tokens are never reused within a session,
/// so a deadline that fires after its turn ended is recognizably stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeadlineToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    pub token: DeadlineToken,
    pub at: Instant,
}

/// Notifications for whoever embeds the lobby (the binary logs them, tests
/// wait on them).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LobbyEvent {
    Joined { side: Side, name: String },
    StateChanged(LobbyState),
}

/// Side effect requested by the session, applied by the server in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Send { side: Side, message: ServerMessage },
    ArmDeadline(Deadline),
    CancelDeadline(DeadlineToken),
    Notify(LobbyEvent),
    /// The match is over; release the socket.
    Close,
}

/// The turn in progress.
#[derive(Clone, Copy, Debug)]
struct TurnClock {
    number: u32,
    started: Instant,
    deadline: DeadlineToken,
}

pub struct Session {
    board: MatchBoard,
    limits: MatchLimits,
    state: LobbyState,
    players: [Option<PlayerHandle>; 2],
    turn: Option<TurnClock>,
    next_token: u64,
}

impl Session {
    pub fn new(map: Arc<MapDefinition>, limits: MatchLimits) -> Self {
        Self {
            board: MatchBoard::new(map),
            limits,
            state: LobbyState::WaitingFirstPlayer,
            players: [None, None],
            turn: None,
            next_token: 0,
        }
    }

    pub fn state(&self) -> LobbyState {
        self.state
    }

    pub fn player(&self, side: Side) -> Option<&PlayerHandle> {
        self.players[seat_index(side)].as_ref()
    }

    pub fn board(&self) -> &MatchBoard {
        &self.board
    }

    /// Number of the turn in progress, starting at 1. `None` outside the
    /// turn states.
    pub fn turn_number(&self) -> Option<u32> {
        self.turn.map(|t| t.number)
    }

    /// Deadline of the turn in progress.
    pub fn deadline(&self) -> Option<Deadline> {
        self.turn.map(|t| Deadline {
            token: t.deadline,
            at: t.started + self.limits.max_turn_duration,
        })
    }

    /// Process one datagram received from `from` at `now`.
    pub fn handle_datagram(&mut self, bytes: &[u8], from: SocketAddr, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        let text = match datagram_text(bytes) {
            Ok(text) => text,
            Err(e) => {
                debug!(%from, "dropping datagram: {e}");
                return effects;
            }
        };

        match self.state {
            LobbyState::WaitingFirstPlayer => {
                if !self.register(Side::First, text, from, &mut effects) {
                    return effects;
                }
            }
            LobbyState::WaitingSecondPlayer => {
                if self.sender(from).is_some() {
                    debug!(%from, "first player registered twice; ignoring");
                    return effects;
                }
                if !self.register(Side::Second, text, from, &mut effects) {
                    return effects;
                }
            }
            LobbyState::FirstTurn | LobbyState::SecondTurn => {
                let Some(mover) = self.state.mover() else {
                    return effects;
                };
                if self.sender(from) != Some(mover) {
                    debug!(%from, expected = %mover, "dropping datagram from out-of-turn sender");
                    return effects;
                }
                if self.turn_expired(now) {
                    info!(side = %mover, "move arrived after the turn deadline");
                } else {
                    let cell: CellToken = match text.parse() {
                        Ok(cell) => cell,
                        Err(e) => {
                            debug!(side = %mover, "dropping move: {e}");
                            return effects;
                        }
                    };
                    self.play(mover, cell, &mut effects);
                }
            }
            LobbyState::Completed => return effects,
        }

        self.advance(now, &mut effects);
        effects
    }

    /// Process a fired deadline. Stale tokens and early firings are ignored.
    pub fn handle_deadline(&mut self, token: DeadlineToken, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(turn) = self.turn else {
            return effects;
        };
        if turn.deadline != token {
            debug!(?token, "ignoring stale deadline");
            return effects;
        }
        if !self.turn_expired(now) {
            debug!(?token, "ignoring early deadline");
            return effects;
        }
        self.advance(now, &mut effects);
        effects
    }

    /// Which registered player sent a datagram from `from`, if any.
    fn sender(&self, from: SocketAddr) -> Option<Side> {
        self.players
            .iter()
            .flatten()
            .find(|p| p.matches(from))
            .map(PlayerHandle::side)
    }

    fn register(
        &mut self,
        side: Side,
        text: &str,
        from: SocketAddr,
        effects: &mut Vec<Effect>,
    ) -> bool {
        let registration = match Registration::parse(text) {
            Ok(r) => r,
            Err(e) => {
                debug!(%from, "rejecting registration: {e}");
                return false;
            }
        };
        let render_mode = if registration.compact {
            RenderMode::Compact
        } else {
            RenderMode::Verbose
        };
        let name = registration.name;
        info!(%side, %name, %from, ?render_mode, "player joined");

        self.players[seat_index(side)] = Some(PlayerHandle::new(
            side,
            name.clone(),
            render_mode,
            from,
        ));
        effects.push(Effect::Send {
            side,
            message: ServerMessage::Welcome {
                seat: side.seat(),
                name: name.clone(),
            },
        });
        effects.push(Effect::Notify(LobbyEvent::Joined { side, name }));
        true
    }

    fn play(&mut self, mover: Side, cell: CellToken, effects: &mut Vec<Effect>) {
        let claimed = self.board.attempt_claim_at(cell.row(), cell.col(), mover);
        if claimed {
            debug!(side = %mover, %cell, "claimed\n{}", self.board.render());
            effects.push(Effect::Send {
                side: mover.opponent(),
                message: ServerMessage::OpponentPlayed { cell },
            });
        } else {
            debug!(side = %mover, %cell, "illegal move");
            effects.push(Effect::Send {
                side: mover,
                message: ServerMessage::YouFailed,
            });
            effects.push(Effect::Send {
                side: mover.opponent(),
                message: ServerMessage::OpponentFailed,
            });
        }
    }

    fn turn_expired(&self, now: Instant) -> bool {
        self.turn.is_some_and(|t| {
            now.saturating_duration_since(t.started) >= self.limits.max_turn_duration
        })
    }

    /// Leave the current state: cancel the running deadline, then pick the
    /// next state.
    fn advance(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let expired = self.turn_expired(now);
        let finished = self.turn.take();
        if let Some(turn) = finished {
            effects.push(Effect::CancelDeadline(turn.deadline));
        }

        match self.state {
            LobbyState::WaitingFirstPlayer => {
                self.enter(LobbyState::WaitingSecondPlayer, effects);
            }
            LobbyState::WaitingSecondPlayer => {
                for side in Side::BOTH {
                    if let Some(player) = self.player(side) {
                        let map = self.board.map().encode(player.render_mode());
                        effects.push(Effect::Send {
                            side,
                            message: ServerMessage::MatchStart { map },
                        });
                    }
                }
                if self.board.can_play() {
                    info!("match started");
                    self.begin_turn(Side::First, 1, now, effects);
                } else {
                    info!("match started on a board without legal moves");
                    self.enter(LobbyState::Completed, effects);
                }
            }
            LobbyState::FirstTurn | LobbyState::SecondTurn => {
                let (Some(mover), Some(turn)) = (self.state.mover(), finished) else {
                    self.enter(LobbyState::Completed, effects);
                    return;
                };
                let reason = if !self.board.can_play() {
                    Some("no legal moves left")
                } else if turn.number >= self.limits.max_turn_count {
                    Some("turn limit reached")
                } else if expired {
                    Some("turn timed out")
                } else {
                    None
                };
                match reason {
                    Some(reason) => {
                        info!(turn = turn.number, "match over: {reason}");
                        self.enter(LobbyState::Completed, effects);
                    }
                    None => self.begin_turn(mover.opponent(), turn.number + 1, now, effects),
                }
            }
            LobbyState::Completed => {}
        }
    }

    fn begin_turn(&mut self, side: Side, number: u32, now: Instant, effects: &mut Vec<Effect>) {
        let token = DeadlineToken(self.next_token);
        self.next_token += 1;
        self.turn = Some(TurnClock {
            number,
            started: now,
            deadline: token,
        });
        effects.push(Effect::ArmDeadline(Deadline {
            token,
            at: now + self.limits.max_turn_duration,
        }));
        self.enter(LobbyState::turn_of(side), effects);
    }

    /// Switch to `state` and run its entry actions.
    fn enter(&mut self, state: LobbyState, effects: &mut Vec<Effect>) {
        self.state = state;
        effects.push(Effect::Notify(LobbyEvent::StateChanged(state)));

        match state {
            LobbyState::FirstTurn | LobbyState::SecondTurn => {
                if let Some(side) = state.mover() {
                    effects.push(Effect::Send {
                        side,
                        message: ServerMessage::YourTurn,
                    });
                }
            }
            LobbyState::Completed => {
                let first = tally(&self.board, Side::First);
                let second = tally(&self.board, Side::Second);
                info!(first, second, "match complete");
                for (side, own, opponent) in
                    [(Side::First, first, second), (Side::Second, second, first)]
                {
                    effects.push(Effect::Send {
                        side,
                        message: ServerMessage::MatchEnd {
                            outcome: Outcome::from_tally(own, opponent),
                            own,
                            opponent,
                        },
                    });
                }
                effects.push(Effect::Close);
            }
            LobbyState::WaitingFirstPlayer | LobbyState::WaitingSecondPlayer => {}
        }
    }
}

fn seat_index(side: Side) -> usize {
    match side {
        Side::First => 0,
        Side::Second => 1,
    }
}

fn tally(board: &MatchBoard, side: Side) -> u32 {
    u32::try_from(board.claimed_count(side)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use coffee_map::{CellKind, PlotId};

    use super::*;

    const BUDGET: Duration = Duration::from_millis(1000);

    /// 4x4 map, plots in horizontal pairs:
    ///   1 1 2 2
    ///   3 3 4 4
    ///   5 5 6 6
    ///   7 7 8 8
    fn pairs_map() -> Arc<MapDefinition> {
        let cells = (0..16u16)
            .map(|i| CellKind::Plot(PlotId(i / 2 + 1)))
            .collect();
        Arc::new(MapDefinition::new(4, 4, cells).unwrap())
    }

    fn limits(max_turn_count: u32) -> MatchLimits {
        MatchLimits {
            max_turn_count,
            max_turn_duration: BUDGET,
        }
    }

    fn alpha() -> SocketAddr {
        "127.0.0.1:5001".parse().unwrap()
    }

    fn beta() -> SocketAddr {
        "127.0.0.1:5002".parse().unwrap()
    }

    fn sends_to(effects: &[Effect], side: Side) -> Vec<ServerMessage> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send { side: s, message } if *s == side => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn armed(effects: &[Effect]) -> Option<Deadline> {
        effects.iter().find_map(|e| match e {
            Effect::ArmDeadline(d) => Some(*d),
            _ => None,
        })
    }

    /// Session with both players registered; returns the match start time.
    fn started(map: Arc<MapDefinition>, max_turns: u32) -> (Session, Instant) {
        let mut session = Session::new(map, limits(max_turns));
        let t0 = Instant::now();
        session.handle_datagram(b"Alpha", alpha(), t0);
        session.handle_datagram(b"#Beta", beta(), t0);
        (session, t0)
    }

    #[test]
    fn first_registration_sends_welcome() {
        let mut session = Session::new(pairs_map(), limits(56));
        let effects = session.handle_datagram(b"Alpha\n", alpha(), Instant::now());

        assert_eq!(session.state(), LobbyState::WaitingSecondPlayer);
        assert_eq!(
            sends_to(&effects, Side::First),
            vec![ServerMessage::Welcome {
                seat: 1,
                name: "Alpha".into()
            }]
        );
        assert!(effects.contains(&Effect::Notify(LobbyEvent::Joined {
            side: Side::First,
            name: "Alpha".into()
        })));
        assert_eq!(session.player(Side::First).unwrap().address(), alpha());
    }

    #[test]
    fn empty_registration_is_dropped() {
        let mut session = Session::new(pairs_map(), limits(56));
        assert!(session.handle_datagram(b"#", alpha(), Instant::now()).is_empty());
        assert!(session.handle_datagram(b"", alpha(), Instant::now()).is_empty());
        assert_eq!(session.state(), LobbyState::WaitingFirstPlayer);
    }

    #[test]
    fn registered_players_keep_their_side() {
        let (session, _) = started(pairs_map(), 56);
        for side in Side::BOTH {
            assert_eq!(session.player(side).unwrap().side(), side);
        }
        assert_eq!(session.sender(beta()), Some(Side::Second));
        assert_eq!(session.sender("127.0.0.1:5003".parse().unwrap()), None);
    }

    #[test]
    fn first_player_cannot_take_both_seats() {
        let mut session = Session::new(pairs_map(), limits(56));
        let now = Instant::now();
        session.handle_datagram(b"Alpha", alpha(), now);
        assert!(session.handle_datagram(b"Alpha2", alpha(), now).is_empty());
        assert_eq!(session.state(), LobbyState::WaitingSecondPlayer);
    }

    #[test]
    fn second_registration_starts_the_match() {
        let mut session = Session::new(pairs_map(), limits(56));
        let t0 = Instant::now();
        session.handle_datagram(b"Alpha", alpha(), t0);
        let effects = session.handle_datagram(b"#Beta", beta(), t0);

        assert_eq!(session.state(), LobbyState::FirstTurn);
        assert_eq!(session.turn_number(), Some(1));
        assert_eq!(session.player(Side::Second).unwrap().name(), "Beta");

        let map = session.board().map();
        assert_eq!(
            sends_to(&effects, Side::First),
            vec![
                ServerMessage::MatchStart {
                    map: map.encode(RenderMode::Verbose)
                },
                ServerMessage::YourTurn,
            ]
        );
        assert_eq!(
            sends_to(&effects, Side::Second),
            vec![
                ServerMessage::Welcome {
                    seat: 2,
                    name: "Beta".into()
                },
                ServerMessage::MatchStart {
                    map: map.encode(RenderMode::Compact)
                },
            ]
        );
        let deadline = armed(&effects).unwrap();
        assert_eq!(deadline.at, t0 + BUDGET);
        assert_eq!(session.deadline(), Some(deadline));
    }

    #[test]
    fn legal_move_is_forwarded_and_turn_passes() {
        let (mut session, t0) = started(pairs_map(), 56);
        let first_deadline = session.deadline().unwrap();

        let effects = session.handle_datagram(b"A:1", alpha(), t0 + Duration::from_millis(10));

        assert_eq!(session.state(), LobbyState::SecondTurn);
        assert_eq!(session.turn_number(), Some(2));
        assert_eq!(
            sends_to(&effects, Side::Second),
            vec![
                ServerMessage::OpponentPlayed {
                    cell: "A:1".parse().unwrap()
                },
                ServerMessage::YourTurn,
            ]
        );
        assert!(sends_to(&effects, Side::First).is_empty());
        assert_eq!(effects[0], Effect::CancelDeadline(first_deadline.token));
        assert_ne!(armed(&effects).unwrap().token, first_deadline.token);
    }

    #[test]
    fn illegal_move_consumes_the_turn() {
        let (mut session, t0) = started(pairs_map(), 56);
        session.handle_datagram(b"A:1", alpha(), t0);

        // B:2 is diagonal from A:1.
        let effects = session.handle_datagram(b"B:2", beta(), t0);
        assert_eq!(sends_to(&effects, Side::Second), vec![ServerMessage::YouFailed]);
        assert_eq!(
            sends_to(&effects, Side::First),
            vec![ServerMessage::OpponentFailed, ServerMessage::YourTurn]
        );
        assert_eq!(session.state(), LobbyState::FirstTurn);
        assert_eq!(session.board().claimed_count(Side::Second), 0);
    }

    #[test]
    fn off_grid_move_is_illegal() {
        let (mut session, t0) = started(pairs_map(), 56);
        let effects = session.handle_datagram(b"Z:40", alpha(), t0);
        assert_eq!(sends_to(&effects, Side::First), vec![ServerMessage::YouFailed]);
        assert_eq!(session.state(), LobbyState::SecondTurn);
    }

    #[test]
    fn unparseable_move_is_dropped() {
        let (mut session, t0) = started(pairs_map(), 56);
        let before = session.deadline();
        for junk in [&b"hello"[..], &b"a:1"[..], &b"A:0"[..], &b"A1"[..], &b"\xff\xfe"[..]] {
            assert!(session.handle_datagram(junk, alpha(), t0).is_empty());
        }
        assert_eq!(session.state(), LobbyState::FirstTurn);
        assert_eq!(session.deadline(), before);
    }

    #[test]
    fn out_of_turn_and_spoofed_datagrams_are_dropped() {
        let (mut session, t0) = started(pairs_map(), 56);
        // The waiting player.
        assert!(session.handle_datagram(b"A:1", beta(), t0).is_empty());
        // Right IP, wrong port.
        let spoof: SocketAddr = "127.0.0.1:5999".parse().unwrap();
        assert!(session.handle_datagram(b"A:1", spoof, t0).is_empty());
        // A stranger.
        let stranger: SocketAddr = "10.0.0.7:5001".parse().unwrap();
        assert!(session.handle_datagram(b"A:1", stranger, t0).is_empty());

        assert_eq!(session.state(), LobbyState::FirstTurn);
        assert_eq!(session.board().claimed_count(Side::First), 0);
        assert_eq!(session.board().claimed_count(Side::Second), 0);
    }

    #[test]
    fn deadline_completes_the_match() {
        let (mut session, _) = started(pairs_map(), 56);
        let deadline = session.deadline().unwrap();

        let effects = session.handle_deadline(deadline.token, deadline.at);
        assert_eq!(session.state(), LobbyState::Completed);
        assert_eq!(session.turn_number(), None);
        assert_eq!(effects[0], Effect::CancelDeadline(deadline.token));
        let end = ServerMessage::MatchEnd {
            outcome: Outcome::Draw,
            own: 0,
            opponent: 0,
        };
        assert_eq!(sends_to(&effects, Side::First), vec![end.clone()]);
        assert_eq!(sends_to(&effects, Side::Second), vec![end]);
        assert_eq!(effects.last(), Some(&Effect::Close));
    }

    #[test]
    fn stale_and_early_deadlines_are_ignored() {
        let (mut session, t0) = started(pairs_map(), 56);
        let first = session.deadline().unwrap();
        session.handle_datagram(b"A:1", alpha(), t0);

        // The first turn's deadline fires after the turn already ended.
        assert!(session.handle_deadline(first.token, first.at).is_empty());
        assert_eq!(session.state(), LobbyState::SecondTurn);

        // The current deadline fires too early.
        let current = session.deadline().unwrap();
        assert!(session
            .handle_deadline(current.token, current.at - Duration::from_millis(1))
            .is_empty());
        assert_eq!(session.state(), LobbyState::SecondTurn);
    }

    #[test]
    fn late_move_is_not_applied() {
        let (mut session, t0) = started(pairs_map(), 56);
        let effects = session.handle_datagram(b"A:1", alpha(), t0 + BUDGET);

        assert_eq!(session.state(), LobbyState::Completed);
        assert_eq!(session.board().claimed_count(Side::First), 0);
        assert!(
            !sends_to(&effects, Side::Second)
                .iter()
                .any(|m| matches!(m, ServerMessage::OpponentPlayed { .. }))
        );
    }

    #[test]
    fn turn_limit_counts_every_turn() {
        let (mut session, t0) = started(pairs_map(), 3);
        session.handle_datagram(b"A:1", alpha(), t0); // turn 1
        session.handle_datagram(b"C:1", beta(), t0); // turn 2
        assert_eq!(session.turn_number(), Some(3));
        let effects = session.handle_datagram(b"C:3", alpha(), t0); // turn 3

        assert_eq!(session.state(), LobbyState::Completed);
        assert_eq!(
            sends_to(&effects, Side::First).last(),
            Some(&ServerMessage::MatchEnd {
                outcome: Outcome::Win,
                own: 2,
                opponent: 1
            })
        );
        assert_eq!(
            sends_to(&effects, Side::Second).last(),
            Some(&ServerMessage::MatchEnd {
                outcome: Outcome::Loss,
                own: 1,
                opponent: 2
            })
        );
    }

    #[test]
    fn running_out_of_moves_completes_the_match() {
        let cells = vec![CellKind::Plot(PlotId(1)), CellKind::Plot(PlotId(2))];
        let map = Arc::new(MapDefinition::new(2, 1, cells).unwrap());
        let (mut session, t0) = started(map, 56);

        session.handle_datagram(b"A:1", alpha(), t0);
        assert_eq!(session.state(), LobbyState::SecondTurn);
        session.handle_datagram(b"B:1", beta(), t0);
        assert_eq!(session.state(), LobbyState::Completed);
    }

    #[test]
    fn board_without_plots_completes_at_start() {
        let map = Arc::new(MapDefinition::new(2, 1, vec![CellKind::Sea, CellKind::Forest]).unwrap());
        let (session, _) = started(map, 56);
        assert_eq!(session.state(), LobbyState::Completed);
        assert_eq!(session.deadline(), None);
    }

    #[test]
    fn completed_session_ignores_everything() {
        let (mut session, t0) = started(pairs_map(), 1);
        session.handle_datagram(b"A:1", alpha(), t0);
        assert_eq!(session.state(), LobbyState::Completed);
        assert!(session.handle_datagram(b"C:1", beta(), t0).is_empty());
        assert!(session.handle_datagram(b"Gamma", "127.0.0.1:6000".parse().unwrap(), t0).is_empty());
    }

    #[test]
    fn state_changes_are_notified_in_order() {
        let (mut session, t0) = started(pairs_map(), 56);
        let effects = session.handle_datagram(b"A:1", alpha(), t0);
        let states: Vec<_> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(LobbyEvent::StateChanged(s)) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![LobbyState::SecondTurn]);
        assert_eq!(LobbyState::SecondTurn.to_string(), "second player's turn");
    }
}
