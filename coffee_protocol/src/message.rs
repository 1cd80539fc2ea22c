// Protocol messages.
//
// `ServerMessage` is everything the lobby sends; `encode()` gives the exact
// datagram text and `decode()` reads it back (used by clients). Texts are
// fixed by the deployed clients, French included:
//
//   0{seat}-Bonjour {name}                      welcome, seat 1 or 2
//   01-la partie va commencer\nMAP={map}        match start
//   10-A vous de jouer :                        your turn
//   20:coup adversaire:{cell}                   opponent played
//   21:coup joué illégal                        your move was illegal
//   22:coup adversaire illegal                  opponent's move was illegal
//   88-Partie Terminée\nRESULTAT={r}\nSCORE={own}:{opponent}
//
// Clients have a single structured message, `Registration`; after that
// they only send bare `CellToken`s.

use crate::error::ProtocolError;
use crate::types::{CellToken, Outcome};

/// Leading character of a registration that asks for the compact map
/// encoding.
pub const COMPACT_MARKER: char = '#';

const WELCOME_BODY: &str = "-Bonjour ";
const MATCH_START: &str = "01-la partie va commencer\nMAP=";
const YOUR_TURN: &str = "10-A vous de jouer :";
const OPPONENT_PLAYED: &str = "20:coup adversaire:";
const YOU_FAILED: &str = "21:coup joué illégal";
const OPPONENT_FAILED: &str = "22:coup adversaire illegal";
const MATCH_END: &str = "88-Partie Terminée\nRESULTAT=";
const SCORE: &str = "\nSCORE=";

/// Messages sent by the lobby to a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMessage {
    /// Registration accepted; `seat` is 1 for the first side, 2 for the second.
    Welcome { seat: u8, name: String },
    /// Both players are in. `map` is already encoded for this player's
    /// rendering mode.
    MatchStart { map: String },
    YourTurn,
    OpponentPlayed { cell: CellToken },
    YouFailed,
    OpponentFailed,
    /// Final result from the receiver's point of view.
    MatchEnd {
        outcome: Outcome,
        own: u32,
        opponent: u32,
    },
}

impl ServerMessage {
    /// Datagram text for this message.
    pub fn encode(&self) -> String {
        match self {
            ServerMessage::Welcome { seat, name } => format!("{seat:02}{WELCOME_BODY}{name}"),
            ServerMessage::MatchStart { map } => format!("{MATCH_START}{map}"),
            ServerMessage::YourTurn => YOUR_TURN.to_string(),
            ServerMessage::OpponentPlayed { cell } => format!("{OPPONENT_PLAYED}{cell}"),
            ServerMessage::YouFailed => YOU_FAILED.to_string(),
            ServerMessage::OpponentFailed => OPPONENT_FAILED.to_string(),
            ServerMessage::MatchEnd {
                outcome,
                own,
                opponent,
            } => format!(
                "{MATCH_END}{}{SCORE}{own}:{opponent}",
                outcome.wire_word()
            ),
        }
    }

    /// Parse a datagram text produced by `encode()`.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let unknown = || ProtocolError::UnknownMessage(text.to_string());

        if let Some(map) = text.strip_prefix(MATCH_START) {
            return Ok(ServerMessage::MatchStart {
                map: map.to_string(),
            });
        }
        if let Some(cell) = text.strip_prefix(OPPONENT_PLAYED) {
            return Ok(ServerMessage::OpponentPlayed {
                cell: cell.parse()?,
            });
        }
        if let Some(rest) = text.strip_prefix(MATCH_END) {
            let (word, score) = rest.split_once(SCORE).ok_or_else(unknown)?;
            let outcome = Outcome::from_wire_word(word).ok_or_else(unknown)?;
            let (own, opponent) = score.split_once(':').ok_or_else(unknown)?;
            return Ok(ServerMessage::MatchEnd {
                outcome,
                own: own.parse().map_err(|_| unknown())?,
                opponent: opponent.parse().map_err(|_| unknown())?,
            });
        }
        match text {
            YOUR_TURN => return Ok(ServerMessage::YourTurn),
            YOU_FAILED => return Ok(ServerMessage::YouFailed),
            OPPONENT_FAILED => return Ok(ServerMessage::OpponentFailed),
            _ => {}
        }
        for seat in [1u8, 2] {
            let prefix = format!("{seat:02}{WELCOME_BODY}");
            if let Some(name) = text.strip_prefix(prefix.as_str()) {
                return Ok(ServerMessage::Welcome {
                    seat,
                    name: name.to_string(),
                });
            }
        }
        Err(unknown())
    }

    /// Two-digit code at the start of the datagram.
    pub fn code(&self) -> u8 {
        match self {
            ServerMessage::Welcome { seat, .. } => *seat,
            ServerMessage::MatchStart { .. } => 1,
            ServerMessage::YourTurn => 10,
            ServerMessage::OpponentPlayed { .. } => 20,
            ServerMessage::YouFailed => 21,
            ServerMessage::OpponentFailed => 22,
            ServerMessage::MatchEnd { .. } => 88,
        }
    }
}

/// First datagram of a player: display name, optionally prefixed with
/// `COMPACT_MARKER`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub compact: bool,
}

impl Registration {
    /// Split off the compact marker. A name that is empty once the marker is
    /// removed is rejected.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let (name, compact) = match text.strip_prefix(COMPACT_MARKER) {
            Some(rest) => (rest, true),
            None => (text, false),
        };
        if name.is_empty() {
            return Err(ProtocolError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            compact,
        })
    }

    pub fn encode(&self) -> String {
        if self.compact {
            format!("{COMPACT_MARKER}{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> CellToken {
        s.parse().unwrap()
    }

    #[test]
    fn exact_wire_texts() {
        let cases = [
            (
                ServerMessage::Welcome {
                    seat: 1,
                    name: "Alpha".into(),
                },
                "01-Bonjour Alpha",
            ),
            (
                ServerMessage::Welcome {
                    seat: 2,
                    name: "Beta".into(),
                },
                "02-Bonjour Beta",
            ),
            (
                ServerMessage::MatchStart {
                    map: "Mhj|Fpo".into(),
                },
                "01-la partie va commencer\nMAP=Mhj|Fpo",
            ),
            (ServerMessage::YourTurn, "10-A vous de jouer :"),
            (
                ServerMessage::OpponentPlayed { cell: cell("B:2") },
                "20:coup adversaire:B:2",
            ),
            (ServerMessage::YouFailed, "21:coup joué illégal"),
            (ServerMessage::OpponentFailed, "22:coup adversaire illegal"),
            (
                ServerMessage::MatchEnd {
                    outcome: Outcome::Draw,
                    own: 1,
                    opponent: 1,
                },
                "88-Partie Terminée\nRESULTAT=EGALITE\nSCORE=1:1",
            ),
        ];
        for (msg, text) in cases {
            assert_eq!(msg.encode(), text);
            assert_eq!(ServerMessage::decode(text).unwrap(), msg);
        }
    }

    #[test]
    fn codes() {
        assert_eq!(ServerMessage::YourTurn.code(), 10);
        assert_eq!(
            ServerMessage::MatchEnd {
                outcome: Outcome::Win,
                own: 2,
                opponent: 0
            }
            .code(),
            88
        );
        assert!(ServerMessage::YourTurn.encode().starts_with("10"));

        // The welcome code is the seat number.
        for seat in [1u8, 2] {
            let welcome = ServerMessage::Welcome {
                seat,
                name: "Beta".into(),
            };
            assert_eq!(welcome.code(), seat);
            assert_eq!(format!("{:02}", welcome.code()), &welcome.encode()[..2]);
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        for bad in [
            "",
            "99-nope",
            "03-Bonjour X",
            "20:coup adversaire:zz",
            "88-Partie Terminée\nRESULTAT=MAYBE\nSCORE=1:1",
            "88-Partie Terminée\nRESULTAT=GAGNE",
        ] {
            assert!(ServerMessage::decode(bad).is_err(), "'{bad}' decoded");
        }
    }

    #[test]
    fn welcome_name_may_contain_separators() {
        let msg = ServerMessage::decode("02-Bonjour Team: -Bonjour").unwrap();
        assert_eq!(
            msg,
            ServerMessage::Welcome {
                seat: 2,
                name: "Team: -Bonjour".into()
            }
        );
    }

    #[test]
    fn registration_marker() {
        assert_eq!(
            Registration::parse("#Beta").unwrap(),
            Registration {
                name: "Beta".into(),
                compact: true
            }
        );
        assert_eq!(
            Registration::parse("Alpha").unwrap(),
            Registration {
                name: "Alpha".into(),
                compact: false
            }
        );
        // Only the first marker is stripped.
        assert_eq!(Registration::parse("##x").unwrap().name, "#x");
    }

    #[test]
    fn registration_rejects_empty_name() {
        assert_eq!(Registration::parse("#"), Err(ProtocolError::EmptyName));
        assert_eq!(Registration::parse(""), Err(ProtocolError::EmptyName));
    }

    #[test]
    fn registration_encode() {
        let reg = Registration {
            name: "Beta".into(),
            compact: true,
        };
        assert_eq!(reg.encode(), "#Beta");
        assert_eq!(Registration::parse(&reg.encode()).unwrap(), reg);
    }
}
