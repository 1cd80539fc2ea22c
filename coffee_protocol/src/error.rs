// Protocol-level parse failures. The lobby never answers these: a datagram
// that fails to parse is dropped.

use crate::framing::MAX_DATAGRAM_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty datagram")]
    Empty,

    #[error("datagram of {0} bytes exceeds the {max} byte limit", max = MAX_DATAGRAM_SIZE)]
    TooLarge(usize),

    #[error("datagram is not valid UTF-8")]
    NotUtf8,

    #[error("display name is empty")]
    EmptyName,

    #[error("invalid cell token '{0}'")]
    BadCellToken(String),

    #[error("unrecognized server message '{0}'")]
    UnknownMessage(String),
}
