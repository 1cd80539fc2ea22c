// Datagram framing.
//
// UDP already delimits messages, so framing is only about turning received
// bytes into text: reject empty, oversized and non-UTF-8 payloads, and strip
// the trailing line ending that line-oriented clients (netcat, telnet-style
// bots) append.

use crate::error::ProtocolError;

/// Largest payload a single UDP datagram over IPv4 can carry. Also the size
/// of the receive buffers on both ends.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Extract the text of a datagram, without its trailing `\r`/`\n`.
pub fn datagram_text(bytes: &[u8]) -> Result<&str, ProtocolError> {
    if bytes.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::TooLarge(bytes.len()));
    }
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::NotUtf8)?;
    Ok(text.trim_end_matches(['\r', '\n']))
}
