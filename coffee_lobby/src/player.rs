// One registered remote player.
//
// A `PlayerHandle` is created when a registration datagram is accepted and
// lives, unchanged, until the match ends. It pins the player's address: any
// later datagram is attributed to this player only if it comes from the
// same IP and port.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use coffee_map::{RenderMode, Side};
use coffee_protocol::ServerMessage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerHandle {
    side: Side,
    name: String,
    render_mode: RenderMode,
    address: SocketAddr,
}

impl PlayerHandle {
    pub fn new(side: Side, name: String, render_mode: RenderMode, address: SocketAddr) -> Self {
        Self {
            side,
            name,
            render_mode,
            address,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Whether a datagram from `from` was sent by this player.
    pub fn matches(&self, from: SocketAddr) -> bool {
        self.address.ip() == from.ip() && self.address.port() == from.port()
    }

    /// Fire-and-forget send; the caller decides what to do with an error.
    pub fn send(&self, socket: &UdpSocket, message: &ServerMessage) -> io::Result<usize> {
        socket.send_to(message.encode().as_bytes(), self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn matches_same_ip_and_port_only() {
        let p = PlayerHandle::new(
            Side::First,
            "Alpha".into(),
            RenderMode::Verbose,
            addr("127.0.0.1:4000"),
        );
        assert!(p.matches(addr("127.0.0.1:4000")));
        assert!(!p.matches(addr("127.0.0.1:4001")));
        assert!(!p.matches(addr("127.0.0.2:4000")));
    }

    #[test]
    fn send_delivers_encoded_text() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();
        let p = PlayerHandle::new(
            Side::Second,
            "Beta".into(),
            RenderMode::Compact,
            client.local_addr().unwrap(),
        );

        p.send(&server, &ServerMessage::YourTurn).unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = client.recv_from(&mut buf).unwrap();
        assert_eq!(from, server.local_addr().unwrap());
        assert_eq!(&buf[..n], "10-A vous de jouer :".as_bytes());
    }
}
