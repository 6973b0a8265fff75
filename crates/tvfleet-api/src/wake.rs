// ── Wake-on-LAN ──
//
// Magic packet: 6 × 0xFF followed by the 6-byte hardware address
// repeated 16 times, sent as one UDP broadcast datagram to port 9.

use std::net::{Ipv4Addr, SocketAddrV4};

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::error::Error;
use crate::mac::MacAddress;

/// Discard port conventionally used for magic packets.
pub const WAKE_PORT: u16 = 9;

/// 6 sync bytes plus 16 repetitions of the address.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Build the magic packet for `mac`.
pub fn magic_packet(mac: &MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF_u8; MAGIC_PACKET_LEN];
    let octets = mac.octets();
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&octets);
    }
    packet
}

/// Emits wake packets.
#[async_trait]
pub trait WakeSignaler: Send + Sync {
    /// Parse `mac` and broadcast one magic packet to `broadcast`.
    ///
    /// Returns a human-readable confirmation. Delivery is never confirmed.
    async fn wake(&self, mac: &str, broadcast: Ipv4Addr) -> Result<String, Error>;
}

/// [`WakeSignaler`] over a broadcast-enabled UDP socket.
#[derive(Debug, Clone, Copy)]
pub struct UdpWakeSignaler {
    port: u16,
}

impl Default for UdpWakeSignaler {
    fn default() -> Self {
        Self { port: WAKE_PORT }
    }
}

impl UdpWakeSignaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send to a port other than 9 (test harnesses, relays).
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl WakeSignaler for UdpWakeSignaler {
    async fn wake(&self, mac: &str, broadcast: Ipv4Addr) -> Result<String, Error> {
        let mac: MacAddress = mac.parse()?;
        let packet = magic_packet(&mac);

        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(Error::Wake)?;
        socket.set_broadcast(true).map_err(Error::Wake)?;
        socket
            .send_to(&packet, SocketAddrV4::new(broadcast, self.port))
            .await
            .map_err(Error::Wake)?;

        tracing::debug!(%mac, %broadcast, port = self.port, "wake packet sent");
        Ok(format!("Wake packet sent to {broadcast}"))
    }
}
