//! X-Plane discovery beacon.
//!
//! A running simulator announces itself with `BECN` datagrams on the
//! 239.255.1.1:49707 multicast group. Discovery listens on that group
//! until a master-role beacon arrives or the bounded wait expires.

use crate::error::SimulatorError;
use crate::protocol::parse_beacon;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info};

const BEACON_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 1, 1);
const BEACON_PORT: u16 = 49707;

/// Wait for a simulator beacon and return the simulator's UDP address.
pub async fn discover(wait: Duration) -> Result<SocketAddr, SimulatorError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, BEACON_PORT)).await?;
    socket.join_multicast_v4(BEACON_GROUP, Ipv4Addr::UNSPECIFIED)?;
    info!(group = %BEACON_GROUP, port = BEACON_PORT, "listening for X-Plane beacon");

    let mut buf = [0u8; 256];
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return Err(SimulatorError::BeaconTimeout {
                seconds: wait.as_secs(),
            });
        }
        let (len, sender) = match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SimulatorError::BeaconTimeout {
                    seconds: wait.as_secs(),
                });
            }
        };
        match parse_beacon(buf.get(..len).unwrap_or(&buf)) {
            Ok(beacon) => {
                info!(
                    computer = %beacon.computer_name,
                    version = beacon.version_number,
                    port = beacon.port,
                    "found X-Plane beacon"
                );
                return Ok(SocketAddr::new(sender.ip(), beacon.port));
            }
            Err(err) => {
                debug!(error = %err, "ignoring non-beacon datagram on beacon port");
            }
        }
    }
}
