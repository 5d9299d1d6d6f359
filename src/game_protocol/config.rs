use std::net::{Ipv4Addr, SocketAddr};
use crate::enums::Framing;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// Where to listen or connect, and how messages are framed on the stream.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ProtocolConfig {
    pub address: SocketAddr,
    pub framing: Framing,
}

impl ProtocolConfig {
    pub fn new(address: SocketAddr, framing: Framing) -> Self {
        Self { address, framing }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            framing: Framing::Legacy,
        }
    }
}
