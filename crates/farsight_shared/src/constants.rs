//! Protocol constants shared by provider and display.

use std::net::Ipv4Addr;

/// Default TCP port of a provider, also the discovery port.
pub const DEFAULT_PORT: u16 = 1309;

/// Multicast group discovery probes are sent to.
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 1);

/// Magic bytes opening a TCP connect header.
pub const CONNECT_MAGIC: [u8; 4] = [0x21, 0x06, 0xc1, 0x62];

/// Magic bytes opening every discovery datagram.
pub const DISCOVERY_MAGIC: [u8; 4] = [0x73, 0xe6, 0x37, 0x28];

/// Handshake protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

/// Largest steady-state frame either side accepts (5 MiB).
pub const MAX_FRAME_SIZE: usize = 5 * 1024 * 1024;

/// Length of the NUL-padded name field in the connect header.
pub const CLIENT_NAME_LEN: usize = 32;

/// Length of the NUL-padded password field in the connect header.
pub const PASSWORD_LEN: usize = 32;

/// Length of the NUL-padded name field in discovery responses.
pub const DISCOVERY_NAME_LEN: usize = 64;

/// Height of the tab header band.
pub const TAB_HEADER_HEIGHT: i32 = 32;

/// Longest varint that still fits a `u32`.
pub const MAX_VARINT_LEN: usize = 5;
