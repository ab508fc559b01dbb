//! Protocol tags and fixed-layout handshake structs.
//!
//! Steady-state messages are varint-encoded and live in `farsight_net`.
//! The handshake and discovery datagrams are packed structs copied straight
//! to and from the socket.

use crate::constants::{
    CLIENT_NAME_LEN, CONNECT_MAGIC, DISCOVERY_MAGIC, DISCOVERY_NAME_LEN, PASSWORD_LEN, PROTOCOL_VERSION,
};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Message tags sent from the provider to the display.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderMessageType {
    /// Upload or replace a resource.
    UploadResource = 1,
    /// Insert or fully replace an object.
    AddOrUpdateObject = 2,
    /// Remove an object.
    RemoveObject = 3,
    /// Select the layout resource shown as the view.
    SetView = 4,
    /// Select the root binding object.
    SetRoot = 5,
    /// Set one property of an object.
    SetProperty = 6,
    /// Empty an object-list property.
    Clear = 7,
    /// Insert references into an object-list property.
    InsertRange = 8,
    /// Remove references from an object-list property.
    RemoveRange = 9,
    /// Move references inside an object-list property.
    MoveRange = 10,
}

impl ProviderMessageType {
    /// Decodes a message tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::UploadResource,
            2 => Self::AddOrUpdateObject,
            3 => Self::RemoveObject,
            4 => Self::SetView,
            5 => Self::SetRoot,
            6 => Self::SetProperty,
            7 => Self::Clear,
            8 => Self::InsertRange,
            9 => Self::RemoveRange,
            10 => Self::MoveRange,
            _ => return None,
        })
    }
}

/// Message tags sent from the display to the provider.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMessageType {
    /// A widget fired a callback.
    EventCallback = 1,
    /// A bound widget changed an object property.
    PropertyChanged = 2,
}

impl DisplayMessageType {
    /// Decodes a message tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::EventCallback),
            2 => Some(Self::PropertyChanged),
            _ => None,
        }
    }
}

/// Kind of an uploaded resource.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Compiled widget tree.
    Layout = 0,
    /// Encoded image.
    Bitmap = 1,
    /// Vector drawing.
    Drawing = 2,
}

impl ResourceKind {
    /// Decodes a resource kind.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Layout),
            1 => Some(Self::Bitmap),
            2 => Some(Self::Drawing),
            _ => None,
        }
    }
}

/// Display capability bits announced in the connect header.
pub mod capabilities {
    /// Has a mouse.
    pub const MOUSE: u32 = 1;
    /// Has a keyboard.
    pub const KEYBOARD: u32 = 2;
    /// Has a touch screen.
    pub const TOUCH: u32 = 4;
    /// High pixel density.
    pub const HIGHDPI: u32 = 8;
    /// Can be rotated.
    pub const TILTABLE: u32 = 16;
    /// Can be resized.
    pub const RESIZABLE: u32 = 32;
    /// Requests accessibility support.
    pub const REQ_ACCESSIBILITY: u32 = 64;

    /// Maps a capability name (as used in config files) to its bit.
    #[must_use]
    pub fn from_name(name: &str) -> Option<u32> {
        Some(match name {
            "mouse" => MOUSE,
            "keyboard" => KEYBOARD,
            "touch" => TOUCH,
            "highdpi" => HIGHDPI,
            "tiltable" => TILTABLE,
            "resizable" => RESIZABLE,
            "accessibility" => REQ_ACCESSIBILITY,
            _ => return None,
        })
    }
}

/// Why a connection ended.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// The display quit.
    Quit = 0,
    /// The provider shut down.
    Shutdown = 1,
    /// The peer stopped responding.
    Timeout = 2,
    /// The socket failed.
    NetworkError = 3,
    /// The peer sent undecodable data.
    InvalidData = 4,
    /// The handshake did not match.
    ProtocolMismatch = 5,
}

fn pack_name<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [0u8; N];
    // keep one NUL so the field always terminates; never split a character
    let mut len = text.len().min(N - 1);
    while !text.is_char_boundary(len) {
        len -= 1;
    }
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    out
}

fn unpack_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// First packet on a TCP connection, sent by the display.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ConnectHeader {
    /// Must equal [`CONNECT_MAGIC`].
    pub magic: [u8; 4],
    /// Must equal [`PROTOCOL_VERSION`].
    pub protocol_version: u16,
    /// NUL-padded display name.
    pub name: [u8; CLIENT_NAME_LEN],
    /// NUL-padded password.
    pub password: [u8; PASSWORD_LEN],
    /// Capability bits.
    pub capabilities: u32,
    /// Screen width in pixels.
    pub screen_width: u16,
    /// Screen height in pixels.
    pub screen_height: u16,
}

impl ConnectHeader {
    /// Builds a header for the current protocol version.
    #[must_use]
    pub fn new(name: &str, password: &str, capabilities: u32, screen_width: u16, screen_height: u16) -> Self {
        Self {
            magic: CONNECT_MAGIC,
            protocol_version: PROTOCOL_VERSION,
            name: pack_name(name),
            password: pack_name(password),
            capabilities,
            screen_width,
            screen_height,
        }
    }

    /// The display name up to its first NUL.
    #[must_use]
    pub fn name(&self) -> String {
        let name = self.name;
        unpack_name(&name)
    }

    /// The password up to its first NUL.
    #[must_use]
    pub fn password(&self) -> String {
        let password = self.password;
        unpack_name(&password)
    }
}

/// Provider reply to a connect header.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ConnectResponse {
    /// 1 on success, 0 on rejection.
    pub success: u32,
    /// Number of resource descriptors that follow.
    pub resource_count: u32,
}

/// Announces one resource during the handshake.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ResourceDescriptor {
    /// Resource id.
    pub id: u32,
    /// [`ResourceKind`] code.
    pub kind: u32,
    /// Payload length in bytes.
    pub size: u32,
    /// Content hash of the payload.
    pub hash: [u8; 8],
}

/// Number of resource requests that follow.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ResourceRequestHeader {
    /// Request count.
    pub request_count: u32,
}

/// Requests one resource by id.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ResourceRequest {
    /// Resource id.
    pub id: u32,
}

/// Precedes the payload of a requested resource.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ResourceHeader {
    /// Resource id.
    pub id: u32,
    /// Payload length in bytes.
    pub size: u32,
}

/// Discovery datagram type.
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryType {
    /// Probe for providers.
    Discover = 0,
    /// A provider answering a probe.
    RespondDiscover = 1,
}

/// Header of every discovery datagram.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DiscoveryHeader {
    /// Must equal [`DISCOVERY_MAGIC`].
    pub magic: [u8; 4],
    /// [`DiscoveryType`] code.
    pub message_type: u16,
}

impl DiscoveryHeader {
    /// Builds a header of the given type.
    #[must_use]
    pub const fn new(message_type: DiscoveryType) -> Self {
        Self {
            magic: DISCOVERY_MAGIC,
            message_type: message_type as u16,
        }
    }

    /// Returns the decoded type, or `None` for foreign datagrams.
    #[must_use]
    pub fn kind(&self) -> Option<DiscoveryType> {
        if self.magic != DISCOVERY_MAGIC {
            return None;
        }
        match self.message_type {
            0 => Some(DiscoveryType::Discover),
            1 => Some(DiscoveryType::RespondDiscover),
            _ => None,
        }
    }
}

/// A provider's answer to a discovery probe.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DiscoveryResponse {
    /// Header with [`DiscoveryType::RespondDiscover`].
    pub header: DiscoveryHeader,
    /// TCP port the provider listens on.
    pub tcp_port: u16,
    /// Length of the name.
    pub length: u16,
    /// NUL-padded provider name.
    pub name: [u8; DISCOVERY_NAME_LEN],
}

impl DiscoveryResponse {
    /// Builds a response announcing `name` on `tcp_port`.
    #[must_use]
    pub fn new(name: &str, tcp_port: u16) -> Self {
        let packed: [u8; DISCOVERY_NAME_LEN] = pack_name(name);
        let length = packed.iter().position(|&b| b == 0).unwrap_or(DISCOVERY_NAME_LEN) as u16;
        Self {
            header: DiscoveryHeader::new(DiscoveryType::RespondDiscover),
            tcp_port,
            length,
            name: packed,
        }
    }

    /// The provider name.
    #[must_use]
    pub fn name(&self) -> String {
        let name = self.name;
        let len = usize::from(self.length).min(DISCOVERY_NAME_LEN);
        unpack_name(&name[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_header_size() {
        // Ensure fixed size for network protocol
        assert_eq!(std::mem::size_of::<ConnectHeader>(), 78);
    }

    #[test]
    fn test_handshake_struct_sizes() {
        assert_eq!(std::mem::size_of::<ConnectResponse>(), 8);
        assert_eq!(std::mem::size_of::<ResourceDescriptor>(), 20);
        assert_eq!(std::mem::size_of::<ResourceHeader>(), 8);
        assert_eq!(std::mem::size_of::<DiscoveryHeader>(), 6);
        assert_eq!(std::mem::size_of::<DiscoveryResponse>(), 74);
    }

    #[test]
    fn test_name_padding() {
        let header = ConnectHeader::new("Test Client", "secret", capabilities::MOUSE, 640, 480);
        assert_eq!(header.name(), "Test Client");
        assert_eq!(header.password(), "secret");

        let long = "x".repeat(100);
        let header = ConnectHeader::new(&long, "", 0, 0, 0);
        assert_eq!(header.name().len(), CLIENT_NAME_LEN - 1);
    }

    #[test]
    fn test_name_truncated_at_char_boundary() {
        // The two-byte 'é' straddles the last usable byte.
        let prefix = "a".repeat(CLIENT_NAME_LEN - 2);
        let header = ConnectHeader::new(&format!("{prefix}é"), "", 0, 0, 0);
        assert_eq!(header.name(), prefix);

        let response = DiscoveryResponse::new(&"ü".repeat(DISCOVERY_NAME_LEN), 1309);
        let name = response.name();
        assert!(!name.contains('\u{FFFD}'));
        assert!(name.len() < DISCOVERY_NAME_LEN);
        assert!(name.chars().all(|c| c == 'ü'));
    }

    #[test]
    fn test_discovery_response() {
        let response = DiscoveryResponse::new("Calculator", 1309);
        let bytes = bytemuck::bytes_of(&response);
        let decoded: DiscoveryResponse = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(decoded.header.kind(), Some(DiscoveryType::RespondDiscover));
        assert_eq!(decoded.name(), "Calculator");
        let port = decoded.tcp_port;
        assert_eq!(port, 1309);
    }

    #[test]
    fn test_message_tags() {
        assert_eq!(ProviderMessageType::from_u8(10), Some(ProviderMessageType::MoveRange));
        assert!(ProviderMessageType::from_u8(0).is_none());
        assert_eq!(DisplayMessageType::from_u8(2), Some(DisplayMessageType::PropertyChanged));
    }
}
