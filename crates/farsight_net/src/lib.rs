//! # FARSIGHT Net - Sessions Over TCP
//!
//! Everything between two processes: the provider that owns data and
//! describes a UI, and the display that shows it.
//!
//! ## Architecture
//!
//! - **Protocol**: the two steady-state message sets and their varint layouts
//! - **Transport**: length-prefixed frames, a send lock, a blocking reader thread
//! - **Handshake**: connect header, then content-addressed resource sync
//! - **Provider**: listener, per-display connections, object transactions
//! - **Client**: the display's connection
//! - **Discovery**: UDP probes and answers
//!
//! ## Session Flow
//!
//! ```text
//! DISPLAY                           PROVIDER
//!   |--- ConnectHeader ------------->|
//!   |<-- resource descriptors -------|
//!   |--- requests (changed only) --->|
//!   |<-- resource payloads ----------|
//!   |<== ProviderMessage frames =====|
//!   |=== DisplayMessage frames =====>|
//! ```
//!
//! There is no async runtime. Reader threads queue frames and the owner
//! drains them once per tick.
//!
//! ## Example
//!
//! ```rust,ignore
//! use farsight_net::{Provider, ProviderConfig, ProviderEvent};
//!
//! let provider = Provider::open(ProviderConfig::default())?;
//! provider.add_resource(ResourceId(1), ResourceKind::Layout, layout_bytes);
//! for event in provider.pump() {
//!     if let ProviderEvent::Connected(display) = event {
//!         display.set_view(ResourceId(1))?;
//!     }
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod discovery;
pub mod error;
pub mod handshake;
pub mod protocol;
pub mod provider;
pub mod resources;
pub mod transport;

pub use client::DisplayClient;
pub use discovery::{discover, discover_at, DiscoveredProvider, DiscoveryResponder};
pub use error::{NetError, NetResult};
pub use handshake::{client_handshake, server_handshake, HandshakeOutcome};
pub use protocol::{DisplayMessage, ProviderMessage};
pub use provider::{
    ConnectionId, DisplayInfo, ObjectTransaction, Provider, ProviderConfig, ProviderConnection, ProviderEvent,
};
pub use resources::{content_hash, ResourceCache, ResourceStore, StoredResource};
pub use transport::{read_frame, write_frame, ConnectionState, FrameSender, TransportStats};
