//! # Session Protocol
//!
//! Steady-state messages exchanged after the handshake.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Length (4 bytes, little-endian, excludes itself)             │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Tag (1) │ Payload (varints, strings, typed values)           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Framing lives in [`crate::transport`]; this module only maps a frame
//! body to a message and back.

mod messages;

pub use messages::{DisplayMessage, ProviderMessage};
