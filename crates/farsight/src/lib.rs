//! # FARSIGHT
//!
//! The display side of the remote-UI protocol, integrating all crates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           FARSIGHT DISPLAY                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │ farsight_net    │     │ Session         │     │ farsight_ui     │   │
//! │  │                 │────>│                 │────>│                 │   │
//! │  │  • Handshake    │     │  • Objects      │     │  • Widget tree  │   │
//! │  │  • Framing      │<────│  • Resources    │<────│  • Layout       │   │
//! │  │  • Reader thread│     │  • Outbox       │     │  • Paint/Input  │   │
//! │  └─────────────────┘     └────────┬────────┘     └─────────────────┘   │
//! │                                   │                                     │
//! │                          ┌────────┴────────┐                            │
//! │                          │ DisplayLoop     │                            │
//! │                          │ receive, layout │                            │
//! │                          │ paint, send     │                            │
//! │                          └─────────────────┘                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML display configuration
//! - `display_loop`: Tick orchestration and timing
//! - `session`: Provider message dispatch and widget context

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod display_loop;
pub mod session;

pub use farsight_net as net;
pub use farsight_shared as shared;
pub use farsight_ui as ui;

pub use config::DisplayConfig;
pub use display_loop::{DisplayLoop, DisplayLoopConfig, TickStats, TickStatsAccumulator};
pub use session::Session;
