//! # Display Client
//!
//! The display's end of a session.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      DISPLAY CLIENT                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐        ┌──────────────┐                   │
//! │  │ Reader thread│ ─────> │ Frame queue  │ ─> drained by the │
//! │  │ (blocking)   │        │ (crossbeam)  │    display tick   │
//! │  └──────────────┘        └──────────────┘                   │
//! │  ┌──────────────┐                                           │
//! │  │ FrameSender  │ <───── event callbacks, property changes  │
//! │  │ (one lock)   │                                           │
//! │  └──────────────┘                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::{Shutdown, SocketAddr, TcpStream};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, TryRecvError};
use farsight_shared::protocol::ConnectHeader;
use tracing::info;

use crate::error::{NetError, NetResult};
use crate::handshake::{client_handshake, HandshakeOutcome};
use crate::protocol::DisplayMessage;
use crate::resources::ResourceCache;
use crate::transport::{spawn_reader, ConnectionState, FrameSender, Inbound, TransportStats};

/// A connected display.
pub struct DisplayClient {
    peer: SocketAddr,
    state: ConnectionState,
    stream: TcpStream,
    sender: FrameSender<TcpStream>,
    inbound: Receiver<Inbound>,
    reader: Option<JoinHandle<()>>,
}

impl DisplayClient {
    /// Connects, runs the handshake and starts the reader thread.
    ///
    /// Resources the provider sends are stored in `cache`; resources whose
    /// hash already matches the cache are not transferred again.
    ///
    /// # Errors
    ///
    /// Fails on connect or handshake errors.
    pub fn connect(
        addr: SocketAddr,
        header: &ConnectHeader,
        cache: &mut ResourceCache,
    ) -> NetResult<(Self, HandshakeOutcome)> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let outcome = client_handshake(&mut stream, header, cache)?;
        info!(
            "Connected to {addr}: {} resources announced, {} transferred",
            outcome.announced.len(),
            outcome.requested.len()
        );
        let client = Self::from_stream(stream)?;
        Ok((client, outcome))
    }

    /// Wraps a stream whose handshake is already done.
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot be cloned or the reader thread cannot start.
    pub fn from_stream(stream: TcpStream) -> NetResult<Self> {
        let peer = stream.peer_addr()?;
        let sender = FrameSender::new(stream.try_clone()?);
        let (inbound, reader) = spawn_reader(format!("farsight-reader-{peer}"), stream.try_clone()?)?;
        Ok(Self {
            peer,
            state: ConnectionState::Active,
            stream,
            sender,
            inbound,
            reader: Some(reader),
        })
    }

    /// The provider's address.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Takes the next queued frame without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Closed`] once the stream has ended and the queue is
    /// empty. A reader failure is reported as an I/O error once.
    pub fn try_recv(&mut self) -> NetResult<Option<Vec<u8>>> {
        if self.state == ConnectionState::Closed {
            return Err(NetError::Closed);
        }
        match self.inbound.try_recv() {
            Ok(Inbound::Frame(frame)) => Ok(Some(frame)),
            Ok(Inbound::Closed(None)) | Err(TryRecvError::Disconnected) => {
                self.state = ConnectionState::Closed;
                Err(NetError::Closed)
            }
            Ok(Inbound::Closed(Some(reason))) => {
                self.state = ConnectionState::Closed;
                Err(NetError::Io(std::io::Error::other(reason)))
            }
            Err(TryRecvError::Empty) => Ok(None),
        }
    }

    /// Returns a handle that sends on this connection.
    #[must_use]
    pub fn sender(&self) -> FrameSender<TcpStream> {
        self.sender.clone()
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Fails if the connection is closed or the write fails.
    pub fn send(&self, message: &DisplayMessage) -> NetResult<()> {
        self.sender.send(&message.encode())
    }

    /// Send statistics.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.sender.stats()
    }

    /// Closes the socket and waits for the reader thread.
    pub fn shutdown(&mut self) {
        self.sender.close();
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        self.state = ConnectionState::Closed;
    }
}

impl Drop for DisplayClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
