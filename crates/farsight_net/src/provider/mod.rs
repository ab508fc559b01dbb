//! # Provider Host
//!
//! The side of a session that owns the data and describes the UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        PROVIDER                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
//! │  │ Accept loop  │  │ Per-display  │  │ Discovery    │      │
//! │  │ (TCP)        │──│ reader thread│  │ responder    │      │
//! │  └──────────────┘  └──────────────┘  └──────────────┘      │
//! │                           │                                 │
//! │              ┌────────────▼────────────┐                    │
//! │              │ Event queue, drained by │                    │
//! │              │ the application (pump)  │                    │
//! │              └─────────────────────────┘                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each accepted socket runs the handshake on its own thread, which then
//! stays on as that display's reader. Application code never blocks on the
//! network: it drains [`ProviderEvent`]s and sends through
//! [`ProviderConnection`] handles.

mod connection;

pub use connection::{ConnectionId, DisplayInfo, ObjectTransaction, ProviderConnection};

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use farsight_shared::protocol::DisconnectReason;
use farsight_shared::{EventId, ObjectId, PropertyName, ResourceId, ResourceKind, Value, WidgetName, DEFAULT_PORT};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::discovery::DiscoveryResponder;
use crate::error::{NetError, NetResult};
use crate::handshake::server_handshake;
use crate::protocol::{DisplayMessage, ProviderMessage};
use crate::resources::ResourceStore;
use crate::transport::read_frame;

const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// Provider configuration.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Name announced to discovery probes.
    pub name: String,
    /// TCP address to listen on.
    pub bind: SocketAddr,
    /// Password displays must present, if any.
    pub password: Option<String>,
    /// Answer UDP discovery probes.
    pub discoverable: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "farsight".into(),
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            password: None,
            discoverable: true,
        }
    }
}

/// Something that happened on one of the provider's connections.
#[derive(Clone, Debug)]
pub enum ProviderEvent {
    /// A display finished its handshake.
    Connected(ProviderConnection),
    /// A display went away.
    Disconnected {
        /// Which connection.
        connection: ConnectionId,
        /// Why.
        reason: DisconnectReason,
    },
    /// A widget on the display fired an event.
    Event {
        /// Which connection.
        connection: ConnectionId,
        /// Event id configured on the widget.
        event: EventId,
        /// The widget's `name`.
        widget: WidgetName,
    },
    /// The display changed a bound property.
    PropertyChanged {
        /// Which connection.
        connection: ConnectionId,
        /// Object the property belongs to.
        object: ObjectId,
        /// Property name.
        name: PropertyName,
        /// The new value.
        value: Value,
    },
}

struct Shared {
    config: ProviderConfig,
    resources: RwLock<ResourceStore>,
    connections: Mutex<HashMap<ConnectionId, ProviderConnection>>,
    running: AtomicBool,
    next_id: AtomicU32,
    events: Sender<ProviderEvent>,
}

/// An open provider.
///
/// Dropping it closes the listener and every connection.
pub struct Provider {
    shared: Arc<Shared>,
    local_addr: SocketAddr,
    events: Receiver<ProviderEvent>,
    accept_thread: Option<JoinHandle<()>>,
    responder: Option<DiscoveryResponder>,
}

impl Provider {
    /// Starts listening.
    ///
    /// # Errors
    ///
    /// Fails if the TCP listener cannot be bound or a thread cannot be spawned.
    /// A discovery responder that cannot bind is logged and skipped.
    pub fn open(config: ProviderConfig) -> NetResult<Self> {
        let listener = TcpListener::bind(config.bind)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let responder = if config.discoverable {
            match DiscoveryResponder::spawn(&config.name, local_addr.port()) {
                Ok(responder) => Some(responder),
                Err(e) => {
                    warn!("Provider '{}' not discoverable: {e}", config.name);
                    None
                }
            }
        } else {
            None
        };

        let (tx, rx) = unbounded();
        let shared = Arc::new(Shared {
            config,
            resources: RwLock::new(ResourceStore::new()),
            connections: Mutex::new(HashMap::new()),
            running: AtomicBool::new(true),
            next_id: AtomicU32::new(1),
            events: tx,
        });

        let accept_shared = Arc::clone(&shared);
        let accept_thread = std::thread::Builder::new()
            .name("farsight-accept".into())
            .spawn(move || accept_loop(&listener, &accept_shared))?;

        info!("Provider '{}' listening on {local_addr}", shared.config.name);
        Ok(Self {
            shared,
            local_addr,
            events: rx,
            accept_thread: Some(accept_thread),
            responder,
        })
    }

    /// Address the provider listens on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns whether the provider accepts connections.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Relaxed)
    }

    /// Adds or replaces a resource.
    ///
    /// New displays receive it during their handshake. Displays that are
    /// already connected receive it as `uploadResource`.
    pub fn add_resource(&self, id: ResourceId, kind: ResourceKind, data: Vec<u8>) {
        let message = ProviderMessage::UploadResource {
            id,
            kind,
            data: data.clone(),
        };
        // Held until the broadcast is done so registration cannot slip in between.
        let mut store = self.shared.resources.write();
        store.insert(id, kind, data);
        for connection in self.connections() {
            if let Err(e) = connection.send(&message) {
                warn!("Resource {id} not pushed to {}: {e}", connection.id());
            }
        }
    }

    /// Removes a resource from future handshakes.
    pub fn remove_resource(&self, id: ResourceId) -> bool {
        self.shared.resources.write().remove(id).is_some()
    }

    /// Snapshot of the live connections.
    #[must_use]
    pub fn connections(&self) -> Vec<ProviderConnection> {
        let mut list: Vec<_> = self.shared.connections.lock().values().cloned().collect();
        list.sort_by_key(ProviderConnection::id);
        list
    }

    /// Looks up a live connection.
    #[must_use]
    pub fn connection(&self, id: ConnectionId) -> Option<ProviderConnection> {
        self.shared.connections.lock().get(&id).cloned()
    }

    /// Drains every pending event without blocking.
    pub fn pump(&self) -> Vec<ProviderEvent> {
        self.events.try_iter().collect()
    }

    /// Waits up to `timeout` for the next event.
    #[must_use]
    pub fn next_event(&self, timeout: Duration) -> Option<ProviderEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stops accepting and disconnects every display.
    pub fn close(&mut self) {
        if !self.shared.running.swap(false, Ordering::Relaxed) {
            return;
        }
        if let Some(thread) = self.accept_thread.take() {
            let _ = thread.join();
        }
        if let Some(mut responder) = self.responder.take() {
            responder.stop();
        }
        for connection in self.connections() {
            connection.disconnect();
        }
        info!("Provider '{}' closed", self.shared.config.name);
    }
}

impl Drop for Provider {
    fn drop(&mut self) {
        self.close();
    }
}

fn accept_loop(listener: &TcpListener, shared: &Arc<Shared>) {
    while shared.running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let id = ConnectionId(shared.next_id.fetch_add(1, Ordering::Relaxed));
                let conn_shared = Arc::clone(shared);
                let spawned = std::thread::Builder::new()
                    .name(format!("farsight-conn-{}", id.0))
                    .spawn(move || serve_connection(id, stream, addr, &conn_shared));
                if let Err(e) = spawned {
                    error!("Cannot spawn connection thread for {addr}: {e}");
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => std::thread::sleep(ACCEPT_POLL),
            Err(e) => {
                error!("Accept failed: {e}");
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
    debug!("Accept loop stopped");
}

fn serve_connection(id: ConnectionId, mut stream: TcpStream, addr: SocketAddr, shared: &Shared) {
    let snapshot = shared.resources.read().clone();
    let handshake = stream
        .set_nonblocking(false)
        .map_err(NetError::from)
        .and_then(|()| server_handshake(&mut stream, &snapshot, shared.config.password.as_deref()));
    let header = match handshake {
        Ok(header) => header,
        Err(e) => {
            warn!("Handshake with {addr} failed: {e}");
            return;
        }
    };

    let reader = match stream.try_clone() {
        Ok(reader) => reader,
        Err(e) => {
            error!("Cannot clone socket for {addr}: {e}");
            return;
        }
    };
    let connection = match ProviderConnection::new(id, addr, (&header).into(), stream) {
        Ok(connection) => connection,
        Err(e) => {
            error!("Cannot set up connection {id}: {e}");
            return;
        }
    };

    info!("Display '{}' connected from {addr} as {id}", connection.info().name);
    register(shared, &connection, &snapshot);
    let _ = shared.events.send(ProviderEvent::Connected(connection.clone()));

    let reason = read_loop(id, reader, shared);
    connection.disconnect();
    shared.connections.lock().remove(&id);
    info!("Display {id} disconnected: {reason:?}");
    let _ = shared.events.send(ProviderEvent::Disconnected {
        connection: id,
        reason,
    });
}

/// Makes `connection` visible to resource broadcasts.
///
/// Resources added or replaced after `snapshot` was taken for the handshake
/// are pushed first, under the same lock [`Provider::add_resource`] holds
/// while broadcasting.
fn register(shared: &Shared, connection: &ProviderConnection, snapshot: &ResourceStore) {
    let store = shared.resources.read();
    for (id, resource) in store.changed_since(snapshot) {
        debug!("Catching {} up on resource {id}", connection.id());
        let message = ProviderMessage::UploadResource {
            id,
            kind: resource.kind,
            data: resource.data.clone(),
        };
        if let Err(e) = connection.send(&message) {
            warn!("Resource {id} not pushed to {}: {e}", connection.id());
        }
    }
    shared.connections.lock().insert(connection.id(), connection.clone());
}

fn read_loop(id: ConnectionId, mut reader: TcpStream, shared: &Shared) -> DisconnectReason {
    loop {
        let frame = match read_frame(&mut reader) {
            Ok(Some(frame)) => frame,
            Ok(None) if shared.running.load(Ordering::Relaxed) => return DisconnectReason::Quit,
            Ok(None) => return DisconnectReason::Shutdown,
            Err(NetError::FrameTooLarge(len)) => {
                warn!("Display {id} sent a {len} byte frame");
                return DisconnectReason::InvalidData;
            }
            Err(e) => {
                if shared.running.load(Ordering::Relaxed) {
                    warn!("Display {id} read failed: {e}");
                    return DisconnectReason::NetworkError;
                }
                return DisconnectReason::Shutdown;
            }
        };

        let event = match DisplayMessage::decode(&frame) {
            Ok(DisplayMessage::EventCallback { event, widget }) => ProviderEvent::Event {
                connection: id,
                event,
                widget,
            },
            Ok(DisplayMessage::PropertyChanged { object, name, value }) => ProviderEvent::PropertyChanged {
                connection: id,
                object,
                name,
                value,
            },
            Ok(DisplayMessage::Unknown(tag)) => {
                warn!("Display {id} sent unknown message tag {tag}");
                continue;
            }
            Err(e) => {
                error!("Display {id} sent an undecodable frame: {e}");
                return DisconnectReason::InvalidData;
            }
        };
        if shared.events.send(event).is_err() {
            return DisconnectReason::Shutdown;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::client_handshake;
    use crate::resources::ResourceCache;
    use crate::transport::{read_frame, write_frame};
    use farsight_shared::protocol::ConnectHeader;
    use std::sync::Barrier;

    fn local_config() -> ProviderConfig {
        ProviderConfig {
            name: "test".into(),
            bind: "127.0.0.1:0".parse().unwrap(),
            password: None,
            discoverable: false,
        }
    }

    fn connect(provider: &Provider) -> (TcpStream, ProviderConnection) {
        let mut stream = TcpStream::connect(provider.local_addr()).unwrap();
        let header = ConnectHeader::new("display", "", 0, 640, 480);
        client_handshake(&mut stream, &header, &mut ResourceCache::new()).unwrap();
        match provider.next_event(Duration::from_secs(5)) {
            Some(ProviderEvent::Connected(connection)) => (stream, connection),
            other => panic!("expected Connected, got {other:?}"),
        }
    }

    #[test]
    fn test_provider_config_default() {
        let config = ProviderConfig::default();
        assert_eq!(config.bind.port(), DEFAULT_PORT);
        assert!(config.discoverable);
    }

    #[test]
    fn test_events_flow_from_display() {
        let provider = Provider::open(local_config()).unwrap();
        let (mut stream, connection) = connect(&provider);
        assert_eq!(connection.info().name, "display");
        assert_eq!(provider.connections().len(), 1);

        let msg = DisplayMessage::EventCallback {
            event: EventId(5),
            widget: WidgetName(2),
        };
        write_frame(&mut stream, &msg.encode()).unwrap();
        match provider.next_event(Duration::from_secs(5)) {
            Some(ProviderEvent::Event { event, widget, .. }) => {
                assert_eq!(event, EventId(5));
                assert_eq!(widget, WidgetName(2));
            }
            other => panic!("expected Event, got {other:?}"),
        }

        drop(stream);
        match provider.next_event(Duration::from_secs(5)) {
            Some(ProviderEvent::Disconnected { reason, .. }) => assert_eq!(reason, DisconnectReason::Quit),
            other => panic!("expected Disconnected, got {other:?}"),
        }
        assert!(provider.connections().is_empty());
    }

    #[test]
    fn test_transaction_commit_sends_object() {
        let provider = Provider::open(local_config()).unwrap();
        let (mut stream, connection) = connect(&provider);

        let mut tx = connection.begin_object(ObjectId(9));
        tx.set(PropertyName(1), "hello").unwrap();
        tx.set(PropertyName(2), 3).unwrap();
        assert!(tx.set(PropertyName(2), true).is_err());
        tx.commit().unwrap();

        connection.begin_object(ObjectId(10)).cancel();

        let frame = read_frame(&mut stream).unwrap().unwrap();
        match ProviderMessage::decode(&frame).unwrap() {
            ProviderMessage::AddOrUpdateObject(object) => {
                assert_eq!(object.id(), ObjectId(9));
                assert_eq!(object.get(PropertyName(1)).unwrap().value, Value::from("hello"));
                assert_eq!(object.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_add_resource_pushes_to_live_displays() {
        let provider = Provider::open(local_config()).unwrap();
        let (mut stream, _connection) = connect(&provider);

        provider.add_resource(ResourceId(3), ResourceKind::Layout, vec![2, 0, 0]);
        let frame = read_frame(&mut stream).unwrap().unwrap();
        assert_eq!(
            ProviderMessage::decode(&frame).unwrap(),
            ProviderMessage::UploadResource {
                id: ResourceId(3),
                kind: ResourceKind::Layout,
                data: vec![2, 0, 0],
            }
        );
        assert!(provider.remove_resource(ResourceId(3)));
        assert!(!provider.remove_resource(ResourceId(3)));
    }

    #[test]
    fn test_resource_added_during_handshake_reaches_display() {
        let provider = Provider::open(local_config()).unwrap();
        provider.add_resource(ResourceId(1), ResourceKind::Layout, vec![2, 0, 0]);
        let snapshot = provider.shared.resources.read().clone();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut display = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (socket, addr) = listener.accept().unwrap();
        let header = ConnectHeader::new("display", "", 0, 640, 480);
        let connection = ProviderConnection::new(ConnectionId(99), addr, (&header).into(), socket).unwrap();

        // Registration and the broadcast race; either order delivers exactly once.
        let barrier = Arc::new(Barrier::new(2));
        let registering = {
            let shared = Arc::clone(&provider.shared);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                register(&shared, &connection, &snapshot);
            })
        };
        barrier.wait();
        provider.add_resource(ResourceId(7), ResourceKind::Drawing, vec![7; 4]);
        registering.join().unwrap();

        let frame = read_frame(&mut display).unwrap().unwrap();
        assert_eq!(
            ProviderMessage::decode(&frame).unwrap(),
            ProviderMessage::UploadResource {
                id: ResourceId(7),
                kind: ResourceKind::Drawing,
                data: vec![7; 4],
            }
        );
        assert_eq!(provider.connections().len(), 1);

        display.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
        assert!(read_frame(&mut display).is_err());
    }

    #[test]
    fn test_close_disconnects_displays() {
        let mut provider = Provider::open(local_config()).unwrap();
        let (mut stream, _connection) = connect(&provider);
        provider.close();
        assert!(!provider.is_running());
        assert!(read_frame(&mut stream).unwrap_or(None).is_none());
    }
}
