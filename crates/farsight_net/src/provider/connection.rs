//! # Display Connection Handle
//!
//! One accepted display, as seen from the provider.
//!
//! ## Design
//!
//! - Cheap to clone: all clones share the socket and its send lock
//! - Every helper encodes one [`ProviderMessage`] and sends it as one frame
//! - Objects are built through [`ObjectTransaction`] and sent on commit

use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;

use farsight_shared::protocol::ConnectHeader;
use farsight_shared::{
    FarsightResult, Object, ObjectId, PropertyName, ResourceId, ResourceKind, Value,
};
use tracing::debug;

use crate::error::NetResult;
use crate::protocol::ProviderMessage;
use crate::transport::FrameSender;

/// Unique identifier for a display connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    /// Invalid/null connection ID.
    pub const NULL: Self = Self(u32::MAX);

    /// Returns true if this is a null/invalid ID.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the display said about itself in its connect header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Display name.
    pub name: String,
    /// Capability bits.
    pub capabilities: u32,
    /// Screen width in pixels.
    pub screen_width: u16,
    /// Screen height in pixels.
    pub screen_height: u16,
}

impl From<&ConnectHeader> for DisplayInfo {
    fn from(header: &ConnectHeader) -> Self {
        Self {
            name: header.name(),
            capabilities: header.capabilities,
            screen_width: header.screen_width,
            screen_height: header.screen_height,
        }
    }
}

/// Handle to a connected display.
#[derive(Clone)]
pub struct ProviderConnection {
    id: ConnectionId,
    addr: SocketAddr,
    info: Arc<DisplayInfo>,
    stream: Arc<TcpStream>,
    sender: FrameSender<TcpStream>,
}

impl std::fmt::Debug for ProviderConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConnection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("name", &self.info.name)
            .finish_non_exhaustive()
    }
}

impl ProviderConnection {
    pub(crate) fn new(id: ConnectionId, addr: SocketAddr, info: DisplayInfo, stream: TcpStream) -> std::io::Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self {
            id,
            addr,
            info: Arc::new(info),
            stream: Arc::new(stream),
            sender: FrameSender::new(writer),
        })
    }

    /// Connection id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// What the display reported at connect time.
    #[must_use]
    pub fn info(&self) -> &DisplayInfo {
        &self.info
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Fails if the connection is closed or the write fails.
    pub fn send(&self, message: &ProviderMessage) -> NetResult<()> {
        debug!("-> {} {:?}", self.id, message.message_type());
        self.sender.send(&message.encode())
    }

    /// Uploads or replaces a resource on this display only.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn upload_resource(&self, id: ResourceId, kind: ResourceKind, data: &[u8]) -> NetResult<()> {
        self.send(&ProviderMessage::UploadResource {
            id,
            kind,
            data: data.to_vec(),
        })
    }

    /// Inserts or fully replaces an object.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn add_or_update_object(&self, object: &Object) -> NetResult<()> {
        self.send(&ProviderMessage::AddOrUpdateObject(object.clone()))
    }

    /// Removes an object.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn remove_object(&self, id: ObjectId) -> NetResult<()> {
        self.send(&ProviderMessage::RemoveObject(id))
    }

    /// Shows a layout resource.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn set_view(&self, layout: ResourceId) -> NetResult<()> {
        self.send(&ProviderMessage::SetView(layout))
    }

    /// Selects the root binding object.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn set_root(&self, object: ObjectId) -> NetResult<()> {
        self.send(&ProviderMessage::SetRoot(object))
    }

    /// Sets one property on the display's copy of an object.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn set_property(&self, object: ObjectId, name: PropertyName, value: Value) -> NetResult<()> {
        self.send(&ProviderMessage::SetProperty { object, name, value })
    }

    /// Empties an object-list property.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn clear(&self, object: ObjectId, name: PropertyName) -> NetResult<()> {
        self.send(&ProviderMessage::Clear { object, name })
    }

    /// Inserts references into an object-list property.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn insert_range(&self, object: ObjectId, name: PropertyName, index: u32, items: &[ObjectId]) -> NetResult<()> {
        self.send(&ProviderMessage::InsertRange {
            object,
            name,
            index,
            items: items.to_vec(),
        })
    }

    /// Removes references from an object-list property.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn remove_range(&self, object: ObjectId, name: PropertyName, index: u32, count: u32) -> NetResult<()> {
        self.send(&ProviderMessage::RemoveRange {
            object,
            name,
            index,
            count,
        })
    }

    /// Moves references inside an object-list property.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn move_range(&self, object: ObjectId, name: PropertyName, from: u32, to: u32, count: u32) -> NetResult<()> {
        self.send(&ProviderMessage::MoveRange {
            object,
            name,
            from,
            to,
            count,
        })
    }

    /// Starts building an object that is sent on [`ObjectTransaction::commit`].
    #[must_use]
    pub fn begin_object(&self, id: ObjectId) -> ObjectTransaction<'_> {
        ObjectTransaction {
            connection: self,
            object: Object::new(id),
        }
    }

    /// Closes the connection. The reader thread sees end of stream and exits.
    pub fn disconnect(&self) {
        self.sender.close();
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// Returns true once the connection can no longer send.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// An object under construction.
///
/// Dropping the transaction without committing discards it.
#[must_use = "a transaction does nothing until committed"]
pub struct ObjectTransaction<'a> {
    connection: &'a ProviderConnection,
    object: Object,
}

impl ObjectTransaction<'_> {
    /// Sets a property, declaring it on first use.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the property was already set with another type.
    pub fn set(&mut self, name: PropertyName, value: impl Into<Value>) -> FarsightResult<&mut Self> {
        let value = value.into();
        if self.object.get(name).is_some() {
            self.object.set(name, value)?;
        } else {
            self.object.add_value(name, value)?;
        }
        Ok(self)
    }

    /// The object built so far.
    #[must_use]
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Sends the object as `addOrUpdateObject`.
    ///
    /// # Errors
    ///
    /// See [`ProviderConnection::send`].
    pub fn commit(self) -> NetResult<()> {
        self.connection.send(&ProviderMessage::AddOrUpdateObject(self.object))
    }

    /// Discards the object.
    pub fn cancel(self) {
        debug!("Object {} discarded", self.object.id());
    }
}
