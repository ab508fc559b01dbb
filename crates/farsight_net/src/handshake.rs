//! # Connection Handshake
//!
//! Runs once per TCP connection, before any framed message.
//!
//! ```text
//! DISPLAY                                  PROVIDER
//!   |--- ConnectHeader ---------------------->|  magic, version, password
//!   |<-- ConnectResponse (success, N) --------|
//!   |<-- N x ResourceDescriptor --------------|  id, kind, size, hash
//!   |--- ResourceRequestHeader (M) ---------->|  only changed hashes
//!   |--- M x ResourceRequest ---------------->|
//!   |<-- M x (ResourceHeader + payload) ------|
//! ```

use std::io::{Read, Write};

use bytemuck::Pod;
use farsight_shared::constants::CONNECT_MAGIC;
use farsight_shared::protocol::{
    ConnectHeader, ConnectResponse, ResourceDescriptor, ResourceHeader, ResourceRequest, ResourceRequestHeader,
};
use farsight_shared::{ResourceId, ResourceKind, MAX_FRAME_SIZE, PROTOCOL_VERSION};
use tracing::{debug, info, warn};

use crate::error::{NetError, NetResult};
use crate::resources::{ResourceCache, ResourceStore};

fn write_pod<W: Write, T: Pod>(writer: &mut W, value: &T) -> NetResult<()> {
    writer.write_all(bytemuck::bytes_of(value))?;
    Ok(())
}

fn read_pod<R: Read, T: Pod>(reader: &mut R) -> NetResult<T> {
    let mut value = T::zeroed();
    reader.read_exact(bytemuck::bytes_of_mut(&mut value))?;
    Ok(value)
}

/// What the display learned during its handshake.
#[derive(Clone, Debug, Default)]
pub struct HandshakeOutcome {
    /// Every resource the provider announced.
    pub announced: Vec<ResourceId>,
    /// The subset that was transferred because the cache was stale.
    pub requested: Vec<ResourceId>,
}

/// Runs the display side of the handshake.
///
/// Resources whose hash matches `cache` are not requested. Received payloads
/// are written into `cache`.
///
/// # Errors
///
/// [`NetError::Rejected`] if the provider refuses, I/O errors otherwise.
pub fn client_handshake<S: Read + Write>(
    stream: &mut S,
    header: &ConnectHeader,
    cache: &mut ResourceCache,
) -> NetResult<HandshakeOutcome> {
    write_pod(stream, header)?;
    stream.flush()?;

    let response: ConnectResponse = read_pod(stream)?;
    if response.success == 0 {
        return Err(NetError::Rejected);
    }

    let count = response.resource_count as usize;
    let mut descriptors = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        descriptors.push(read_pod::<_, ResourceDescriptor>(stream)?);
    }

    let requested = cache.missing(&descriptors);
    write_pod(
        stream,
        &ResourceRequestHeader {
            request_count: requested.len() as u32,
        },
    )?;
    for id in &requested {
        write_pod(stream, &ResourceRequest { id: id.raw() })?;
    }
    stream.flush()?;
    debug!(
        "Provider announced {} resources, requesting {}",
        descriptors.len(),
        requested.len()
    );

    for _ in 0..requested.len() {
        let res_header: ResourceHeader = read_pod(stream)?;
        let size = res_header.size as usize;
        if size > MAX_FRAME_SIZE {
            return Err(NetError::FrameTooLarge(size));
        }
        let mut data = vec![0u8; size];
        stream.read_exact(&mut data)?;

        let id = ResourceId(res_header.id);
        let kind = descriptors
            .iter()
            .find(|desc| ResourceId(desc.id) == id)
            .and_then(|desc| u8::try_from(desc.kind).ok())
            .and_then(ResourceKind::from_u8);
        match kind {
            Some(kind) => cache.insert(id, kind, data),
            None => warn!("Provider sent unannounced resource {id}"),
        }
    }

    Ok(HandshakeOutcome {
        announced: descriptors.iter().map(|desc| ResourceId(desc.id)).collect(),
        requested,
    })
}

/// Runs the provider side of the handshake and returns the display's header.
///
/// # Errors
///
/// [`NetError::InvalidMagic`], [`NetError::ProtocolMismatch`] or
/// [`NetError::Rejected`] when the header does not check out. Mismatch and
/// rejection are answered with a failure response before returning.
pub fn server_handshake<S: Read + Write>(
    stream: &mut S,
    store: &ResourceStore,
    password: Option<&str>,
) -> NetResult<ConnectHeader> {
    let header: ConnectHeader = read_pod(stream)?;
    if header.magic != CONNECT_MAGIC {
        return Err(NetError::InvalidMagic);
    }

    let refuse = ConnectResponse {
        success: 0,
        resource_count: 0,
    };
    let version = header.protocol_version;
    if version != PROTOCOL_VERSION {
        write_pod(stream, &refuse)?;
        return Err(NetError::ProtocolMismatch {
            expected: PROTOCOL_VERSION,
            found: version,
        });
    }
    if let Some(expected) = password {
        if header.password() != expected {
            write_pod(stream, &refuse)?;
            return Err(NetError::Rejected);
        }
    }

    let descriptors = store.descriptors();
    write_pod(
        stream,
        &ConnectResponse {
            success: 1,
            resource_count: descriptors.len() as u32,
        },
    )?;
    for desc in &descriptors {
        write_pod(stream, desc)?;
    }
    stream.flush()?;

    let request: ResourceRequestHeader = read_pod(stream)?;
    let request_count = request.request_count;
    let mut ids = Vec::new();
    for _ in 0..request_count {
        let req: ResourceRequest = read_pod(stream)?;
        ids.push(ResourceId(req.id));
    }

    for id in ids {
        let data = match store.get(id) {
            Some(res) => res.data.as_slice(),
            None => {
                warn!("Display requested unknown resource {id}");
                &[]
            }
        };
        write_pod(
            stream,
            &ResourceHeader {
                id: id.raw(),
                size: data.len() as u32,
            },
        )?;
        stream.write_all(data)?;
    }
    stream.flush()?;

    info!(
        "Handshake complete with '{}' ({} resources sent)",
        header.name(),
        request_count
    );
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn run_pair(
        store: ResourceStore,
        password: Option<&'static str>,
        header: ConnectHeader,
        cache: &mut ResourceCache,
    ) -> (NetResult<HandshakeOutcome>, NetResult<ConnectHeader>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            server_handshake(&mut stream, &store, password)
        });
        let mut stream = TcpStream::connect(addr).unwrap();
        let client = client_handshake(&mut stream, &header, cache);
        (client, server.join().unwrap())
    }

    fn sample_store() -> ResourceStore {
        let mut store = ResourceStore::new();
        store.insert(ResourceId(1), ResourceKind::Layout, vec![1, 0, 0]);
        store.insert(ResourceId(2), ResourceKind::Drawing, vec![4; 100]);
        store
    }

    #[test]
    fn test_full_sync_then_cached() {
        let mut cache = ResourceCache::new();
        let header = ConnectHeader::new("display", "", 1, 640, 480);

        let (client, server) = run_pair(sample_store(), None, header, &mut cache);
        let outcome = client.unwrap();
        assert_eq!(server.unwrap().name(), "display");
        assert_eq!(outcome.requested.len(), 2);
        assert_eq!(cache.get(ResourceId(2)).unwrap().data, vec![4; 100]);

        let (client, _) = run_pair(sample_store(), None, header, &mut cache);
        let outcome = client.unwrap();
        assert_eq!(outcome.announced.len(), 2);
        assert!(outcome.requested.is_empty());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let mut cache = ResourceCache::new();
        let header = ConnectHeader::new("display", "guess", 0, 640, 480);
        let (client, server) = run_pair(sample_store(), Some("secret"), header, &mut cache);
        assert!(matches!(client, Err(NetError::Rejected)));
        assert!(matches!(server, Err(NetError::Rejected)));
    }

    #[test]
    fn test_version_mismatch() {
        let mut cache = ResourceCache::new();
        let mut header = ConnectHeader::new("display", "", 0, 640, 480);
        header.protocol_version = PROTOCOL_VERSION + 1;
        let (client, server) = run_pair(sample_store(), None, header, &mut cache);
        assert!(matches!(client, Err(NetError::Rejected)));
        assert!(matches!(server, Err(NetError::ProtocolMismatch { .. })));
    }
}
