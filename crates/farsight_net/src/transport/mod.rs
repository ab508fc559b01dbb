//! # Transport Layer
//!
//! Length-prefixed frames over a byte stream.
//!
//! ## Design
//!
//! - Every frame is a 4-byte little-endian length followed by the body
//! - Writes go through one lock per connection so frames never interleave
//! - A dedicated reader thread blocks on the socket and queues whole frames
//! - Shutting the socket down is the only way to stop a reader

use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use farsight_shared::MAX_FRAME_SIZE;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{NetError, NetResult};

/// Writes one frame.
///
/// # Errors
///
/// Fails with [`NetError::FrameTooLarge`] before writing anything if the body
/// exceeds the frame limit, or with the underlying I/O error.
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> NetResult<()> {
    if body.len() > MAX_FRAME_SIZE {
        return Err(NetError::FrameTooLarge(body.len()));
    }
    let len = body.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame.
///
/// Returns `Ok(None)` on a clean end of stream between frames.
///
/// # Errors
///
/// Fails on oversized frames, on EOF in the middle of a frame, and on I/O errors.
pub fn read_frame<R: Read>(reader: &mut R) -> NetResult<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 4];
    let mut filled = 0;
    while filled < len_bytes.len() {
        match reader.read(&mut len_bytes[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(NetError::Io(ErrorKind::UnexpectedEof.into())),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(NetError::FrameTooLarge(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportStats {
    /// Frames sent.
    pub frames_sent: u64,
    /// Bytes sent, length prefixes included.
    pub bytes_sent: u64,
    /// Send errors.
    pub send_errors: u64,
}

struct SenderInner<W> {
    writer: W,
    stats: TransportStats,
    closed: bool,
}

/// Shared, lock-serialized frame writer.
///
/// Clones share the same stream; each [`FrameSender::send`] writes one whole
/// frame under the lock.
pub struct FrameSender<W> {
    inner: Arc<Mutex<SenderInner<W>>>,
}

impl<W> Clone for FrameSender<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> FrameSender<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SenderInner {
                writer,
                stats: TransportStats::default(),
                closed: false,
            })),
        }
    }

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Closed`] after [`FrameSender::close`] or after an
    /// earlier write failed. A failed write closes the sender.
    pub fn send(&self, body: &[u8]) -> NetResult<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(NetError::Closed);
        }
        match write_frame(&mut inner.writer, body) {
            Ok(()) => {
                inner.stats.frames_sent += 1;
                inner.stats.bytes_sent += body.len() as u64 + 4;
                Ok(())
            }
            Err(NetError::FrameTooLarge(len)) => Err(NetError::FrameTooLarge(len)),
            Err(e) => {
                inner.stats.send_errors += 1;
                inner.closed = true;
                Err(e)
            }
        }
    }

    /// Marks the sender closed. Later sends fail with [`NetError::Closed`].
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    /// Returns true once the sender is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Returns statistics.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.inner.lock().stats
    }

    /// Runs `f` with the locked writer.
    pub fn with_writer<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        f(&mut self.inner.lock().writer)
    }
}

/// Connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    /// Socket opening.
    #[default]
    Connecting = 0,
    /// Handshake and resource sync in progress.
    Handshaking = 1,
    /// Exchanging steady-state frames.
    Active = 2,
    /// Torn down.
    Closed = 3,
}

/// What a reader thread pushes into its queue.
#[derive(Debug)]
pub enum Inbound {
    /// One frame body.
    Frame(Vec<u8>),
    /// The stream ended. `None` for a clean end of stream.
    Closed(Option<String>),
}

/// Spawns a thread that reads frames from `reader` until the stream ends.
///
/// Every frame and the final close notice go to the returned queue.
///
/// # Errors
///
/// Fails if the thread cannot be spawned.
pub fn spawn_reader<R>(name: String, reader: R) -> io::Result<(Receiver<Inbound>, JoinHandle<()>)>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = unbounded();
    let handle = std::thread::Builder::new()
        .name(name)
        .spawn(move || reader_loop(reader, &tx))?;
    Ok((rx, handle))
}

fn reader_loop<R: Read>(mut reader: R, tx: &Sender<Inbound>) {
    loop {
        match read_frame(&mut reader) {
            Ok(Some(frame)) => {
                if tx.send(Inbound::Frame(frame)).is_err() {
                    debug!("Frame queue dropped, reader exiting");
                    return;
                }
            }
            Ok(None) => {
                debug!("Stream closed by peer");
                let _ = tx.send(Inbound::Closed(None));
                return;
            }
            Err(e) => {
                warn!("Reader stopped: {e}");
                let _ = tx.send(Inbound::Closed(Some(e.to_string())));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_roundtrip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[1, 2, 3]).unwrap();
        write_frame(&mut buf, &[]).unwrap();
        assert_eq!(&buf[..4], &[3, 0, 0, 0]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(read_frame(&mut cursor).unwrap(), Some(vec![]));
        assert_eq!(read_frame(&mut cursor).unwrap(), None);
    }

    #[test]
    fn test_truncated_frame() {
        let mut cursor = Cursor::new(vec![5, 0, 0, 0, 1, 2]);
        assert!(matches!(read_frame(&mut cursor), Err(NetError::Io(_))));

        let mut cursor = Cursor::new(vec![5, 0]);
        assert!(matches!(read_frame(&mut cursor), Err(NetError::Io(_))));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let len = (MAX_FRAME_SIZE as u32 + 1).to_le_bytes();
        let mut cursor = Cursor::new(len.to_vec());
        assert!(matches!(read_frame(&mut cursor), Err(NetError::FrameTooLarge(_))));

        let mut sink = Vec::new();
        let body = vec![0u8; MAX_FRAME_SIZE + 1];
        assert!(matches!(write_frame(&mut sink, &body), Err(NetError::FrameTooLarge(_))));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sender_serializes_whole_frames() {
        let sender = FrameSender::new(Vec::new());
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let sender = sender.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        sender.send(&[i; 16]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let bytes = sender.with_writer(std::mem::take);
        let mut cursor = Cursor::new(bytes);
        let mut count = 0;
        while let Some(frame) = read_frame(&mut cursor).unwrap() {
            assert!(frame.iter().all(|&b| b == frame[0]));
            count += 1;
        }
        assert_eq!(count, 200);
        assert_eq!(sender.stats().frames_sent, 200);
    }

    #[test]
    fn test_closed_sender() {
        let sender = FrameSender::new(Vec::new());
        sender.close();
        assert!(matches!(sender.send(&[1]), Err(NetError::Closed)));
    }

    #[test]
    fn test_reader_thread_queues_frames() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[9]).unwrap();
        let (rx, handle) = spawn_reader("test-reader".into(), Cursor::new(buf)).unwrap();
        handle.join().unwrap();
        assert!(matches!(rx.recv().unwrap(), Inbound::Frame(f) if f == vec![9]));
        assert!(matches!(rx.recv().unwrap(), Inbound::Closed(None)));
    }
}
