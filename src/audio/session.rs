//! A single recording, from device acquisition to the final byte stream.
//!
//! ```text
//!  MicrophoneLock ──try_acquire──▶ MicrophoneLease ─┐
//!                                                   ▼
//!  AudioDevice ──acquire──▶ DeviceStream ──▶ CaptureSession ──finish──▶ CapturedAudio
//!                              │  RawChunk (mpsc)     ▲
//!                              └──────────────────────┘
//! ```
//!
//! The lease is held for the life of the session, so at most one session
//! per lock owns the microphone at any time.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, OnceLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::capture::{AudioDevice, CaptureError, DeviceStream, RawChunk};
use super::decode::ContainerFormat;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier of a recording session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MicrophoneLock
// ---------------------------------------------------------------------------

/// Exclusive-use flag for a microphone.
///
/// Clones share the same flag.  [`MicrophoneLock::global`] is the
/// process-wide instance used for the real device; tests build private
/// locks with [`MicrophoneLock::new`].
#[derive(Debug, Clone, Default)]
pub struct MicrophoneLock {
    in_use: Arc<AtomicBool>,
}

impl MicrophoneLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide lock for the system microphone.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<MicrophoneLock> = OnceLock::new();
        GLOBAL.get_or_init(MicrophoneLock::new).clone()
    }

    /// Take the microphone, or `None` when another lease is live.
    pub fn try_acquire(&self) -> Option<MicrophoneLease> {
        self.in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| MicrophoneLease {
                in_use: Arc::clone(&self.in_use),
            })
    }

    pub fn is_held(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }
}

/// RAII guard returned by [`MicrophoneLock::try_acquire`]; dropping it
/// releases the microphone.
#[derive(Debug)]
pub struct MicrophoneLease {
    in_use: Arc<AtomicBool>,
}

impl Drop for MicrophoneLease {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// CapturedAudio
// ---------------------------------------------------------------------------

/// The complete byte stream of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub bytes: Vec<u8>,
    pub format: ContainerFormat,
    /// Number of chunks received, including a non-empty flush tail.
    pub chunk_count: usize,
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// A live recording: owns the device stream, the microphone lease and the
/// chunks received so far.
///
/// Dropping a session without calling [`finish`](Self::finish) stops the
/// device and discards the audio.
pub struct CaptureSession {
    id: SessionId,
    stream: Box<dyn DeviceStream>,
    incoming: mpsc::Receiver<RawChunk>,
    chunks: Vec<RawChunk>,
    started_at: Instant,
    _lease: MicrophoneLease,
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("format", &self.stream.format())
            .field("chunks", &self.chunks.len())
            .finish_non_exhaustive()
    }
}

impl CaptureSession {
    /// Acquire `device` under an existing lease and start recording.
    pub async fn open(
        id: SessionId,
        lease: MicrophoneLease,
        device: &dyn AudioDevice,
    ) -> Result<Self, CaptureError> {
        let (tx, rx) = mpsc::channel();
        let stream = device.acquire(tx).await?;
        log::debug!("session {id}: opened ({})", stream.format());

        Ok(Self {
            id,
            stream,
            incoming: rx,
            chunks: Vec::new(),
            started_at: Instant::now(),
            _lease: lease,
        })
    }

    /// Take the lock and open a session in one step.
    pub async fn start(
        id: SessionId,
        lock: &MicrophoneLock,
        device: &dyn AudioDevice,
    ) -> Result<Self, CaptureError> {
        let lease = lock.try_acquire().ok_or(CaptureError::Busy)?;
        Self::open(id, lease, device).await
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn format(&self) -> ContainerFormat {
        self.stream.format()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Move chunks that have arrived since the last call into the session
    /// buffer; returns how many were moved.
    pub fn collect_pending(&mut self) -> usize {
        let before = self.chunks.len();
        self.chunks.extend(self.incoming.try_iter());
        self.chunks.len() - before
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.bytes.len()).sum()
    }

    /// Flush the device, collect every remaining chunk and concatenate them
    /// in arrival order.  The microphone is released on return.
    pub async fn finish(self) -> Result<CapturedAudio, CaptureError> {
        let Self {
            id,
            stream,
            incoming,
            mut chunks,
            started_at,
            _lease,
        } = self;

        let format = stream.format();
        let tail = stream.flush().await?;

        chunks.extend(incoming.try_iter());
        if !tail.is_empty() {
            chunks.push(RawChunk::new(tail));
        }

        let chunk_count = chunks.len();
        let bytes: Vec<u8> = chunks.into_iter().flat_map(|c| c.bytes).collect();

        log::debug!(
            "session {id}: finished after {:.1}s, {chunk_count} chunks, {} bytes",
            started_at.elapsed().as_secs_f32(),
            bytes.len()
        );
        Ok(CapturedAudio {
            bytes,
            format,
            chunk_count,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
