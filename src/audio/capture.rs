//! Microphone capture devices.
//!
//! A recording is driven through two traits so the practice pipeline can run
//! against real hardware or a test double:
//!
//! * [`AudioDevice`]: acquires the microphone and starts delivering
//!   [`RawChunk`]s to a channel.
//! * [`DeviceStream`]: the live stream; [`DeviceStream::flush`] stops it and
//!   returns any bytes still buffered inside the device.
//!
//! [`CpalDevice`] is the production implementation.  `cpal::Stream` is not
//! `Send` on every platform, so it lives on a dedicated `mic-capture` thread
//! which holds it until the stream handle is flushed or dropped.

use std::sync::mpsc;
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tokio::sync::oneshot;

use super::decode::ContainerFormat;

// ---------------------------------------------------------------------------
// RawChunk
// ---------------------------------------------------------------------------

/// One buffer of encoded bytes as delivered by a device, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChunk {
    pub bytes: Vec<u8>,
}

impl RawChunk {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring or running a microphone stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {0:?} not found")]
    DeviceNotFound(String),

    #[error("microphone is already in use by another session")]
    Busy,

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format {0}; f32 input is required")]
    UnsupportedSampleFormat(String),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("capture thread failed: {0}")]
    Thread(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A source of recorded audio.
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Acquire the device and start streaming chunks into `sink`.
    async fn acquire(
        &self,
        sink: mpsc::Sender<RawChunk>,
    ) -> Result<Box<dyn DeviceStream>, CaptureError>;
}

/// A live capture stream.  Dropping it stops capture without flushing.
#[async_trait]
pub trait DeviceStream: Send {
    /// Encoding of every chunk this stream delivers.
    fn format(&self) -> ContainerFormat;

    /// Stop capture and return any trailing bytes not yet delivered as a
    /// chunk.  Once this resolves no further chunks are sent.
    async fn flush(self: Box<Self>) -> Result<Vec<u8>, CaptureError>;
}

// ---------------------------------------------------------------------------
// CpalDevice
// ---------------------------------------------------------------------------

/// System microphone via `cpal`, delivering raw interleaved `f32` LE bytes
/// at the device's native rate and channel count.
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use phono_coach::audio::{AudioDevice, CpalDevice};
///
/// # async fn demo() -> Result<(), phono_coach::audio::CaptureError> {
/// let (tx, rx) = mpsc::channel();
/// let stream = CpalDevice::default().acquire(tx).await?;
/// // ... speak ...
/// let tail = stream.flush().await?;
/// let chunks: Vec<_> = rx.try_iter().collect();
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpalDevice {
    /// Input device name; `None` selects the host default.
    device_name: Option<String>,
}

impl CpalDevice {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    /// Names of all input devices on the default host.
    pub fn input_device_names() -> Result<Vec<String>, CaptureError> {
        let host = cpal::default_host();
        Ok(host
            .input_devices()?
            .filter_map(|d| d.name().ok())
            .collect())
    }
}

#[async_trait]
impl AudioDevice for CpalDevice {
    async fn acquire(
        &self,
        sink: mpsc::Sender<RawChunk>,
    ) -> Result<Box<dyn DeviceStream>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel::<Result<ContainerFormat, CaptureError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let device_name = self.device_name.clone();

        let worker = std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), sink) {
                    Ok((stream, format)) => {
                        let _ = ready_tx.send(Ok(format));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Block until flushed or dropped; a closed channel also stops.
                let _ = stop_rx.recv();
                drop(stream);
                log::debug!("capture: stream closed");
            })
            .map_err(|e| CaptureError::Thread(e.to_string()))?;

        let format = ready_rx
            .await
            .map_err(|_| CaptureError::Thread("capture thread exited during setup".into()))??;

        log::info!("capture: recording started ({format})");
        Ok(Box::new(CpalStream {
            format,
            stop: Some(stop_tx),
            worker: Some(worker),
        }))
    }
}

/// Build and start the input stream on the calling thread.
fn open_stream(
    device_name: Option<&str>,
    sink: mpsc::Sender<RawChunk>,
) -> Result<(cpal::Stream, ContainerFormat), CaptureError> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))?,
        None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
    };

    let supported = device.default_input_config()?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(CaptureError::UnsupportedSampleFormat(
            format!("{:?}", supported.sample_format()),
        ));
    }

    let format = ContainerFormat::RawF32Le {
        sample_rate: supported.sample_rate().0,
        channels: supported.channels(),
    };
    let config: cpal::StreamConfig = supported.into();

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let bytes = data.iter().flat_map(|s| s.to_le_bytes()).collect();
            // Ignore send errors; the session may already be gone.
            let _ = sink.send(RawChunk { bytes });
        },
        |err: cpal::StreamError| {
            log::error!("cpal stream error: {err}");
        },
        None,
    )?;
    stream.play()?;

    Ok((stream, format))
}

/// Handle to a stream owned by the `mic-capture` thread.
struct CpalStream {
    format: ContainerFormat,
    stop: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

#[async_trait]
impl DeviceStream for CpalStream {
    fn format(&self) -> ContainerFormat {
        self.format
    }

    async fn flush(self: Box<Self>) -> Result<Vec<u8>, CaptureError> {
        let mut this = self;
        if let Some(stop) = this.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = this.worker.take() {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| CaptureError::Thread(e.to_string()))?
                .map_err(|_| CaptureError::Thread("capture thread panicked".into()))?;
        }
        // cpal hands every buffer to the callback, nothing is held back.
        Ok(Vec::new())
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

// ---------------------------------------------------------------------------
// MockDevice (test helper)
// ---------------------------------------------------------------------------

/// Scripted device for tests: sends its chunks as soon as it is acquired and
/// returns `tail` from [`DeviceStream::flush`].
#[cfg(test)]
pub struct MockDevice {
    format: ContainerFormat,
    chunks: Vec<Vec<u8>>,
    tail: Vec<u8>,
    available: bool,
    acquire_gate: Option<std::sync::Arc<tokio::sync::Notify>>,
    flush_gate: Option<std::sync::Arc<tokio::sync::Notify>>,
}

#[cfg(test)]
impl MockDevice {
    pub fn new(format: ContainerFormat, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            format,
            chunks,
            tail: Vec::new(),
            available: true,
            acquire_gate: None,
            flush_gate: None,
        }
    }

    /// Mono 16 kHz raw f32 device delivering `samples` as one chunk.
    pub fn with_samples(samples: &[f32]) -> Self {
        let bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(
            ContainerFormat::RawF32Le {
                sample_rate: 16_000,
                channels: 1,
            },
            vec![bytes],
        )
    }

    pub fn with_tail(mut self, tail: Vec<u8>) -> Self {
        self.tail = tail;
        self
    }

    /// Hold `acquire` until the returned handle is notified.
    pub fn with_acquire_gate(mut self) -> (Self, std::sync::Arc<tokio::sync::Notify>) {
        let gate = std::sync::Arc::new(tokio::sync::Notify::new());
        self.acquire_gate = Some(std::sync::Arc::clone(&gate));
        (self, gate)
    }

    /// Hold `flush` until the returned handle is notified.
    pub fn with_flush_gate(mut self) -> (Self, std::sync::Arc<tokio::sync::Notify>) {
        let gate = std::sync::Arc::new(tokio::sync::Notify::new());
        self.flush_gate = Some(std::sync::Arc::clone(&gate));
        (self, gate)
    }

    /// A device whose acquisition always fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_samples(&[])
        }
    }
}

#[cfg(test)]
#[async_trait]
impl AudioDevice for MockDevice {
    async fn acquire(
        &self,
        sink: mpsc::Sender<RawChunk>,
    ) -> Result<Box<dyn DeviceStream>, CaptureError> {
        if let Some(gate) = &self.acquire_gate {
            gate.notified().await;
        }
        if !self.available {
            return Err(CaptureError::NoDevice);
        }
        for bytes in &self.chunks {
            let _ = sink.send(RawChunk::new(bytes.clone()));
        }
        Ok(Box::new(MockStream {
            format: self.format,
            tail: self.tail.clone(),
            gate: self.flush_gate.clone(),
        }))
    }
}

#[cfg(test)]
struct MockStream {
    format: ContainerFormat,
    tail: Vec<u8>,
    gate: Option<std::sync::Arc<tokio::sync::Notify>>,
}

#[cfg(test)]
#[async_trait]
impl DeviceStream for MockStream {
    fn format(&self) -> ContainerFormat {
        self.format
    }

    async fn flush(self: Box<Self>) -> Result<Vec<u8>, CaptureError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.tail)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RawChunk>();
        assert_send::<CaptureError>();
    }

    #[test]
    fn device_traits_are_object_safe() {
        fn takes_device(_: &dyn AudioDevice) {}
        fn takes_stream(_: Option<Box<dyn DeviceStream>>) {}
        takes_device(&CpalDevice::default());
        takes_stream(None);
    }

    #[tokio::test]
    async fn mock_device_delivers_chunks_then_tail() {
        let (tx, rx) = mpsc::channel();
        let device = MockDevice::new(
            ContainerFormat::Wav,
            vec![vec![1, 2], vec![3]],
        )
        .with_tail(vec![4]);

        let stream = device.acquire(tx).await.unwrap();
        assert_eq!(stream.format(), ContainerFormat::Wav);
        assert_eq!(stream.flush().await.unwrap(), vec![4]);

        let chunks: Vec<RawChunk> = rx.try_iter().collect();
        assert_eq!(chunks, vec![RawChunk::new(vec![1, 2]), RawChunk::new(vec![3])]);
    }

    #[tokio::test]
    async fn unavailable_mock_fails_to_acquire() {
        let (tx, _rx) = mpsc::channel();
        let result = MockDevice::unavailable().acquire(tx).await;
        assert!(matches!(result, Err(CaptureError::NoDevice)));
    }

    #[test]
    fn busy_message() {
        assert_eq!(
            CaptureError::Busy.to_string(),
            "microphone is already in use by another session"
        );
    }
}
