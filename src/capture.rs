//! Completion handles for in-flight captures.
//!
//! A photo request splits into two owned halves:
//!
//! - [`PendingCapture`] stays with the camera session. When the session
//!   delivers a [`CaptureResult`] it calls [`PendingCapture::complete`], which
//!   runs the pipeline on the rayon pool. If the session fails it calls
//!   [`PendingCapture::fail`].
//! - [`CaptureHandle`] goes to the caller, who blocks on
//!   [`CaptureHandle::wait`] or [`CaptureHandle::wait_timeout`].
//!
//! Each half is consumed at most once, and dropping the pending half without
//! resolving it wakes the caller with [`CaptureError::Abandoned`]. Nothing is
//! registered globally; the pair lives exactly as long as the request.

use crate::imaging::ImageBackend;
use crate::process::{PhotoPostProcessor, ProcessError};
use crate::types::{CaptureResult, ProcessedPhoto, ProcessingRequest};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Processing(#[from] ProcessError),
    #[error("Capture session failed: {0}")]
    Session(String),
    #[error("Capture was dropped before it completed")]
    Abandoned,
    #[error("Timed out waiting for capture")]
    Timeout,
}

impl CaptureError {
    /// Stable error code reported to the host.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Processing(e) => e.code(),
            Self::Session(_) => "capture/session-error",
            Self::Abandoned => "capture/abandoned",
            Self::Timeout => "capture/timeout",
        }
    }
}

type Outcome = Result<ProcessedPhoto, CaptureError>;

/// Start tracking one photo request.
pub fn begin_capture(request: ProcessingRequest) -> (PendingCapture, CaptureHandle) {
    let (sender, receiver) = mpsc::sync_channel(1);
    (
        PendingCapture { request, sender },
        CaptureHandle { receiver },
    )
}

/// Session-side half of a capture.
#[derive(Debug)]
pub struct PendingCapture {
    request: ProcessingRequest,
    sender: SyncSender<Outcome>,
}

impl PendingCapture {
    pub fn request(&self) -> &ProcessingRequest {
        &self.request
    }

    /// Process `capture` on the rayon pool and deliver the result.
    ///
    /// Returns immediately.
    pub fn complete<B>(self, processor: Arc<PhotoPostProcessor<B>>, capture: CaptureResult)
    where
        B: ImageBackend + Send + 'static,
    {
        let Self { request, sender } = self;
        rayon::spawn(move || {
            let outcome = processor
                .process(capture, &request)
                .map_err(CaptureError::from);
            if sender.send(outcome).is_err() {
                debug!("capture finished after its handle was dropped");
            }
        });
    }

    /// Resolve the capture with a session error.
    pub fn fail(self, message: impl Into<String>) {
        if self
            .sender
            .send(Err(CaptureError::Session(message.into())))
            .is_err()
        {
            debug!("capture failed after its handle was dropped");
        }
    }
}

/// Caller-side half of a capture.
#[derive(Debug)]
pub struct CaptureHandle {
    receiver: Receiver<Outcome>,
}

impl CaptureHandle {
    /// Block until the capture resolves.
    pub fn wait(self) -> Outcome {
        self.receiver.recv().map_err(|_| CaptureError::Abandoned)?
    }

    /// Block for at most `timeout`.
    ///
    /// A timeout leaves the handle usable, so the caller may wait again.
    pub fn wait_timeout(&self, timeout: Duration) -> Outcome {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::Abandoned),
        }
    }
}
