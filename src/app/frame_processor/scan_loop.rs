// SPDX-License-Identifier: GPL-3.0-only

//! QR detection loop
//!
//! The loop waits for each new frame, runs the detector on it and stops on
//! the first payload. A shared [`ScanToken`] decides the race between
//! "detected" and "cancelled": whichever flips it first wins, and the loser
//! has no effect. In particular a detection that finishes after cancellation
//! is discarded and never reaches the callback.

use super::tasks::Detector;
use crate::backends::camera::FrameSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Notify;
use tracing::{debug, info, trace};

const ACTIVE: u8 = 0;
const CONSUMED: u8 = 1;
const CANCELLED: u8 = 2;

struct TokenInner {
    state: AtomicU8,
    finished: Notify,
}

/// One-shot completion flag shared by a scan's producer and consumer
///
/// Starts active and can be finished exactly once, either by a detection
/// (`consume`) or by the user (`cancel`).
#[derive(Clone)]
pub struct ScanToken {
    inner: Arc<TokenInner>,
}

impl Default for ScanToken {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                state: AtomicU8::new(ACTIVE),
                finished: Notify::new(),
            }),
        }
    }

    /// Request cancellation; `false` if the scan already finished
    pub fn cancel(&self) -> bool {
        self.finish(CANCELLED)
    }

    /// Claim the scan for a detection; `false` if it already finished
    pub fn consume(&self) -> bool {
        self.finish(CONSUMED)
    }

    fn finish(&self, to: u8) -> bool {
        let won = self
            .inner
            .state
            .compare_exchange(ACTIVE, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.inner.finished.notify_waiters();
        }
        won
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == ACTIVE
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == CANCELLED
    }

    pub fn is_consumed(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == CONSUMED
    }

    /// Resolve once the token is no longer active
    pub async fn finished(&self) {
        loop {
            let notified = self.inner.finished.notified();
            tokio::pin!(notified);
            // Register before checking so a finish in between is not missed
            notified.as_mut().enable();
            if !self.is_active() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for ScanToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner.state.load(Ordering::Acquire) {
            ACTIVE => "active",
            CONSUMED => "consumed",
            _ => "cancelled",
        };
        f.debug_tuple("ScanToken").field(&state).finish()
    }
}

/// Why a detection loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A payload was delivered to the callback
    Detected,
    /// The token was cancelled (or claimed elsewhere) first
    Cancelled,
    /// The frame source ended before anything was detected
    SourceEnded,
}

/// Frame-paced QR polling loop
pub struct DetectionLoop<S> {
    source: S,
    detector: Arc<dyn Detector>,
    token: ScanToken,
}

impl<S: FrameSource> DetectionLoop<S> {
    pub fn new(source: S, detector: Arc<dyn Detector>, token: ScanToken) -> Self {
        Self {
            source,
            detector,
            token,
        }
    }

    /// Poll frames until a payload is found, the token finishes, or the
    /// source ends
    ///
    /// `on_detect` is called at most once, with the first payload of the
    /// first frame that yielded any.
    pub async fn run<F>(self, on_detect: F) -> LoopExit
    where
        F: FnOnce(String),
    {
        let Self {
            mut source,
            detector,
            token,
        } = self;
        let mut polls: u64 = 0;

        loop {
            if !token.is_active() {
                return stopped(&token, polls);
            }

            let frame = tokio::select! {
                biased;
                _ = token.finished() => return stopped(&token, polls),
                frame = source.next_frame() => frame,
            };
            let Some(frame) = frame else {
                debug!(polls, "Frame source ended");
                return LoopExit::SourceEnded;
            };

            polls += 1;
            let result = tokio::select! {
                biased;
                _ = token.finished() => return stopped(&token, polls),
                result = detector.detect(frame) => result,
            };

            if !token.is_active() {
                return stopped(&token, polls);
            }

            match result {
                Ok(detections) => {
                    let Some(first) = detections.into_iter().next() else {
                        trace!(polls, "No QR code in frame");
                        continue;
                    };
                    if !token.consume() {
                        return stopped(&token, polls);
                    }
                    info!(polls, content = %first.content, "QR code detected");
                    on_detect(first.content);
                    return LoopExit::Detected;
                }
                Err(e) => {
                    debug!(error = %e, polls, "QR detection failed, retrying on next frame");
                }
            }
        }
    }
}

fn stopped(token: &ScanToken, polls: u64) -> LoopExit {
    debug!(polls, token = ?token, "Detection loop stopped");
    LoopExit::Cancelled
}
