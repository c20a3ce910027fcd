#![forbid(unsafe_code)]

//! Host-facing abstractions: frame scheduling and render output.
//!
//! The engine never owns a clock or a thread. The host supplies:
//!
//! - a [`FrameScheduler`], the `request next frame` / `cancel` pair backed
//!   by whatever per-refresh callback the host has, and
//! - an optional [`RenderSink`] receiving each composed string.
//!
//! When a requested frame fires, the host calls
//! [`ScrambleEngine::on_frame`] with the handle and a monotonic timestamp.
//!
//! [`ManualScheduler`] is a deterministic, host-controlled implementation
//! for tests and headless embedding: time only moves when a frame is
//! delivered, by a fixed interval.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::engine::ScrambleEngine;

/// Interval between frames delivered by [`ManualScheduler`] (one 60 Hz refresh).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_micros(16_667);

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Opaque identifier of one frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The host's frame-callback source.
pub trait FrameScheduler {
    /// Ask for one frame callback. The host later delivers it through
    /// [`ScrambleEngine::on_frame`] with the returned handle.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a request that has not fired yet. Unknown or already
    /// delivered handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Write-only output target. Every call replaces the previous frame.
pub trait RenderSink {
    /// Show `frame`.
    fn render(&mut self, frame: &str);
}

impl RenderSink for String {
    fn render(&mut self, frame: &str) {
        self.clear();
        self.push_str(frame);
    }
}

// ---------------------------------------------------------------------------
// SharedSink
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SinkState {
    frame: String,
    writes: u64,
}

/// Cloneable in-memory sink. The engine keeps one clone, the host another.
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    inner: Rc<RefCell<SinkState>>,
}

impl SharedSink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered frame.
    #[must_use]
    pub fn contents(&self) -> String {
        self.inner.borrow().frame.clone()
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.inner.borrow().writes
    }
}

impl RenderSink for SharedSink {
    fn render(&mut self, frame: &str) {
        let mut state = self.inner.borrow_mut();
        state.frame.clear();
        state.frame.push_str(frame);
        state.writes += 1;
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler
// ---------------------------------------------------------------------------

/// Deterministic scheduler with a host-controlled clock.
///
/// At most one request is outstanding at a time, which matches how the
/// engine uses its scheduler.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: Duration,
    frame_interval: Duration,
    next_id: u64,
    pending: Option<FrameHandle>,
    requests: u64,
    cancellations: u64,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    /// Scheduler at time zero delivering frames every [`DEFAULT_REFRESH_INTERVAL`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            frame_interval: DEFAULT_REFRESH_INTERVAL,
            next_id: 1,
            pending: None,
            requests: 0,
            cancellations: 0,
        }
    }

    /// Set the time between delivered frames (builder).
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Change the time between delivered frames.
    pub fn set_frame_interval(&mut self, interval: Duration) {
        self.frame_interval = interval;
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward without delivering a frame.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Outstanding request, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Total requests issued.
    #[must_use]
    pub const fn requests(&self) -> u64 {
        self.requests
    }

    /// Total requests withdrawn before firing.
    #[must_use]
    pub const fn cancellations(&self) -> u64 {
        self.cancellations
    }

    /// Fire the outstanding request: advance the clock by one frame interval
    /// and return the handle with the new timestamp.
    pub fn take_due(&mut self) -> Option<(FrameHandle, Duration)> {
        let handle = self.pending.take()?;
        self.now = self.now.saturating_add(self.frame_interval);
        Some((handle, self.now))
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.requests += 1;
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancellations += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Headless driving
// ---------------------------------------------------------------------------

impl ScrambleEngine<ManualScheduler> {
    /// Deliver the outstanding frame, if any. Returns whether one fired.
    pub fn pump(&mut self) -> bool {
        match self.scheduler_mut().take_due() {
            Some((handle, now)) => {
                self.on_frame(handle, now);
                true
            }
            None => false,
        }
    }

    /// Deliver frames until none is requested or `max_frames` have fired.
    /// Returns the number delivered.
    pub fn run_until_idle(&mut self, max_frames: usize) -> usize {
        let mut delivered = 0;
        while delivered < max_frames && self.pump() {
            delivered += 1;
        }
        delivered
    }
}
