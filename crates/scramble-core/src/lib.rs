#![forbid(unsafe_code)]

//! Scramble: frame-driven text scramble animation.
//!
//! A [`ScrambleEngine`] animates a target string from random characters
//! into its final form, one host-delivered frame at a time, writing every
//! composed string to a [`RenderSink`]. The engine never owns a clock or a
//! thread: the host supplies a [`FrameScheduler`] and calls
//! [`ScrambleEngine::on_frame`] when a requested frame fires.
//!
//! ```ignore
//! use scramble_core::{ManualScheduler, ScrambleConfig, ScrambleEngine, SharedSink};
//!
//! let sink = SharedSink::new();
//! let mut engine = ScrambleEngine::new(ScrambleConfig::new("HELLO"), ManualScheduler::new())
//!     .with_sink(sink.clone());
//! engine.on_activate();
//! engine.run_until_idle(10_000);
//! assert_eq!(sink.contents(), "HELLO");
//! ```

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod logging;
pub mod rng;

pub use config::{CharRange, GENERIC_FILLER, MAX_FRAME_INTERVAL, Overdrive, ScrambleConfig};
pub use control::{Cell, ControlSequence, IgnoreSet};
pub use engine::{AnimationState, ScrambleEngine};
pub use error::ConfigError;
pub use events::{EventLog, Observers, ScrambleEvent};
pub use host::{
    DEFAULT_REFRESH_INTERVAL, FrameHandle, FrameScheduler, ManualScheduler, RenderSink, SharedSink,
};
pub use rng::ScrambleRng;

#[cfg(feature = "tracing")]
pub use logging::{debug, trace};
