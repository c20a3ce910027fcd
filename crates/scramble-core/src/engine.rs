#![forbid(unsafe_code)]

//! The scramble engine: a frame-driven state machine that animates a text
//! from random characters into its final form.
//!
//! # Per-frame pipeline
//!
//! ```text
//! on_frame(handle, now)
//!   ├─ overdrive            every delivered frame
//!   └─ if now - last > interval (accepted frame)
//!        ├─ if tick_count % tick == 0
//!        │    step_forward → resize_control → seed_forward
//!        └─ compose → sink, on_frame observer, completion check
//! ```
//!
//! # Invariants
//!
//! 1. `0 <= frontier <= text.len()`, non-decreasing within a play cycle.
//! 2. With overdrive enabled, `overdrive_cursor >= frontier` within a play
//!    cycle: both advance by `step`, overdrive first, so the flash never
//!    overwrites a launched cell. With overdrive off the cursor stays at 0.
//! 3. Cells below the frontier are never [`Cell::Unset`].
//! 4. Positions whose target character is ignored never hold a countdown.
//! 5. `Completed` is entered, and the end observer fires, at most once per
//!    play cycle.
//!
//! # Failure Modes
//!
//! - No render sink attached: composition is skipped entirely, so counters
//!   and `tick_count` wait for the next frame that has a sink.
//! - `speed == 0`: no frame is ever requested; the engine stays frozen.
//! - Stale or cancelled frame handles are dropped.

use std::fmt;
use std::time::Duration;

use rand::Rng;

use crate::config::{CharRange, ScrambleConfig};
use crate::control::{Cell, ControlSequence, IgnoreSet};
use crate::events::{EventLog, Observers, ScrambleEvent};
use crate::host::{FrameHandle, FrameScheduler, RenderSink};
use crate::rng::{ScrambleRng, launch_duration, should_scramble};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of a [`ScrambleEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// Not started, or torn down.
    #[default]
    Idle,
    /// Frames are being requested and composed.
    Playing,
    /// The output matched the target text. No frames are requested.
    Completed,
}

/// Text scramble animation engine.
///
/// Owns the control sequence and every pointer exclusively; several
/// simultaneous animations are simply several engines.
pub struct ScrambleEngine<S: FrameScheduler> {
    config: ScrambleConfig,
    text: Vec<char>,
    control: ControlSequence,
    frontier: usize,
    overdrive_cursor: usize,
    tick_count: u64,
    last_accepted: Option<Duration>,
    pending: Option<FrameHandle>,
    state: AnimationState,
    completion_fired: bool,
    rng: ScrambleRng,
    scheduler: S,
    sink: Option<Box<dyn RenderSink>>,
    observers: Observers,
    events: EventLog,
    last_frame: Option<String>,
}

impl<S: FrameScheduler + fmt::Debug> fmt::Debug for ScrambleEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrambleEngine")
            .field("state", &self.state)
            .field("text", &self.config.text)
            .field("frontier", &self.frontier)
            .field("overdrive_cursor", &self.overdrive_cursor)
            .field("tick_count", &self.tick_count)
            .field("cells", &self.control.len())
            .field("pending", &self.pending)
            .field("has_sink", &self.sink.is_some())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<S: FrameScheduler> ScrambleEngine<S> {
    /// Create an idle engine. Call [`on_activate`](Self::on_activate) or
    /// [`play`](Self::play) to start.
    ///
    /// The configuration is [normalized](ScrambleConfig::normalized) first.
    pub fn new(config: ScrambleConfig, scheduler: S) -> Self {
        let config = config.normalized();
        let text = config.text.chars().collect();
        let rng = ScrambleRng::from_seed_option(config.rng_seed);
        Self {
            config,
            text,
            control: ControlSequence::new(),
            frontier: 0,
            overdrive_cursor: 0,
            tick_count: 0,
            last_accepted: None,
            pending: None,
            state: AnimationState::Idle,
            completion_fired: false,
            rng,
            scheduler,
            sink: None,
            observers: Observers::default(),
            events: EventLog::default(),
            last_frame: None,
        }
    }

    /// Attach a render sink (builder).
    #[must_use]
    pub fn with_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.attach_sink(sink);
        self
    }

    /// Observer called when a play cycle starts (builder).
    #[must_use]
    pub fn on_animation_start(mut self, hook: impl FnMut() + 'static) -> Self {
        self.observers.set_on_start(hook);
        self
    }

    /// Observer receiving every composed frame (builder).
    #[must_use]
    pub fn on_animation_frame(mut self, hook: impl FnMut(&str) + 'static) -> Self {
        self.observers.set_on_frame(hook);
        self
    }

    /// Observer called once when the output matches the text (builder).
    #[must_use]
    pub fn on_animation_end(mut self, hook: impl FnMut() + 'static) -> Self {
        self.observers.set_on_end(hook);
        self
    }

    /// Queue every [`ScrambleEvent`] for [`drain_events`](Self::drain_events) (builder).
    #[must_use]
    pub fn record_events(mut self) -> Self {
        self.events.set_enabled(true);
        self
    }

    /// Mutable access to the observers.
    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.observers
    }

    /// Attach or replace the render sink.
    pub fn attach_sink(&mut self, sink: impl RenderSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Detach the render sink. Later frames skip composition.
    pub fn detach_sink(&mut self) -> Option<Box<dyn RenderSink>> {
        self.sink.take()
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<ScrambleEvent> {
        self.events.drain()
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

impl<S: FrameScheduler> ScrambleEngine<S> {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Index up to which characters have been launched.
    #[must_use]
    pub fn frontier(&self) -> usize {
        self.frontier
    }

    /// Position of the overdrive sweep.
    #[must_use]
    pub fn overdrive_cursor(&self) -> usize {
        self.overdrive_cursor
    }

    /// Frames composed in this play cycle.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Control cells.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        self.control.as_slice()
    }

    /// Target text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.config.text
    }

    /// Normalized configuration in effect.
    #[must_use]
    pub fn config(&self) -> &ScrambleConfig {
        &self.config
    }

    /// Most recently composed frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<&str> {
        self.last_frame.as_deref()
    }

    /// Whether a frame request is outstanding.
    #[must_use]
    pub fn is_frame_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The host scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable access to the host scheduler.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl<S: FrameScheduler> ScrambleEngine<S> {
    /// Host activation: play, or jump straight to the final text when
    /// `play_on_mount` is off.
    pub fn on_activate(&mut self) {
        if self.config.play_on_mount {
            self.play();
        } else {
            self.skip_to_end();
        }
    }

    /// Host teardown: cancel the outstanding frame. No further callbacks fire.
    pub fn on_deactivate(&mut self) {
        self.cancel_pending();
        self.state = AnimationState::Idle;
        crate::debug!(text = %self.config.text, "scramble torn down");
    }

    /// New target text. Restarts the cycle exactly like [`play`](Self::play).
    pub fn on_target_changed(&mut self, text: impl Into<String>) {
        self.config.text = text.into();
        self.text = self.config.text.chars().collect();
        crate::debug!(text = %self.config.text, "scramble target changed");
        self.play();
    }

    /// Start a play cycle from scratch.
    pub fn play(&mut self) {
        self.cancel_pending();
        self.reset();
        self.state = AnimationState::Playing;
        crate::debug!(
            text = %self.config.text,
            retained = self.control.len(),
            "scramble play"
        );
        self.observers.started();
        self.events.push(|| ScrambleEvent::Started);
        if !self.config.is_frozen() {
            self.request_frame();
        }
    }

    /// Restart on demand. Same as [`play`](Self::play).
    pub fn replay(&mut self) {
        self.play();
    }

    /// Show the final text without animating and enter `Completed`.
    pub fn skip_to_end(&mut self) {
        self.cancel_pending();
        let ignore = IgnoreSet::new(&self.config.ignore);
        let text = &self.text;
        self.control
            .reset_to(text.len(), |i| ignore.pin(Some(text[i]), Cell::Settled(text[i])));
        self.frontier = text.len();
        self.overdrive_cursor = text.len();
        self.tick_count = text.len() as u64;
        self.last_accepted = None;
        self.completion_fired = false;
        crate::debug!(text = %self.config.text, "scramble skip to end");
        if self.compose() && self.is_converged() {
            self.complete();
        }
        self.state = AnimationState::Completed;
    }

    /// Deliver a frame the scheduler fired at monotonic time `now`.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Duration) {
        if self.state != AnimationState::Playing || self.pending != Some(handle) {
            crate::trace!(handle = handle.0, "dropping stale frame");
            return;
        }
        self.pending = None;
        let Some(interval) = self.config.frame_interval() else {
            return;
        };

        self.overdrive();

        let accepted = self
            .last_accepted
            .is_none_or(|last| now.saturating_sub(last) > interval);
        if accepted {
            self.last_accepted = Some(now);
            if self.tick_count % u64::from(self.config.tick) == 0 {
                self.run_tick();
            }
            if self.compose() && self.is_converged() {
                self.complete();
                return;
            }
        }
        self.request_frame();
    }

    fn reset(&mut self) {
        self.frontier = 0;
        self.overdrive_cursor = 0;
        self.tick_count = 0;
        self.last_accepted = None;
        self.completion_fired = false;
        if !self.config.overflow {
            let ignore = IgnoreSet::new(&self.config.ignore);
            let text = &self.text;
            self.control
                .reset_to(text.len(), |i| ignore.pin(Some(text[i]), Cell::Unset));
        }
    }

    fn request_frame(&mut self) {
        self.pending = Some(self.scheduler.request_frame());
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    fn complete(&mut self) {
        self.control.truncate(self.text.len());
        self.cancel_pending();
        self.state = AnimationState::Completed;
        if !self.completion_fired {
            self.completion_fired = true;
            crate::debug!(frames = self.tick_count, text = %self.config.text, "scramble complete");
            self.observers.ended();
            self.events.push(|| ScrambleEvent::Completed);
        }
    }

    /// Last frame equals the text, every position is launched, and no
    /// retained tail remains.
    fn is_converged(&self) -> bool {
        self.frontier == self.text.len()
            && self.control.len() == self.text.len()
            && self.last_frame.as_deref() == Some(self.config.text.as_str())
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

impl<S: FrameScheduler> ScrambleEngine<S> {
    fn run_tick(&mut self) {
        self.step_forward();
        self.resize_control();
        self.seed_forward();
        crate::trace!(
            frontier = self.frontier,
            overdrive = self.overdrive_cursor,
            cells = self.control.len(),
            "scramble tick"
        );
    }

    /// Launch up to `step` characters at the frontier and advance it.
    pub(crate) fn step_forward(&mut self) {
        let ignore = IgnoreSet::new(&self.config.ignore);
        for _ in 0..self.config.step {
            let Some(&ch) = self.text.get(self.frontier) else {
                break;
            };
            let frames = if should_scramble(&mut self.rng.launch, self.config.chance) {
                launch_duration(&mut self.rng.launch, self.config.scramble)
            } else {
                0
            };
            self.control
                .set(self.frontier, ignore.pin(Some(ch), Cell::countdown(frames)));
            self.frontier += 1;
        }
    }

    /// Move the control length up to `step` cells toward the text length.
    pub(crate) fn resize_control(&mut self) {
        let len = self.text.len();
        let step = self.config.step;
        if self.control.len() > len {
            self.control.shrink_by(step, len);
        }
        let ignore = IgnoreSet::new(&self.config.ignore);
        for _ in 0..step {
            let index = self.control.len();
            let Some(&ch) = self.text.get(index) else {
                break;
            };
            self.control.push(ignore.pin(Some(ch), Cell::Vacant));
        }
    }

    /// Re-arm random cells at or beyond the frontier: literals and vacant
    /// placeholders. Countdowns, pending cells, and holes are skipped;
    /// ignored literals stay pinned.
    pub(crate) fn seed_forward(&mut self) {
        if self.frontier >= self.text.len() {
            return;
        }
        let ignore = IgnoreSet::new(&self.config.ignore);
        let magnitude = if self.config.scramble > 0 {
            self.config.scramble
        } else {
            u32::try_from(self.config.seed).unwrap_or(u32::MAX)
        };
        for _ in 0..self.config.seed {
            if self.frontier >= self.control.len() {
                break;
            }
            let index = self
                .rng
                .scatter
                .random_range(self.frontier..self.control.len());
            let Some(cell) = self.control.get(index) else {
                continue;
            };
            if cell.is_numeric() || cell == Cell::Unset {
                continue;
            }
            let rearmed = if should_scramble(&mut self.rng.scatter, self.config.chance) {
                Cell::countdown(magnitude)
            } else {
                Cell::Pending
            };
            self.control.set(index, ignore.pin(cell.literal(), rearmed));
        }
    }

    /// Sweep the filler across up to `step` positions ahead.
    pub(crate) fn overdrive(&mut self) {
        let Some(filler) = self.config.overdrive.filler() else {
            return;
        };
        let ignore = IgnoreSet::new(&self.config.ignore);
        for _ in 0..self.config.step {
            let bound = self.control.len().max(self.text.len());
            if self.overdrive_cursor >= bound {
                break;
            }
            let index = self.overdrive_cursor;
            let reference = self.text.get(index).copied();
            self.control
                .set(index, ignore.pin(reference, Cell::Filler(filler)));
            self.overdrive_cursor += 1;
        }
    }

    /// Compose the frame, write it out, and advance `tick_count`.
    /// Returns false when no sink is attached and nothing happened.
    pub(crate) fn compose(&mut self) -> bool {
        let Some(sink) = self.sink.as_mut() else {
            return false;
        };
        let frame = compose_cells(
            &mut self.control,
            &self.text,
            self.frontier,
            &self.config.range,
            &mut self.rng.glyph,
        );
        sink.render(&frame);
        self.observers.frame(&frame);
        self.events.push(|| ScrambleEvent::Frame(frame.clone()));
        self.tick_count += 1;
        self.last_frame = Some(frame);
        true
    }
}

/// Render the control cells, decrementing live countdowns.
///
/// Dispatch per cell, first match wins:
///
/// 1. Countdown: random glyph; decrement when at or behind the frontier.
/// 2. Literal beyond the text or at/after the frontier: the literal.
/// 3. Literal equal to the text character behind the frontier: that character.
/// 4. Pending inside the text: the text character, and the cell settles.
/// 5. Anything else: nothing.
fn compose_cells<R: Rng + ?Sized>(
    control: &mut ControlSequence,
    text: &[char],
    frontier: usize,
    range: &CharRange,
    rng: &mut R,
) -> String {
    let mut out = String::with_capacity(control.len());
    for (i, cell) in control.iter_mut().enumerate() {
        let target = text.get(i).copied();
        match (*cell, cell.literal()) {
            (Cell::Scrambling(frames), _) => {
                out.push(range.sample(rng));
                if i <= frontier {
                    *cell = Cell::countdown(frames.saturating_sub(1));
                }
            }
            (_, Some(literal)) if target.is_none() || i >= frontier => out.push(literal),
            (_, Some(literal)) if target == Some(literal) => out.push(literal),
            (Cell::Pending, _) => {
                if let Some(ch) = target {
                    out.push(ch);
                    *cell = Cell::Settled(ch);
                }
            }
            _ => {}
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ManualScheduler, SharedSink};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn engine(config: ScrambleConfig) -> ScrambleEngine<ManualScheduler> {
        ScrambleEngine::new(
            config.rng_seed(7).range(CharRange::from_chars("#")),
            ManualScheduler::new(),
        )
        .with_sink(SharedSink::new())
    }

    fn set_cells(engine: &mut ScrambleEngine<ManualScheduler>, cells: &[Cell]) {
        engine.control.clear();
        for cell in cells {
            engine.control.push(*cell);
        }
    }

    // ---- step_forward ----

    #[test]
    fn step_forward_chance_zero_reveals_immediately() {
        let mut e = engine(ScrambleConfig::new("abc").chance(0.0).step(2));
        e.step_forward();
        assert_eq!(e.frontier(), 2);
        assert_eq!(e.cells(), &[Cell::Pending, Cell::Pending]);
    }

    #[test]
    fn step_forward_chance_one_scrambles_within_bounds() {
        let mut e = engine(ScrambleConfig::new("abcdef").scramble(4).step(6));
        e.step_forward();
        for cell in e.cells() {
            match cell {
                Cell::Scrambling(n) => assert!((4..=6).contains(n), "duration {n}"),
                other => panic!("expected countdown, got {other:?}"),
            }
        }
    }

    #[test]
    fn step_forward_pins_ignored_characters() {
        let mut e = engine(ScrambleConfig::new("a b").step(3));
        e.step_forward();
        assert_eq!(e.cells()[1], Cell::Ignored(' '));
        assert!(matches!(e.cells()[0], Cell::Scrambling(_)));
    }

    #[test]
    fn step_forward_clamps_at_text_length() {
        let mut e = engine(ScrambleConfig::new("ab").step(5));
        e.step_forward();
        e.step_forward();
        assert_eq!(e.frontier(), 2);
        assert_eq!(e.cells().len(), 2);
    }

    // ---- resize_control ----

    #[test]
    fn resize_shrinks_by_exactly_step() {
        let mut e = engine(ScrambleConfig::new("ab").step(2));
        set_cells(&mut e, &[Cell::Settled('x'); 7]);
        e.resize_control();
        assert_eq!(e.cells().len(), 5);
        e.resize_control();
        assert_eq!(e.cells().len(), 3);
        e.resize_control();
        assert_eq!(e.cells().len(), 2);
    }

    #[test]
    fn resize_grows_by_step_with_ignore_pinning() {
        let mut e = engine(ScrambleConfig::new("a b c").step(2));
        e.resize_control();
        assert_eq!(e.cells(), &[Cell::Vacant, Cell::Ignored(' ')]);
        e.resize_control();
        e.resize_control();
        assert_eq!(e.cells().len(), 5);
        assert_eq!(e.cells()[3], Cell::Ignored(' '));
    }

    // ---- seed_forward ----

    #[test]
    fn seed_rearms_literals_ahead_of_frontier() {
        let mut e = engine(ScrambleConfig::new("ab").scramble(3).seed(8));
        set_cells(&mut e, &[Cell::Filler('_'), Cell::Filler('_')]);
        e.seed_forward();
        assert!(e.cells().iter().any(|c| *c == Cell::Scrambling(3)));
        assert!(
            e.cells()
                .iter()
                .all(|c| matches!(c, Cell::Scrambling(3) | Cell::Filler('_')))
        );
    }

    #[test]
    fn seed_chance_zero_sets_pending() {
        let mut e = engine(ScrambleConfig::new("ab").chance(0.0).seed(16));
        set_cells(&mut e, &[Cell::Settled('q'), Cell::Settled('r')]);
        e.seed_forward();
        assert!(e.cells().iter().all(|c| matches!(c, Cell::Pending | Cell::Settled(_))));
        assert!(e.cells().contains(&Cell::Pending));
    }

    #[test]
    fn seed_zero_scramble_uses_seed_count() {
        let mut e = engine(ScrambleConfig::new("ab").scramble(0).seed(5));
        set_cells(&mut e, &[Cell::Filler('_'), Cell::Filler('_')]);
        e.seed_forward();
        assert!(e.cells().contains(&Cell::Scrambling(5)));
    }

    #[test]
    fn seed_rearms_vacant_placeholders() {
        let mut e = engine(ScrambleConfig::new("abc").scramble(3).seed(16));
        set_cells(&mut e, &[Cell::Pending, Cell::Vacant, Cell::Vacant]);
        e.frontier = 1;
        e.seed_forward();
        assert_eq!(e.cells()[0], Cell::Pending);
        assert!(
            e.cells()[1..]
                .iter()
                .all(|c| matches!(c, Cell::Scrambling(3) | Cell::Vacant))
        );
        assert!(e.cells().contains(&Cell::Scrambling(3)));
    }

    #[test]
    fn seed_skips_ignored_numeric_and_unset() {
        let mut e = engine(ScrambleConfig::new("a bc").seed(32));
        let cells = [
            Cell::Ignored(' '),
            Cell::Scrambling(9),
            Cell::Pending,
            Cell::Unset,
        ];
        set_cells(&mut e, &cells);
        e.seed_forward();
        assert_eq!(e.cells(), &cells);
    }

    #[test]
    fn seed_stops_once_frontier_reaches_end() {
        let mut e = engine(ScrambleConfig::new("ab").seed(8));
        set_cells(&mut e, &[Cell::Settled('a'), Cell::Settled('b'), Cell::Filler('_')]);
        e.frontier = 2;
        e.seed_forward();
        assert_eq!(e.cells()[2], Cell::Filler('_'));
    }

    #[test]
    fn seed_never_touches_cells_behind_frontier() {
        let mut e = engine(ScrambleConfig::new("abcd").seed(64));
        set_cells(
            &mut e,
            &[
                Cell::Settled('a'),
                Cell::Settled('b'),
                Cell::Filler('_'),
                Cell::Filler('_'),
            ],
        );
        e.frontier = 2;
        e.seed_forward();
        assert_eq!(&e.cells()[..2], &[Cell::Settled('a'), Cell::Settled('b')]);
    }

    // ---- overdrive ----

    #[test]
    fn overdrive_sweeps_filler_and_respects_ignore() {
        let mut e = engine(ScrambleConfig::new("a b").overdrive('*').step(2));
        e.overdrive();
        assert_eq!(e.cells(), &[Cell::Filler('*'), Cell::Ignored(' ')]);
        e.overdrive();
        assert_eq!(e.overdrive_cursor(), 3);
        e.overdrive();
        assert_eq!(e.overdrive_cursor(), 3);
        assert_eq!(e.cells().len(), 3);
    }

    #[test]
    fn overdrive_covers_retained_tail() {
        let mut e = engine(ScrambleConfig::new("a").step(3));
        set_cells(&mut e, &[Cell::Settled('x'), Cell::Settled('y'), Cell::Settled('z')]);
        e.overdrive();
        assert_eq!(e.cells(), &[Cell::Filler('_'); 3]);
    }

    #[test]
    fn overdrive_off_is_noop() {
        let mut e = engine(ScrambleConfig::new("abc").overdrive(false));
        e.overdrive();
        assert!(e.cells().is_empty());
        assert_eq!(e.overdrive_cursor(), 0);
    }

    // ---- compose ----

    #[test]
    fn compose_follows_dispatch_order() {
        let mut e = engine(ScrambleConfig::new("abcd"));
        set_cells(
            &mut e,
            &[
                Cell::Settled('a'),
                Cell::Scrambling(2),
                Cell::Filler('_'),
                Cell::Pending,
                Cell::Settled('z'),
            ],
        );
        e.frontier = 2;
        assert!(e.compose());
        assert_eq!(e.last_frame(), Some("a#_dz"));
        assert_eq!(
            e.cells(),
            &[
                Cell::Settled('a'),
                Cell::Scrambling(1),
                Cell::Filler('_'),
                Cell::Settled('d'),
                Cell::Settled('z'),
            ]
        );
        assert_eq!(e.tick_count(), 1);
    }

    #[test]
    fn compose_freezes_countdowns_beyond_frontier() {
        let mut e = engine(ScrambleConfig::new("abcd"));
        set_cells(&mut e, &[Cell::Pending, Cell::Scrambling(1), Cell::Scrambling(4)]);
        e.frontier = 1;
        e.compose();
        assert_eq!(e.last_frame(), Some("a##"));
        assert_eq!(e.cells()[1], Cell::Pending);
        assert_eq!(e.cells()[2], Cell::Scrambling(4));
    }

    #[test]
    fn compose_emits_nothing_for_stale_or_empty_cells() {
        let mut e = engine(ScrambleConfig::new("ab"));
        set_cells(
            &mut e,
            &[Cell::Settled('x'), Cell::Unset, Cell::Pending, Cell::Vacant],
        );
        e.frontier = 2;
        e.compose();
        assert_eq!(e.last_frame(), Some(""));
        assert_eq!(e.cells()[2], Cell::Pending);
    }

    #[test]
    fn compose_without_sink_changes_nothing() {
        let mut e = engine(ScrambleConfig::new("ab"));
        e.detach_sink();
        set_cells(&mut e, &[Cell::Scrambling(2), Cell::Pending]);
        e.frontier = 2;
        assert!(!e.compose());
        assert_eq!(e.cells(), &[Cell::Scrambling(2), Cell::Pending]);
        assert_eq!(e.tick_count(), 0);
        assert_eq!(e.last_frame(), None);
    }

    #[test]
    fn compose_cells_uses_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut control = ControlSequence::new();
        control.push(Cell::Scrambling(3));
        let range = CharRange::from_chars("%");
        let frame = compose_cells(&mut control, &['x'], 0, &range, &mut rng);
        assert_eq!(frame, "%");
        assert_eq!(control.get(0), Some(Cell::Scrambling(2)));
    }

    // ---- tick gating ----

    #[test]
    fn tick_factor_skips_ticks() {
        let mut e = engine(ScrambleConfig::new("abcdef").tick(3).chance(0.0));
        e.play();
        e.pump();
        assert_eq!(e.frontier(), 1);
        e.pump();
        e.pump();
        assert_eq!(e.frontier(), 1);
        e.pump();
        assert_eq!(e.frontier(), 2);
    }

    #[test]
    fn frames_inside_interval_only_run_overdrive() {
        let mut e = engine(ScrambleConfig::new("abcdef").speed(0.5).chance(0.0));
        e.play();
        // Interval is 33.3ms; the scheduler delivers every 16.7ms.
        e.pump();
        assert_eq!((e.frontier(), e.overdrive_cursor(), e.tick_count()), (1, 1, 1));
        e.pump();
        assert_eq!((e.frontier(), e.overdrive_cursor(), e.tick_count()), (1, 2, 1));
        e.pump();
        assert_eq!((e.frontier(), e.overdrive_cursor(), e.tick_count()), (2, 3, 2));
    }

    // ---- properties ----

    proptest! {
        #[test]
        fn chance_one_always_scrambles_new_launches(
            text in "[a-z]{1,24}",
            scramble in 1u32..8,
            step in 1usize..5,
            seed in any::<u64>(),
        ) {
            let mut e = ScrambleEngine::new(
                ScrambleConfig::new(text.clone()).scramble(scramble).step(step).rng_seed(seed),
                ManualScheduler::new(),
            );
            while e.frontier() < text.chars().count() {
                let before = e.frontier();
                e.step_forward();
                for cell in &e.cells()[before..e.frontier()] {
                    prop_assert!(
                        matches!(cell, Cell::Scrambling(n) if *n >= scramble),
                        "launched cell {:?} did not scramble", cell
                    );
                }
            }
        }

        #[test]
        fn overdrive_cursor_never_trails_frontier(
            text in "[a-z ]{0,24}",
            step in 1usize..4,
            tick in 1u32..4,
            seed in any::<u64>(),
        ) {
            let mut e = ScrambleEngine::new(
                ScrambleConfig::new(text).step(step).tick(tick).rng_seed(seed),
                ManualScheduler::new(),
            )
            .with_sink(SharedSink::new());
            e.play();
            for _ in 0..10_000 {
                if !e.pump() {
                    break;
                }
                prop_assert!(e.overdrive_cursor() >= e.frontier());
            }
            prop_assert_eq!(e.state(), AnimationState::Completed);
        }
    }
}
