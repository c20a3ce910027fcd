#![forbid(unsafe_code)]

//! Lifecycle observers and the polled event queue.
//!
//! Hosts can listen to an animation in two ways:
//!
//! - **Observers**: optional closures invoked synchronously from inside the
//!   frame that produced the event.
//! - **Polling**: with recording enabled, the engine also queues every
//!   [`ScrambleEvent`]; the host drains them after delivering a frame. This
//!   suits Elm-style update loops where closures capturing state compose
//!   poorly.
//!
//! # Invariants
//!
//! 1. `Started` fires once per play cycle, from `play()`.
//! 2. `Frame` fires once per composed frame, carrying the composed string.
//! 3. `Completed` fires at most once per play cycle.
//! 4. [`EventLog::drain`] clears the queue; events are not replayed.

use std::fmt;

/// An event emitted by the scramble engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrambleEvent {
    /// A play cycle started.
    Started,
    /// A frame was composed.
    Frame(String),
    /// The composed output matched the target text.
    Completed,
}

type Hook = Box<dyn FnMut()>;
type FrameHook = Box<dyn FnMut(&str)>;

/// Optional lifecycle hooks. Absent hooks are skipped.
#[derive(Default)]
pub struct Observers {
    on_start: Option<Hook>,
    on_frame: Option<FrameHook>,
    on_end: Option<Hook>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("on_start", &self.on_start.is_some())
            .field("on_frame", &self.on_frame.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

impl Observers {
    /// Install the start hook.
    pub fn set_on_start(&mut self, hook: impl FnMut() + 'static) {
        self.on_start = Some(Box::new(hook));
    }

    /// Install the per-frame hook.
    pub fn set_on_frame(&mut self, hook: impl FnMut(&str) + 'static) {
        self.on_frame = Some(Box::new(hook));
    }

    /// Install the completion hook.
    pub fn set_on_end(&mut self, hook: impl FnMut() + 'static) {
        self.on_end = Some(Box::new(hook));
    }

    pub(crate) fn started(&mut self) {
        if let Some(hook) = self.on_start.as_mut() {
            hook();
        }
    }

    pub(crate) fn frame(&mut self, frame: &str) {
        if let Some(hook) = self.on_frame.as_mut() {
            hook(frame);
        }
    }

    pub(crate) fn ended(&mut self) {
        if let Some(hook) = self.on_end.as_mut() {
            hook();
        }
    }
}

/// Queue of events for hosts that poll instead of registering observers.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    enabled: bool,
    events: Vec<ScrambleEvent>,
}

impl EventLog {
    /// Start or stop recording. Stopping discards queued events.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.events.clear();
        }
    }

    /// Whether events are being recorded.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn push(&mut self, event: impl FnOnce() -> ScrambleEvent) {
        if self.enabled {
            self.events.push(event());
        }
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<ScrambleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn absent_hooks_are_skipped() {
        let mut observers = Observers::default();
        observers.started();
        observers.frame("abc");
        observers.ended();
    }

    #[test]
    fn hooks_receive_calls() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::default();
        let s = Rc::clone(&seen);
        observers.set_on_start(move || s.borrow_mut().push("start".to_string()));
        let s = Rc::clone(&seen);
        observers.set_on_frame(move |frame| s.borrow_mut().push(frame.to_string()));
        let s = Rc::clone(&seen);
        observers.set_on_end(move || s.borrow_mut().push("end".to_string()));

        observers.started();
        observers.frame("A_");
        observers.ended();
        assert_eq!(*seen.borrow(), vec!["start", "A_", "end"]);
    }

    #[test]
    fn debug_reports_installed_hooks() {
        let mut observers = Observers::default();
        observers.set_on_end(|| {});
        let dbg = format!("{observers:?}");
        assert!(dbg.contains("on_end: true"));
        assert!(dbg.contains("on_start: false"));
    }

    #[test]
    fn log_records_only_when_enabled() {
        let mut log = EventLog::default();
        log.push(|| ScrambleEvent::Started);
        assert!(log.is_empty());

        log.set_enabled(true);
        log.push(|| ScrambleEvent::Started);
        log.push(|| ScrambleEvent::Frame("x".into()));
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.drain(),
            vec![ScrambleEvent::Started, ScrambleEvent::Frame("x".into())]
        );
        assert!(log.is_empty());
    }

    #[test]
    fn disabling_discards_queue() {
        let mut log = EventLog::default();
        log.set_enabled(true);
        log.push(|| ScrambleEvent::Completed);
        log.set_enabled(false);
        assert!(log.is_empty());
        assert!(!log.is_enabled());
    }
}
