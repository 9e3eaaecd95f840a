//! Delayed effects
//!
//! Writes to the chip's registers don't take effect straight away; the effect
//! arrives a fixed number of clocks later. Each sprite owns a `Scheduler` that
//! holds its pending effects. A scheduler is only ticked when its sprite is
//! clocked, so sprites never share timing.
//!
//! Payloads are plain data. When an event fires its payload is handed back to
//! the owner, which applies it. The owner drives a tick like this:
//!
//! ```text
//! delay.tick();
//! while let Some((handle, payload)) = delay.next_fired() {
//!     apply(handle, payload);   // may schedule, force, pause or drop events
//! }
//! ```
//!
//! Events are visited in the order they were scheduled. An event scheduled
//! while a tick is in progress is visited later in that same tick, so it is
//! counted down immediately. Events scheduled between ticks are first counted
//! down on the next tick.
//!
//! An event scheduled with delay `n` is counted down on its first `n` ticks and
//! fires on the tick after that. In between it sits with zero ticks remaining,
//! which is observable through `about_to_end`.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use vcs_core::logging::{log, LogCategory, LogLevel};

/// More pending events than this in one sprite means something is looping
pub const MAX_PENDING: usize = 16;

/// Identifies a scheduled event for the lifetime of its scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventHandle(u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Event<A> {
    handle: EventHandle,
    label: Cow<'static, str>,
    initial: u32,
    remaining: u32,
    paused: bool,
    payload: A,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<A> {
    label: Cow<'static, str>,
    events: Vec<Event<A>>,
    next_handle: u32,
    /// Position of the tick in progress, if any
    cursor: Option<usize>,
}

impl<A> Scheduler<A> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label: Cow::Borrowed(label),
            events: Vec::new(),
            next_handle: 0,
            cursor: None,
        }
    }

    /// Queue `payload` to fire after `delay` ticks
    pub fn schedule(&mut self, delay: u32, payload: A, label: &'static str) -> EventHandle {
        if self.events.len() >= MAX_PENDING {
            log(LogCategory::Scheduler, LogLevel::Error, || {
                format!(
                    "{}: delay queue full scheduling {} ({})",
                    self.label,
                    label,
                    self.pending_labels().join(", ")
                )
            });
            panic!("{}: more than {} pending events", self.label, MAX_PENDING);
        }

        let handle = EventHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        self.events.push(Event {
            handle,
            label: Cow::Borrowed(label),
            initial: delay,
            remaining: delay,
            paused: false,
            payload,
        });

        handle
    }

    /// Begin a tick. Fired payloads are collected with `next_fired`.
    pub fn tick(&mut self) {
        self.cursor = Some(0);
    }

    /// Continue the tick in progress, returning the next payload to fire
    pub fn next_fired(&mut self) -> Option<(EventHandle, A)> {
        let mut i = self.cursor?;

        while i < self.events.len() {
            let ev = &mut self.events[i];
            if ev.paused {
                i += 1;
                continue;
            }

            if ev.remaining == 0 {
                let ev = self.events.remove(i);
                self.cursor = Some(i);
                return Some((ev.handle, ev.payload));
            }

            ev.remaining -= 1;
            i += 1;
        }

        self.cursor = None;
        None
    }

    /// Swap the payload and label of a pending event, leaving its countdown
    /// alone. Returns false if the event has already fired or been dropped.
    pub fn replace(&mut self, handle: EventHandle, payload: A, label: &'static str) -> bool {
        match self.events.iter_mut().find(|ev| ev.handle == handle) {
            Some(ev) => {
                ev.payload = payload;
                ev.label = Cow::Borrowed(label);
                true
            }
            None => false,
        }
    }

    /// Freeze the event. It keeps its remaining ticks and won't fire until
    /// resumed or forced.
    pub fn pause(&mut self, handle: EventHandle) {
        if let Some(ev) = self.events.iter_mut().find(|ev| ev.handle == handle) {
            ev.paused = true;
        }
    }

    pub fn resume(&mut self, handle: EventHandle) {
        if let Some(ev) = self.events.iter_mut().find(|ev| ev.handle == handle) {
            ev.paused = false;
        }
    }

    /// Remove the event without it ever firing. Returns false if it had already
    /// fired or been dropped.
    pub fn drop(&mut self, handle: EventHandle) -> bool {
        self.take(handle).is_some()
    }

    /// Remove the event and hand back its payload so the owner can apply it now
    pub fn force(&mut self, handle: EventHandle) -> Option<A> {
        self.take(handle)
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.find(handle).is_some()
    }

    /// Ticks left before the event fires
    pub fn remaining(&self, handle: EventHandle) -> Option<u32> {
        self.find(handle).map(|ev| ev.remaining)
    }

    /// True if the event hasn't been counted down yet
    pub fn just_started(&self, handle: EventHandle) -> bool {
        self.find(handle)
            .map(|ev| ev.remaining == ev.initial)
            .unwrap_or(false)
    }

    /// True if the event will fire on the next tick (unless paused)
    pub fn about_to_end(&self, handle: EventHandle) -> bool {
        self.find(handle)
            .map(|ev| ev.remaining == 0)
            .unwrap_or(false)
    }

    pub fn is_paused(&self, handle: EventHandle) -> bool {
        self.find(handle).map(|ev| ev.paused).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Labels of every pending event, in scheduling order
    pub fn pending_labels(&self) -> Vec<&str> {
        self.events.iter().map(|ev| ev.label.as_ref()).collect()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.events.clear();
        self.cursor = None;
    }

    fn find(&self, handle: EventHandle) -> Option<&Event<A>> {
        self.events.iter().find(|ev| ev.handle == handle)
    }

    fn take(&mut self, handle: EventHandle) -> Option<A> {
        let idx = self.events.iter().position(|ev| ev.handle == handle)?;
        let ev = self.events.remove(idx);

        // keep the tick in progress pointing at the same next event
        if let Some(cursor) = self.cursor.as_mut() {
            if idx < *cursor {
                *cursor -= 1;
            }
        }

        Some(ev.payload)
    }
}

impl<A> fmt::Display for Scheduler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.label)?;
        if self.events.is_empty() {
            return write!(f, " -");
        }
        for ev in &self.events {
            write!(f, " {}({}", ev.label, ev.remaining)?;
            if ev.paused {
                write!(f, " paused")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run one tick, collecting payloads
    fn tick(s: &mut Scheduler<u8>) -> Vec<u8> {
        let mut fired = Vec::new();
        s.tick();
        while let Some((_, p)) = s.next_fired() {
            fired.push(p);
        }
        fired
    }

    #[test]
    fn test_fires_once_on_tick_after_countdown() {
        let mut s = Scheduler::new("test");
        let h = s.schedule(3, 7, "EV");
        assert!(s.just_started(h));

        assert!(tick(&mut s).is_empty()); // 2
        assert!(!s.just_started(h));
        assert!(tick(&mut s).is_empty()); // 1
        assert!(tick(&mut s).is_empty()); // 0
        assert!(s.about_to_end(h));
        assert_eq!(s.remaining(h), Some(0));

        assert_eq!(tick(&mut s), vec![7]);
        assert!(!s.is_pending(h));
        assert!(tick(&mut s).is_empty());
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let mut s = Scheduler::new("test");
        let h = s.schedule(1, 1, "EV");
        s.pause(h);
        for _ in 0..10 {
            assert!(tick(&mut s).is_empty());
        }
        assert_eq!(s.remaining(h), Some(1));
        assert!(s.is_paused(h));

        s.resume(h);
        assert!(tick(&mut s).is_empty());
        assert_eq!(tick(&mut s), vec![1]);
    }

    #[test]
    fn test_drop_never_fires() {
        let mut s = Scheduler::new("test");
        let h = s.schedule(0, 1, "EV");
        assert!(s.drop(h));
        assert!(!s.drop(h));
        assert!(tick(&mut s).is_empty());
    }

    #[test]
    fn test_force_returns_payload_even_when_paused() {
        let mut s = Scheduler::new("test");
        let h = s.schedule(5, 9, "EV");
        s.pause(h);
        assert_eq!(s.force(h), Some(9));
        assert!(s.is_empty());
        assert_eq!(s.force(h), None);
    }

    #[test]
    fn test_event_scheduled_during_tick_is_counted_down_in_that_tick() {
        let mut s = Scheduler::new("test");
        s.schedule(0, 1, "FIRST");

        s.tick();
        let (_, p) = s.next_fired().unwrap();
        assert_eq!(p, 1);
        let h = s.schedule(2, 2, "SECOND");
        assert!(s.next_fired().is_none());

        assert_eq!(s.remaining(h), Some(1));
    }

    #[test]
    fn test_force_during_tick_keeps_order() {
        let mut s = Scheduler::new("test");
        let early = s.schedule(5, 1, "EARLY");
        s.schedule(0, 2, "FIRES");
        let late = s.schedule(5, 3, "LATE");

        s.tick();
        let (_, p) = s.next_fired().unwrap();
        assert_eq!(p, 2);

        // removing an event already visited mustn't skip the next one
        assert_eq!(s.force(early), Some(1));
        assert!(s.next_fired().is_none());

        assert_eq!(s.remaining(late), Some(4));
    }

    #[test]
    fn test_display_lists_pending() {
        let mut s = Scheduler::new("Missile 0");
        let h = s.schedule(2, 0u8, "RESM0");
        s.schedule(1, 0u8, "HMM0");
        s.pause(h);
        assert_eq!(s.to_string(), "Missile 0: RESM0(2 paused) HMM0(1)");
        assert_eq!(s.pending_labels(), vec!["RESM0", "HMM0"]);
    }

    #[test]
    fn test_replace_keeps_countdown() {
        let mut s = Scheduler::new("test");
        let h = s.schedule(3, 1, "HMP0");
        assert!(tick(&mut s).is_empty());

        assert!(s.replace(h, 2, "HMCLR"));
        assert_eq!(s.remaining(h), Some(2));
        assert_eq!(s.pending_labels(), vec!["HMCLR"]);

        assert!(tick(&mut s).is_empty());
        assert!(tick(&mut s).is_empty());
        assert_eq!(tick(&mut s), vec![2]);
        assert!(!s.replace(h, 3, "HMP0"));
    }

    #[test]
    fn test_labels_survive_serde() {
        let mut s = Scheduler::new("Ball");
        s.schedule(2, 5u8, "RESBL");

        let json = serde_json::to_string(&s).unwrap();
        let restored: Scheduler<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.to_string(), "Ball: RESBL(2)");
    }

    #[test]
    #[should_panic]
    fn test_overflow_is_a_defect() {
        let mut s = Scheduler::new("test");
        for _ in 0..=MAX_PENDING {
            s.schedule(10, 0u8, "EV");
        }
    }
}
