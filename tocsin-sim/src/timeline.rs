//! Time-ordered store of pending events.

use std::collections::{BTreeMap, VecDeque};

use tocsin_core::Tick;

use crate::events::{EventClass, EventKind, SimulationEvent};

/// Events pending at one tick, split by class so receives always come out
/// first while each class keeps scheduling order.
#[derive(Debug, Default)]
struct TickQueue {
    receives: VecDeque<SimulationEvent>,
    sends: VecDeque<SimulationEvent>,
}

impl TickQueue {
    fn push(&mut self, event: SimulationEvent) {
        match event.class() {
            EventClass::Receive => self.receives.push_back(event),
            EventClass::Send => self.sends.push_back(event),
        }
    }

    fn pop(&mut self) -> Option<SimulationEvent> {
        self.receives.pop_front().or_else(|| self.sends.pop_front())
    }

    fn len(&self) -> usize {
        self.receives.len() + self.sends.len()
    }

    fn is_empty(&self) -> bool {
        self.receives.is_empty() && self.sends.is_empty()
    }
}

/// Pending events keyed by tick.
///
/// The key set is the ascending set of ticks that still have work. Events
/// may be scheduled at the tick currently being processed; [`Timeline::pop`]
/// hands them out in the same pass, still receives first.
#[derive(Debug, Default)]
pub struct Timeline {
    pending: BTreeMap<Tick, TickQueue>,
    next_event_id: u64,
    len: usize,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event at `time` and returns its scheduling sequence number.
    pub fn schedule(&mut self, time: Tick, kind: EventKind) -> u64 {
        let id = self.next_event_id;
        self.next_event_id += 1;

        self.pending
            .entry(time)
            .or_default()
            .push(SimulationEvent::new(id, time, kind));
        self.len += 1;

        id
    }

    /// Smallest tick with pending events.
    pub fn next_time(&self) -> Option<Tick> {
        self.pending.first_key_value().map(|(time, _)| *time)
    }

    /// Removes and returns the next event at `time`: the earliest scheduled
    /// receive, otherwise the earliest scheduled send.
    pub fn pop(&mut self, time: Tick) -> Option<SimulationEvent> {
        let queue = self.pending.get_mut(&time)?;
        let event = queue.pop();
        if queue.is_empty() {
            self.pending.remove(&time);
        }
        if event.is_some() {
            self.len -= 1;
        }
        event
    }

    /// Removes and returns every event at `time`, receives first, each class
    /// in scheduling order.
    pub fn drain(&mut self, time: Tick) -> Vec<SimulationEvent> {
        let Some(queue) = self.pending.remove(&time) else {
            return Vec::new();
        };
        self.len -= queue.len();

        let mut events: Vec<SimulationEvent> = queue.receives.into();
        events.extend(queue.sends);
        events
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
