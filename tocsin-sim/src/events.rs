//! Event types and their ordering within a tick.

use std::cmp::Ordering;

use tocsin_core::{DeviceId, MessageKind, Tick};

/// Processing class of an event.
///
/// At a single tick every `Receive` event runs before any `Send` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventClass {
    /// Delivery of an alert or cancellation
    Receive = 0,
    /// Device-initiated flood
    Send = 1,
}

/// What happens when an event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `origin` issues an alert and floods it to its links
    SendAlert {
        /// Issuing device
        origin: DeviceId,
        /// Alert text
        message: String,
    },
    /// An alert from `sender` reaches `receiver`
    RecvAlert {
        /// Device the alert came from
        sender: DeviceId,
        /// Device the alert arrives at
        receiver: DeviceId,
        /// Alert text
        message: String,
    },
    /// `origin` cancels a message and floods the cancellation
    SendCancel {
        /// Canceling device
        origin: DeviceId,
        /// Text of the canceled message
        message: String,
    },
    /// A cancellation from `sender` reaches `receiver`
    RecvCancel {
        /// Device the cancellation came from
        sender: DeviceId,
        /// Device the cancellation arrives at
        receiver: DeviceId,
        /// Text of the canceled message
        message: String,
    },
}

impl EventKind {
    /// Returns string representation of event kind for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SendAlert { .. } => "SendAlert",
            EventKind::RecvAlert { .. } => "RecvAlert",
            EventKind::SendCancel { .. } => "SendCancel",
            EventKind::RecvCancel { .. } => "RecvCancel",
        }
    }

    /// Returns the processing class.
    pub fn class(&self) -> EventClass {
        match self {
            EventKind::RecvAlert { .. } | EventKind::RecvCancel { .. } => EventClass::Receive,
            EventKind::SendAlert { .. } | EventKind::SendCancel { .. } => EventClass::Send,
        }
    }

    /// Returns whether the event carries an alert or a cancellation.
    pub fn message_kind(&self) -> MessageKind {
        match self {
            EventKind::SendAlert { .. } | EventKind::RecvAlert { .. } => MessageKind::Alert,
            EventKind::SendCancel { .. } | EventKind::RecvCancel { .. } => {
                MessageKind::Cancellation
            }
        }
    }

    /// Device that produced the event.
    pub fn origin(&self) -> DeviceId {
        match self {
            EventKind::SendAlert { origin, .. } | EventKind::SendCancel { origin, .. } => *origin,
            EventKind::RecvAlert { sender, .. } | EventKind::RecvCancel { sender, .. } => *sender,
        }
    }

    /// Message text carried by the event.
    pub fn message(&self) -> &str {
        match self {
            EventKind::SendAlert { message, .. }
            | EventKind::RecvAlert { message, .. }
            | EventKind::SendCancel { message, .. }
            | EventKind::RecvCancel { message, .. } => message,
        }
    }
}

/// Scheduled event.
#[derive(Debug, Clone)]
pub struct SimulationEvent {
    /// Scheduling sequence number, unique per timeline
    pub id: u64,
    /// Tick the event fires at
    pub time: Tick,
    /// What the event does
    pub kind: EventKind,
}

impl SimulationEvent {
    /// Creates new simulation event.
    pub fn new(id: u64, time: Tick, kind: EventKind) -> Self {
        Self { id, time, kind }
    }

    /// Returns the processing class.
    pub fn class(&self) -> EventClass {
        self.kind.class()
    }
}

impl Eq for SimulationEvent {}

impl PartialEq for SimulationEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Ord for SimulationEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.class().cmp(&other.class()))
            // Scheduling order among equals
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for SimulationEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_alert(id: u64, time: Tick) -> SimulationEvent {
        SimulationEvent::new(
            id,
            time,
            EventKind::SendAlert {
                origin: DeviceId(1),
                message: "X".to_string(),
            },
        )
    }

    fn recv_cancel(id: u64, time: Tick) -> SimulationEvent {
        SimulationEvent::new(
            id,
            time,
            EventKind::RecvCancel {
                sender: DeviceId(1),
                receiver: DeviceId(2),
                message: "X".to_string(),
            },
        )
    }

    #[test]
    fn test_receive_precedes_send_at_same_tick() {
        let send = send_alert(1, 10);
        let recv = recv_cancel(2, 10);

        assert!(recv < send);
    }

    #[test]
    fn test_earlier_tick_wins_over_class() {
        let send = send_alert(5, 9);
        let recv = recv_cancel(1, 10);

        assert!(send < recv);
    }

    #[test]
    fn test_scheduling_order_breaks_ties() {
        let first = send_alert(3, 10);
        let second = send_alert(4, 10);

        assert!(first < second);
    }

    #[test]
    fn test_kind_accessors() {
        let event = recv_cancel(0, 0);

        assert_eq!(event.kind.as_str(), "RecvCancel");
        assert_eq!(event.class(), EventClass::Receive);
        assert_eq!(event.kind.message_kind(), MessageKind::Cancellation);
        assert_eq!(event.kind.origin(), DeviceId(1));
        assert_eq!(event.kind.message(), "X");
    }
}
