//! Log records emitted by a simulation run and their text rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DeviceId, Tick};

/// Whether a record describes the sending or the receiving side of a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    /// Returns the verb used in the text rendering.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Sent => "SENT",
            Direction::Received => "RECEIVED",
        }
    }
}

/// Kind of message carried by a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Alert,
    Cancellation,
}

impl MessageKind {
    /// Returns the upper-case label used in the text rendering.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Alert => "ALERT",
            MessageKind::Cancellation => "CANCELLATION",
        }
    }
}

/// One line of simulation output.
///
/// For a `Sent` record `left` is the sender and `right` the target. For a
/// `Received` record `left` is the receiver and `right` the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    /// A single hop of an alert or cancellation.
    Message {
        time: Tick,
        direction: Direction,
        kind: MessageKind,
        left: DeviceId,
        right: DeviceId,
        message: String,
    },
    /// Terminal record, stamped at the horizon.
    End { time: Tick },
}

impl LogRecord {
    /// Record for `sender` handing `message` to `target`.
    pub fn sent(
        time: Tick,
        kind: MessageKind,
        sender: DeviceId,
        target: DeviceId,
        message: impl Into<String>,
    ) -> Self {
        LogRecord::Message {
            time,
            direction: Direction::Sent,
            kind,
            left: sender,
            right: target,
            message: message.into(),
        }
    }

    /// Record for `receiver` taking delivery of `message` from `source`.
    pub fn received(
        time: Tick,
        kind: MessageKind,
        receiver: DeviceId,
        source: DeviceId,
        message: impl Into<String>,
    ) -> Self {
        LogRecord::Message {
            time,
            direction: Direction::Received,
            kind,
            left: receiver,
            right: source,
            message: message.into(),
        }
    }

    /// Terminal record.
    pub fn end(time: Tick) -> Self {
        LogRecord::End { time }
    }

    /// Returns the tick the record is stamped with.
    pub fn time(&self) -> Tick {
        match self {
            LogRecord::Message { time, .. } | LogRecord::End { time } => *time,
        }
    }

    /// Returns true for the terminal record.
    pub fn is_end(&self) -> bool {
        matches!(self, LogRecord::End { .. })
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Message {
                time,
                direction,
                kind,
                left,
                right,
                message,
            } => {
                let preposition = match direction {
                    Direction::Sent => "TO",
                    Direction::Received => "FROM",
                };
                write!(
                    f,
                    "@{time}: #{left} {} {} {preposition} #{right}: {message}",
                    direction.as_str(),
                    kind.as_str()
                )
            }
            LogRecord::End { time } => write!(f, "@{time}: END"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sent_record_names_target() {
        let record = LogRecord::sent(200, MessageKind::Alert, DeviceId(1), DeviceId(2), "Badness");
        assert_eq!(record.to_string(), "@200: #1 SENT ALERT TO #2: Badness");
    }

    #[test]
    fn test_received_record_names_source() {
        let record = LogRecord::received(
            550,
            MessageKind::Cancellation,
            DeviceId(2),
            DeviceId(1),
            "Badness",
        );
        assert_eq!(
            record.to_string(),
            "@550: #2 RECEIVED CANCELLATION FROM #1: Badness"
        );
    }

    #[test]
    fn test_end_record() {
        let record = LogRecord::end(900);
        assert!(record.is_end());
        assert_eq!(record.time(), 900);
        assert_eq!(record.to_string(), "@900: END");
    }

    #[test]
    fn test_json_shape() {
        let record = LogRecord::sent(0, MessageKind::Alert, DeviceId(1), DeviceId(2), "X");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "message");
        assert_eq!(json["direction"], "sent");
        assert_eq!(json["kind"], "alert");
        assert_eq!(json["left"], 1);
        assert_eq!(json["right"], 2);

        let end = serde_json::to_value(LogRecord::end(20)).unwrap();
        assert_eq!(end, serde_json::json!({ "type": "end", "time": 20 }));
    }
}
