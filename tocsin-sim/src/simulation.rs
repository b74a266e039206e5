//! Simulation engine: drives the timeline and applies alert and
//! cancellation semantics.

use thiserror::Error;
use tocsin_core::{
    Command, CommandKind, DeviceId, EngineConfig, LogRecord, MessageKind, ScenarioConfig, Tick,
};

use crate::device_state::DeviceMessageState;
use crate::events::{EventKind, SimulationEvent};
use crate::graph::PropagationGraph;
use crate::metrics::{SimulationMetrics, SimulationReport};
use crate::timeline::Timeline;

/// Errors that can occur during simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Too many events fired at one tick; only zero-delay alert cycles get here
    #[error("Event budget exceeded at tick {time}: more than {limit} events")]
    TickBudgetExceeded {
        /// Tick that kept producing events
        time: Tick,
        /// Configured per-tick ceiling
        limit: usize,
    },
}

/// Destination for log records.
///
/// Emission is fire-and-forget: the engine never waits on or inspects the
/// sink.
pub trait RecordSink {
    /// Accepts the next record in output order.
    fn emit(&mut self, record: LogRecord);
}

impl RecordSink for Vec<LogRecord> {
    fn emit(&mut self, record: LogRecord) {
        self.push(record);
    }
}

/// Alert flooding simulation over a fixed propagation graph.
pub struct Simulation {
    /// Engine guards
    config: EngineConfig,
    /// Exclusive upper bound on delivery times
    horizon: Tick,
    /// Links, read-only during a run
    graph: PropagationGraph,
    /// Cancellation bookkeeping
    devices: DeviceMessageState,
    /// Pending events
    timeline: Timeline,
    /// Metrics collector
    metrics: SimulationMetrics,
}

impl Simulation {
    /// Creates a simulation with nothing scheduled.
    pub fn new(horizon: Tick, graph: PropagationGraph) -> Self {
        Self {
            config: EngineConfig::default(),
            horizon,
            graph,
            devices: DeviceMessageState::new(),
            timeline: Timeline::new(),
            metrics: SimulationMetrics::new(),
        }
    }

    /// Builds the graph from a scenario and schedules its commands in
    /// declaration order.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Self {
        let graph: PropagationGraph = scenario.propagations.iter().collect();
        let mut simulation = Self::new(scenario.length, graph);
        for command in &scenario.commands {
            simulation.schedule_command(command);
        }
        simulation
    }

    /// Replaces the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Schedules an initial command as a send event at its own tick.
    ///
    /// Initial commands are not subject to the horizon; only propagated
    /// deliveries are.
    pub fn schedule_command(&mut self, command: &Command) {
        let origin = command.device;
        let message = command.message.clone();
        let kind = match command.kind {
            CommandKind::Alert => EventKind::SendAlert { origin, message },
            CommandKind::Cancel => EventKind::SendCancel { origin, message },
        };
        self.timeline.schedule(command.time, kind);
    }

    /// Schedules `device` to raise an alert at `time`.
    pub fn schedule_alert(&mut self, device: DeviceId, message: &str, time: Tick) {
        self.timeline.schedule(
            time,
            EventKind::SendAlert {
                origin: device,
                message: message.to_string(),
            },
        );
    }

    /// Schedules `device` to cancel a message at `time`.
    pub fn schedule_cancel(&mut self, device: DeviceId, message: &str, time: Tick) {
        self.timeline.schedule(
            time,
            EventKind::SendCancel {
                origin: device,
                message: message.to_string(),
            },
        );
    }

    /// Returns the horizon.
    pub fn horizon(&self) -> Tick {
        self.horizon
    }

    /// Returns the cancellation bookkeeping.
    pub fn device_state(&self) -> &DeviceMessageState {
        &self.devices
    }

    /// Number of events still pending.
    pub fn pending_events(&self) -> usize {
        self.timeline.len()
    }

    /// Runs until no events remain, then emits the END record.
    ///
    /// Ticks are visited in ascending order. Each tick is drained one event
    /// at a time until nothing is left at it, so events a handler schedules
    /// for the current tick are processed before moving on.
    ///
    /// # Errors
    /// - `SimulationError::TickBudgetExceeded` - A single tick produced more
    ///   events than `EngineConfig::max_events_per_tick`; no END record is
    ///   emitted
    pub fn run<S: RecordSink>(&mut self, sink: &mut S) -> Result<SimulationReport, SimulationError> {
        tracing::info!(
            horizon = self.horizon,
            links = self.graph.link_count(),
            senders = self.graph.senders().len(),
            pending = self.timeline.len(),
            "Starting simulation"
        );

        let limit = self.config.max_events_per_tick;
        let mut ctx = EngineContext {
            horizon: self.horizon,
            graph: &self.graph,
            devices: &mut self.devices,
            timeline: &mut self.timeline,
            metrics: &mut self.metrics,
            sink,
        };

        while let Some(time) = ctx.timeline.next_time() {
            let mut events_at_tick = 0;

            while let Some(event) = ctx.timeline.pop(time) {
                events_at_tick += 1;
                if events_at_tick > limit {
                    tracing::error!("Tick {time} exceeded the budget of {limit} events");
                    return Err(SimulationError::TickBudgetExceeded { time, limit });
                }
                dispatch(&mut ctx, event);
            }

            ctx.metrics.update_peak_events_per_tick(events_at_tick);
        }

        ctx.emit(LogRecord::end(self.horizon));

        tracing::info!(
            events = self.metrics.events_processed,
            records = self.metrics.records_emitted,
            "Simulation finished"
        );

        Ok(SimulationReport {
            horizon: self.horizon,
            devices_with_state: self.devices.device_count(),
            metrics: self.metrics.clone(),
        })
    }

    /// Runs to completion and returns every record.
    ///
    /// # Errors
    /// - `SimulationError::TickBudgetExceeded` - See [`Simulation::run`]
    pub fn run_to_records(&mut self) -> Result<Vec<LogRecord>, SimulationError> {
        let mut records = Vec::new();
        self.run(&mut records)?;
        Ok(records)
    }
}

/// Everything a handler may read or write while processing one event.
struct EngineContext<'a, S: RecordSink> {
    horizon: Tick,
    graph: &'a PropagationGraph,
    devices: &'a mut DeviceMessageState,
    timeline: &'a mut Timeline,
    metrics: &'a mut SimulationMetrics,
    sink: &'a mut S,
}

impl<S: RecordSink> EngineContext<'_, S> {
    fn emit(&mut self, record: LogRecord) {
        self.metrics.records_emitted += 1;
        self.sink.emit(record);
    }

    /// Sends `message` from `from` over every outgoing link at `time`.
    ///
    /// A SENT record is emitted for every link; the matching delivery is
    /// only scheduled when it lands strictly before the horizon.
    fn flood(&mut self, from: DeviceId, time: Tick, kind: MessageKind, message: &str) {
        let graph = self.graph;

        for link in graph.links_from(from) {
            let arrival = time
                .checked_add(link.delay)
                .filter(|arrival| *arrival < self.horizon);

            match arrival {
                Some(arrival) => {
                    let delivery = match kind {
                        MessageKind::Alert => EventKind::RecvAlert {
                            sender: from,
                            receiver: link.to,
                            message: message.to_string(),
                        },
                        MessageKind::Cancellation => EventKind::RecvCancel {
                            sender: from,
                            receiver: link.to,
                            message: message.to_string(),
                        },
                    };
                    self.timeline.schedule(arrival, delivery);
                }
                None => {
                    self.metrics.deliveries_dropped += 1;
                    tracing::trace!(
                        "Dropping {} {from}->{} at {time}+{}: beyond horizon {}",
                        kind.as_str(),
                        link.to,
                        link.delay,
                        self.horizon
                    );
                }
            }

            self.emit(LogRecord::sent(time, kind, from, link.to, message));
        }
    }
}

/// Routes one event to its handler.
fn dispatch<S: RecordSink>(ctx: &mut EngineContext<'_, S>, event: SimulationEvent) {
    let time = event.time;
    ctx.metrics.record_event(event.kind.as_str());
    tracing::debug!(time, kind = event.kind.as_str(), origin = %event.kind.origin(), "Processing event");

    match event.kind {
        EventKind::SendAlert { origin, message } => handle_send_alert(ctx, time, origin, &message),
        EventKind::RecvAlert {
            sender,
            receiver,
            message,
        } => handle_recv_alert(ctx, time, sender, receiver, &message),
        EventKind::SendCancel { origin, message } => {
            handle_send_cancel(ctx, time, origin, &message)
        }
        EventKind::RecvCancel {
            sender,
            receiver,
            message,
        } => handle_recv_cancel(ctx, time, sender, receiver, &message),
    }
}

fn handle_send_alert<S: RecordSink>(
    ctx: &mut EngineContext<'_, S>,
    time: Tick,
    origin: DeviceId,
    message: &str,
) {
    ctx.flood(origin, time, MessageKind::Alert, message);
}

/// Logs the delivery, then forwards unless the receiver canceled the message
/// at least one tick ago.
fn handle_recv_alert<S: RecordSink>(
    ctx: &mut EngineContext<'_, S>,
    time: Tick,
    sender: DeviceId,
    receiver: DeviceId,
    message: &str,
) {
    ctx.emit(LogRecord::received(
        time,
        MessageKind::Alert,
        receiver,
        sender,
        message,
    ));

    if ctx.devices.is_stale(receiver, message, time) {
        ctx.metrics.stale_alerts_suppressed += 1;
        tracing::debug!("Device {receiver} suppresses stale alert '{message}' at {time}");
        return;
    }

    ctx.flood(receiver, time, MessageKind::Alert, message);
}

fn handle_send_cancel<S: RecordSink>(
    ctx: &mut EngineContext<'_, S>,
    time: Tick,
    origin: DeviceId,
    message: &str,
) {
    ctx.devices.mark_canceled(origin, message, time);
    ctx.flood(origin, time, MessageKind::Cancellation, message);
}

/// Applies an incoming cancellation.
///
/// A stale cancellation is logged and absorbed. A fresh one whose
/// (sender, message) edge was already applied at the receiver is dropped
/// without a record; this is what stops cancellation floods in cyclic
/// graphs. Anything else cancels at the receiver and floods onward.
fn handle_recv_cancel<S: RecordSink>(
    ctx: &mut EngineContext<'_, S>,
    time: Tick,
    sender: DeviceId,
    receiver: DeviceId,
    message: &str,
) {
    let record = LogRecord::received(time, MessageKind::Cancellation, receiver, sender, message);

    if ctx.devices.is_stale(receiver, message, time) {
        ctx.metrics.stale_cancellations_absorbed += 1;
        ctx.emit(record);
        return;
    }

    if ctx.devices.has_applied_edge(receiver, sender, message) {
        ctx.metrics.duplicate_cancellations_ignored += 1;
        tracing::trace!("Device {receiver} already applied cancellation '{message}' from {sender}");
        return;
    }

    ctx.devices.record_applied_edge(receiver, sender, message);
    ctx.devices.mark_canceled(receiver, message, time);
    ctx.emit(record);
    ctx.flood(receiver, time, MessageKind::Cancellation, message);
}
