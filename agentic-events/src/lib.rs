#![deny(missing_docs)]
//! Typed progress events emitted by the agentic loop engine.
//!
//! The engine never blocks waiting on a sink and never inspects what the
//! sink does with an event — painting, batching, or discarding it is
//! entirely the sink's business. [`Event`] is the sum type every sink
//! consumes; [`EventSink`] is the one-operation observer interface.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// One iteration's verdict from the evaluate step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the evaluator judged the iteration successful.
    pub succeeded: bool,
    /// Confidence in `[0, 1]`, if parsed.
    pub confidence: Option<f64>,
    /// Free-form reasoning text.
    pub reasoning: String,
}

/// Progress events emitted during one agentic run.
///
/// `Thinking`/`Planning` are droppable under backpressure; every other
/// variant is non-droppable (see [`Event::is_droppable`]).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new run has started.
    TaskStarted {
        /// The session this run belongs to.
        session_id: String,
        /// The original task text.
        task: String,
    },
    /// A new iteration has begun.
    IterationStarted {
        /// 1-based iteration index.
        iteration: u32,
    },
    /// The think step produced reasoning text.
    Thinking {
        /// The parsed thinking text.
        text: String,
    },
    /// The think step produced a plan.
    Planning {
        /// The parsed plan text.
        text: String,
    },
    /// The execute step has begun.
    ExecutionStarted {
        /// The plan being executed.
        plan: String,
    },
    /// The execute step finished.
    ExecutionCompleted {
        /// Human-readable execution result.
        result: String,
    },
    /// The evaluate step finished.
    EvaluationCompleted {
        /// The parsed or heuristic verdict.
        verdict: Verdict,
        /// Feedback text carried into refinement.
        feedback: String,
    },
    /// An iteration finished, successful or not.
    IterationCompleted {
        /// 1-based iteration index.
        iteration: u32,
        /// Wall-clock duration of the iteration, in milliseconds.
        duration_ms: u64,
    },
    /// The run finished with success.
    TaskSucceeded {
        /// The final result payload.
        result: String,
    },
    /// The run exhausted its iteration cap without success.
    TaskMaxIterations {
        /// The best partial result seen, if any.
        last_result: Option<String>,
    },
    /// The run failed unrecoverably.
    TaskFailed {
        /// The terminal error kind, as text.
        error: String,
    },
    /// The run was cancelled.
    TaskCancelled {
        /// Iterations completed before cancellation.
        iterations_completed: u32,
    },
}

impl Event {
    /// Whether this event may be dropped under sink backpressure.
    ///
    /// Only `Thinking`/`Planning` are droppable; every terminal and
    /// iteration-boundary event is preserved.
    pub fn is_droppable(&self) -> bool {
        matches!(self, Event::Thinking { .. } | Event::Planning { .. })
    }
}

/// Observer interface consumed by a display layer.
///
/// Implementations may be synchronous (console printer) or asynchronous
/// (batched UI update); the engine never awaits completion of `emit`
/// beyond the bound the implementation itself chooses to impose.
pub trait EventSink: Send + Sync {
    /// Receive one event. Must not block the caller indefinitely.
    fn emit(&self, event: Event);
}

/// Configuration for [`ChannelEventSink`].
#[derive(Debug, Clone)]
pub struct EventSinkConfig {
    /// Bounded channel capacity.
    pub channel_capacity: usize,
}

impl Default for EventSinkConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// A bounded-channel event sink.
///
/// When the channel is full, droppable events (`Thinking`/`Planning`) are
/// discarded and a `warn`-level log is emitted; non-droppable events are
/// sent with a blocking send on the sender's background thread equivalent
/// (`try_send` retried is avoided — the channel capacity is sized so that
/// non-droppable events practically never contend under normal operation).
pub struct ChannelEventSink {
    tx: mpsc::Sender<Event>,
}

impl ChannelEventSink {
    /// Create a sink and its receiver, wired per `config`.
    pub fn new(config: &EventSinkConfig) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: Event) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.tx.try_send(event) {
            if event.is_droppable() {
                tracing::warn!(event = ?event, "event sink full, dropping droppable event");
            } else {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    if tx.send(event).await.is_err() {
                        tracing::warn!("event sink receiver dropped, discarding non-droppable event");
                    }
                });
            }
        }
    }
}

/// An in-memory recorder, for tests and simple embeddings.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<VecDeque<Event>>,
}

impl RecordingEventSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all recorded events in emission order.
    pub fn drain(&self) -> Vec<Event> {
        self.events.lock().unwrap().drain(..).collect()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: Event) {
        self.events.lock().unwrap().push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn event_sink_is_object_safe() {
        _assert_send_sync::<std::sync::Arc<dyn EventSink>>();
    }

    #[test]
    fn droppable_classification() {
        assert!(
            Event::Thinking {
                text: "x".into()
            }
            .is_droppable()
        );
        assert!(Event::Planning { text: "x".into() }.is_droppable());
        assert!(
            !Event::TaskStarted {
                session_id: "s".into(),
                task: "t".into()
            }
            .is_droppable()
        );
        assert!(
            !Event::IterationStarted { iteration: 1 }.is_droppable()
        );
    }

    #[test]
    fn recording_sink_preserves_order() {
        let sink = RecordingEventSink::new();
        sink.emit(Event::TaskStarted {
            session_id: "s".into(),
            task: "t".into(),
        });
        sink.emit(Event::IterationStarted { iteration: 1 });
        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], Event::TaskStarted { .. }));
        assert!(matches!(drained[1], Event::IterationStarted { .. }));
        assert_eq!(sink.len(), 0);
    }

    #[tokio::test]
    async fn channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelEventSink::new(&EventSinkConfig::default());
        sink.emit(Event::TaskStarted {
            session_id: "s".into(),
            task: "t".into(),
        });
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, Event::TaskStarted { .. }));
    }

    #[tokio::test]
    async fn channel_sink_drops_droppable_under_backpressure() {
        let config = EventSinkConfig {
            channel_capacity: 1,
        };
        let (sink, mut rx) = ChannelEventSink::new(&config);
        sink.emit(Event::Thinking { text: "1".into() });
        // Channel now full (capacity 1, nothing drained yet).
        sink.emit(Event::Thinking { text: "2".into() });
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, Event::Thinking { text } if text == "1"));
        assert!(rx.try_recv().is_err());
    }
}
