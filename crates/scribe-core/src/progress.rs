//! Progress channel - ordered, timestamped log events for live listeners
//!
//! Every component of a run writes here instead of stdout. Delivery is
//! best-effort: listeners that subscribe after a run starts only see events
//! emitted from that point on, and a listener that falls too far behind skips
//! the oldest events.
//!
//! Each event is also mirrored to `tracing` so runs without listeners still
//! leave a log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events kept for slow listeners before they start lagging
const DEFAULT_CAPACITY: usize = 1024;

/// Severity/category of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Orchestration milestones
    Info,
    /// Role activity and final role outputs
    Agent,
    /// Model reasoning preceding a tool call
    Thought,
    /// Tool output returned to a role
    Observation,
    /// Absorbed failures
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Agent => write!(f, "AGENT"),
            LogLevel::Thought => write!(f, "THOUGHT"),
            LogLevel::Observation => write!(f, "OBSERVATION"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A single progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for LogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {:<11} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Cloneable handle for emitting progress events
///
/// Clones share the same channel. Emitting never blocks and never fails,
/// including when nobody is listening.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: broadcast::Sender<LogEvent>,
}

impl ProgressSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new listener. It receives events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.sender.subscribe()
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        let event = LogEvent::new(level, message);

        match event.level {
            LogLevel::Error => tracing::warn!("{}", event.message),
            LogLevel::Thought | LogLevel::Observation => tracing::debug!("{}", event.message),
            LogLevel::Info | LogLevel::Agent => tracing::info!("{}", event.message),
        }

        // No listeners is not an error
        let _ = self.sender.send(event);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    pub fn agent(&self, message: impl Into<String>) {
        self.emit(LogLevel::Agent, message);
    }

    pub fn thought(&self, message: impl Into<String>) {
        self.emit(LogLevel::Thought, message);
    }

    pub fn observation(&self, message: impl Into<String>) {
        self.emit(LogLevel::Observation, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_listeners_is_silent() {
        let sink = ProgressSink::new();
        assert_eq!(sink.listener_count(), 0);
        sink.info("nobody hears this");
    }

    #[test]
    fn test_events_arrive_in_order() {
        let sink = ProgressSink::new();
        let mut rx = sink.subscribe();

        sink.info("first");
        sink.thought("second");
        sink.error("third");

        let levels: Vec<_> = (0..3).map(|_| rx.try_recv().unwrap()).collect();
        assert_eq!(levels[0].message, "first");
        assert_eq!(levels[0].level, LogLevel::Info);
        assert_eq!(levels[1].level, LogLevel::Thought);
        assert_eq!(levels[2].level, LogLevel::Error);
        assert!(levels[0].timestamp <= levels[2].timestamp);
    }

    #[test]
    fn test_late_listener_misses_earlier_events() {
        let sink = ProgressSink::new();
        sink.info("before");

        let mut rx = sink.subscribe();
        sink.info("after");

        assert_eq!(rx.try_recv().unwrap().message, "after");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_channel() {
        let sink = ProgressSink::new();
        let mut rx = sink.subscribe();
        let clone = sink.clone();

        clone.agent("from clone");
        assert_eq!(rx.try_recv().unwrap().level, LogLevel::Agent);
    }

    #[test]
    fn test_level_serializes_uppercase() {
        let event = LogEvent::new(LogLevel::Observation, "out");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["level"], "OBSERVATION");
        assert_eq!(json["message"], "out");
    }
}
