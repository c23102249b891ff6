use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters accumulated by the interaction controller.
#[derive(Debug, Default, Clone)]
pub struct InteractionMetrics {
    sessions: u64,
    samples: u64,
    invalid_samples: u64,
    reflows: u64,
    reflow_passes: u64,
    cap_exhausted: u64,
    commits: u64,
    cancellations: u64,
}

impl InteractionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_session(&mut self) {
        self.sessions = self.sessions.saturating_add(1);
    }

    pub fn record_sample(&mut self, valid: bool) {
        self.samples = self.samples.saturating_add(1);
        if !valid {
            self.invalid_samples = self.invalid_samples.saturating_add(1);
        }
    }

    pub fn record_reflow(&mut self, passes: usize, converged: bool) {
        self.reflows = self.reflows.saturating_add(1);
        self.reflow_passes = self.reflow_passes.saturating_add(passes as u64);
        if !converged {
            self.cap_exhausted = self.cap_exhausted.saturating_add(1);
        }
    }

    pub fn record_commit(&mut self) {
        self.commits = self.commits.saturating_add(1);
    }

    pub fn record_cancel(&mut self) {
        self.cancellations = self.cancellations.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            sessions: self.sessions,
            samples: self.samples,
            invalid_samples: self.invalid_samples,
            reflows: self.reflows,
            reflow_passes: self.reflow_passes,
            cap_exhausted: self.cap_exhausted,
            commits: self.commits,
            cancellations: self.cancellations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub sessions: u64,
    pub samples: u64,
    pub invalid_samples: u64,
    pub reflows: u64,
    pub reflow_passes: u64,
    pub cap_exhausted: u64,
    pub commits: u64,
    pub cancellations: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("sessions".to_string(), json!(self.sessions));
        map.insert("samples".to_string(), json!(self.samples));
        map.insert("invalid_samples".to_string(), json!(self.invalid_samples));
        map.insert("reflows".to_string(), json!(self.reflows));
        map.insert("reflow_passes".to_string(), json!(self.reflow_passes));
        map.insert("cap_exhausted".to_string(), json!(self.cap_exhausted));
        map.insert("commits".to_string(), json!(self.commits));
        map.insert("cancellations".to_string(), json!(self.cancellations));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "interaction_metrics", self.as_fields())
    }
}
