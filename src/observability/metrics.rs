//! Reload metrics.
//!
//! # Metrics
//! - `dyte_config_events_total` (counter): resolved config events by outcome
//! - `dyte_reloads_total` (counter): server replacements by result
//! - `dyte_active_port` (gauge): port of the active instance

/// Outcome label for `dyte_config_events_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Unchanged,
    Reloaded,
    Rejected,
    Ignored,
}

impl EventOutcome {
    fn as_str(self) -> &'static str {
        match self {
            EventOutcome::Unchanged => "unchanged",
            EventOutcome::Reloaded => "reloaded",
            EventOutcome::Rejected => "rejected",
            EventOutcome::Ignored => "ignored",
        }
    }
}

pub fn record_config_event(outcome: EventOutcome) {
    ::metrics::counter!("dyte_config_events_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    ::metrics::counter!("dyte_reloads_total", "result" => result).increment(1);
}

pub fn set_active_port(port: u16) {
    ::metrics::gauge!("dyte_active_port").set(f64::from(port));
}
