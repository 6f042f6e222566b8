use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Commands by action and outcome
// - Validation rejections by rule
// - Events appended to the ledger
// - Command latency
//
// The registry is owned here; `render` produces the text exposition format.
// ============================================================================

/// Central metrics registry for the service
pub struct Metrics {
    registry: Registry,

    pub commands_total: IntCounterVec,
    pub validation_rejections: IntCounterVec,
    pub events_appended: IntCounterVec,
    pub command_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands_total = IntCounterVec::new(
            Opts::new("provenance_commands_total", "Total commands handled"),
            &["action", "outcome"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let validation_rejections = IntCounterVec::new(
            Opts::new("provenance_validation_rejections_total", "Proposed events rejected by a rule"),
            &["action", "rule"],
        )?;
        registry.register(Box::new(validation_rejections.clone()))?;

        let events_appended = IntCounterVec::new(
            Opts::new("provenance_events_appended_total", "Events appended to the ledger"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_appended.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("provenance_command_duration_seconds", "Command handling duration")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["action"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            validation_rejections,
            events_appended,
            command_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a handled command
    pub fn record_command(&self, action: &str, outcome: &str, duration_secs: f64) {
        self.commands_total.with_label_values(&[action, outcome]).inc();
        self.command_duration.with_label_values(&[action]).observe(duration_secs);
    }

    pub fn record_rejection(&self, action: &str, rule: &str) {
        self.validation_rejections.with_label_values(&[action, rule]).inc();
    }

    pub fn record_appended(&self, event_type: &str) {
        self.events_appended.with_label_values(&[event_type]).inc();
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
