use std::collections::HashMap;
use std::time::Instant;

/// Observer for alignment and caption-building events.
///
/// Use cases report through this trait instead of printing, so the CLI can
/// summarize a run while tests stay silent.
pub trait PipelineLogger: Send {
    /// Record how long a named step took.
    fn timing(&mut self, step: &str, duration_ms: f64);

    /// Record a count or measurement (word count, segment count, ...).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Log a step that failed and was skipped.
    fn warn(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _step: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
}

/// CLI logger: forwards messages to the `log` facade and keeps per-step
/// timings and metrics for a summary at the end of the run.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, f64>,
    start_time: Instant,
    warnings: usize,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            warnings: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Pipeline summary ({elapsed_s:.1}s total):")];

        let mut steps: Vec<_> = self.timings.keys().collect();
        steps.sort();
        for step in steps {
            let durations = &self.timings[step];
            let total_ms: f64 = durations.iter().sum();
            let attempts = durations.len();
            lines.push(format!(
                "  {step:18}: {total_ms:8.0}ms  ({attempts} attempt{})",
                if attempts == 1 { "" } else { "s" }
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: {}", self.metrics[name]));
        }

        if self.warnings > 0 {
            lines.push(format!("  {} step(s) failed and were skipped", self.warnings));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, step: &str) -> Option<&[f64]> {
        self.timings.get(step).map(|v| v.as_slice())
    }

    pub fn metric_value(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn timing(&mut self, step: &str, duration_ms: f64) {
        self.timings
            .entry(step.to_string())
            .or_default()
            .push(duration_ms);
    }

    /// Latest value wins.
    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        self.warnings += 1;
        log::warn!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
