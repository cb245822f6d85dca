use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::studio::options::{Choice, HeadshotConfig};

pub const TIMING_TARGET: &str = "studio.timing";

/// Logs the start and end of one generation attempt on the timing target.
#[derive(Debug)]
pub struct GenerationTimer {
    generation_id: u64,
    template: &'static str,
    background: &'static str,
    source_bytes: usize,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl GenerationTimer {
    pub fn new(generation_id: u64, config: &HeadshotConfig, source_bytes: usize) -> Self {
        GenerationTimer {
            generation_id,
            template: config.template.slug(),
            background: config.background_type.slug(),
            source_bytes,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_started(&self) {
        info!(
            target: TIMING_TARGET,
            "event=generation_started generation_id={} template={} background={} source_bytes={} started_at={}",
            self.generation_id,
            self.template,
            self.background,
            self.source_bytes,
            self.started_at.to_rfc3339()
        );
    }

    /// No effect once completion has been logged.
    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        if self.completed {
            return;
        }
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=generation_completed generation_id={} template={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.generation_id,
            self.template,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

impl Drop for GenerationTimer {
    fn drop(&mut self) {
        if !self.completed {
            self.mark_status("aborted", None);
            self.log_completed();
        }
    }
}

pub fn start_generation_timer(
    generation_id: u64,
    config: &HeadshotConfig,
    source_bytes: usize,
) -> GenerationTimer {
    let timer = GenerationTimer::new(generation_id, config, source_bytes);
    timer.log_started();
    timer
}

pub fn complete_generation_timer(
    timer: &mut GenerationTimer,
    status: &str,
    detail: Option<String>,
) {
    timer.mark_status(status, detail);
    timer.log_completed();
}

pub async fn log_llm_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: TIMING_TARGET,
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}
