use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::CONFIG;
use crate::llm::gemini::GEMINI_LOG_TARGET;
use crate::utils::timing::TIMING_TARGET;

pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

// Gemini payload summaries are noisy, so they follow their own switch instead of
// LOG_LEVEL. Timing events only ever go to the timing files.
fn studio_filter(general_level: LevelFilter, gemini_payloads: bool) -> Targets {
    let gemini_level = if gemini_payloads {
        LevelFilter::DEBUG
    } else {
        general_level.min(LevelFilter::INFO)
    };
    Targets::new()
        .with_default(general_level)
        .with_target(TIMING_TARGET, LevelFilter::OFF)
        .with_target(GEMINI_LOG_TARGET, gemini_level)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
}

fn timing_filter() -> Targets {
    Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(TIMING_TARGET, LevelFilter::INFO)
}

fn daily_writer(dir: &Path, file_name: &str, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let appender = tracing_appender::rolling::daily(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    guards.push(guard);
    writer
}

/// Console output goes to stderr so `prompt` can print to stdout untouched.
pub fn init_logging() -> LoggingGuards {
    let logs_dir = CONFIG.log_dir.as_path();
    if let Err(err) = fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory {}: {err}", logs_dir.display());
    }

    let mut guards = Vec::with_capacity(4);
    let studio_writer = daily_writer(logs_dir, "studio.log", &mut guards);
    let timing_writer = daily_writer(logs_dir, "timing.log", &mut guards);
    let studio_json_writer = daily_writer(logs_dir, "studio.jsonl", &mut guards);
    let timing_json_writer = daily_writer(logs_dir, "timing.jsonl", &mut guards);

    let general = studio_filter(parse_log_level(&CONFIG.log_level), CONFIG.gemini_log_payloads);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(studio_writer)
                .with_ansi(false)
                .with_filter(general.clone()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(general.clone()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(timing_writer)
                .with_ansi(false)
                .with_filter(timing_filter()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(studio_json_writer)
                .with_filter(general),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(timing_json_writer)
                .with_filter(timing_filter()),
        )
        .init();

    LoggingGuards { _guards: guards }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn log_level_names_are_forgiving() {
        assert_eq!(parse_log_level(" DEBUG "), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("warning"), LevelFilter::WARN);
        assert_eq!(parse_log_level("verbose"), LevelFilter::INFO);
    }

    #[test]
    fn gemini_payloads_have_their_own_switch() {
        let quiet = studio_filter(LevelFilter::DEBUG, false);
        assert!(quiet.would_enable("headshot_studio::studio", &Level::DEBUG));
        assert!(!quiet.would_enable(GEMINI_LOG_TARGET, &Level::DEBUG));
        assert!(quiet.would_enable(GEMINI_LOG_TARGET, &Level::INFO));

        let loud = studio_filter(LevelFilter::INFO, true);
        assert!(loud.would_enable(GEMINI_LOG_TARGET, &Level::DEBUG));
        assert!(!loud.would_enable("headshot_studio::studio", &Level::DEBUG));
    }

    #[test]
    fn timing_events_stay_out_of_the_studio_log() {
        let general = studio_filter(LevelFilter::TRACE, true);
        assert!(!general.would_enable(TIMING_TARGET, &Level::INFO));
        assert!(timing_filter().would_enable(TIMING_TARGET, &Level::INFO));
        assert!(!timing_filter().would_enable(GEMINI_LOG_TARGET, &Level::WARN));
    }
}
