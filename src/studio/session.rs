use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::llm::media::{detect_mime_type, normalize_gemini_mime_type, prepare_source_image};
use crate::llm::{GeneratedImage, GenerationRequest, ImageService, SourceImage};
use crate::studio::caption::{start_caption_ticker, SharedCaption};
use crate::studio::error::{classify_service_failure, StudioError};
use crate::studio::options::{HeadshotConfig, PersistedConfig, PersistedState, Theme};
use crate::studio::prompt::{compile, ASPECT_RATIO};
use crate::utils::timing::{complete_generation_timer, start_generation_timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    InFlight,
    Succeeded(GeneratedImage),
    Failed(StudioError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// No source photo has been uploaded; nothing happened.
    MissingSource,
    /// A generation is already running; no request was sent.
    AlreadyInFlight,
    Completed(Result<GeneratedImage, StudioError>),
}

/// Compiles the prompt and performs exactly one call to `service`.
pub async fn generate(
    service: &dyn ImageService,
    source: &SourceImage,
    config: &HeadshotConfig,
) -> Result<GeneratedImage, StudioError> {
    let request = GenerationRequest {
        image: source.clone(),
        prompt: compile(config),
        aspect_ratio: ASPECT_RATIO.to_string(),
    };

    let response = service.generate_content(request).await.map_err(|failure| {
        warn!("{} image service failed: {}", service.name(), failure);
        classify_service_failure(&failure)
    })?;

    let Some(inline) = response.first_inline_image() else {
        warn!(
            "{} responded with {} candidate(s) but no inline image",
            service.name(),
            response.candidates.len()
        );
        return Err(StudioError::NoImagePayload);
    };

    let bytes = general_purpose::STANDARD
        .decode(inline.data.trim())
        .map_err(|err| {
            StudioError::ServiceError(format!("Image payload was not valid base64: {err}"))
        })?;
    if bytes.is_empty() {
        return Err(StudioError::NoImagePayload);
    }

    let mime_type = if inline.mime_type.trim().is_empty() {
        detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string())
    } else {
        normalize_gemini_mime_type(&inline.mime_type)
    };

    Ok(GeneratedImage { bytes, mime_type })
}

#[derive(Debug)]
struct SessionState {
    config: HeadshotConfig,
    theme: Theme,
    source: Option<SourceImage>,
    phase: GenerationPhase,
    last_result: Option<GeneratedImage>,
    generation_count: u64,
}

impl SessionState {
    fn snapshot(&self) -> PersistedState {
        PersistedState {
            config: PersistedConfig::from(&self.config),
            theme: self.theme,
        }
    }
}

// Puts the session back to Idle if the in-flight future is dropped before it settles.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    settled: bool,
}

impl InFlightGuard<'_> {
    fn settle(mut self, phase: GenerationPhase) {
        let mut state = self.state.lock();
        if let GenerationPhase::Succeeded(image) = &phase {
            state.last_result = Some(image.clone());
        }
        state.phase = phase;
        drop(state);
        self.settled = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.state.lock();
        if state.phase == GenerationPhase::InFlight {
            warn!("Generation dropped before it settled; returning to idle");
            state.phase = GenerationPhase::Idle;
        }
    }
}

/// One studio session: the current options, the uploaded photo and the lifecycle of
/// the single generation that may be running.
pub struct Studio {
    service: Arc<dyn ImageService>,
    state: Mutex<SessionState>,
    caption: SharedCaption,
    caption_interval: Duration,
}

impl Studio {
    /// Starts a session from persisted state. A record that fails validation is
    /// replaced by the defaults.
    pub fn new(
        service: Arc<dyn ImageService>,
        persisted: &PersistedState,
        caption_interval: Duration,
    ) -> Self {
        let config = match HeadshotConfig::try_from(&persisted.config) {
            Ok(config) => config,
            Err(err) => {
                warn!("Ignoring saved studio settings: {}", err);
                HeadshotConfig::default()
            }
        };

        Self {
            service,
            state: Mutex::new(SessionState {
                config,
                theme: persisted.theme,
                source: None,
                phase: GenerationPhase::Idle,
                last_result: None,
                generation_count: 0,
            }),
            caption: Arc::new(Mutex::new(None)),
            caption_interval,
        }
    }

    pub fn config(&self) -> HeadshotConfig {
        self.state.lock().config.clone()
    }

    #[allow(dead_code)]
    pub fn theme(&self) -> Theme {
        self.state.lock().theme
    }

    #[allow(dead_code)]
    pub fn phase(&self) -> GenerationPhase {
        self.state.lock().phase.clone()
    }

    /// Most recent successful portrait. Survives later failed or abandoned attempts.
    #[allow(dead_code)]
    pub fn last_result(&self) -> Option<GeneratedImage> {
        self.state.lock().last_result.clone()
    }

    #[allow(dead_code)]
    pub fn is_in_flight(&self) -> bool {
        self.state.lock().phase == GenerationPhase::InFlight
    }

    #[allow(dead_code)]
    pub fn has_source(&self) -> bool {
        self.state.lock().source.is_some()
    }

    pub fn caption(&self) -> Option<String> {
        self.caption.lock().clone()
    }

    pub fn snapshot(&self) -> PersistedState {
        self.state.lock().snapshot()
    }

    /// Replaces the options wholesale and returns the record to persist.
    pub fn update_config(&self, config: HeadshotConfig) -> PersistedState {
        let mut state = self.state.lock();
        if state.config != config {
            debug!("Studio options updated: {:?}", config);
        }
        state.config = config;
        state.snapshot()
    }

    pub fn toggle_theme(&self) -> PersistedState {
        let mut state = self.state.lock();
        state.theme = state.theme.toggled();
        state.snapshot()
    }

    pub fn upload_source(&self, bytes: Vec<u8>) -> Result<(), StudioError> {
        let source = prepare_source_image(bytes)?;
        info!(
            "Source photo uploaded ({} bytes, {})",
            source.bytes.len(),
            source.mime_type
        );
        self.state.lock().source = Some(source);
        Ok(())
    }

    pub async fn trigger_generate(&self) -> TriggerOutcome {
        let (source, config, generation_id) = {
            let mut state = self.state.lock();
            if state.phase == GenerationPhase::InFlight {
                info!("Generation already in flight; ignoring trigger");
                return TriggerOutcome::AlreadyInFlight;
            }
            let Some(source) = state.source.clone() else {
                debug!("Generate triggered without a source photo");
                return TriggerOutcome::MissingSource;
            };
            state.phase = GenerationPhase::InFlight;
            state.generation_count += 1;
            (source, state.config.clone(), state.generation_count)
        };

        let guard = InFlightGuard {
            state: &self.state,
            settled: false,
        };
        let mut timer = start_generation_timer(generation_id, &config, source.bytes.len());
        let ticker = start_caption_ticker(self.caption.clone(), self.caption_interval);

        let result = generate(self.service.as_ref(), &source, &config).await;
        ticker.stop();

        let phase = match &result {
            Ok(image) => {
                complete_generation_timer(
                    &mut timer,
                    "success",
                    Some(format!("bytes={} mime={}", image.bytes.len(), image.mime_type)),
                );
                GenerationPhase::Succeeded(image.clone())
            }
            Err(err) => {
                complete_generation_timer(&mut timer, "error", Some(err.to_string()));
                GenerationPhase::Failed(err.clone())
            }
        };
        guard.settle(phase);

        TriggerOutcome::Completed(result)
    }
}
