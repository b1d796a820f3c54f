// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Multi-layer personality profiling on top of the phase dispatcher.
//!
//! A [`ProfilePipeline`] registers twelve analyses across the three phases,
//! feeds them the sanitised messages, and assembles a [`ProfileReport`] from
//! whatever settled. Model-backed analyses go through a shared
//! [`ProviderCascade`], so an unreachable backend produces flagged
//! placeholder data rather than a failed task.
//!
//! ```
//! use std::sync::Arc;
//! use the_layercake::backends::{FixedBackend, ProviderBackend, ProviderCascade};
//! use the_layercake::pipeline::{PipelineOptions, ProfileInput, ProfilePipeline};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backends: Vec<Arc<dyn ProviderBackend>> = vec![Arc::new(FixedBackend::new(
//!     "offline",
//!     r#"{"bigFive": {"openness": 80, "extraversion": 40}}"#,
//! ))];
//! let pipeline = ProfilePipeline::new(ProviderCascade::new(backends), PipelineOptions::default());
//!
//! let report = pipeline.run(ProfileInput::new(["I spend weekends reading about space."])).await?;
//! assert!(report.missing_analyses.is_empty());
//! assert_eq!(report.profile["personality"]["primary"]["dominantTrait"], "openness");
//! # Ok(())
//! # }
//! ```

mod bart;
mod curation;
mod input;
mod placeholders;
mod prompts;
mod synthesis;
mod tasks;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::backends::{ProviderCascade, PLACEHOLDER_FLAG};
use crate::engine::{DispatchMetrics, Dispatcher, DispatcherOptions, EventBus, TaskReport};
use crate::errors::{ErrorHandler, ErrorHandlerOptions, ErrorSummary, PipelineError};
use crate::observability::messages::pipeline::{
    InputRejected, ProfileAborted, ProfileCompleted, ProfileStarted,
};
use crate::observability::messages::StructuredLog;
use crate::utils::duration_ms;

pub use bart::{score as bart_score, BartScore};
pub use input::{sanitize, BartData, BartRound, ProfileInput, MAX_MESSAGE_CHARS};
pub use synthesis::{build_layers, correlation, cross_correlations, synthesize, Correlation};
pub use tasks::{
    ATTACHMENT_DEFENSE, COGNITIVE_ANALYSIS, COGNITIVE_BIASES, CULTURAL_ANALYSIS, CURATION,
    DEEP_ANALYSIS, DEMOGRAPHICS, EXISTENTIAL_ANALYSIS, PSYCHOCORE_X, SHADOW_ARCHETYPES,
    SURFACE_ANALYSIS, SYNTHESIS,
};

use tasks::Analysis;

/// Cultural lens the analyses are asked to read the messages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CulturalContext {
    #[default]
    Western,
    Eastern,
    African,
}

impl CulturalContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            CulturalContext::Western => "western",
            CulturalContext::Eastern => "eastern",
            CulturalContext::African => "african",
        }
    }

    pub fn framework(&self) -> &'static str {
        match self {
            CulturalContext::Western => "Big Five / OCEAN",
            CulturalContext::Eastern => "CPAI / Ren Qing",
            CulturalContext::African => "Ubuntu",
        }
    }

    pub fn emphasis(&self) -> [&'static str; 3] {
        match self {
            CulturalContext::Western => ["individualism", "achievement", "self-expression"],
            CulturalContext::Eastern => ["collectivism", "harmony", "social roles"],
            CulturalContext::African => ["community", "interconnectedness", "shared identity"],
        }
    }

    /// The lens as attached to the personality model.
    pub fn lens(&self) -> Value {
        json!({
            "appliedFramework": self.framework(),
            "culturalEmphasis": self.emphasis(),
            "adjustedInterpretations": {},
        })
    }
}

impl fmt::Display for CulturalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub cultural_context: CulturalContext,
    /// A failed synthesis aborts the run instead of yielding an empty profile.
    pub critical_synthesis: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cultural_context: CulturalContext::default(),
            critical_synthesis: true,
        }
    }
}

/// Everything one profiling run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "duration_ms::serialize")]
    pub duration: Duration,
    pub cultural_context: CulturalContext,
    /// Every registered analysis completed.
    pub success: bool,
    pub profile: Value,
    pub recommendations: Value,
    /// The five analysis layers the profile was synthesized from.
    pub layer_results: Value,
    /// Analyses that failed and are absent from the layers.
    pub missing_analyses: Vec<String>,
    /// Analyses answered with placeholder data because no backend replied.
    pub degraded_analyses: Vec<String>,
    pub metrics: DispatchMetrics,
    pub tasks: Vec<TaskReport>,
    pub errors: ErrorSummary,
}

/// Builds and runs the profiling task graph.
///
/// The pipeline itself is immutable; every [`run`](Self::run) registers the
/// graph on a fresh dispatcher with its own error handler, so runs never
/// share state beyond the cascade (and its cache).
pub struct ProfilePipeline {
    cascade: Arc<ProviderCascade>,
    options: PipelineOptions,
    dispatcher_options: DispatcherOptions,
    error_handler_options: ErrorHandlerOptions,
    events: EventBus,
}

impl ProfilePipeline {
    /// `cascade` gains a placeholder template for every analysis.
    pub fn new(cascade: ProviderCascade, options: PipelineOptions) -> Self {
        Self {
            cascade: Arc::new(placeholders::install(cascade)),
            options,
            dispatcher_options: DispatcherOptions::default(),
            error_handler_options: ErrorHandlerOptions::default(),
            events: EventBus::new(),
        }
    }

    pub fn with_dispatcher_options(mut self, options: DispatcherOptions) -> Self {
        self.dispatcher_options = options;
        self
    }

    pub fn with_error_handler_options(mut self, options: ErrorHandlerOptions) -> Self {
        self.error_handler_options = options;
        self
    }

    /// Listeners registered here are attached to every run's dispatcher.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn dispatcher_options(&self) -> &DispatcherOptions {
        &self.dispatcher_options
    }

    pub fn cascade(&self) -> &ProviderCascade {
        &self.cascade
    }

    pub async fn run(&self, input: ProfileInput) -> Result<ProfileReport, PipelineError> {
        let started = Instant::now();
        let session_id = format!("session-{}", ulid::Ulid::new().to_string().to_lowercase());

        let prepared = input.prepare().inspect_err(|e| {
            InputRejected {
                session_id: &session_id,
                reason: &e.to_string(),
            }
            .log();
        })?;

        let start = ProfileStarted {
            session_id: &session_id,
            message_count: prepared.messages.len(),
            cultural_context: self.options.cultural_context.as_str(),
        };
        start.log();
        let span = start.span("profile_run");

        let handler = Arc::new(ErrorHandler::new(self.error_handler_options.clone()));
        let mut dispatcher = Dispatcher::new(self.dispatcher_options.clone())
            .with_events(self.events.clone())
            .with_error_handler(handler.clone());
        dispatcher.register_tasks(
            Analysis::ALL
                .into_iter()
                .map(|analysis| analysis.spec(self.cascade.clone(), &self.options)),
        )?;

        let initial = serde_json::to_value(&prepared)?;
        let result = match dispatcher.dispatch(initial).instrument(span).await {
            Ok(result) => result,
            Err(error) => {
                ProfileAborted {
                    session_id: &session_id,
                    error: &error,
                }
                .log();
                return Err(error.into());
            }
        };

        let missing_analyses: Vec<String> = Analysis::ALL
            .iter()
            .map(|a| a.name())
            .filter(|name| !result.results.contains_key(*name))
            .map(str::to_string)
            .collect();
        let degraded_analyses: Vec<String> = result
            .results
            .iter()
            .filter(|(_, value)| is_placeholder(value))
            .map(|(name, _)| name.clone())
            .collect();

        let mut results = result.results;
        let (profile, layer_results) = match results.remove(SYNTHESIS) {
            Some(mut synthesis) => (synthesis["synthesized"].take(), synthesis["allResults"].take()),
            None => (json!({}), build_layers(&results)),
        };
        let recommendations = results.remove(CURATION).unwrap_or_else(|| json!({}));

        let duration = started.elapsed();
        ProfileCompleted {
            session_id: &session_id,
            duration,
            missing: &missing_analyses,
            degraded: &degraded_analyses,
        }
        .log();

        Ok(ProfileReport {
            session_id,
            timestamp: Utc::now(),
            duration,
            cultural_context: self.options.cultural_context,
            success: result.success,
            profile,
            recommendations,
            layer_results,
            missing_analyses,
            degraded_analyses,
            metrics: result.metrics,
            tasks: result.tasks,
            errors: handler.summary(),
        })
    }
}

/// Flagged itself, or one of its top-level parts is.
fn is_placeholder(value: &Value) -> bool {
    let flagged = |v: &Value| v.get(PLACEHOLDER_FLAG).and_then(Value::as_bool) == Some(true);
    flagged(value)
        || value
            .as_object()
            .is_some_and(|fields| fields.values().any(flagged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StaticBackend;
    use crate::backends::ProviderBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MODEL_ANSWER: &str = r#"```json
{
  "emotionalTone": "curious",
  "bigFive": {"openness": 85, "conscientiousness": 55, "extraversion": 45,
              "agreeableness": 70, "neuroticism": 30},
  "dominant": "sage", "secondary": "explorer", "shadow": "ruler",
  "scores": {"sage": 90},
  "integrationLevel": 0.7
}
```"#;

    fn pipeline(backend: StaticBackend) -> ProfilePipeline {
        let backends: Vec<Arc<dyn ProviderBackend>> = vec![Arc::new(backend)];
        ProfilePipeline::new(ProviderCascade::new(backends), PipelineOptions::default())
            .with_error_handler_options(ErrorHandlerOptions {
                log_to_console: false,
                ..ErrorHandlerOptions::default()
            })
    }

    #[test]
    fn cultural_context_parses_lowercase() {
        let options: PipelineOptions =
            serde_yaml::from_str("cultural_context: eastern").unwrap();
        assert_eq!(options.cultural_context, CulturalContext::Eastern);
        assert!(options.critical_synthesis);
        assert_eq!(CulturalContext::African.lens()["appliedFramework"], "Ubuntu");
        assert!(serde_yaml::from_str::<PipelineOptions>("cultural_context: martian").is_err());
    }

    #[tokio::test]
    async fn full_run_assembles_the_report() {
        let report = pipeline(StaticBackend::ok("static", MODEL_ANSWER))
            .run(ProfileInput::new(["I read about stars", "and ask why a lot"]))
            .await
            .unwrap();

        assert!(report.success);
        assert!(report.session_id.starts_with("session-"));
        assert!(report.missing_analyses.is_empty());
        assert!(report.degraded_analyses.is_empty());
        assert_eq!(report.metrics.total_tasks, 12);
        assert_eq!(report.errors.total, 0);

        let primary = &report.profile["personality"]["primary"];
        assert_eq!(primary["dominantTrait"], "openness");
        assert_eq!(primary["archetype"], "sage");
        assert_eq!(report.profile["integratedArchetype"]["integrationLevel"], 70.0);

        assert_eq!(report.layer_results["surface"]["emotionalTone"], "curious");
        assert_eq!(report.layer_results["middle"]["bartRisk"]["score"], 5);
        assert_eq!(
            report.layer_results["deep"]["attachmentStyle"]["primaryStyle"],
            "avoidant"
        );
        // The model answer carries no curation sections
        assert_eq!(report.recommendations["films"][0]["title"], "Interstellar");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["duration_ms"].is_u64());
        assert_eq!(json["cultural_context"], "western");
    }

    #[tokio::test]
    async fn outage_degrades_but_completes() {
        let report = pipeline(StaticBackend::failing("down"))
            .run(ProfileInput::new(["hello"]))
            .await
            .unwrap();

        assert!(report.success);
        assert!(report.missing_analyses.is_empty());
        assert_eq!(
            report.degraded_analyses,
            vec![
                COGNITIVE_ANALYSIS,
                COGNITIVE_BIASES,
                CULTURAL_ANALYSIS,
                DEEP_ANALYSIS,
                EXISTENTIAL_ANALYSIS,
                PSYCHOCORE_X,
                SHADOW_ARCHETYPES,
                SURFACE_ANALYSIS,
            ]
        );
        // Placeholder scores still drive the synthesis
        assert_eq!(
            report.profile["personality"]["primary"]["dominantTrait"],
            "agreeableness"
        );
    }

    #[tokio::test]
    async fn extreme_bart_rounds_keep_psychocore_in_the_report() {
        let bart = BartData {
            rounds: vec![
                BartRound { pumps: u32::MAX, exploded: false },
                BartRound { pumps: 10, exploded: false },
            ],
        };
        let report = pipeline(StaticBackend::ok("static", MODEL_ANSWER))
            .run(ProfileInput::new(["hello there"]).with_bart(bart))
            .await
            .unwrap();

        assert!(report.missing_analyses.is_empty());
        assert_eq!(report.layer_results["middle"]["bartRisk"]["score"], 9);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_dispatch() {
        let backend = Arc::new(StaticBackend::ok("static", "{}"));
        let backends: Vec<Arc<dyn ProviderBackend>> = vec![backend.clone()];
        let pipeline =
            ProfilePipeline::new(ProviderCascade::new(backends), PipelineOptions::default());

        let err = pipeline.run(ProfileInput::new(["  "])).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn listeners_are_attached_to_every_run() {
        let completed = Arc::new(AtomicUsize::new(0));
        let mut pipeline = pipeline(StaticBackend::ok("static", "{}"));
        let counter = completed.clone();
        pipeline.events_mut().on_task_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let first = pipeline.run(ProfileInput::new(["one"])).await.unwrap();
        let second = pipeline.run(ProfileInput::new(["two"])).await.unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 24);
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn placeholder_detection_looks_one_level_deep() {
        assert!(is_placeholder(&json!({"_placeholder": true})));
        assert!(is_placeholder(&json!({"archetypes": {"_placeholder": true}})));
        assert!(!is_placeholder(&json!({"archetypes": {"dominant": "sage"}})));
        assert!(!is_placeholder(&json!([{"_placeholder": true}])));
    }
}
