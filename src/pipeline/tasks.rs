// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The profiling task graph.
//!
//! Phase 1 reads only the user's messages. Phase 2 builds on phase 1's
//! results. The synthesis phase folds everything into the final profile and
//! its recommendations.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::curation::{self, DEFAULT_ARCHETYPE};
use super::input::PreparedInput;
use super::synthesis::{build_layers, spread, synthesize, text};
use super::{bart, placeholders, prompts, CulturalContext, PipelineOptions};
use crate::backends::ProviderCascade;
use crate::engine::{ExecutionContext, Phase, Priority, TaskSpec};
use crate::errors::Severity;
use crate::traits::TaskExecutor;

pub const SURFACE_ANALYSIS: &str = "surface_analysis";
pub const CULTURAL_ANALYSIS: &str = "cultural_analysis";
pub const PSYCHOCORE_X: &str = "psychocore_x";
pub const DEMOGRAPHICS: &str = "demographics";
pub const DEEP_ANALYSIS: &str = "deep_analysis";
pub const COGNITIVE_ANALYSIS: &str = "cognitive_analysis";
pub const SHADOW_ARCHETYPES: &str = "shadow_archetypes";
pub const EXISTENTIAL_ANALYSIS: &str = "existential_analysis";
pub const ATTACHMENT_DEFENSE: &str = "attachment_defense";
pub const COGNITIVE_BIASES: &str = "cognitive_biases";
pub const SYNTHESIS: &str = "synthesis";
pub const CURATION: &str = "curation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Analysis {
    Surface,
    Cultural,
    PsychoCore,
    Demographics,
    Deep,
    Cognitive,
    ShadowArchetypes,
    Existential,
    AttachmentDefense,
    CognitiveBiases,
    Synthesis,
    Curation,
}

impl Analysis {
    /// Registration order. Dependencies always precede their dependents.
    pub(crate) const ALL: [Analysis; 12] = [
        Analysis::Surface,
        Analysis::Cultural,
        Analysis::PsychoCore,
        Analysis::Demographics,
        Analysis::Deep,
        Analysis::Cognitive,
        Analysis::ShadowArchetypes,
        Analysis::Existential,
        Analysis::AttachmentDefense,
        Analysis::CognitiveBiases,
        Analysis::Synthesis,
        Analysis::Curation,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Analysis::Surface => SURFACE_ANALYSIS,
            Analysis::Cultural => CULTURAL_ANALYSIS,
            Analysis::PsychoCore => PSYCHOCORE_X,
            Analysis::Demographics => DEMOGRAPHICS,
            Analysis::Deep => DEEP_ANALYSIS,
            Analysis::Cognitive => COGNITIVE_ANALYSIS,
            Analysis::ShadowArchetypes => SHADOW_ARCHETYPES,
            Analysis::Existential => EXISTENTIAL_ANALYSIS,
            Analysis::AttachmentDefense => ATTACHMENT_DEFENSE,
            Analysis::CognitiveBiases => COGNITIVE_BIASES,
            Analysis::Synthesis => SYNTHESIS,
            Analysis::Curation => CURATION,
        }
    }

    fn phase(self) -> Phase {
        match self {
            Analysis::Surface | Analysis::Cultural | Analysis::PsychoCore | Analysis::Demographics => {
                Phase::Phase1
            }
            Analysis::Synthesis | Analysis::Curation => Phase::Synthesis,
            _ => Phase::Phase2,
        }
    }

    fn priority(self) -> Priority {
        match self {
            Analysis::Surface | Analysis::PsychoCore | Analysis::Deep | Analysis::Synthesis => {
                Priority::CRITICAL
            }
            Analysis::Cultural
            | Analysis::Cognitive
            | Analysis::ShadowArchetypes
            | Analysis::Curation => Priority::HIGH,
            Analysis::Demographics | Analysis::Existential | Analysis::AttachmentDefense => {
                Priority::MEDIUM
            }
            Analysis::CognitiveBiases => Priority::LOW,
        }
    }

    fn timeout(self) -> Duration {
        let seconds = match self {
            Analysis::Surface => 30,
            Analysis::Cultural => 25,
            Analysis::PsychoCore => 35,
            Analysis::Demographics => 5,
            Analysis::Deep => 40,
            Analysis::Cognitive => 35,
            Analysis::ShadowArchetypes => 30,
            Analysis::Existential => 30,
            Analysis::AttachmentDefense => 10,
            Analysis::CognitiveBiases => 15,
            Analysis::Synthesis => 20,
            Analysis::Curation => 25,
        };
        Duration::from_secs(seconds)
    }

    fn depends_on(self) -> &'static [&'static str] {
        match self {
            Analysis::Deep | Analysis::Cognitive | Analysis::Existential => {
                &[SURFACE_ANALYSIS, PSYCHOCORE_X]
            }
            Analysis::ShadowArchetypes => &[SURFACE_ANALYSIS],
            Analysis::AttachmentDefense => &[PSYCHOCORE_X],
            _ => &[],
        }
    }

    /// Build the registration spec for this analysis.
    pub(crate) fn spec(self, cascade: Arc<ProviderCascade>, options: &PipelineOptions) -> TaskSpec {
        let mut spec = TaskSpec::new(
            self.name(),
            AnalysisTask {
                analysis: self,
                cascade,
                culture: options.cultural_context,
            },
        )
        .phase(self.phase())
        .priority(self.priority())
        .timeout(self.timeout())
        .depends_on(self.depends_on().iter().copied());

        if self == Analysis::Synthesis && options.critical_synthesis {
            spec = spec.severity(Severity::Critical);
        }
        spec
    }
}

/// Executor shared by every analysis; `analysis` selects the work.
struct AnalysisTask {
    analysis: Analysis,
    cascade: Arc<ProviderCascade>,
    culture: CulturalContext,
}

#[async_trait]
impl TaskExecutor for AnalysisTask {
    async fn execute(&self, ctx: ExecutionContext) -> anyhow::Result<Value> {
        let input: PreparedInput = ctx
            .input_as()
            .context("pipeline input is not a prepared profile input")?;
        let culture = self.culture;
        let prior = |name: &str| ctx.previous_result(name);

        let value = match self.analysis {
            Analysis::Surface => {
                self.ask(placeholders::SURFACE, prompts::surface(&input, culture))
                    .await
            }
            Analysis::Cultural => {
                self.ask(placeholders::CULTURAL, prompts::cultural(&input, culture))
                    .await
            }
            Analysis::PsychoCore => {
                let answer = self
                    .ask(placeholders::PSYCHOCORE, prompts::psychocore(&input, culture))
                    .await;
                let mut fields = object_or_wrapped(answer);
                fields.insert(
                    "bartRisk".into(),
                    serde_json::to_value(bart::score(input.bart.as_ref()))?,
                );
                fields.insert("culturalAdaptation".into(), culture.lens());
                Value::Object(fields)
            }
            Analysis::Demographics => demographics(&input),
            Analysis::Deep => {
                let prompt =
                    prompts::deep(&input, culture, prior(SURFACE_ANALYSIS), prior(PSYCHOCORE_X));
                self.ask(placeholders::DEEP, prompt).await
            }
            Analysis::Cognitive => {
                let prompt = prompts::cognitive(
                    &input,
                    culture,
                    prior(SURFACE_ANALYSIS),
                    prior(PSYCHOCORE_X),
                );
                self.ask(placeholders::COGNITIVE, prompt).await
            }
            Analysis::ShadowArchetypes => {
                let archetypes = self
                    .ask(
                        placeholders::ARCHETYPES,
                        prompts::archetypes(&input, prior(SURFACE_ANALYSIS)),
                    )
                    .await;
                let deep_shadow = self
                    .ask(
                        placeholders::SHADOW,
                        prompts::shadow(&input, culture, &archetypes),
                    )
                    .await;
                json!({ "archetypes": archetypes, "deepShadow": deep_shadow })
            }
            Analysis::Existential => {
                self.ask(placeholders::EXISTENTIAL, prompts::existential(&input, culture))
                    .await
            }
            Analysis::AttachmentDefense => json!({
                "attachmentStyle": attachment_style(prior(PSYCHOCORE_X)),
                "projections": {
                    "identifiedProjections": [],
                    "projectionTargets": [],
                    "integrationSuggestions": [],
                },
            }),
            Analysis::CognitiveBiases => {
                self.ask(placeholders::BIASES, prompts::biases(&input)).await
            }
            Analysis::Synthesis => {
                let layers = build_layers(ctx.previous_results());
                let synthesized = synthesize(&layers, culture);
                json!({ "allResults": layers, "synthesized": synthesized })
            }
            Analysis::Curation => {
                let archetypes = prior(SHADOW_ARCHETYPES).map(|s| &s["archetypes"]);
                let dominant = archetypes
                    .and_then(|a| text(&a["dominant"]))
                    .unwrap_or(DEFAULT_ARCHETYPE);
                let shadow = archetypes
                    .and_then(|a| text(&a["shadow"]))
                    .unwrap_or("orphan");
                let tone = prior(SURFACE_ANALYSIS)
                    .and_then(|s| text(&s["emotionalTone"]))
                    .unwrap_or("neutral");
                let big_five = prior(PSYCHOCORE_X).map(|p| &p["bigFive"]);

                let prompt = prompts::curation(dominant, shadow, big_five, tone, culture);
                let curated = self.ask(placeholders::CURATION, prompt).await;
                curation::normalize(&curated, dominant)
            }
        };
        Ok(value)
    }
}

impl AnalysisTask {
    async fn ask(&self, context: &str, prompt: String) -> Value {
        self.cascade.call_in(context, &prompt).await.value
    }
}

fn object_or_wrapped(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        other => {
            let mut fields = serde_json::Map::new();
            fields.insert("analysis".into(), other);
            fields
        }
    }
}

/// Message statistics; the messages carry no reliable demographic signal.
fn demographics(input: &PreparedInput) -> Value {
    let message_count = input.messages.len();
    let word_count = input.word_count();
    json!({
        "inferredAgeRange": "adult",
        "educationLevel": "unknown",
        "occupationHints": [],
        "locationHints": [],
        "messageCount": message_count,
        "wordCount": word_count,
        "averageWordsPerMessage": word_count as f64 / message_count.max(1) as f64,
    })
}

/// Attachment dimensions read off the Big Five: anxiety follows neuroticism,
/// avoidance mirrors extraversion. Without Big Five scores the secure
/// baseline is reported.
fn attachment_style(psychocore: Option<&Value>) -> Value {
    let big_five = spread(psychocore.map(|p| &p["bigFive"]));
    let score = |name: &str| big_five.get(name).and_then(Value::as_f64);

    let (anxiety, avoidance) = match (score("neuroticism"), score("extraversion")) {
        (Some(neuroticism), Some(extraversion)) => {
            (neuroticism.clamp(0.0, 100.0), (100.0 - extraversion).clamp(0.0, 100.0))
        }
        _ => (30.0, 20.0),
    };
    let security = (100.0 - (anxiety + avoidance) / 2.0).round();

    let primary = match (anxiety >= 50.0, avoidance >= 50.0) {
        (false, false) => "secure",
        (true, false) => "anxious",
        (false, true) => "avoidant",
        (true, true) => "disorganized",
    };

    json!({
        "primaryStyle": primary,
        "securityScore": security,
        "anxietyScore": anxiety,
        "avoidanceScore": avoidance,
        "patterns": [],
        "relationshipInsights": [],
    })
}
