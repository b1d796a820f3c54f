// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cascade context keys and the demo data returned under each when no
//! backend answers.

use serde_json::{json, Value};

use crate::backends::ProviderCascade;

pub(crate) const SURFACE: &str = "surface";
pub(crate) const CULTURAL: &str = "cultural";
pub(crate) const PSYCHOCORE: &str = "psychocore_x";
pub(crate) const DEEP: &str = "deep";
pub(crate) const COGNITIVE: &str = "cognitive";
pub(crate) const ARCHETYPES: &str = "archetypes";
pub(crate) const SHADOW: &str = "shadow";
pub(crate) const EXISTENTIAL: &str = "existential";
pub(crate) const BIASES: &str = "biases";
pub(crate) const CURATION: &str = "curation";

fn templates() -> [(&'static str, Value); 10] {
    [
        (
            SURFACE,
            json!({
                "communicationStyle": "open and sincere",
                "emotionalTone": "balanced and positive",
                "cognitivePatterns": ["reflective"],
                "culturalInfluences": [],
                "initialPersonalityHints": {},
            }),
        ),
        (
            CULTURAL,
            json!({
                "culturalIdentity": {
                    "primaryCulture": "hybrid",
                    "influences": ["western individualism", "collectivist values"],
                    "adaptationLevel": 78,
                },
                "valueSystem": {
                    "coreValues": ["personal achievement", "social harmony"],
                    "orientation": "mixed",
                },
            }),
        ),
        (
            PSYCHOCORE,
            json!({
                "bigFive": {
                    "openness": 72,
                    "conscientiousness": 68,
                    "extraversion": 58,
                    "agreeableness": 75,
                    "neuroticism": 42,
                },
                "mbti": { "type": "INFJ", "confidence": 0.78 },
                "enneagram": { "type": "4w5", "confidence": 0.72 },
                "emotionalIntelligence": 76,
            }),
        ),
        (
            DEEP,
            json!({
                "shadowLayer": {
                    "repressedEmotions": [],
                    "deniedTraits": [],
                    "projections": [],
                    "integrationLevel": 50,
                },
                "coreLayer": { "coreSchemas": [], "copingStyles": [] },
                "defenseMechanisms": [],
            }),
        ),
        (
            COGNITIVE,
            json!({
                "iqEstimate": "115-125",
                "thinkingStyle": { "dominantStyle": "intuitive-analytical" },
                "cognitiveStrengths": ["pattern recognition", "abstract thinking", "creative problem solving"],
            }),
        ),
        (
            ARCHETYPES,
            json!({
                "dominant": "creator",
                "secondary": "sage",
                "shadow": "orphan",
                "scores": {
                    "innocent": 40, "orphan": 35, "hero": 55, "caregiver": 60,
                    "explorer": 65, "rebel": 45, "lover": 50, "creator": 80,
                    "jester": 40, "sage": 75, "magician": 55, "ruler": 45,
                },
            }),
        ),
        (
            SHADOW,
            json!({
                "shadowAspects": ["perfectionism", "need for control"],
                "repressedEmotions": ["anger", "fear"],
                "blindSpots": [],
                "integrationLevel": 0.65,
            }),
        ),
        (
            EXISTENTIAL,
            json!({
                "meaningStructure": {
                    "primarySource": "relationships",
                    "secondarySource": "achievement",
                    "meaningQuotient": 65,
                },
                "coreValues": ["authenticity", "growth", "connection"],
                "lifeGoals": { "shortTerm": [], "longTerm": [], "ultimate": "" },
                "spiritualDimension": { "orientation": "secular", "practices": [] },
            }),
        ),
        (BIASES, json!({ "biases": [] })),
        (CURATION, json!({})),
    ]
}

/// Register every analysis's demo template on `cascade`.
pub(crate) fn install(cascade: ProviderCascade) -> ProviderCascade {
    templates()
        .into_iter()
        .fold(cascade, |cascade, (context, template)| {
            cascade.with_placeholder(context, template)
        })
}
