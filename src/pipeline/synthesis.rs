// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Folding the earlier phases' results into the layered profile.
//!
//! Everything here is deterministic and local: the synthesis task never
//! calls a backend, so a profile can always be assembled from whatever the
//! analyses produced.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::{tasks, CulturalContext};

/// `clamp(1 - |a - b| / 100, -1, 1)`; `0.0` when either side is missing.
pub fn correlation(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => (1.0 - (a - b).abs() / 100.0).clamp(-1.0, 1.0),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub dimensions: [&'static str; 2],
    pub correlation: f64,
    pub interpretation: &'static str,
}

/// The five analysis layers, keyed `surface`, `middle`, `deep`, `cognitive`
/// and `existential`. Absent analyses leave empty objects behind.
pub fn build_layers(results: &BTreeMap<String, Value>) -> Value {
    let result = |name: &str| results.get(name);
    let shadow = result(tasks::SHADOW_ARCHETYPES);
    let attachment = result(tasks::ATTACHMENT_DEFENSE);

    let mut surface = spread(result(tasks::SURFACE_ANALYSIS));
    surface.insert("demographics".into(), or_empty(result(tasks::DEMOGRAPHICS)));
    surface.insert(
        "culturalMarkers".into(),
        or_empty(result(tasks::CULTURAL_ANALYSIS)),
    );

    let mut middle = spread(result(tasks::PSYCHOCORE_X));
    middle.insert(
        "jungArchetypes".into(),
        or_empty(shadow.and_then(|s| s.get("archetypes"))),
    );

    let mut deep = spread(result(tasks::DEEP_ANALYSIS));
    deep.insert(
        "shadowAnalysis".into(),
        or_empty(shadow.and_then(|s| s.get("deepShadow"))),
    );
    deep.insert(
        "attachmentStyle".into(),
        or_empty(attachment.and_then(|a| a.get("attachmentStyle"))),
    );
    deep.insert(
        "projections".into(),
        or_empty(attachment.and_then(|a| a.get("projections"))),
    );

    let mut cognitive = spread(result(tasks::COGNITIVE_ANALYSIS));
    cognitive.insert(
        "cognitiveBiases".into(),
        result(tasks::COGNITIVE_BIASES)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
    );

    json!({
        "surface": surface,
        "middle": middle,
        "deep": deep,
        "cognitive": cognitive,
        "existential": or_empty(result(tasks::EXISTENTIAL_ANALYSIS)),
    })
}

/// Pairwise relationships between layers, for whichever pairs are present.
pub fn cross_correlations(layers: &Value) -> Vec<Correlation> {
    let middle = &layers["middle"];
    let deep = &layers["deep"];
    let big_five = present(&middle["bigFive"]);
    let mut correlations = Vec::new();

    if let (Some(big_five), Some(archetypes)) = (big_five, present(&middle["jungArchetypes"])) {
        let sage = number(&archetypes["scores"]["sage"])
            .or_else(|| number(&archetypes["sage"]))
            .unwrap_or(0.0);
        correlations.push(Correlation {
            dimensions: ["bigFive.openness", "jungArchetypes.sage"],
            correlation: correlation(number(&big_five["openness"]), Some(sage)),
            interpretation: "openness to experience and the sage archetype",
        });
    }

    if let (Some(big_five), Some(bart)) = (big_five, present(&middle["bartRisk"])) {
        correlations.push(Correlation {
            dimensions: ["bartRisk.score", "bigFive.neuroticism"],
            correlation: correlation(number(&bart["score"]), number(&big_five["neuroticism"])),
            interpretation: "risk tolerance and emotional instability",
        });
    }

    if let (Some(big_five), Some(attachment)) = (big_five, present(&deep["attachmentStyle"])) {
        let security = number(&attachment["securityScore"]).unwrap_or(0.0);
        correlations.push(Correlation {
            dimensions: ["attachmentStyle.security", "bigFive.agreeableness"],
            correlation: correlation(Some(security), number(&big_five["agreeableness"])),
            interpretation: "secure attachment and agreeableness",
        });
    }

    if let (Some(big_five), Some(shadow)) = (big_five, present(&deep["shadowAnalysis"])) {
        let stability = number(&big_five["neuroticism"]).map(|n| 100.0 - n);
        correlations.push(Correlation {
            dimensions: ["shadow.integration", "personality.stability"],
            correlation: correlation(shadow_integration(shadow), stability),
            interpretation: "how far the shadow is integrated",
        });
    }

    correlations
}

/// Shadow integration on a 0-100 scale; models answer with either a
/// fraction or a percentage.
fn shadow_integration(shadow: &Value) -> Option<f64> {
    number(&shadow["integrationLevel"]).map(|level| if level <= 1.0 { level * 100.0 } else { level })
}

const TRAITS: [(&str, &str, &str); 5] = [
    ("openness", "curiosity and openness to new ideas", "openness to unfamiliar experiences"),
    ("conscientiousness", "discipline and reliability", "structure and follow-through"),
    ("extraversion", "social energy and expressiveness", "reaching out to others"),
    ("agreeableness", "empathy and cooperation", "warmth in conflict"),
    ("neuroticism", "emotional sensitivity", "emotional regulation"),
];

const HIGH: f64 = 65.0;
const LOW: f64 = 35.0;

/// Build the synthesized profile from the layered results.
pub fn synthesize(layers: &Value, culture: CulturalContext) -> Value {
    let middle = &layers["middle"];
    let deep = &layers["deep"];
    let big_five = &middle["bigFive"];
    let archetypes = &middle["jungArchetypes"];
    let shadow = &deep["shadowAnalysis"];

    let dominant_trait = TRAITS
        .iter()
        .filter(|(name, _, _)| *name != "neuroticism")
        .filter_map(|(name, _, _)| number(&big_five[*name]).map(|score| (*name, score)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name)
        .unwrap_or("");

    let (strengths, growth_areas) = strengths_and_growth(big_five);
    let archetype = text(&archetypes["dominant"]).unwrap_or("");
    let integration = shadow_integration(shadow).unwrap_or(50.0).round();
    let correlations = cross_correlations(layers);
    let contradictions = contradictions(layers);

    let supporting: Vec<&str> = strengths.iter().skip(1).copied().collect();
    let shadow_aspects = match &shadow["shadowAspects"] {
        aspects @ Value::Array(_) => aspects.clone(),
        _ => json!([]),
    };
    let life_theme = life_theme(archetype);
    let risk_factors = risk_factors(middle);

    let headline = match (archetype, dominant_trait) {
        ("", "") => "A profile still taking shape".to_string(),
        ("", t) => format!("Marked by {t}"),
        (a, "") => format!("The {a}"),
        (a, t) => format!("The {a}, marked by {t}"),
    };

    json!({
        "personality": {
            "primary": {
                "dominantTrait": dominant_trait,
                "archetype": archetype,
                "mbtiType": label(&middle["mbti"]["type"]),
                "enneagramType": label(&middle["enneagram"]["type"]),
            },
            "secondary": {
                "supportingTraits": supporting,
                "shadowAspects": shadow_aspects,
            },
            "contradictions": contradictions,
        },
        "correlations": correlations,
        "strengths": strengths,
        "growthAreas": growth_areas,
        "integratedArchetype": {
            "primary": archetype,
            "secondary": text(&archetypes["secondary"]).unwrap_or(""),
            "shadow": text(&archetypes["shadow"]).unwrap_or(""),
            "integrationLevel": integration,
        },
        "lifeTheme": life_theme,
        "riskFactors": risk_factors,
        "summary": {
            "headline": headline,
            "description": format!(
                "Read through a {} lens ({}).",
                culture.framework(),
                culture.emphasis().join(", ")
            ),
            "keyInsights": key_insights(layers),
        },
        "culturalContext": culture,
    })
}

fn strengths_and_growth(big_five: &Value) -> (Vec<&'static str>, Vec<&'static str>) {
    let mut strengths = Vec::new();
    let mut growth = Vec::new();
    for (name, strength, growth_area) in TRAITS {
        let Some(score) = number(&big_five[name]) else {
            continue;
        };
        // High neuroticism is the growth area; low neuroticism is not a strength
        if name == "neuroticism" {
            if score >= HIGH {
                growth.push(growth_area);
            }
            continue;
        }
        if score >= HIGH {
            strengths.push(strength);
        } else if score <= LOW {
            growth.push(growth_area);
        }
    }
    (strengths, growth)
}

fn contradictions(layers: &Value) -> Vec<&'static str> {
    let big_five = &layers["middle"]["bigFive"];
    let attachment = text(&layers["deep"]["attachmentStyle"]["primaryStyle"]);
    let mut found = Vec::new();

    if number(&big_five["extraversion"]).is_some_and(|e| e >= HIGH)
        && matches!(attachment, Some("avoidant") | Some("disorganized"))
    {
        found.push("outgoing on the surface while keeping others at a distance");
    }
    if number(&big_five["agreeableness"]).is_some_and(|a| a >= HIGH)
        && number(&layers["middle"]["bartRisk"]["score"]).is_some_and(|s| s >= 8.0)
    {
        found.push("accommodating with people yet bold with risk");
    }
    found
}

fn life_theme(archetype: &str) -> &'static str {
    match archetype {
        "sage" => "the pursuit of understanding",
        "explorer" => "discovery and freedom",
        "hero" => "proving oneself through challenge",
        "creator" => "bringing new things into the world",
        "caregiver" => "protecting and nurturing others",
        "rebel" => "breaking what no longer works",
        "lover" => "connection and intimacy",
        "magician" => "transformation",
        "ruler" => "order and responsibility",
        "jester" => "joy in the present moment",
        "innocent" => "trust and optimism",
        "orphan" => "belonging",
        _ => "exploration and the search for meaning",
    }
}

fn risk_factors(middle: &Value) -> Vec<&'static str> {
    let mut risks = Vec::new();
    if number(&middle["bartRisk"]["score"]).is_some_and(|s| s >= 8.0) {
        risks.push("high risk tolerance");
    }
    if number(&middle["bigFive"]["neuroticism"]).is_some_and(|n| n >= 70.0) {
        risks.push("elevated emotional reactivity");
    }
    risks
}

fn key_insights(layers: &Value) -> Vec<String> {
    let mut insights = Vec::new();
    if let Some(tone) = text(&layers["surface"]["emotionalTone"]) {
        insights.push(format!("emotional tone: {tone}"));
    }
    if let Some(style) = text(&layers["surface"]["communicationStyle"]) {
        insights.push(format!("communication style: {style}"));
    }
    if let Some(style) = text(&layers["deep"]["attachmentStyle"]["primaryStyle"]) {
        insights.push(format!("attachment style: {style}"));
    }
    if let Some(source) = text(&layers["existential"]["meaningStructure"]["primarySource"]) {
        insights.push(format!("draws meaning mostly from {source}"));
    }
    insights
}

/// Object fields of `value`, or an empty map for anything else.
pub(crate) fn spread(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(fields)) => fields.clone(),
        _ => Map::new(),
    }
}

fn or_empty(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or_else(|| Value::Object(Map::new()))
}

/// `Some` for a non-empty object.
fn present(value: &Value) -> Option<&Value> {
    value.as_object().filter(|o| !o.is_empty()).map(|_| value)
}

pub(crate) fn number(value: &Value) -> Option<f64> {
    value.as_f64()
}

pub(crate) fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Strings as-is, numbers rendered; anything else is empty.
fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
