// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Prompt text for the model-backed analyses.
//!
//! Every prompt asks for JSON only and shows the expected shape; the cascade
//! still copes with prose or fenced answers.

use serde_json::Value;

use super::input::PreparedInput;
use super::CulturalContext;

/// Transcript budget for the short, single-layer prompts.
const EXCERPT_CHARS: usize = 800;

pub(crate) const COMMON_BIASES: [&str; 7] = [
    "confirmation_bias",
    "anchoring_bias",
    "availability_heuristic",
    "dunning_kruger",
    "sunk_cost_fallacy",
    "negativity_bias",
    "optimism_bias",
];

pub(crate) const ARCHETYPES: [&str; 12] = [
    "innocent", "orphan", "hero", "caregiver", "explorer", "rebel", "lover", "creator", "jester",
    "sage", "magician", "ruler",
];

pub(crate) fn surface(input: &PreparedInput, culture: CulturalContext) -> String {
    format!(
        r#"Analyse the user's messages and return your first impressions as JSON.

User messages:
{messages}

Cultural context: {culture}

Return only JSON with this shape:
{{
  "communicationStyle": "string",
  "emotionalTone": "string",
  "cognitivePatterns": ["string"],
  "culturalInfluences": ["string"],
  "initialPersonalityHints": {{}}
}}"#,
        messages = json_list(&input.messages),
    )
}

pub(crate) fn cultural(input: &PreparedInput, culture: CulturalContext) -> String {
    format!(
        r#"You are an expert in cultural anthropology and Hofstede's cultural dimensions. Analyse the user's cultural context.

User messages:
{transcript}

Expected cultural context: {culture}

Return only JSON with this shape:
{{
  "culturalIdentity": {{"primaryCulture": "western|eastern|african|hybrid", "influences": ["string"], "adaptationLevel": 0}},
  "valueSystem": {{"coreValues": ["string"], "orientation": "individualist|collectivist|mixed"}},
  "hofstede": {{"powerDistance": 0, "individualism": 0, "uncertaintyAvoidance": 0, "longTermOrientation": 0, "indulgence": 0}}
}}"#,
        transcript = input.transcript(),
    )
}

pub(crate) fn psychocore(input: &PreparedInput, culture: CulturalContext) -> String {
    format!(
        r#"You are a psychologist. Analyse the user's messages and return the result as JSON.

User messages:
{transcript}

Cultural context: {culture}

Return only JSON with this shape (scores are 0-100):
{{
  "bigFive": {{"openness": 0, "conscientiousness": 0, "extraversion": 0, "agreeableness": 0, "neuroticism": 0}},
  "mbti": {{"type": "XXXX", "confidence": 0.0}},
  "enneagram": {{"type": 1, "wing": 2, "healthLevel": 5}},
  "emotionalIntelligence": {{"selfAwareness": 0, "selfRegulation": 0, "motivation": 0, "empathy": 0, "socialSkills": 0}}
}}"#,
        transcript = input.transcript(),
    )
}

pub(crate) fn deep(
    input: &PreparedInput,
    culture: CulturalContext,
    surface: Option<&Value>,
    middle: Option<&Value>,
) -> String {
    format!(
        r#"Unconscious-layer analysis: repressed emotions, projections, core schemas and defense mechanisms.

Message: {excerpt}

Cultural context: {culture}
First impressions: {surface}
Personality model: {middle}

Return only JSON:
{{"shadowLayer": {{"repressedEmotions": [], "deniedTraits": [], "projections": [], "integrationLevel": 50}}, "coreLayer": {{"coreSchemas": [], "copingStyles": []}}, "defenseMechanisms": []}}"#,
        excerpt = input.excerpt(EXCERPT_CHARS),
        surface = compact(surface),
        middle = compact(middle),
    )
}

pub(crate) fn cognitive(
    input: &PreparedInput,
    culture: CulturalContext,
    surface: Option<&Value>,
    middle: Option<&Value>,
) -> String {
    format!(
        r#"You are a cognitive psychologist. Build a cognitive profile from the user's messages.

User messages:
{transcript}

Cultural context: {culture}
First impressions: {surface}
Personality model: {middle}

Return only JSON with this shape (scores are 0-100):
{{
  "cognitiveProfile": {{"verbalAbility": 0, "spatialReasoning": 0, "workingMemory": 0, "processingSpeed": 0, "executiveFunction": 0}},
  "thinkingStyle": {{"analyticalScore": 50, "intuitiveScore": 50, "dominantStyle": "balanced"}},
  "problemSolving": {{"approach": "systematic", "flexibility": 0, "creativity": 0, "persistence": 0}},
  "integratedMatrix": {{"overallProfile": "string", "strengthAreas": ["string"], "vulnerabilityAreas": ["string"]}}
}}"#,
        transcript = input.transcript(),
        surface = compact(surface),
        middle = compact(middle),
    )
}

pub(crate) fn archetypes(input: &PreparedInput, surface: Option<&Value>) -> String {
    format!(
        r#"You are an expert in Jungian psychology. Score the user against the twelve archetypes.

User messages:
{transcript}

First impressions: {surface}

Archetypes: {archetypes}

Return only JSON:
{{"dominant": "archetype", "secondary": "archetype", "shadow": "archetype", "scores": {{{scores}}}}}"#,
        transcript = input.transcript(),
        surface = compact(surface),
        archetypes = ARCHETYPES.join(", "),
        scores = ARCHETYPES
            .iter()
            .map(|a| format!("\"{a}\": 0"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

pub(crate) fn shadow(input: &PreparedInput, culture: CulturalContext, archetypes: &Value) -> String {
    format!(
        r#"You are an expert in Jungian shadow work and the Johari window. Run a deep shadow analysis.

Message: {excerpt}

Archetypes: {archetypes}
Cultural context: {culture}

Return only JSON:
{{"shadowAspects": ["string"], "repressedEmotions": ["string"], "blindSpots": ["string"], "integrationLevel": 50}}"#,
        excerpt = input.excerpt(EXCERPT_CHARS),
        archetypes = compact(Some(archetypes)),
    )
}

pub(crate) fn existential(
    input: &PreparedInput,
    culture: CulturalContext,
) -> String {
    format!(
        r#"Existential analysis: meaning, values, goals.

Message: {excerpt}

Cultural context: {culture}

Return only JSON:
{{"meaningStructure": {{"primarySource": "relationships", "secondarySource": "achievement", "meaningQuotient": 65}}, "coreValues": ["string"], "lifeGoals": {{"shortTerm": [], "longTerm": [], "ultimate": ""}}, "spiritualDimension": {{"orientation": "secular", "practices": []}}}}"#,
        excerpt = input.excerpt(EXCERPT_CHARS),
    )
}

pub(crate) fn biases(input: &PreparedInput) -> String {
    format!(
        r#"Identify cognitive biases visible in the user's messages.

Message: {excerpt}

Consider: {biases}

Return only a JSON array:
[{{"bias": "name", "evidence": "quote or paraphrase", "strength": 0}}]"#,
        excerpt = input.excerpt(EXCERPT_CHARS),
        biases = COMMON_BIASES.join(", "),
    )
}

pub(crate) fn curation(
    dominant: &str,
    shadow: &str,
    big_five: Option<&Value>,
    emotional_tone: &str,
    culture: CulturalContext,
) -> String {
    format!(
        r#"You are a personal-growth curator. Recommend content that fits the user's psychological profile.

Profile:
- Dominant archetype: {dominant}
- Shadow archetype: {shadow}
- Big Five: {big_five}
- Emotional tone: {emotional_tone}
- Cultural context: {culture}

Return only JSON:
{{
  "films": [{{"title": "string", "reason": "string", "matchScore": 0}}],
  "books": [{{"title": "string", "author": "string", "reason": "string", "matchScore": 0}}],
  "music": [{{"genre": "string", "artists": ["string"], "reason": "string", "matchScore": 0, "mood": "string"}}],
  "activities": [{{"activity": "string", "frequency": "daily|weekly", "reason": "string", "matchScore": 0}}],
  "weeklyPlan": {{"monday": "string", "wednesday": "string", "friday": "string", "weekend": "string"}},
  "curatorNotes": "string"
}}"#,
        big_five = compact(big_five),
    )
}

fn json_list(messages: &[String]) -> String {
    serde_json::to_string(messages).unwrap_or_default()
}

fn compact(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "{}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::ProfileInput;
    use serde_json::json;

    #[test]
    fn prompts_carry_the_transcript_and_context() {
        let input = ProfileInput::new(["I love long walks", "and quiet evenings"])
            .prepare()
            .unwrap();
        let prompt = psychocore(&input, CulturalContext::Eastern);
        assert!(prompt.contains("I love long walks\nand quiet evenings"));
        assert!(prompt.contains("Cultural context: eastern"));
        assert!(prompt.contains("\"bigFive\""));
    }

    #[test]
    fn short_prompts_use_an_excerpt() {
        let input = ProfileInput::new(["x".repeat(2000)]).prepare().unwrap();
        let prompt = existential(&input, CulturalContext::Western);
        assert!(prompt.contains(&"x".repeat(EXCERPT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(EXCERPT_CHARS + 1)));
    }

    #[test]
    fn archetype_prompt_lists_all_twelve() {
        let input = ProfileInput::new(["hi"]).prepare().unwrap();
        let prompt = archetypes(&input, Some(&json!({"emotionalTone": "warm"})));
        for archetype in ARCHETYPES {
            assert!(prompt.contains(&format!("\"{archetype}\": 0")));
        }
        assert!(prompt.contains(r#"{"emotionalTone":"warm"}"#));
    }
}
