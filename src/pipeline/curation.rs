// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Content recommendations for a finished profile.

use serde_json::{json, Value};

/// Archetype used when the analyses did not settle on one.
pub const DEFAULT_ARCHETYPE: &str = "sage";

/// Fill every section the backend left out (or answered with something
/// other than an array) from the archetype's defaults.
pub fn normalize(curated: &Value, archetype: &str) -> Value {
    let section = |key: &str, fallback: fn(&str) -> Value| match &curated[key] {
        value @ Value::Array(items) if !items.is_empty() => value.clone(),
        _ => fallback(archetype),
    };

    json!({
        "films": section("films", default_films),
        "books": section("books", default_books),
        "music": section("music", |_| default_music()),
        "activities": section("activities", |_| default_activities()),
        "weeklyPlan": match &curated["weeklyPlan"] {
            plan @ Value::Object(_) => plan.clone(),
            _ => json!({}),
        },
        "curatorNotes": curated["curatorNotes"].as_str().unwrap_or(""),
    })
}

fn default_films(archetype: &str) -> Value {
    match archetype {
        "hero" => json!([{ "title": "The Dark Knight", "reason": "the hero's journey and sacrifice", "matchScore": 88 }]),
        "explorer" => json!([{ "title": "Into the Wild", "reason": "discovery and the search for freedom", "matchScore": 92 }]),
        "creator" => json!([{ "title": "Whiplash", "reason": "creativity and the pursuit of mastery", "matchScore": 87 }]),
        "caregiver" => json!([{ "title": "Amélie", "reason": "compassion and helping others", "matchScore": 85 }]),
        _ => json!([{ "title": "Interstellar", "reason": "the search for knowledge and a cosmic perspective", "matchScore": 90 }]),
    }
}

fn default_books(archetype: &str) -> Value {
    match archetype {
        "hero" => json!([{ "title": "The Art of War", "author": "Sun Tzu", "reason": "strategy and leadership", "matchScore": 85 }]),
        "explorer" => json!([{ "title": "On the Road", "author": "Jack Kerouac", "reason": "journeys and discovery", "matchScore": 90 }]),
        _ => json!([{ "title": "Sapiens", "author": "Yuval Noah Harari", "reason": "depth of knowledge and understanding", "matchScore": 88 }]),
    }
}

fn default_music() -> Value {
    json!([{ "genre": "Ambient", "artists": ["Brian Eno"], "reason": "focus and inner calm", "matchScore": 80, "mood": "calm" }])
}

fn default_activities() -> Value {
    json!([{ "activity": "Meditation", "frequency": "daily", "reason": "building self-awareness", "matchScore": 85 }])
}
