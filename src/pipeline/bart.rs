// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Risk score for the Balloon Analogue Risk Task.

use serde::Serialize;

use super::input::BartData;

/// Score reported when there is no BART data to score.
pub const NEUTRAL_SCORE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BartScore {
    /// 1 (very cautious) to 10 (very risk-seeking)
    pub score: u8,
    pub category: &'static str,
    pub avg_pumps: f64,
    /// Fraction of rounds that exploded, 0.0 to 1.0
    pub explosion_rate: f64,
    pub total_pumps: u64,
    pub insights: Vec<&'static str>,
}

/// Average pumps / 3, rounded and clamped to 1..=10, then +2 when more than
/// half the balloons burst or -1 when fewer than a fifth did.
pub fn score(data: Option<&BartData>) -> BartScore {
    let rounds = match data {
        Some(data) if !data.rounds.is_empty() => &data.rounds,
        _ => {
            return BartScore {
                score: NEUTRAL_SCORE,
                category: category(NEUTRAL_SCORE),
                avg_pumps: 0.0,
                explosion_rate: 0.0,
                total_pumps: 0,
                insights: Vec::new(),
            }
        }
    };

    let total_pumps: u64 = rounds.iter().map(|r| u64::from(r.pumps)).sum();
    let round_count = rounds.len() as f64;
    let avg_pumps = total_pumps as f64 / round_count;
    let explosions = rounds.iter().filter(|r| r.exploded).count();
    let explosion_rate = explosions as f64 / round_count;

    let mut score = (avg_pumps / 3.0).round().clamp(1.0, 10.0) as u8;
    if explosion_rate > 0.5 {
        score = (score + 2).min(10);
    }
    if explosion_rate < 0.2 {
        score = score.saturating_sub(1).max(1);
    }

    BartScore {
        score,
        category: category(score),
        avg_pumps,
        explosion_rate,
        total_pumps,
        insights: insights(score, explosion_rate),
    }
}

fn category(score: u8) -> &'static str {
    match score {
        0 | 1 => "very low risk",
        2 | 3 => "low risk",
        4 => "moderate-low risk",
        5 | 6 => "moderate risk",
        7 => "moderate-high risk",
        8 | 9 => "high risk",
        _ => "very high risk",
    }
}

fn insights(score: u8, explosion_rate: f64) -> Vec<&'static str> {
    let mut insights = if score >= 8 {
        vec![
            "shows a high tolerance for risk",
            "tends to seek excitement",
        ]
    } else if score <= 3 {
        vec![
            "takes a cautious, calculated approach",
            "puts safety first",
        ]
    } else {
        vec!["weighs risk in a balanced way"]
    };

    if explosion_rate > 0.4 {
        insights.push("likes to push limits");
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::BartRound;

    fn rounds(spec: &[(u32, bool)]) -> BartData {
        BartData {
            rounds: spec
                .iter()
                .map(|&(pumps, exploded)| BartRound { pumps, exploded })
                .collect(),
        }
    }

    #[test]
    fn missing_data_is_neutral() {
        let none = score(None);
        assert_eq!(none.score, NEUTRAL_SCORE);
        assert_eq!(none.category, "moderate risk");
        assert_eq!(none.total_pumps, 0);

        let empty = score(Some(&BartData::default()));
        assert_eq!(empty, none);
    }

    #[test]
    fn frequent_explosions_raise_the_score() {
        // avg 24 -> 8, 3 of 4 burst -> +2, capped at 10
        let result = score(Some(&rounds(&[(24, true), (24, true), (24, true), (24, false)])));
        assert_eq!(result.score, 10);
        assert_eq!(result.category, "very high risk");
        assert_eq!(result.total_pumps, 96);
        assert!(result.insights.contains(&"likes to push limits"));
    }

    #[test]
    fn rare_explosions_lower_the_score() {
        // avg 15 -> 5, none burst -> 4
        let result = score(Some(&rounds(&[(15, false), (15, false)])));
        assert_eq!(result.score, 4);
        assert_eq!(result.category, "moderate-low risk");
        assert_eq!(result.insights, vec!["weighs risk in a balanced way"]);
    }

    #[test]
    fn score_never_drops_below_one() {
        let result = score(Some(&rounds(&[(0, false), (1, false)])));
        assert_eq!(result.score, 1);
        assert_eq!(result.insights[0], "takes a cautious, calculated approach");
    }

    #[test]
    fn moderate_explosion_rate_leaves_score_alone() {
        // avg 18 -> 6, 1 of 3 burst
        let result = score(Some(&rounds(&[(18, true), (18, false), (18, false)])));
        assert_eq!(result.score, 6);
        assert!((result.explosion_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn huge_pump_counts_do_not_overflow() {
        let result = score(Some(&rounds(&[(u32::MAX, true), (u32::MAX, false)])));
        assert_eq!(result.total_pumps, 2 * u64::from(u32::MAX));
        assert_eq!(result.avg_pumps, f64::from(u32::MAX));
        // avg clamps to 10, half burst leaves it there
        assert_eq!(result.score, 10);
    }
}
