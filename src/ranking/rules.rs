// rules.rs - Rule-based score adjustments.
//
// Each rule is an independent pure function of (opportunity, profile) returning a small
// additive delta. The aggregator only knows about `RULES`; adding a rule means adding a
// function and one entry in the table. Explanation keys come from the same table.
//
// Matching against free text is deliberately naive (whitespace tokens, substring hits).
// Stemming and synonyms are not handled.

use std::collections::HashSet;

use super::types::{Opportunity, Profile, ScoreExplanation};
use crate::config::scoring as k;

pub type RuleFn = fn(&Opportunity, &Profile) -> f64;

/// Ordered scoring pipeline.
pub static RULES: &[(&str, RuleFn)] = &[
    ("year", score_year),
    ("location", score_location),
    ("stipend", score_stipend),
    ("inclusion", score_inclusion),
    ("tags", score_tags),
    ("penalty", score_irrelevance),
];

pub fn score_year(opp: &Opportunity, profile: &Profile) -> f64 {
    let year = profile.year;
    if opp.year_min <= year && year <= opp.year_max {
        k::YEAR_IN_RANGE
    } else if year.abs_diff(opp.year_min) == 1 || year.abs_diff(opp.year_max) == 1 {
        k::YEAR_ADJACENT
    } else {
        k::YEAR_OUT_OF_RANGE
    }
}

pub fn score_location(opp: &Opportunity, profile: &Profile) -> f64 {
    let Some(pref) = profile.location_preference() else {
        return 0.0;
    };
    if pref == opp.location {
        k::LOCATION_EXACT
    } else if pref.is_flexible() && opp.location.is_flexible() {
        k::LOCATION_FLEXIBLE
    } else {
        k::LOCATION_MISMATCH
    }
}

pub fn score_stipend(opp: &Opportunity, profile: &Profile) -> f64 {
    match (profile.needs_stipend, opp.stipend) {
        (false, _) => 0.0,
        (true, true) => k::STIPEND_MATCH,
        (true, false) => k::STIPEND_MISSING,
    }
}

pub fn score_inclusion(opp: &Opportunity, profile: &Profile) -> f64 {
    let has_flag = |flag: &str| opp.inclusive_flags.iter().any(|f| f == flag);

    let mut score = 0.0;
    if profile.is_female && has_flag(k::FLAG_WOMEN) {
        score += k::INCLUSION_WOMEN;
    }
    if profile.low_income && has_flag(k::FLAG_LOW_INCOME) {
        score += k::INCLUSION_LOW_INCOME;
    }
    if !opp.inclusive_flags.is_empty() {
        score += k::INCLUSION_ANY_FLAG;
    }
    score
}

pub fn score_tags(opp: &Opportunity, profile: &Profile) -> f64 {
    let tags: HashSet<String> = opp.tags.iter().map(|t| t.to_lowercase()).collect();
    let overlap = profile
        .interest_tokens()
        .iter()
        .filter(|tok| tags.contains(tok.as_str()))
        .count();

    if overlap >= k::TAGS_MANY_THRESHOLD {
        k::TAGS_MANY
    } else if overlap == 1 {
        k::TAGS_ONE
    } else {
        0.0
    }
}

/// Penalise items whose description mentions none of the interest words.
/// Empty interests count as "none mentioned".
pub fn score_irrelevance(opp: &Opportunity, profile: &Profile) -> f64 {
    let description = opp.description.to_lowercase();
    let mentioned = profile
        .interest_tokens()
        .iter()
        .any(|tok| description.contains(tok.as_str()));

    if mentioned {
        0.0
    } else {
        k::IRRELEVANCE_PENALTY
    }
}

/// Run every rule, returning the summed adjustment and the per-rule breakdown.
pub fn apply_rules(opp: &Opportunity, profile: &Profile, explanation: &mut ScoreExplanation) -> f64 {
    RULES.iter().fold(0.0, |acc, (name, rule)| {
        let delta = rule(opp, profile);
        explanation.push(*name, delta);
        acc + delta
    })
}
