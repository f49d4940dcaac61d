// text_prep.rs - Text preparation for embedding generation.
//
// Builds the embedding input from structured fields. The field order is fixed: the cache
// key is the composed text, so any reordering would turn every lookup into a miss.
// Truncates free text to fit the model's context window (256 word-piece tokens).

use crate::config;
use crate::ranking::types::{Opportunity, Profile};

// Word-piece tokenization expands by ~1.3x, so 150 words ≈ 195 tokens, leaving room
// for the labelled fields.
const DESCRIPTION_MAX_WORDS: usize = 150;
const PROFILE_FIELD_MAX_WORDS: usize = 80;

/// Prepare embedding text for a catalog entry.
///
/// Order: title, description, tags, type, location, stipend, inclusive flags.
pub fn prepare_opportunity_text(opp: &Opportunity) -> String {
    let mut parts = Vec::with_capacity(7);

    let title = opp.title.trim();
    if !title.is_empty() {
        parts.push(title.to_string());
    }

    let description = truncate_words(opp.description.trim(), DESCRIPTION_MAX_WORDS);
    if !description.is_empty() {
        parts.push(description);
    }

    if !opp.tags.is_empty() {
        parts.push(format!("Tags: {}", opp.tags.join(", ")));
    }
    parts.push(format!("Type: {}", opp.kind));
    parts.push(format!("Location: {}", opp.location.as_str()));
    parts.push(format!("Stipend: {}", if opp.stipend { "yes" } else { "no" }));
    if !opp.inclusive_flags.is_empty() {
        parts.push(format!("Inclusive: {}", opp.inclusive_flags.join(", ")));
    }

    parts.join("\n")
}

/// Prepare embedding text for a user profile.
///
/// Order: interests, branch, goals, location preference, then the "female" and
/// "low-income" markers when they apply. Empty fields are left out, so an empty
/// profile yields an empty string (and a zero vector).
pub fn prepare_profile_text(profile: &Profile) -> String {
    let mut parts = Vec::with_capacity(6);

    let interests = truncate_words(profile.interests.trim(), PROFILE_FIELD_MAX_WORDS);
    if !interests.is_empty() {
        parts.push(interests);
    }
    let branch = profile.branch.trim();
    if !branch.is_empty() {
        parts.push(branch.to_string());
    }
    let goals = truncate_words(profile.goals.trim(), PROFILE_FIELD_MAX_WORDS);
    if !goals.is_empty() {
        parts.push(goals);
    }
    let pref = profile.location_pref.trim();
    if !pref.is_empty() && !pref.eq_ignore_ascii_case(config::scoring::NO_PREFERENCE) {
        parts.push(pref.to_lowercase());
    }
    if profile.is_female {
        parts.push("female".to_string());
    }
    if profile.low_income {
        parts.push(config::scoring::FLAG_LOW_INCOME.to_string());
    }

    parts.join(" ")
}

/// Truncate text to at most `max_words` words, preserving word boundaries.
fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = 0;
    let mut end = 0;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            words += 1;
            if words >= max_words {
                end = i;
                break;
            }
        }
        end = i + c.len_utf8();
    }

    text[..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::types::{Location, OpportunityType};

    fn opp() -> Opportunity {
        Opportunity {
            id: "o1".into(),
            title: "Data Fellowship".into(),
            organization: "Org".into(),
            description: "Work on open data.".into(),
            kind: OpportunityType::Fellowship,
            location: Location::Hybrid,
            deadline: None,
            stipend: false,
            year_min: 2,
            year_max: 4,
            tags: vec!["data".into(), "civic".into()],
            inclusive_flags: vec!["low-income".into()],
            link: "https://example.org".into(),
        }
    }

    #[test]
    fn test_opportunity_text_field_order() {
        let text = prepare_opportunity_text(&opp());
        assert_eq!(
            text,
            "Data Fellowship\nWork on open data.\nTags: data, civic\nType: fellowship\nLocation: hybrid\nStipend: no\nInclusive: low-income"
        );
    }

    #[test]
    fn test_opportunity_text_skips_empty_lists() {
        let o = Opportunity { tags: vec![], inclusive_flags: vec![], ..opp() };
        let text = prepare_opportunity_text(&o);
        assert!(!text.contains("Tags:"));
        assert!(!text.contains("Inclusive:"));
    }

    #[test]
    fn test_profile_text_markers() {
        let p = Profile {
            interests: "robotics".into(),
            branch: "ECE".into(),
            goals: "build drones".into(),
            location_pref: "Remote".into(),
            is_female: true,
            low_income: true,
            ..Profile::default()
        };
        assert_eq!(prepare_profile_text(&p), "robotics ECE build drones remote female low-income");
    }

    #[test]
    fn test_profile_text_empty() {
        assert_eq!(prepare_profile_text(&Profile::default()), "");
    }

    #[test]
    fn test_truncate_words() {
        let text = "one two three four five six seven eight nine ten";
        assert_eq!(truncate_words(text, 5), "one two three four five");
        assert_eq!(truncate_words(text, 100), text);
        assert_eq!(truncate_words("", 5), "");
    }
}
