//! System prompt for a persona clone.
//!
//! The instruction text plus the approved fact list is the only grounding a
//! clone gets, so every rule the dialogue depends on lives here.
//!
//! # Example Output
//!
//! ```text
//! You are alice's dating clone, speaking in first person as alice.
//! Goal: get a feel for whether the two of you would click.
//!
//! Scope: talk only about compatibility signals: values, humor, energy, tastes and boundaries.
//! Never discuss logistics or scheduling (dates, times, places, contact details, meeting up).
//!
//! Approved facts about alice:
//! - Trail runs at dawn
//! - Strong espresso
//!
//! Never invent facts about yourself beyond the list above. If asked about something it does not cover, say so lightly and steer back.
//! Keep every reply to 1-3 sentences.
//! Ask a follow-up question about every other turn.
//! ```

use crate::memory::MemoryRecord;

/// Goal used when the caller does not supply one.
pub const DEFAULT_GOAL: &str = "get a feel for whether the two of you would click";

/// Topics the clone may talk about.
pub const SCOPE_TOPICS: [&str; 5] = ["values", "humor", "energy", "tastes", "boundaries"];

/// Placeholder listed when a record has no facts.
pub const NO_FACTS: &str = "(none)";

/// Build the system instruction for `identity`'s clone.
///
/// Pure: the same identity, record and goal always yield the same text.
/// Facts are listed verbatim and in record order.
pub fn build_system_prompt(identity: &str, record: &MemoryRecord, goal: &str) -> String {
    let goal = if goal.trim().is_empty() {
        DEFAULT_GOAL
    } else {
        goal.trim()
    };

    let facts = if record.is_empty() {
        format!("- {}", NO_FACTS)
    } else {
        record
            .facts()
            .iter()
            .map(|fact| format!("- {}", fact))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let sections = [
        format!(
            "You are {id}'s dating clone, speaking in first person as {id}.\nGoal: {goal}.",
            id = identity,
            goal = goal,
        ),
        format!(
            "Scope: talk only about compatibility signals: {}.\n\
             Never discuss logistics or scheduling (dates, times, places, contact details, meeting up).",
            scope_list()
        ),
        format!("Approved facts about {}:\n{}", identity, facts),
        [
            "Never invent facts about yourself beyond the list above. \
             If asked about something it does not cover, say so lightly and steer back.",
            "Keep every reply to 1-3 sentences.",
            "Ask a follow-up question about every other turn.",
        ]
        .join("\n"),
    ];

    sections.join("\n\n")
}

fn scope_list() -> String {
    let (last, rest) = match SCOPE_TOPICS.split_last() {
        Some(split) => split,
        None => return String::new(),
    };
    format!("{} and {}", rest.join(", "), last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(facts: &[&str]) -> MemoryRecord {
        MemoryRecord::new(facts.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_prompt_declares_identity_and_lists_facts_verbatim() {
        let prompt = build_system_prompt(
            "alice",
            &record(&["Trail runs at dawn", "Strong espresso, no sugar"]),
            DEFAULT_GOAL,
        );

        assert!(prompt.starts_with("You are alice's dating clone"));
        assert!(prompt.contains("- Trail runs at dawn\n- Strong espresso, no sugar"));
        assert!(!prompt.contains(NO_FACTS));
    }

    #[test]
    fn test_prompt_rules() {
        let prompt = build_system_prompt("bo", &record(&["plays bass"]), "see if we vibe");

        assert!(prompt.contains("Goal: see if we vibe."));
        assert!(prompt.contains("values, humor, energy, tastes and boundaries"));
        assert!(prompt.contains("Never discuss logistics or scheduling"));
        assert!(prompt.contains("Never invent facts"));
        assert!(prompt.contains("1-3 sentences"));
        assert!(prompt.contains("follow-up question about every other turn"));
    }

    #[test]
    fn test_empty_record_lists_none() {
        let prompt = build_system_prompt("zed", &MemoryRecord::default(), "");
        assert!(prompt.contains("Approved facts about zed:\n- (none)"));
        assert!(prompt.contains(DEFAULT_GOAL));
    }

    #[test]
    fn test_prompt_is_pure() {
        let r = record(&["collects vinyl"]);
        assert_eq!(
            build_system_prompt("bo", &r, DEFAULT_GOAL),
            build_system_prompt("bo", &r, DEFAULT_GOAL)
        );
    }
}
