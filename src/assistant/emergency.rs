//! Emergency triggers checked before any retrieval.
//!
//! This is a plain scan over a short ordered table, not a classifier; a
//! paraphrased emergency ("my heart is failing") goes undetected.

use regex::Regex;

use crate::core::config::MatchMode;

pub const CALL_TO_ACTION: &str = "\n\n📞 Call your local emergency number RIGHT NOW!";

/// Declaration order is match priority.
const TRIGGERS: [(&str, &str); 8] = [
    (
        "chest pain",
        "🚨 CHEST PAIN could be a heart attack. Call emergency services immediately!",
    ),
    (
        "heart attack",
        "🚨 HEART ATTACK: Call emergency services now! Symptoms include chest pain and shortness of breath.",
    ),
    (
        "stroke",
        "🚨 STROKE: Call emergency services! Look for face drooping, arm weakness, speech difficulty.",
    ),
    (
        "difficulty breathing",
        "🚨 BREATHING PROBLEMS: This is an emergency! Call for help immediately!",
    ),
    (
        "severe bleeding",
        "🚨 SEVERE BLEEDING: Apply pressure and call emergency services!",
    ),
    (
        "unconscious",
        "🚨 UNCONSCIOUS person: Check breathing and call emergency services!",
    ),
    (
        "suicide",
        "🚨 Please call emergency services or a crisis helpline immediately! Your life matters!",
    ),
    (
        "kill myself",
        "🚨 Call for help now! Emergency services and crisis lines are available 24/7!",
    ),
];

struct Trigger {
    phrase: &'static str,
    response: &'static str,
    word_pattern: Regex,
}

pub struct EmergencyDetector {
    triggers: Vec<Trigger>,
    mode: MatchMode,
}

impl EmergencyDetector {
    pub fn new(mode: MatchMode) -> Self {
        let triggers = TRIGGERS
            .iter()
            .filter_map(|(phrase, response)| {
                let pattern = format!(r"\b{}\b", regex::escape(phrase));
                match Regex::new(&pattern) {
                    Ok(word_pattern) => Some(Trigger {
                        phrase,
                        response,
                        word_pattern,
                    }),
                    Err(err) => {
                        tracing::error!("Invalid emergency trigger '{}': {}", phrase, err);
                        None
                    }
                }
            })
            .collect();
        Self { triggers, mode }
    }

    /// Canned warning plus call-to-action for the first trigger present in
    /// the query, if any.
    pub fn detect(&self, query: &str) -> Option<String> {
        let lowered = query.to_lowercase();
        self.triggers
            .iter()
            .find(|trigger| match self.mode {
                MatchMode::Substring => lowered.contains(trigger.phrase),
                MatchMode::Word => trigger.word_pattern.is_match(&lowered),
            })
            .map(|trigger| format!("{}{}", trigger.response, CALL_TO_ACTION))
    }
}

impl Default for EmergencyDetector {
    fn default() -> Self {
        Self::new(MatchMode::Substring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_trigger_is_detected_case_insensitively() {
        let detector = EmergencyDetector::default();
        for (phrase, response) in TRIGGERS {
            let query = format!("Help, {} right now", phrase.to_uppercase());
            let detected = detector.detect(&query).unwrap();
            assert!(detected.starts_with(response), "trigger {}", phrase);
            assert!(detected.ends_with(CALL_TO_ACTION));
        }
    }

    #[test]
    fn first_trigger_in_table_order_wins() {
        let detector = EmergencyDetector::default();
        let detected = detector
            .detect("I think this is a heart attack with chest pain")
            .unwrap();
        assert!(detected.starts_with("🚨 CHEST PAIN"));
    }

    #[test]
    fn ordinary_questions_pass_through() {
        let detector = EmergencyDetector::default();
        assert_eq!(detector.detect("What is diabetes?"), None);
        assert_eq!(detector.detect(""), None);
    }

    #[test]
    fn substring_mode_misfires_inside_longer_words() {
        let detector = EmergencyDetector::new(MatchMode::Substring);
        assert!(detector.detect("how many strokes in a backstroke lap").is_some());
    }

    #[test]
    fn word_mode_requires_whole_words() {
        let detector = EmergencyDetector::new(MatchMode::Word);
        assert_eq!(detector.detect("how many strokes in a backstroke lap"), None);
        assert!(detector.detect("signs of a stroke?").is_some());
        assert!(detector.detect("sudden Chest Pain").is_some());
    }
}
