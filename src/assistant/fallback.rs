//! Answers that need no hosted model.

use std::sync::OnceLock;

use regex::Regex;

const MIN_SENTENCE_CHARS: usize = 50;
const MAX_SENTENCE_CHARS: usize = 400;

const CANNED: [(&str, &str); 3] = [
    (
        "diabetes",
        "Diabetes affects blood sugar regulation. Type 1 requires insulin; Type 2 can be managed with lifestyle changes.",
    ),
    (
        "heart",
        "Heart disease includes conditions like coronary artery disease. Prevention involves healthy lifestyle choices.",
    ),
    (
        "cancer",
        "Cancer involves abnormal cell growth. Treatments include surgery, chemotherapy, and radiation therapy.",
    ),
];

pub const GENERIC_ANSWER: &str =
    "I can provide information about medical conditions from authoritative sources.";

fn sentence_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"[.!?]+").expect("static regex"))
}

/// First sentence of the context longer than 50 characters, cut to 400
/// characters with `...` when longer.
pub fn first_informative_sentence(context: &str) -> Option<String> {
    sentence_boundary()
        .split(context)
        .map(str::trim)
        .find(|sentence| sentence.chars().count() > MIN_SENTENCE_CHARS)
        .map(|sentence| {
            if sentence.chars().count() > MAX_SENTENCE_CHARS {
                let cut: String = sentence.chars().take(MAX_SENTENCE_CHARS).collect();
                format!("{}...", cut)
            } else {
                sentence.to_string()
            }
        })
}

/// Hard-coded answer keyed on the first topic word found in the question.
pub fn canned_answer(question: &str) -> &'static str {
    let lowered = question.to_lowercase();
    CANNED
        .iter()
        .find(|(topic, _)| lowered.contains(topic))
        .map(|(_, answer)| *answer)
        .unwrap_or(GENERIC_ANSWER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_sentence_over_fifty_chars() {
        let context = "Short one. Too short! Diabetes is a group of metabolic diseases with high blood sugar. Another sentence that is long enough to qualify too.";
        assert_eq!(
            first_informative_sentence(context).as_deref(),
            Some("Diabetes is a group of metabolic diseases with high blood sugar")
        );
    }

    #[test]
    fn long_sentence_is_truncated_with_ellipsis() {
        let context = format!("{} end.", "a".repeat(450));
        let sentence = first_informative_sentence(&context).unwrap();
        assert!(sentence.ends_with("..."));
        assert_eq!(sentence.chars().count(), MAX_SENTENCE_CHARS + 3);
    }

    #[test]
    fn exactly_four_hundred_chars_is_not_marked() {
        let context = "b".repeat(400);
        assert_eq!(first_informative_sentence(&context), Some(context));
    }

    #[test]
    fn no_sentence_qualifies() {
        assert_eq!(first_informative_sentence("Tiny. Also tiny!? Yes."), None);
        assert_eq!(first_informative_sentence(""), None);
    }

    #[test]
    fn canned_table_is_checked_in_order() {
        assert!(canned_answer("What is Diabetes?").starts_with("Diabetes affects"));
        assert!(canned_answer("heart problems").starts_with("Heart disease"));
        assert!(canned_answer("cancer and heart").starts_with("Heart disease"));
        assert!(canned_answer("skin cancer").starts_with("Cancer involves"));
        assert_eq!(canned_answer("what is a fever"), GENERIC_ANSWER);
    }
}
