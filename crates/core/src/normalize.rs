//! Correct-answer normalization.
//!
//! Question banks encode the correct answer inconsistently: as an option's
//! text, as a position (`"2"`), as a letter (`"b"`), or as a flag on one of
//! the option rows. [`resolve_correct_answer`] folds all of these into one
//! option string and never fails.

use crate::model::{AnswerSource, RawRow};

/// Aliased question-row fields that may carry the correct answer.
pub const CORRECT_ANSWER_FIELDS: &[&str] = &[
    "correct_answer",
    "correctAnswer",
    "answer",
    "correct_option",
    "correct",
    "solution",
];

/// Outcome of normalization: the canonical answer and how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAnswer {
    pub answer: String,
    pub source: AnswerSource,
}

/// Resolve the correct answer for a question.
///
/// Order of preference:
/// 1. `flagged`, an answer already chosen by an explicit per-option flag;
/// 2. the first aliased field in [`CORRECT_ANSWER_FIELDS`] on `row`,
///    interpreted by [`interpret`];
/// 3. the first option, marked [`AnswerSource::Defaulted`].
///
/// The result is always a member of `options` when `options` is non-empty.
/// For an empty slice the answer is an empty string.
#[must_use]
pub fn resolve_correct_answer(
    flagged: Option<&str>,
    row: &RawRow,
    options: &[String],
) -> ResolvedAnswer {
    if let Some(flagged) = flagged.filter(|f| options.iter().any(|o| o == f)) {
        return ResolvedAnswer {
            answer: flagged.to_string(),
            source: AnswerSource::Flagged,
        };
    }

    if let Some(resolved) = row
        .first_text(CORRECT_ANSWER_FIELDS)
        .and_then(|raw| interpret(&raw, options))
    {
        return resolved;
    }

    ResolvedAnswer {
        answer: options.first().cloned().unwrap_or_default(),
        source: AnswerSource::Defaulted,
    }
}

/// Interpret a raw correct-answer value against `options`.
///
/// Tried in order: exact option text, a single digit as a 1-based position,
/// `0` as a 0-based position, a single letter `A`..`D`, then a
/// case-insensitive option text match.
#[must_use]
pub fn interpret(raw: &str, options: &[String]) -> Option<ResolvedAnswer> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(option) = options.iter().find(|o| o.trim() == raw) {
        return Some(found(option, AnswerSource::Literal));
    }

    let mut chars = raw.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if let Some(digit) = ch.to_digit(10) {
            let digit = digit as usize;
            if digit == 0 {
                return options
                    .first()
                    .map(|o| found(o, AnswerSource::ZeroBasedIndex));
            }
            if let Some(option) = options.get(digit - 1) {
                return Some(found(option, AnswerSource::OneBasedIndex));
            }
        }

        let upper = ch.to_ascii_uppercase();
        if ('A'..='D').contains(&upper) {
            let position = (upper as u8 - b'A') as usize;
            if let Some(option) = options.get(position) {
                return Some(found(option, AnswerSource::Letter));
            }
        }
    }

    options
        .iter()
        .find(|o| o.trim().eq_ignore_ascii_case(raw))
        .map(|o| found(o, AnswerSource::Literal))
}

fn found(option: &str, source: AnswerSource) -> ResolvedAnswer {
    ResolvedAnswer {
        answer: option.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn row(value: serde_json::Value) -> RawRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn digit_two_is_second_option() {
        let options = opts(&["A", "B", "C", "D"]);
        let resolved = resolve_correct_answer(None, &row(json!({ "correct_answer": "2" })), &options);
        assert_eq!(resolved.answer, "B");
        assert_eq!(resolved.source, AnswerSource::OneBasedIndex);
    }

    #[test]
    fn numeric_json_value_is_accepted() {
        let options = opts(&["red", "green", "blue", "white"]);
        let resolved = resolve_correct_answer(None, &row(json!({ "answer": 3 })), &options);
        assert_eq!(resolved.answer, "blue");
    }

    #[test]
    fn zero_is_first_option() {
        let options = opts(&["w", "x", "y", "z"]);
        let resolved = interpret("0", &options).unwrap();
        assert_eq!(resolved.answer, "w");
        assert_eq!(resolved.source, AnswerSource::ZeroBasedIndex);
    }

    #[test]
    fn literal_text_beats_position() {
        let options = opts(&["4", "2", "8", "16"]);
        let resolved = interpret("2", &options).unwrap();
        assert_eq!(resolved.answer, "2");
        assert_eq!(resolved.source, AnswerSource::Literal);
    }

    #[test]
    fn letters_map_to_positions() {
        let options = opts(&["north", "south", "east", "west"]);
        assert_eq!(interpret("c", &options).unwrap().answer, "east");
        assert_eq!(interpret("D", &options).unwrap().source, AnswerSource::Letter);
        assert!(interpret("E", &options).is_none());
    }

    #[test]
    fn case_insensitive_text_matches_last() {
        let options = opts(&["Torque", "Force", "Mass", "Work"]);
        assert_eq!(interpret(" force ", &options).unwrap().answer, "Force");
    }

    #[test]
    fn flagged_answer_wins_when_valid() {
        let options = opts(&["a", "b", "c", "d"]);
        let r = row(json!({ "correct_answer": "a" }));
        assert_eq!(resolve_correct_answer(Some("c"), &r, &options).answer, "c");
        assert_eq!(resolve_correct_answer(Some("zzz"), &r, &options).answer, "a");
    }

    #[test]
    fn unusable_values_default_to_first_option() {
        let options = opts(&["first", "second", "third", "fourth"]);
        for raw in [json!({}), json!({ "answer": "9" }), json!({ "answer": "none of these" })] {
            let resolved = resolve_correct_answer(None, &row(raw), &options);
            assert_eq!(resolved.answer, "first");
            assert!(resolved.source.is_low_confidence());
        }
    }

    #[test]
    fn resolved_answer_is_always_an_option() {
        let options = opts(&["A", "B", "C", "D"]);
        for raw in ["", "0", "1", "4", "5", "a", "d", "e", "B", "x y", "10"] {
            let resolved = resolve_correct_answer(None, &row(json!({ "answer": raw })), &options);
            assert!(options.contains(&resolved.answer), "{raw} -> {resolved:?}");
        }
    }
}
