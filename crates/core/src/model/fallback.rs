use crate::model::ids::QuestionId;
use crate::model::question::{AnswerSource, Question};

/// Size of the built-in practice set.
pub const BUILTIN_QUESTION_COUNT: usize = 31;

/// Static question set used when the question bank cannot be loaded.
#[must_use]
pub fn builtin_questions() -> Vec<Question> {
    (1..=BUILTIN_QUESTION_COUNT)
        .filter_map(|n| {
            let id = i64::try_from(n).ok()?;
            Question::with_source(
                QuestionId::new(id),
                format!("Sample ASVAB question text will go here. This is question {n}"),
                ["Option A", "Option B", "Option C", "Option D"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                "Option A",
                Some("Practice Test".to_string()),
                AnswerSource::Builtin,
            )
            .ok()
        })
        .collect()
}
