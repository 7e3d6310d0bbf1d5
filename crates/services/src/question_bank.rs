//! Question bank loading and row normalization.
//!
//! Question and option rows come from independent tables whose column names
//! vary between deployments. Every lookup goes through ordered alias lists so
//! the first non-empty candidate wins.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use practice_core::model::{Question, QuestionId, RawRow, builtin_questions};
use practice_core::normalize::resolve_correct_answer;
use storage::repository::QuestionSource;

use crate::error::LoadError;

pub const QUESTION_ID_FIELDS: &[&str] = &["id", "question_id", "questionId"];
pub const QUESTION_TEXT_FIELDS: &[&str] =
    &["question_text", "question", "text", "prompt", "content"];
pub const CATEGORY_FIELDS: &[&str] = &["category", "section", "subject"];

pub const OPTION_QUESTION_FIELDS: &[&str] = &["question_id", "questionId", "qid"];
pub const OPTION_TEXT_FIELDS: &[&str] = &[
    "option_text",
    "text",
    "content",
    "option",
    "answer_text",
    "value",
];
pub const OPTION_FLAG_FIELDS: &[&str] = &["is_correct", "correct", "isCorrect"];

const INLINE_LETTERS: [char; 6] = ['a', 'b', 'c', 'd', 'e', 'f'];

/// Table names the loader reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionTables {
    pub primary: String,
    pub alternate: String,
    pub options: String,
}

impl Default for QuestionTables {
    fn default() -> Self {
        Self {
            primary: "questions".to_string(),
            alternate: "asvab_questions".to_string(),
            options: "options".to_string(),
        }
    }
}

/// Questions ready for a session, plus a non-fatal warning when the
/// built-in set had to stand in for the remote bank.
#[derive(Debug, Clone)]
pub struct LoadedQuestions {
    pub questions: Vec<Question>,
    pub warning: Option<String>,
}

impl LoadedQuestions {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Options collected for one question id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionGroup {
    pub options: Vec<String>,
    pub flagged: Option<String>,
}

#[derive(Clone)]
pub struct QuestionBankLoader {
    source: Arc<dyn QuestionSource>,
    tables: QuestionTables,
}

impl QuestionBankLoader {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self {
            source,
            tables: QuestionTables::default(),
        }
    }

    #[must_use]
    pub fn with_tables(mut self, tables: QuestionTables) -> Self {
        self.tables = tables;
        self
    }

    /// Load and normalize the remote question bank.
    ///
    /// The primary table is read first; the alternate is consulted only when
    /// the primary errors or yields no usable questions.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::NoQuestionsAvailable` when both tables fail or are empty.
    pub async fn load(&self) -> Result<Vec<Question>, LoadError> {
        let mut last_error = "no rows".to_string();
        let mut groups: Option<HashMap<String, OptionGroup>> = None;

        for table in [&self.tables.primary, &self.tables.alternate] {
            let rows = match self.source.fetch_rows(table).await {
                Ok(rows) if rows.is_empty() => {
                    debug!("question table {table} is empty");
                    last_error = format!("{table}: no rows");
                    continue;
                }
                Ok(rows) => rows,
                Err(e) => {
                    warn!("question table {table} failed: {e}");
                    last_error = format!("{table}: {e}");
                    continue;
                }
            };

            let option_groups = match groups.take() {
                Some(cached) => cached,
                None => self.load_option_groups().await,
            };
            let questions = normalize_questions(&rows, &option_groups);
            groups = Some(option_groups);
            if questions.is_empty() {
                last_error = format!("{table}: no usable question rows");
                continue;
            }
            debug!("loaded {} questions from {table}", questions.len());
            return Ok(questions);
        }

        Err(LoadError::NoQuestionsAvailable {
            tables: vec![self.tables.primary.clone(), self.tables.alternate.clone()],
            last_error,
        })
    }

    /// Like [`QuestionBankLoader::load`], but substitutes the built-in sample
    /// set and reports a warning instead of failing.
    pub async fn load_or_fallback(&self) -> LoadedQuestions {
        match self.load().await {
            Ok(questions) => LoadedQuestions {
                questions,
                warning: None,
            },
            Err(e) => {
                warn!("using built-in questions: {e}");
                LoadedQuestions {
                    questions: builtin_questions(),
                    warning: Some(format!(
                        "Could not load questions ({e}). Showing sample questions instead."
                    )),
                }
            }
        }
    }

    async fn load_option_groups(&self) -> HashMap<String, OptionGroup> {
        match self.source.fetch_rows(&self.tables.options).await {
            Ok(rows) => group_options(&rows),
            Err(e) => {
                warn!("option table {} failed: {e}", self.tables.options);
                HashMap::new()
            }
        }
    }
}

/// Group option rows by question id, sorted by option text within a group.
#[must_use]
pub fn group_options(rows: &[RawRow]) -> HashMap<String, OptionGroup> {
    let mut groups: HashMap<String, OptionGroup> = HashMap::new();
    for row in rows {
        let (Some(question_id), Some(text)) = (
            row.first_text(OPTION_QUESTION_FIELDS),
            row.first_text(OPTION_TEXT_FIELDS),
        ) else {
            continue;
        };
        let group = groups.entry(question_id).or_default();
        if row.first_flag(OPTION_FLAG_FIELDS) == Some(true) && group.flagged.is_none() {
            group.flagged = Some(text.clone());
        }
        if !group.options.contains(&text) {
            group.options.push(text);
        }
    }
    for group in groups.values_mut() {
        group.options.sort();
    }
    groups
}

/// Normalize question rows, skipping rows without usable text.
///
/// `groups` empty means no option rows exist at all, in which case inline
/// option columns on each question row are scanned instead.
#[must_use]
pub fn normalize_questions(rows: &[RawRow], groups: &HashMap<String, OptionGroup>) -> Vec<Question> {
    rows.iter()
        .enumerate()
        .filter_map(|(position, row)| {
            let question = normalize_question(row, position, groups);
            if question.is_none() {
                debug!("skipping question row {position}: no usable text");
            }
            question
        })
        .collect()
}

fn normalize_question(
    row: &RawRow,
    position: usize,
    groups: &HashMap<String, OptionGroup>,
) -> Option<Question> {
    let text = row.first_text(QUESTION_TEXT_FIELDS)?;
    let fallback_id = i64::try_from(position).unwrap_or(i64::MAX).saturating_add(1);
    let id = QuestionId::new(row.first_integer(QUESTION_ID_FIELDS).unwrap_or(fallback_id));

    let group = row
        .first_text(QUESTION_ID_FIELDS)
        .and_then(|key| groups.get(&key));

    let (mut options, flagged) = match group {
        Some(group) => (group.options.clone(), group.flagged.clone()),
        None if groups.is_empty() => (inline_options(row), None),
        None => (Vec::new(), None),
    };
    pad_options(&mut options);

    let resolved = resolve_correct_answer(flagged.as_deref(), row, &options);
    Question::with_source(
        id,
        text,
        options,
        resolved.answer,
        row.first_text(CATEGORY_FIELDS),
        resolved.source,
    )
    .ok()
}

/// Option-like columns on a question row, trying each naming scheme in turn.
#[must_use]
pub fn inline_options(row: &RawRow) -> Vec<String> {
    let schemes: [Box<dyn Fn(usize, char) -> String>; 5] = [
        Box::new(|_, l| format!("option_{l}")),
        Box::new(|_, l| format!("option{}", l.to_ascii_uppercase())),
        Box::new(|i, _| format!("option{}", i + 1)),
        Box::new(|_, l| l.to_string()),
        Box::new(|_, l| l.to_ascii_uppercase().to_string()),
    ];
    for scheme in &schemes {
        let found: Vec<String> = INLINE_LETTERS
            .iter()
            .enumerate()
            .filter_map(|(i, l)| row.text(&scheme(i, *l)))
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Pad to four options with `Option A`.. labels not already present.
pub fn pad_options(options: &mut Vec<String>) {
    let mut letter = b'A';
    while options.len() < Question::MIN_OPTIONS && letter <= b'Z' {
        let label = format!("Option {}", letter as char);
        if !options.contains(&label) {
            options.push(label);
        }
        letter += 1;
    }
}
