mod fallback;
mod identity;
mod ids;
mod progress;
mod question;
mod row;
mod score;
mod session;

pub use ids::{ParseIdError, QuestionId, SessionId, UserId};

pub use fallback::{BUILTIN_QUESTION_COUNT, builtin_questions};
pub use identity::AuthIdentity;
pub use progress::ProgressRecord;
pub use question::{AnswerSource, Question, QuestionError};
pub use row::RawRow;
pub use score::{ScoreSummary, score};
pub use session::{
    AnswerFilter, PracticeSession, QuestionStatus, SaveState, SessionPhase, SessionStateError,
};
