#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod identity;
pub mod practice_service;
pub mod progress;
pub mod question_bank;

pub use practice_core::Clock;

pub use app_services::{AppConfig, AppServices, Backend};
pub use error::{AppServicesError, HistoryError, LoadError, PracticeError, SaveError};
pub use identity::IdentityWatch;
pub use practice_service::{PracticeService, SavedProgress, StartedSession};
pub use progress::{
    DEFAULT_HISTORY_LIMIT, HistoryEntry, HistoryReader, MAX_ATTEMPTS, ProgressSaver,
    ProgressTable, SaveReceipt,
};
pub use question_bank::{LoadedQuestions, QuestionBankLoader, QuestionTables};
