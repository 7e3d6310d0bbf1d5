mod history_vm;
mod practice_vm;
mod summary_vm;
mod time_fmt;

pub use history_vm::{HistoryRowVm, TrendPointVm, map_history_rows, map_history_trend};
pub use practice_vm::{
    GridCellVm, IntentOutcome, OptionVm, PracticeIntent, PracticeScreenVm, apply_intent,
    map_practice_screen, settle_save,
};
pub use summary_vm::{
    HINT_CONNECTION, HINT_PERMISSIONS, HINT_SCHEMA, SaveFeedbackVm, SaveStatusVm, SummaryVm,
    diagnostic_hints, map_save_error, map_save_success, map_summary,
};
pub use time_fmt::{format_datetime, format_duration, format_timer};
