//! Smilegen core: pure session state machine, progress estimation and view-model helpers.
mod effect;
mod failure;
mod format;
mod msg;
mod progress;
mod share;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use failure::{classify, FailureCategory, Guidance, ProcessFailure};
pub use format::{format_duration, format_file_size};
pub use msg::Msg;
pub use progress::{clamp_percent, remaining_from, ProgressState, EASING_FACTOR, SNAP_EPSILON};
pub use share::{share_action, ShareAction, SharePlatform, SHARE_TEXT};
pub use state::{
    AppState, Expression, Notice, NoticeAction, NoticeId, NoticeLevel, ProcessedResult,
    ResultSource, SelectedImage, Stage, MAX_NOTICES,
};
pub use update::update;
pub use view_model::{AppViewModel, NoticeView};
