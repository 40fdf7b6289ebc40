use std::time::Instant;

use crate::{
    Expression, NoticeAction, NoticeId, ProcessFailure, ResultSource, SelectedImage,
    SharePlatform, Stage,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked an image that passed local validation.
    ImageSelected(SelectedImage),
    /// User picked an image that failed local validation.
    ImageRejected(String),
    /// User chose the expression to apply.
    ExpressionSelected(Expression),
    /// Credential was set, loaded or cleared.
    CredentialChanged { present: bool },
    /// User asked to process the selected image.
    ProcessClicked { now: Instant },
    /// Engine reached a processing milestone.
    StageReached { stage: Stage, now: Instant },
    /// Animation/timer tick.
    Tick,
    /// Engine returned an edited image.
    ProcessingSucceeded { result: ResultSource, now: Instant },
    /// Engine gave up on the run.
    ProcessingFailed { failure: ProcessFailure, now: Instant },
    /// Locally generated stand-in result is available.
    PlaceholderReady(ResultSource),
    /// User clicked Download.
    DownloadClicked,
    /// Saving finished with the written path or an error message.
    DownloadFinished(Result<String, String>),
    /// User clicked a share button.
    ShareClicked { platform: SharePlatform, page_url: String },
    /// User clicked the action button on a notice.
    NoticeActionInvoked(NoticeAction),
    DismissNotice(NoticeId),
    /// Fallback for placeholder wiring.
    NoOp,
}
