use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::progress::ProgressState;
use crate::view_model::{AppViewModel, NoticeView};

/// Most notices shown at once; the oldest is evicted first.
pub const MAX_NOTICES: usize = 5;

pub type NoticeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expression {
    #[default]
    DimpleSmile,
    PearDimpleSmile,
    BigGrin,
    StandardGrin,
    CoolPose,
    Sad,
    ForcedSmile,
    OpeningEyes,
}

/// Milestones of one processing run, each a progress checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Sending,
    Analyzing,
    Generating,
}

impl Stage {
    pub fn percent(self) -> f64 {
        match self {
            Stage::Preparing => 10.0,
            Stage::Sending => 30.0,
            Stage::Analyzing => 50.0,
            Stage::Generating => 80.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Preparing => "Preparing image for AI processing...",
            Stage::Sending => "Sending to AILabTools API...",
            Stage::Analyzing => "AI is analyzing facial features...",
            Stage::Generating => "Generating natural smile effect...",
        }
    }

    /// Duration hint that restarts the remaining-time estimate.
    pub fn estimate(self) -> Option<Duration> {
        match self {
            Stage::Preparing => Some(Duration::from_secs(20)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub name: String,
    pub mime: String,
    pub size: u64,
    /// Size on disk before the upload was re-encoded, if it was.
    pub original_size: Option<u64>,
}

impl SelectedImage {
    /// `portrait.png` becomes `portrait_smile.jpg`.
    pub fn download_filename(&self) -> String {
        let stem = match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem,
            _ => self.name.as_str(),
        };
        format!("{stem}_smile.jpg")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSource {
    /// Self-describing `data:image/...;base64,` payload.
    Inline(String),
    /// Server-hosted image to be fetched on download.
    Remote(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResult {
    pub source: ResultSource,
    pub placeholder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    SetKey,
    ResetKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub level: NoticeLevel,
    pub message: String,
    pub action: Option<NoticeAction>,
}

/// Session-scoped state owned by the UI loop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    image: Option<SelectedImage>,
    expression: Expression,
    has_credential: bool,
    busy: bool,
    run_started_at: Option<Instant>,
    progress: ProgressState,
    result: Option<ProcessedResult>,
    notices: VecDeque<Notice>,
    next_notice_id: NoticeId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(has_credential: bool) -> Self {
        Self {
            has_credential,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            busy: self.busy,
            has_credential: self.has_credential,
            image: self.image.clone(),
            expression: self.expression,
            progress_percent: self.progress.current().round() as u8,
            progress_label: self.progress.label().to_string(),
            has_result: self.result.is_some(),
            result_is_placeholder: self.result.as_ref().is_some_and(|r| r.placeholder),
            download_filename: self.image.as_ref().map(SelectedImage::download_filename),
            notices: self
                .notices
                .iter()
                .map(|notice| NoticeView {
                    id: notice.id,
                    level: notice.level,
                    message: notice.message.clone(),
                    action: notice.action,
                })
                .collect(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_credential(&self) -> bool {
        self.has_credential
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    pub fn expression(&self) -> Expression {
        self.expression
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn result(&self) -> Option<&ProcessedResult> {
        self.result.as_ref()
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn progress_mut(&mut self) -> &mut ProgressState {
        &mut self.progress
    }

    pub(crate) fn select_image(&mut self, image: SelectedImage) {
        self.image = Some(image);
        self.result = None;
        self.progress.reset();
        self.mark_dirty();
    }

    pub(crate) fn set_expression(&mut self, expression: Expression) {
        self.expression = expression;
        self.mark_dirty();
    }

    pub(crate) fn set_credential(&mut self, present: bool) {
        self.has_credential = present;
        self.mark_dirty();
    }

    pub(crate) fn begin_run(&mut self, now: Instant) {
        self.busy = true;
        self.run_started_at = Some(now);
        self.result = None;
        self.progress.reset();
        self.mark_dirty();
    }

    /// Clears the busy flag; returns how long the run took.
    pub(crate) fn end_run(&mut self, now: Instant) -> Option<Duration> {
        self.busy = false;
        self.mark_dirty();
        self.run_started_at
            .take()
            .map(|started| now.saturating_duration_since(started))
    }

    pub(crate) fn set_result(&mut self, result: ProcessedResult) {
        self.result = Some(result);
        self.mark_dirty();
    }

    pub(crate) fn push_notice(
        &mut self,
        level: NoticeLevel,
        message: impl Into<String>,
        action: Option<NoticeAction>,
    ) -> NoticeId {
        self.next_notice_id += 1;
        let id = self.next_notice_id;
        if self.notices.len() >= MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            id,
            level,
            message: message.into(),
            action,
        });
        self.mark_dirty();
        id
    }

    pub(crate) fn dismiss_notice(&mut self, id: NoticeId) {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        if self.notices.len() != before {
            self.mark_dirty();
        }
    }
}
