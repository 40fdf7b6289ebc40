use crate::{Expression, NoticeAction, NoticeId, NoticeLevel, SelectedImage};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub busy: bool,
    pub has_credential: bool,
    pub image: Option<SelectedImage>,
    pub expression: Expression,
    pub progress_percent: u8,
    pub progress_label: String,
    pub has_result: bool,
    pub result_is_placeholder: bool,
    pub download_filename: Option<String>,
    pub notices: Vec<NoticeView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub id: NoticeId,
    pub level: NoticeLevel,
    pub message: String,
    pub action: Option<NoticeAction>,
}
