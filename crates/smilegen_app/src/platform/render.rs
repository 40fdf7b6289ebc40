use smilegen_core::{AppViewModel, NoticeAction, NoticeId, NoticeLevel};

/// Turns view-model changes into terminal lines, printing each notice once.
#[derive(Debug, Default)]
pub struct Renderer {
    last_label: String,
    last_decile: Option<u8>,
    last_notice: Option<NoticeId>,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel, status: Option<String>) {
        for line in self.lines(view, status) {
            println!("{line}");
        }
    }

    pub fn lines(&mut self, view: &AppViewModel, status: Option<String>) -> Vec<String> {
        let mut lines = Vec::new();

        let decile = view.progress_percent / 10;
        let label_changed = !view.progress_label.is_empty() && view.progress_label != self.last_label;
        if label_changed || (view.busy && self.last_decile.is_some_and(|last| decile > last)) {
            let mut line = format!("[{:>3}%] {}", view.progress_percent, view.progress_label);
            if let Some(status) = status.filter(|_| view.busy) {
                line.push_str(&format!("  ({status})"));
            }
            lines.push(line);
            self.last_label = view.progress_label.clone();
            self.last_decile = Some(decile);
        }

        for notice in &view.notices {
            if self.last_notice.is_some_and(|last| notice.id <= last) {
                continue;
            }
            let mut line = format!("{} {}", level_tag(notice.level), notice.message);
            if let Some(hint) = notice.action.map(action_hint) {
                line.push_str(&format!(" ({hint})"));
            }
            lines.push(line);
            self.last_notice = Some(notice.id);
        }

        lines
    }
}

fn level_tag(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "[info]",
        NoticeLevel::Success => "[ ok ]",
        NoticeLevel::Warning => "[warn]",
        NoticeLevel::Error => "[fail]",
    }
}

fn action_hint(action: NoticeAction) -> &'static str {
    match action {
        NoticeAction::SetKey => "run `smilegen key set`",
        NoticeAction::ResetKey => "run `smilegen key clear` and set a new key",
    }
}
