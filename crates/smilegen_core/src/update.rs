use crate::failure::{classify, Guidance};
use crate::{
    format_duration, share_action, AppState, Effect, Msg, NoticeAction, NoticeLevel,
    ProcessedResult,
};

const COMPLETE_LABEL: &str = "Processing complete!";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ImageSelected(image) => {
            if state.is_busy() {
                return (state, Vec::new());
            }
            let mut message = format!(
                "Image ready: {} ({})",
                image.name,
                crate::format_file_size(image.size)
            );
            if let Some(original) = image.original_size.filter(|&size| size != image.size) {
                message.push_str(&format!(
                    " (Optimized: {} → {})",
                    crate::format_file_size(original),
                    crate::format_file_size(image.size)
                ));
            }
            state.select_image(image);
            state.push_notice(NoticeLevel::Success, message, None);
            Vec::new()
        }
        Msg::ImageRejected(reason) => {
            state.push_notice(NoticeLevel::Error, reason, None);
            Vec::new()
        }
        Msg::ExpressionSelected(expression) => {
            if !state.is_busy() && state.expression() != expression {
                state.set_expression(expression);
            }
            Vec::new()
        }
        Msg::CredentialChanged { present } => {
            state.set_credential(present);
            Vec::new()
        }
        Msg::ProcessClicked { now } => {
            // A trigger while a run is outstanding is dropped, not queued.
            if state.is_busy() {
                return (state, Vec::new());
            }
            let Some(image) = state.image().cloned() else {
                return (state, Vec::new());
            };
            if !state.has_credential() {
                let guidance = Guidance::MissingCredential;
                state.push_notice(NoticeLevel::Error, guidance.message(), guidance.action());
                return (state, Vec::new());
            }
            state.begin_run(now);
            vec![Effect::Submit {
                image,
                expression: state.expression(),
            }]
        }
        Msg::StageReached { stage, now } => {
            if state.is_busy() {
                state
                    .progress_mut()
                    .set_target(stage.percent(), stage.label(), stage.estimate(), now);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick => {
            if state.progress_mut().tick() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ProcessingSucceeded { result, now } => {
            if !state.is_busy() {
                return (state, Vec::new());
            }
            state.progress_mut().set_target(100.0, COMPLETE_LABEL, None, now);
            let elapsed = state.end_run(now).unwrap_or_default();
            state.set_result(ProcessedResult {
                source: result,
                placeholder: false,
            });
            state.push_notice(
                NoticeLevel::Success,
                format!(
                    "AI smile generation successful! Processing time: {}",
                    format_duration(elapsed.as_secs_f64())
                ),
                None,
            );
            Vec::new()
        }
        Msg::ProcessingFailed { failure, now } => {
            if !state.is_busy() {
                return (state, Vec::new());
            }
            state.end_run(now);
            let guidance = classify(&failure);
            state.push_notice(NoticeLevel::Error, guidance.message(), guidance.action());
            match state.image().cloned() {
                Some(image) => vec![Effect::RenderPlaceholder { image }],
                None => Vec::new(),
            }
        }
        Msg::PlaceholderReady(source) => {
            state.set_result(ProcessedResult {
                source,
                placeholder: true,
            });
            state.push_notice(
                NoticeLevel::Info,
                "Showing demo result (your original photo, not AI-edited). Set API key to use real AI processing.",
                Some(NoticeAction::SetKey),
            );
            Vec::new()
        }
        Msg::DownloadClicked => {
            let target = state
                .result()
                .zip(state.image())
                .map(|(result, image)| (result.source.clone(), image.download_filename()));
            match target {
                Some((source, filename)) => vec![Effect::SaveResult { source, filename }],
                None => {
                    state.push_notice(NoticeLevel::Error, "No result image to download.", None);
                    Vec::new()
                }
            }
        }
        Msg::DownloadFinished(outcome) => {
            match outcome {
                Ok(path) => state.push_notice(
                    NoticeLevel::Success,
                    format!("Image downloaded successfully! Saved to {path}"),
                    None,
                ),
                Err(_) => state.push_notice(
                    NoticeLevel::Error,
                    "Download failed. Please try again.",
                    None,
                ),
            };
            Vec::new()
        }
        Msg::ShareClicked { platform, page_url } => {
            vec![Effect::Share(share_action(platform, &page_url))]
        }
        Msg::NoticeActionInvoked(action) => match action {
            NoticeAction::SetKey => vec![Effect::PromptCredential],
            NoticeAction::ResetKey => {
                state.set_credential(false);
                vec![Effect::ClearCredential]
            }
        },
        Msg::DismissNotice(id) => {
            state.dismiss_notice(id);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
