use std::sync::Once;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use smilegen_core::{
    update, AppState, Effect, Expression, FailureCategory, Msg, NoticeAction, NoticeLevel,
    ProcessFailure, ResultSource, SelectedImage, Stage,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(smilegen_logging::initialize_for_tests);
}

fn portrait() -> SelectedImage {
    SelectedImage {
        name: "portrait.png".to_string(),
        mime: "image/png".to_string(),
        size: 2 * 1024 * 1024,
        original_size: None,
    }
}

fn ready_state() -> AppState {
    let (state, _) = update(AppState::with_credential(true), Msg::ImageSelected(portrait()));
    state
}

fn running_state(now: Instant) -> AppState {
    let (state, effects) = update(ready_state(), Msg::ProcessClicked { now });
    assert_eq!(effects.len(), 1);
    state
}

#[test]
fn process_click_submits_selected_image() {
    init_logging();
    let (mut state, effects) = update(ready_state(), Msg::ProcessClicked { now: Instant::now() });

    assert!(state.is_busy());
    assert!(state.consume_dirty());
    assert_eq!(
        effects,
        vec![Effect::Submit {
            image: portrait(),
            expression: Expression::DimpleSmile,
        }]
    );
}

#[test]
fn process_click_while_busy_is_dropped() {
    init_logging();
    let now = Instant::now();
    let mut state = running_state(now);
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::ProcessClicked { now });
    assert!(effects.is_empty());
    assert!(state.is_busy());
    assert!(!state.consume_dirty());
}

#[test]
fn process_click_without_image_does_nothing() {
    init_logging();
    let state = AppState::with_credential(true);
    let (next, effects) = update(state.clone(), Msg::ProcessClicked { now: Instant::now() });
    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn process_click_without_credential_asks_for_key() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::ImageSelected(portrait()));
    let (state, effects) = update(state, Msg::ProcessClicked { now: Instant::now() });

    assert!(effects.is_empty());
    assert!(!state.is_busy());
    let last = state.view().notices.last().cloned().expect("notice");
    assert_eq!(last.level, NoticeLevel::Error);
    assert_eq!(last.action, Some(NoticeAction::SetKey));
}

#[test]
fn stages_move_the_progress_target() {
    init_logging();
    let now = Instant::now();
    let state = running_state(now);
    let (state, _) = update(
        state,
        Msg::StageReached {
            stage: Stage::Analyzing,
            now,
        },
    );
    assert_eq!(state.progress().target(), 50.0);
    assert_eq!(state.progress().label(), Stage::Analyzing.label());

    let (state, _) = update(state, Msg::Tick);
    assert_eq!(state.view().progress_percent, 5);
}

#[test]
fn success_stores_result_and_reports_time() {
    init_logging();
    let started = Instant::now();
    let state = running_state(started);
    let (state, effects) = update(
        state,
        Msg::ProcessingSucceeded {
            result: ResultSource::Inline("data:image/jpeg;base64,AAAA".to_string()),
            now: started + Duration::from_secs(12),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.is_busy());
    assert_eq!(state.progress().target(), 100.0);
    let view = state.view();
    assert!(view.has_result);
    assert!(!view.result_is_placeholder);
    assert_eq!(
        view.notices.last().map(|n| n.message.as_str()),
        Some("AI smile generation successful! Processing time: 12s")
    );
}

#[test]
fn failure_classifies_and_requests_placeholder() {
    init_logging();
    let now = Instant::now();
    let state = running_state(now);
    let (state, effects) = update(
        state,
        Msg::ProcessingFailed {
            failure: ProcessFailure::new(FailureCategory::Api, Some(401), "unauthorized"),
            now,
        },
    );

    assert!(!state.is_busy());
    assert_eq!(effects, vec![Effect::RenderPlaceholder { image: portrait() }]);
    let notice = state.view().notices.last().cloned().expect("notice");
    assert_eq!(
        notice.message,
        "Invalid API key. Please check your AILabTools API key."
    );
    assert_eq!(notice.action, Some(NoticeAction::ResetKey));

    let (state, _) = update(
        state,
        Msg::PlaceholderReady(ResultSource::Inline("data:image/jpeg;base64,BBBB".to_string())),
    );
    let view = state.view();
    assert!(view.result_is_placeholder);
    let notice = view.notices.last().expect("demo notice");
    assert!(notice.message.contains("not AI-edited"), "{}", notice.message);
    assert_eq!(notice.action, Some(NoticeAction::SetKey));
}

#[test]
fn reset_key_action_clears_credential() {
    init_logging();
    let (state, effects) = update(
        AppState::with_credential(true),
        Msg::NoticeActionInvoked(NoticeAction::ResetKey),
    );
    assert!(!state.has_credential());
    assert_eq!(effects, vec![Effect::ClearCredential]);
}

#[test]
fn download_uses_smile_filename() {
    init_logging();
    let now = Instant::now();
    let source = ResultSource::Remote("https://cdn.example.com/out.jpg".to_string());
    let (state, _) = update(
        running_state(now),
        Msg::ProcessingSucceeded {
            result: source.clone(),
            now,
        },
    );
    let (_state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(
        effects,
        vec![Effect::SaveResult {
            source,
            filename: "portrait_smile.jpg".to_string(),
        }]
    );
}

#[test]
fn download_without_result_reports_error() {
    init_logging();
    let (state, effects) = update(ready_state(), Msg::DownloadClicked);
    assert!(effects.is_empty());
    assert_eq!(
        state.view().notices.last().map(|n| n.level),
        Some(NoticeLevel::Error)
    );
}

#[test]
fn expression_is_locked_while_busy() {
    init_logging();
    let state = running_state(Instant::now());
    let (state, _) = update(state, Msg::ExpressionSelected(Expression::BigGrin));
    assert_eq!(state.expression(), Expression::DimpleSmile);
}

#[test]
fn optimized_image_reports_size_reduction() {
    init_logging();
    let image = SelectedImage {
        original_size: Some(6 * 1024 * 1024),
        ..portrait()
    };
    let (state, _) = update(AppState::with_credential(true), Msg::ImageSelected(image));

    let notice = state.view().notices.last().cloned().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(
        notice.message,
        "Image ready: portrait.png (2 MB) (Optimized: 6 MB → 2 MB)"
    );
}

#[test]
fn notices_are_capped_and_oldest_evicted() {
    init_logging();
    let mut state = AppState::with_credential(true);
    for n in 1..=6 {
        state = update(state, Msg::ImageRejected(format!("rejected {n}"))).0;
    }

    let notices = state.view().notices;
    assert_eq!(notices.len(), 5);
    let ids: Vec<_> = notices.iter().map(|notice| notice.id).collect();
    assert_eq!(ids, vec![2, 3, 4, 5, 6]);
    assert_eq!(notices[0].message, "rejected 2");
}
