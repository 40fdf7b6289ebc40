use std::time::{Duration, Instant};

use smilegen_core::{remaining_from, ProgressState};

#[test]
fn targets_outside_range_are_clamped() {
    let now = Instant::now();
    let mut progress = ProgressState::new();
    for (input, expected) in [(-20.0, 0.0), (250.0, 100.0), (42.5, 42.5), (100.0, 100.0)] {
        progress.set_target(input, "step", None, now);
        assert_eq!(progress.target(), expected, "input {input}");
    }
}

#[test]
fn half_way_after_ten_seconds_leaves_ten_seconds() {
    let remaining = remaining_from(Duration::from_secs(10), 50.0).expect("estimate");
    assert!((remaining.as_secs_f64() - 10.0).abs() < 1e-6);
}

#[test]
fn zero_percent_has_no_estimate() {
    assert_eq!(remaining_from(Duration::from_secs(10), 0.0), None);
}

#[test]
fn estimate_needs_a_start_reference() {
    let now = Instant::now();
    let mut progress = ProgressState::new();
    progress.set_target(50.0, "no hint", None, now);
    while progress.tick() {}
    progress.tick();
    assert_eq!(progress.estimate_remaining(now + Duration::from_secs(5)), None);
}

#[test]
fn estimate_uses_displayed_percent() {
    let start = Instant::now();
    let mut progress = ProgressState::new();
    progress.set_target(50.0, "working", Some(Duration::from_secs(20)), start);
    while progress.tick() {}
    progress.tick();
    assert_eq!(progress.current(), 50.0);

    let remaining = progress
        .estimate_remaining(start + Duration::from_secs(10))
        .expect("estimate");
    assert!((remaining.as_secs_f64() - 10.0).abs() < 1e-6);
    assert_eq!(
        progress.status_line(start + Duration::from_secs(10)).as_deref(),
        Some("Estimated remaining: 10s")
    );
}

#[test]
fn full_progress_reports_almost_done() {
    let start = Instant::now();
    let mut progress = ProgressState::new();
    progress.set_target(100.0, "done", Some(Duration::from_secs(5)), start);
    while progress.tick() {}
    progress.tick();
    assert_eq!(
        progress.status_line(start + Duration::from_secs(3)).as_deref(),
        Some("Almost done...")
    );
}

#[test]
fn reset_zeroes_everything() {
    let now = Instant::now();
    let mut progress = ProgressState::new();
    progress.set_target(70.0, "busy", Some(Duration::from_secs(3)), now);
    progress.tick();
    progress.reset();
    assert_eq!(progress, ProgressState::default());
    assert_eq!(progress.estimate_remaining(now), None);
}
