use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use boxtrack_tracker::{
    load_frames_jsonl, FrameReport, Resolution, TrackerConfig, TrackingPhase,
};

fn testdata_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata")
        .join(name)
}

fn replay_session() -> Vec<FrameReport> {
    let config_path = testdata_path("session_config.json");
    let cfg = TrackerConfig::load_json(&config_path).expect("config");
    let base = config_path.parent().expect("config dir");
    let mut tracker = cfg.build_tracker(base).expect("tracker");

    let frames_path = cfg.frames_path(base).expect("frames path");
    let frames = load_frames_jsonl(frames_path).expect("frames");
    assert_eq!(frames.len(), 7);

    let reports: Vec<FrameReport> = frames
        .iter()
        .map(|f| tracker.update(&f.observations))
        .collect();

    let summary = tracker.snapshot();
    assert_eq!(summary.frames_processed, 7);
    assert_eq!(summary.phase, TrackingPhase::Tracking);
    assert_eq!(summary.reference_tags, vec![0]);
    reports
}

#[test]
fn counts_quarter_turns_across_the_seam() {
    let reports = replay_session();
    let counts: Vec<i64> = reports.iter().map(|r| r.rotation_count).collect();
    assert_eq!(counts, vec![0, 1, 2, 2, 3, 4, 5]);

    let last = reports.last().unwrap();
    assert_abs_diff_eq!(last.orientation_deg.unwrap(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(last.delta_deg.unwrap(), 90.0, epsilon = 1e-9);
}

#[test]
fn headings_stay_normalized() {
    for report in replay_session() {
        if let Some(deg) = report.orientation_deg {
            assert!((0.0..360.0).contains(&deg), "heading {deg} out of range");
        }
    }
}

#[test]
fn empty_frame_skips_heading_but_defaults_reference() {
    let reports = replay_session();
    let empty = &reports[3];
    assert!(empty.orientation_deg.is_none());
    assert!(empty.rotation_event.is_none());
    assert_eq!(empty.reference_orientation_deg(), Some(0.0));
    assert_eq!(empty.rotation_count, reports[2].rotation_count);
}

#[test]
fn calibrated_marker_resolves_directly() {
    let reports = replay_session();
    let first = reports[0].reference_orientation.expect("resolved");
    assert_abs_diff_eq!(first.degrees, 0.0, epsilon = 1e-5);
    assert!(matches!(
        first.resolution,
        Resolution::Matched {
            visible_tag: 0,
            reference_tag: 0,
            ..
        }
    ));
}

#[test]
fn hidden_reference_is_reached_through_opposite_face() {
    let reports = replay_session();
    let frame = &reports[4];
    assert_eq!(frame.visible_faces, vec!["bottom".to_string(), "left".to_string()]);
    assert_eq!(frame.contributing_markers, 1);

    let resolved = frame.reference_orientation.expect("resolved");
    match resolved.resolution {
        Resolution::Matched {
            visible_tag,
            reference_tag,
            edge_angle_deg,
            angle_between_deg,
        } => {
            assert_eq!(visible_tag, 24);
            assert_eq!(reference_tag, 0);
            assert_abs_diff_eq!(edge_angle_deg, 180.0);
            assert_abs_diff_eq!(resolved.degrees, 180.0 + angle_between_deg, epsilon = 1e-9);
        }
        other => panic!("unexpected resolution {other:?}"),
    }
}

#[test]
fn all_four_faces_complete_one_cycle() {
    let reports = replay_session();
    let completed: Vec<bool> = reports.iter().map(|r| r.cycle_completed).collect();
    assert_eq!(
        completed,
        vec![false, false, false, false, false, true, false]
    );
    assert_eq!(reports.last().unwrap().cycle_count, 1);
}
