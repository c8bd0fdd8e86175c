mod common;

use common::{note_on_track, smf};
use midiplay::backend::MockBackend;
use midiplay::player::{PlaybackController, PlaybackState, PlayerError};
use midiplay::DecodeError;

const EPSILON: f64 = 1e-9;

fn assert_times(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < EPSILON, "{:?} vs {:?}", actual, expected);
    }
}

fn two_track_file() -> Vec<u8> {
    smf(
        480,
        &[
            note_on_track(&[(0, 72, 100), (480, 74, 100)]),
            note_on_track(&[(0, 48, 80), (960, 50, 0)]),
        ],
    )
}

fn loaded_player() -> PlaybackController<MockBackend> {
    let mut player = PlaybackController::new(MockBackend::new());
    player.load_bytes(&two_track_file()).unwrap();
    player
}

#[test]
fn test_play_dispatches_every_sounding_note() {
    let mut player = loaded_player();

    assert_eq!(player.play(), 3);
    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(player.active_handles(), 3);

    let notes: Vec<i32> = player.backend().triggered().iter().map(|n| n.note).collect();
    assert_eq!(notes, vec![72, 74, 48]);
    assert!(player
        .backend()
        .triggered()
        .iter()
        .all(|n| n.duration == player.note_duration()));
}

#[test]
fn test_play_without_tracks_stays_stopped() {
    let mut player = PlaybackController::new(MockBackend::new());
    assert_eq!(player.play(), 0);
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(player.backend().triggered().is_empty());
}

#[test]
fn test_play_while_playing_is_a_no_op() {
    let mut player = loaded_player();
    player.play();
    assert_eq!(player.play(), 0);
    assert_eq!(player.backend().triggered().len(), 3);
    assert_eq!(player.active_handles(), 3);
}

#[test]
fn test_stop_silences_every_handle() {
    let mut player = loaded_player();
    player.play();
    player.stop();

    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(player.active_handles(), 0);
    assert!(player.backend().triggered().iter().all(|n| n.is_stopped()));
    assert_eq!(player.backend().stop_calls(), 3);
}

#[test]
fn test_stop_twice_matches_stop_once() {
    let mut player = loaded_player();
    player.play();
    player.stop();
    let calls_after_first = player.backend().stop_calls();

    player.stop();
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(player.active_handles(), 0);
    assert_eq!(player.backend().stop_calls(), calls_after_first);
}

#[test]
fn test_stop_when_never_played() {
    let mut player = PlaybackController::new(MockBackend::new());
    player.stop();
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn test_settings_apply_on_next_play_only() {
    let mut player = loaded_player();
    player.play();

    player.set_transpose(12);
    player.set_mute_lead(true);
    player.set_tempo(2.0).unwrap();

    // Already scheduled notes keep their original values
    let notes: Vec<i32> = player.backend().triggered().iter().map(|n| n.note).collect();
    let times: Vec<f64> = player.backend().triggered().iter().map(|n| n.at).collect();
    assert_eq!(notes, vec![72, 74, 48]);
    assert_times(&times, &[0.0, 0.5, 0.0]);

    player.stop();
    player.backend_mut().clear();
    player.backend_mut().set_time(5.0);
    assert_eq!(player.play(), 1);

    let second = &player.backend().triggered()[0];
    assert_eq!(second.note, 60);
    assert_eq!(second.at, 5.0);
}

#[test]
fn test_tempo_change_after_stop() {
    let mut player = loaded_player();
    player.set_tempo(2.0).unwrap();
    player.play();
    let times: Vec<f64> = player.backend().triggered().iter().map(|n| n.at).collect();
    assert_times(&times, &[0.0, 0.25, 0.0]);
}

#[test]
fn test_failed_load_keeps_previous_score() {
    let mut player = loaded_player();
    let before = player.score().clone();

    let mut bad = two_track_file();
    bad[..4].copy_from_slice(b"MThX");
    let result = player.load_bytes(&bad);

    assert!(matches!(
        result,
        Err(PlayerError::Decode(DecodeError::InvalidFormat(_)))
    ));
    assert_eq!(player.score(), &before);
}

#[test]
fn test_truncated_load_keeps_previous_score() {
    let mut player = loaded_player();
    let before = player.score().clone();

    let data = two_track_file();
    let result = player.load_bytes(&data[..data.len() - 3]);

    assert!(matches!(
        result,
        Err(PlayerError::Decode(DecodeError::OutOfBounds { .. }))
    ));
    assert_eq!(player.score(), &before);
}

#[test]
fn test_load_while_playing_keeps_playing() {
    let mut player = loaded_player();
    player.play();

    let other = smf(96, &[note_on_track(&[(0, 30, 30)])]);
    player.load_bytes(&other).unwrap();

    assert!(player.is_playing());
    assert_eq!(player.active_handles(), 3);
    assert_eq!(player.score().division, 96);
    assert!(!player.backend().triggered().iter().any(|n| n.is_stopped()));
}

#[test]
fn test_out_of_range_notes_reach_the_backend_unchanged() {
    let mut player = PlaybackController::new(MockBackend::new());
    player
        .load_bytes(&smf(480, &[note_on_track(&[(0, 2, 100)])]))
        .unwrap();
    player.set_transpose(-5);
    player.play();
    assert_eq!(player.backend().triggered()[0].note, -3);
}
