mod common;

use common::*;
use ringabell_core::{AudioInput, EngineError};
use std::sync::Arc;

#[test]
fn test_exact_copy_recognised() {
    let engine = engine_with_songs(&[1, 2, 3]);

    let result = engine.search(&mono(song(2))).unwrap();
    assert_eq!(result.song_name.as_deref(), Some("song-2.wav"));
    assert_eq!(result.song_id, Some(2));
    approx::assert_relative_eq!(result.score, 1.0);
    approx::assert_abs_diff_eq!(result.offset_seconds.unwrap(), 0.0, epsilon = 0.05);
}

#[test]
fn test_ids_follow_registration_order() {
    let engine = engine_with_songs(&[7, 8]);
    let songs = engine.songs().unwrap();
    assert_eq!(songs.len(), 2);
    assert_eq!((songs[0].id, songs[0].name.as_str()), (1, "song-7.wav"));
    assert_eq!((songs[1].id, songs[1].name.as_str()), (2, "song-8.wav"));
}

#[test]
fn test_time_shifted_query() {
    let engine = engine_with_songs(&[1, 2, 3]);

    // 22 hops of silence in front of the song
    let mut shifted = vec![0.0; 22 * HOP];
    shifted.extend(song(3));

    let result = engine.search(&mono(shifted)).unwrap();
    assert_eq!(result.song_name.as_deref(), Some("song-3.wav"));
    let expected = -(22.0 * HOP as f64) / RATE as f64;
    approx::assert_abs_diff_eq!(result.offset_seconds.unwrap(), expected, epsilon = 0.1);
}

#[test]
fn test_excerpt_recognised() {
    let engine = engine_with_songs(&[1, 2, 3]);

    let start = 43 * HOP;
    let excerpt = song(1)[start..start + 4 * RATE as usize].to_vec();

    let result = engine.search(&mono(excerpt)).unwrap();
    assert_eq!(result.song_name.as_deref(), Some("song-1.wav"));
    approx::assert_abs_diff_eq!(
        result.offset_seconds.unwrap(),
        start as f64 / RATE as f64,
        epsilon = 0.1
    );
}

#[test]
fn test_noisy_copy_scores_lower() {
    let engine = engine_with_songs(&[1, 2, 3]);

    let clean = engine.search(&mono(song(1))).unwrap();

    let mut noisy = song(1);
    add_noise(&mut noisy, 4242, 0.15);
    let degraded = engine.search(&mono(noisy)).unwrap();

    assert_eq!(degraded.song_name.as_deref(), Some("song-1.wav"));
    assert!(degraded.score > 0.0);
    assert!(degraded.score <= clean.score);
}

#[test]
fn test_unregistered_song_not_found() {
    let engine = engine_with_songs(&[1, 2, 3]);

    let result = engine.search(&mono(song(99))).unwrap();
    assert!(!result.is_match());
    assert_eq!(result.score, 0.0);
    assert_eq!(result.song_id, None);
    assert!(result.query_hashes > 0);
}

#[test]
fn test_silence_not_found() {
    let engine = engine_with_songs(&[1]);

    let result = engine.search(&mono(vec![0.0; 3 * RATE as usize])).unwrap();
    assert!(!result.is_match());
    assert_eq!(result.query_hashes, 0);
}

#[test]
fn test_stereo_wav_at_other_rate() {
    let engine = engine_with_songs(&[1, 2, 3]);

    let melody = melody(2, 32);
    let samples = render(&melody, 22050, 77, 0.1);
    let wav = AudioInput::Wav(wav_bytes(&samples, 22050, 2));

    let result = engine.search(&wav).unwrap();
    assert_eq!(result.song_name.as_deref(), Some("song-2.wav"));
}

#[test]
fn test_pcm16_input() {
    let engine = engine_with_songs(&[1, 2]);

    let bytes: Vec<u8> = song(1)
        .iter()
        .flat_map(|&s| ((s * i16::MAX as f32) as i16).to_le_bytes())
        .collect();
    let input = AudioInput::Pcm16 {
        bytes,
        sample_rate: RATE,
        channels: 1,
    };

    let result = engine.search(&input).unwrap();
    assert_eq!(result.song_name.as_deref(), Some("song-1.wav"));
}

#[test]
fn test_search_is_deterministic() {
    let engine = engine_with_songs(&[1, 2, 3]);

    let mut query = song(2)[10 * HOP..].to_vec();
    add_noise(&mut query, 5, 0.05);

    let first = engine.search(&mono(query.clone())).unwrap();
    let second = engine.search(&mono(query)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_search_leaves_state_unchanged() {
    let engine = engine_with_songs(&[1, 2]);
    let hashes = engine.hash_count().unwrap();

    engine.search(&mono(song(1))).unwrap();
    engine.search(&mono(song(50))).unwrap();

    assert_eq!(engine.song_count().unwrap(), 2);
    assert_eq!(engine.hash_count().unwrap(), hashes);
}

#[test]
fn test_empty_buffer_rejected() {
    let engine = engine_with_songs(&[1]);
    let hashes = engine.hash_count().unwrap();

    let err = engine.register("empty.wav", &mono(Vec::new())).unwrap_err();
    assert!(matches!(err, EngineError::InvalidAudioFormat(_)));

    let err = engine.search(&AudioInput::Wav(b"not a wav".to_vec())).unwrap_err();
    assert!(matches!(err, EngineError::InvalidAudioFormat(_)));

    assert_eq!(engine.song_count().unwrap(), 1);
    assert_eq!(engine.hash_count().unwrap(), hashes);
}

#[test]
fn test_duplicate_name_rejected() {
    let engine = engine_with_songs(&[1]);
    let hashes = engine.hash_count().unwrap();

    let err = engine.register("song-1.wav", &mono(song(2))).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateSongName(_)));
    assert_eq!(engine.song_count().unwrap(), 1);
    assert_eq!(engine.hash_count().unwrap(), hashes);
}

#[test]
fn test_removed_song_not_found() {
    let engine = engine_with_songs(&[1, 2]);

    assert_eq!(engine.remove("song-1.wav").unwrap(), 1);
    assert!(!engine.search(&mono(song(1))).unwrap().is_match());
    assert!(engine.search(&mono(song(2))).unwrap().is_match());

    // Ids are never reused
    let id = engine.register("song-1.wav", &mono(song(1))).unwrap();
    assert_eq!(id, 3);
}

#[test]
fn test_reset() {
    let engine = engine_with_songs(&[1, 2]);
    engine.reset().unwrap();

    assert_eq!(engine.song_count().unwrap(), 0);
    assert_eq!(engine.hash_count().unwrap(), 0);
    assert!(!engine.search(&mono(song(1))).unwrap().is_match());
}

#[test]
fn test_concurrent_searches() {
    let engine = Arc::new(engine_with_songs(&[1, 2, 3]));

    std::thread::scope(|scope| {
        for seed in [1u64, 2, 3, 1, 2, 3] {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                let result = engine.search(&mono(song(seed))).unwrap();
                assert_eq!(result.song_name, Some(format!("song-{}.wav", seed)));
            });
        }
    });
}

#[test]
fn test_concurrent_register_and_search() {
    let engine = Arc::new(engine_with_songs(&[1]));

    std::thread::scope(|scope| {
        for seed in 10u64..14 {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                engine
                    .register(&format!("song-{}.wav", seed), &mono(song(seed)))
                    .unwrap();
            });
        }
        let engine = Arc::clone(&engine);
        scope.spawn(move || {
            for _ in 0..3 {
                let result = engine.search(&mono(song(1))).unwrap();
                assert_eq!(result.song_name.as_deref(), Some("song-1.wav"));
            }
        });
    });

    assert_eq!(engine.song_count().unwrap(), 5);
    for seed in 10u64..14 {
        let result = engine.search(&mono(song(seed))).unwrap();
        assert_eq!(result.song_name, Some(format!("song-{}.wav", seed)));
    }
}
