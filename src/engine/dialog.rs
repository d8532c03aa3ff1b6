// Dialog audio and phoneme timing data

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Phoneme shapes of one spoken line, as ascending (time, shape) boundaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhonemeTrack {
    times: Vec<f32>,
    shapes: Vec<char>,
}

impl PhonemeTrack {
    /// Build a track; entries are sorted by time
    pub fn new(entries: impl IntoIterator<Item = (f32, char)>) -> Self {
        let mut entries: Vec<(f32, char)> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (times, shapes) = entries.into_iter().unzip();
        Self { times, shapes }
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Shape of the last boundary at or before `time`
    pub fn shape_at(&self, time: f32) -> Option<char> {
        let index = self.times.partition_point(|t| *t <= time);
        index.checked_sub(1).map(|i| self.shapes[i])
    }
}

/// Dialog collaborator queried by the lip-sync driver
pub trait DialogAudio {
    /// Playback position of the dialog audio currently voiced by `character`
    fn line_audio_time(&self, character: &str) -> Option<f32>;
    /// Phoneme data for a character's line, if it has been generated
    fn phonemes(&self, character: &str, line_id: i32) -> Option<&PhonemeTrack>;
}

/// In-memory phoneme tracks plus a simple per-character audio clock
#[derive(Debug, Default)]
pub struct PhonemeLibrary {
    tracks: HashMap<(String, i32), PhonemeTrack>,
    audio_times: HashMap<String, f32>,
}

impl PhonemeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_track(&mut self, character: &str, line_id: i32, track: PhonemeTrack) {
        self.tracks.insert((character.to_string(), line_id), track);
    }

    /// Start (or seek) the audio clock for a character's line
    pub fn set_audio_time(&mut self, character: &str, time: f32) {
        self.audio_times.insert(character.to_string(), time);
    }

    pub fn stop_audio(&mut self, character: &str) {
        self.audio_times.remove(character);
    }

    /// Advance every running audio clock
    pub fn advance(&mut self, dt: f32) {
        for time in self.audio_times.values_mut() {
            *time += dt;
        }
    }
}

impl DialogAudio for PhonemeLibrary {
    fn line_audio_time(&self, character: &str) -> Option<f32> {
        self.audio_times.get(character).copied()
    }

    fn phonemes(&self, character: &str, line_id: i32) -> Option<&PhonemeTrack> {
        self.tracks.get(&(character.to_string(), line_id))
    }
}
