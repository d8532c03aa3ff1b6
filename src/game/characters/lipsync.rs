// Lip-sync driver
//
// Maps the dialog audio clock through phoneme timing data to a mouth frame
// and holds the mouth (or the whole talk clip) paused on it.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::math::time_increment_passed;
use crate::engine::animation::SpriteAnimator;
use crate::game::context::TickContext;

use super::character::Character;

/// Mouth shapes A to F every lip-sync clip provides
pub const BASE_MOUTH_SHAPES: usize = 6;

/// Lip-sync options shared by all characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncSettings {
    /// Seconds subtracted from the audio clock to cover output latency
    pub latency: f32,
    /// Extra shapes drawn after the base ones, in frame order (e.g. "GHX")
    pub extended_shapes: String,
    /// Closed mouth is drawn as 'X' rather than 'A'
    pub uses_x_shape: bool,
    /// How often the mouth may move while no phoneme data exists
    pub fallback_interval: f32,
    /// Chance of a new random mouth frame at each fallback interval
    pub fallback_chance: f32,
}

impl Default for LipSyncSettings {
    fn default() -> Self {
        Self {
            latency: 0.1,
            extended_shapes: String::new(),
            uses_x_shape: false,
            fallback_interval: 0.1,
            fallback_chance: 0.8,
        }
    }
}

impl LipSyncSettings {
    /// Number of frames in a mouth clip
    pub fn total_frames(&self) -> usize {
        BASE_MOUTH_SHAPES + self.extended_shapes.chars().count()
    }

    /// Shape shown before the first phoneme
    pub fn closed_shape(&self) -> char {
        if self.uses_x_shape {
            'X'
        } else {
            'A'
        }
    }

    /// Frame index for a phoneme shape letter
    pub fn frame_for_shape(&self, shape: char) -> usize {
        let last = self.total_frames() as i64 - 1;
        (shape as i64 - 'A' as i64).clamp(0, last) as usize
    }

    /// Normalized clip time at the middle of `frame`
    pub fn frame_time(&self, frame: usize) -> f32 {
        (frame as f32 + 0.5) / self.total_frames() as f32
    }

    fn frame_at_time(&self, time: f32) -> usize {
        let total = self.total_frames();
        ((time.max(0.0) * total as f32) as usize).min(total - 1)
    }
}

impl Character {
    /// Drive the mouth from the dialog audio while talking
    pub(super) fn update_lip_sync(&mut self, ctx: &mut TickContext) {
        if !self.settings.lip_sync_enabled {
            return;
        }
        if !self.state.talking {
            self.mouth_visible = false;
            return;
        }

        let use_mouth = self.mouth.is_some() && !self.settings.anim_mouth.is_empty();
        if use_mouth {
            // An anchor at the origin means this pose has no mouth
            if self.animator.mouth_anchor() == Vec2::ZERO {
                self.mouth_visible = false;
                return;
            }
            self.mouth_visible = true;
        }

        let settings = ctx.lip_sync;
        let dialog = ctx.dialog;
        let track = dialog
            .phonemes(&self.settings.name, self.state.current_line_id)
            .filter(|track| !track.is_empty());

        let talk_animator: &mut dyn SpriteAnimator = match self.mouth.as_deref_mut() {
            Some(mouth) if use_mouth => mouth,
            _ => self.animator.as_mut(),
        };

        let new_time = match track {
            Some(track) => {
                let time = dialog.line_audio_time(&self.settings.name).unwrap_or(0.0) - settings.latency;
                let shape = track
                    .shape_at(time)
                    .unwrap_or_else(|| settings.closed_shape());
                let frame = settings.frame_for_shape(shape);
                self.state.lip_sync_frame = frame;
                settings.frame_time(frame)
            }
            None => {
                // No phoneme data yet, fake it
                let time = if time_increment_passed(settings.fallback_interval, ctx.game_time, ctx.dt)
                    && ctx.rng.gen::<f32>() < settings.fallback_chance
                {
                    ctx.rng.gen::<f32>()
                } else {
                    talk_animator.normalized_time()
                };
                self.state.lip_sync_frame = settings.frame_at_time(time);
                time
            }
        };

        talk_animator.set_normalized_time(new_time);
        talk_animator.pause();
    }
}
