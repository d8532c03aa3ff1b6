// Clip playback: the engine-side animator interface and a frame-based player

use glam::Vec2;

use super::{AnimEvent, AnimationClip};

/// Playback primitives the character layer needs from the engine.
///
/// One animator drives the body sprite, an optional second one drives the
/// mouth overlay.
pub trait SpriteAnimator: std::fmt::Debug {
    /// Start `clip` from its first frame
    fn play(&mut self, clip: &AnimationClip);
    fn pause(&mut self);
    fn resume(&mut self);
    fn is_paused(&self) -> bool;
    /// False once a one-shot clip has reached its end
    fn is_playing(&self) -> bool;
    /// Name of the clip currently loaded, if any
    fn clip_name(&self) -> Option<&str>;
    fn normalized_time(&self) -> f32;
    fn set_normalized_time(&mut self, time: f32);
    /// Mirror the sprite horizontally (negative x scale)
    fn set_flip_horizontal(&mut self, flip: bool);
    fn is_flipped_horizontal(&self) -> bool;
    /// Mouth attachment point on the current frame, relative to the owner
    fn mouth_anchor(&self) -> Vec2 {
        Vec2::ZERO
    }
    /// Advance playback
    fn update(&mut self, dt: f32);
    /// Take the events raised since the last call
    fn drain_events(&mut self) -> Vec<AnimEvent>;
}

/// Frame-based clip player
#[derive(Debug)]
pub struct ClipPlayer {
    /// Clip being played
    clip: Option<AnimationClip>,
    /// Current frame index
    current_frame: usize,
    /// Time elapsed in current frame
    frame_timer: f32,
    /// False once a one-shot clip has finished
    playing: bool,
    paused: bool,
    /// Whether the sprite should be flipped horizontally
    flip_horizontal: bool,
    events: Vec<AnimEvent>,
}

impl Default for ClipPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipPlayer {
    pub fn new() -> Self {
        Self {
            clip: None,
            current_frame: 0,
            frame_timer: 0.0,
            playing: false,
            paused: false,
            flip_horizontal: false,
            events: Vec::new(),
        }
    }

    /// Get the current frame index
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }
}

impl SpriteAnimator for ClipPlayer {
    fn play(&mut self, clip: &AnimationClip) {
        self.current_frame = 0;
        self.frame_timer = 0.0;
        self.playing = true;
        self.paused = false;
        self.events.push(AnimEvent::Reset);
        self.events.extend(clip.events_at(0).cloned());
        self.clip = Some(clip.clone());
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_playing(&self) -> bool {
        self.clip.is_some() && self.playing
    }

    fn clip_name(&self) -> Option<&str> {
        self.clip.as_ref().map(|clip| clip.name.as_str())
    }

    fn normalized_time(&self) -> f32 {
        let Some(clip) = &self.clip else {
            return 0.0;
        };
        if clip.frame_duration <= 0.0 || clip.frame_count == 0 {
            return 0.0;
        }
        (self.current_frame as f32 + self.frame_timer / clip.frame_duration)
            / clip.frame_count as f32
    }

    fn set_normalized_time(&mut self, time: f32) {
        let Some(clip) = &self.clip else {
            return;
        };
        let time = time.clamp(0.0, 1.0);
        let position = time * clip.frame_count as f32;
        let frame = (position.floor() as usize).min(clip.frame_count.saturating_sub(1));
        self.current_frame = frame;
        self.frame_timer = (position - frame as f32) * clip.frame_duration;
        if time < 1.0 {
            self.playing = true;
        }
    }

    fn set_flip_horizontal(&mut self, flip: bool) {
        self.flip_horizontal = flip;
    }

    fn is_flipped_horizontal(&self) -> bool {
        self.flip_horizontal
    }

    fn mouth_anchor(&self) -> Vec2 {
        self.clip
            .as_ref()
            .and_then(|clip| clip.mouth_anchors.get(self.current_frame).copied())
            .unwrap_or(Vec2::ZERO)
    }

    fn update(&mut self, dt: f32) {
        if !self.playing || self.paused {
            return;
        }

        let Some(clip) = &self.clip else {
            return;
        };
        if clip.frame_duration <= 0.0 {
            return;
        }

        self.frame_timer += dt;

        while self.frame_timer >= clip.frame_duration {
            if self.current_frame + 1 >= clip.frame_count {
                if clip.looping {
                    self.frame_timer -= clip.frame_duration;
                    self.current_frame = 0;
                } else {
                    // Hold the last frame
                    self.frame_timer = clip.frame_duration;
                    self.playing = false;
                    break;
                }
            } else {
                self.frame_timer -= clip.frame_duration;
                self.current_frame += 1;
            }
            self.events.extend(clip.events_at(self.current_frame).cloned());
        }
    }

    fn drain_events(&mut self) -> Vec<AnimEvent> {
        std::mem::take(&mut self.events)
    }
}
