// Animation clips and the per-character clip catalog

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::AnimEvent;

/// Event tag authored on a specific frame of a clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTag {
    pub frame: usize,
    pub event: AnimEvent,
}

/// A single animation clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Full clip name including any directional postfix (e.g. "WalkDL")
    pub name: String,
    /// Number of frames in the animation
    pub frame_count: usize,
    /// Duration of each frame in seconds
    pub frame_duration: f32,
    /// Whether the animation loops
    #[serde(default)]
    pub looping: bool,
    /// Events fired when playback enters a frame
    #[serde(default)]
    pub tags: Vec<FrameTag>,
    /// Mouth attachment point per frame, relative to the character.
    /// The origin means "no mouth on this frame".
    #[serde(default)]
    pub mouth_anchors: Vec<Vec2>,
}

impl AnimationClip {
    /// Create a new animation clip
    pub fn new(name: &str, frame_count: usize, fps: f32, looping: bool) -> Self {
        Self {
            name: name.to_string(),
            frame_count: frame_count.max(1),
            frame_duration: 1.0 / fps,
            looping,
            tags: Vec::new(),
            mouth_anchors: Vec::new(),
        }
    }

    /// Create a looping animation
    pub fn looping(name: &str, frame_count: usize, fps: f32) -> Self {
        Self::new(name, frame_count, fps, true)
    }

    /// Create a one-shot animation (plays once)
    pub fn one_shot(name: &str, frame_count: usize, fps: f32) -> Self {
        Self::new(name, frame_count, fps, false)
    }

    /// Attach an event to a frame
    pub fn with_tag(mut self, frame: usize, event: AnimEvent) -> Self {
        self.tags.push(FrameTag { frame, event });
        self
    }

    /// Use the same mouth anchor on every frame
    pub fn with_mouth_anchor(mut self, anchor: Vec2) -> Self {
        self.mouth_anchors = vec![anchor; self.frame_count];
        self
    }

    /// Events authored on `frame`
    pub fn events_at(&self, frame: usize) -> impl Iterator<Item = &AnimEvent> + '_ {
        self.tags
            .iter()
            .filter(move |tag| tag.frame == frame)
            .map(|tag| &tag.event)
    }
}

/// Ordered collection of the clips available to one character.
///
/// Owned by the asset layer; characters only read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationCatalog {
    clips: Vec<AnimationClip>,
}

impl AnimationCatalog {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self { clips }
    }

    /// Add a clip at the end of the catalog
    pub fn push(&mut self, clip: AnimationClip) {
        self.clips.push(clip);
    }

    /// Find a clip by name, ignoring ASCII case
    pub fn find(&self, name: &str) -> Option<&AnimationClip> {
        self.clips
            .iter()
            .find(|clip| clip.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationClip> {
        self.clips.iter()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl FromIterator<AnimationClip> for AnimationCatalog {
    fn from_iter<I: IntoIterator<Item = AnimationClip>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_clip_creation() {
        let clip = AnimationClip::looping("IdleL", 4, 8.0);
        assert_eq!(clip.name, "IdleL");
        assert_eq!(clip.frame_count, 4);
        assert_eq!(clip.frame_duration, 0.125); // 1/8
        assert!(clip.looping);
    }

    #[test]
    fn test_events_at_frame() {
        let clip = AnimationClip::one_shot("Sit", 6, 10.0)
            .with_tag(2, AnimEvent::LoopStart)
            .with_tag(4, AnimEvent::LoopEnd);
        assert_eq!(clip.events_at(2).collect::<Vec<_>>(), vec![&AnimEvent::LoopStart]);
        assert_eq!(clip.events_at(3).count(), 0);
    }

    #[test]
    fn test_catalog_find_ignores_case() {
        let catalog: AnimationCatalog = [
            AnimationClip::looping("IdleL", 4, 8.0),
            AnimationClip::looping("WalkR", 4, 8.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("idlel").map(|c| c.name.as_str()), Some("IdleL"));
        assert!(catalog.find("Talk").is_none());
    }
}
