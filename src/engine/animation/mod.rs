// Animation playback layer
//
// Clips, per-character catalogs and the animator interface the character
// layer drives. `ClipPlayer` is the in-crate animator used by the demo and
// the tests; a renderer backend can supply its own `SpriteAnimator`.

mod clip;
mod player;

pub use clip::{AnimationCatalog, AnimationClip, FrameTag};
pub use player::{ClipPlayer, SpriteAnimator};

use serde::{Deserialize, Serialize};

/// Events raised by an animator while it plays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnimEvent {
    /// A clip was (re)started or stopped
    Reset,
    /// Start of an authored loop region
    LoopStart,
    /// End of an authored loop region
    LoopEnd,
    /// Override both walk speed axes until the clip resets
    WalkSpeed(f32),
    WalkSpeedX(f32),
    WalkSpeedY(f32),
    WalkSpeedReset,
    /// Switch the mouth animation base name
    Mouth(String),
}
