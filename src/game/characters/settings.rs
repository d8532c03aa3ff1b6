// Character properties loaded from config

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::direction::Direction8;

/// Default walk speed in world units per second (x, y)
pub const DEFAULT_WALK_SPEED: Vec2 = Vec2::new(100.0, 50.0);
/// Default turn rate, in compass steps per second
pub const DEFAULT_TURN_SPEED_FPS: f32 = 8.0;
/// Default solid footprint used as the pathfinding obstacle
pub const DEFAULT_SOLID_SIZE: Vec2 = Vec2::new(20.0, 10.0);

/// Authored properties of one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSettings {
    /// Unique script name
    pub name: String,
    /// Room the character starts in
    pub room: String,
    pub position: Vec2,
    pub facing: Direction8,
    pub visible: bool,

    // Animation names
    pub anim_idle: String,
    pub anim_walk: String,
    pub anim_talk: String,
    /// Base name of the separate mouth animation, empty for none
    pub anim_mouth: String,

    // Movement
    pub walk_speed: Vec2,
    pub turn_speed_fps: f32,
    /// Scale walk speed by the character's vertical scale
    pub adjust_speed_with_scaling: bool,

    // Pathfinding
    /// Other characters path around solid characters
    pub solid: bool,
    pub solid_size: Vec2,

    /// Hold the last frame of a played animation instead of returning to idle
    pub pause_anim_at_end: bool,
    pub lip_sync_enabled: bool,
}

impl Default for CharacterSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            room: String::new(),
            position: Vec2::ZERO,
            facing: Direction8::Down,
            visible: true,
            anim_idle: "Idle".to_string(),
            anim_walk: "Walk".to_string(),
            anim_talk: "Talk".to_string(),
            anim_mouth: String::new(),
            walk_speed: DEFAULT_WALK_SPEED,
            turn_speed_fps: DEFAULT_TURN_SPEED_FPS,
            adjust_speed_with_scaling: true,
            solid: false,
            solid_size: DEFAULT_SOLID_SIZE,
            pause_anim_at_end: false,
            lip_sync_enabled: false,
        }
    }
}

impl CharacterSettings {
    /// Default settings for a named character
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Whether `anim` is one of the built-in state animations
    pub fn is_builtin_anim(&self, anim: &str) -> bool {
        [&self.anim_idle, &self.anim_walk, &self.anim_talk]
            .iter()
            .any(|builtin| builtin.eq_ignore_ascii_case(anim))
    }
}
