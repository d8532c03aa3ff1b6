// Per-character simulation record and animation states

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::direction::Direction8;

/// Which animation family the character is showing.
///
/// Derived from the animating/walking/talking flags in fixed priority order:
/// Animate > Walk > Talk > Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnimState {
    #[default]
    Idle,
    Walk,
    Talk,
    Animate,
}

impl AnimState {
    /// State implied by the character's activity flags
    pub fn from_flags(animating: bool, walking: bool, talking: bool) -> Self {
        if animating {
            Self::Animate
        } else if walking {
            Self::Walk
        } else if talking {
            Self::Talk
        } else {
            Self::Idle
        }
    }
}

/// Walk progress; exactly one holds at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WalkState {
    #[default]
    Idle,
    /// Rotating on the spot before the walk clip starts
    TurningToWalk,
    Walking,
}

/// An interstitial clip in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Clip that was playing when the transition started
    pub from_clip: String,
    /// Clip currently playing as the transition
    pub clip: String,
    /// Base name to play once the transition clip finishes
    pub pending: String,
}

/// Normalized-time bounds of an authored loop region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopWindow {
    pub start: f32,
    pub end: f32,
}

impl LoopWindow {
    /// No loop region active
    pub const NONE: Self = Self {
        start: -1.0,
        end: -1.0,
    };

    pub fn is_open(&self) -> bool {
        self.start > 0.0
    }
}

impl Default for LoopWindow {
    fn default() -> Self {
        Self::NONE
    }
}

/// Everything the per-tick components read and write for one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    pub position: Vec2,
    pub facing: Direction8,
    /// Last non-vertical side faced, used when no Up/Down clip exists
    pub facing_vertical_fallback: Direction8,
    pub target_facing: Direction8,
    /// Seconds until the next turn step is allowed
    pub turn_timer: f32,

    pub walk_state: WalkState,
    pub path: Option<Vec<Vec2>>,
    pub path_index: usize,
    /// Queued waypoints, consumed after the current path
    pub waypoints: Vec<Vec2>,

    pub anim_state: AnimState,
    /// Set while a `PlayAnimation` clip is running
    pub animating: bool,
    pub current_anim_base_name: String,
    pub flipped: bool,
    pub transition: Option<Transition>,
    pub loop_window: LoopWindow,

    pub talking: bool,
    /// Dialog line being voiced, -1 when silent
    pub current_line_id: i32,
    pub lip_sync_frame: usize,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            facing: Direction8::Down,
            facing_vertical_fallback: Direction8::Right,
            target_facing: Direction8::Down,
            turn_timer: -1.0,
            walk_state: WalkState::Idle,
            path: None,
            path_index: 0,
            waypoints: Vec::new(),
            anim_state: AnimState::Idle,
            animating: false,
            current_anim_base_name: String::new(),
            flipped: false,
            transition: None,
            loop_window: LoopWindow::NONE,
            talking: false,
            current_line_id: -1,
            lip_sync_frame: 0,
        }
    }
}

impl CharacterState {
    pub fn new(position: Vec2, facing: Direction8) -> Self {
        let mut state = Self {
            position,
            ..Self::default()
        };
        state.set_facing(facing);
        state.target_facing = facing;
        state
    }

    pub fn is_walking(&self) -> bool {
        self.walk_state != WalkState::Idle
    }

    /// State the flags currently call for
    pub fn desired_anim_state(&self) -> AnimState {
        AnimState::from_flags(self.animating, self.is_walking(), self.talking)
    }

    /// Set the facing and remember the horizontal side
    pub fn set_facing(&mut self, facing: Direction8) {
        self.facing = facing;
        if !facing.is_vertical() {
            self.facing_vertical_fallback = facing.to_cardinal();
        }
    }

    /// Drop any path and queued waypoints
    pub fn clear_route(&mut self) {
        self.path = None;
        self.path_index = 0;
        self.waypoints.clear();
    }
}
