// Character system
//
// This module contains everything related to adventure-game characters:
// - Character data structure and management
// - Directional clip resolution and transition rules
// - Animation state machine, turning, walking and lip-sync

pub mod character;
pub mod controller;
pub mod direction;
pub mod error;
pub mod lipsync;
pub mod motion;
pub mod resolver;
pub mod rules;
pub mod settings;
pub mod state;
pub mod turning;

// Re-export commonly used types
pub use character::{Character, CharacterId, CharacterManager};
pub use direction::Direction8;
pub use error::CharacterError;
pub use lipsync::LipSyncSettings;
pub use motion::WalkProgress;
pub use resolver::{resolve, Resolved};
pub use rules::{AnimRules, TransitionAnimRule, TurnAnimRule};
pub use settings::CharacterSettings;
pub use state::{AnimState, CharacterState, LoopWindow, WalkState};
