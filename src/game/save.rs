// Save games: versioned character snapshots

use glam::Vec2;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::characters::{CharacterManager, Direction8, LoopWindow};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write save: {0}")]
    Serialize(#[from] ron::Error),

    #[error("failed to read save: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Persistent state of one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub position: Vec2,
    pub facing: Direction8,
    pub facing_vertical_fallback: Direction8,
    /// Base name of the animation being played, if any
    pub animation: Option<String>,
    /// Normalized playback time of `animation`
    pub animation_time: f32,
    pub loop_window: LoopWindow,
    pub room: String,
    pub visible: bool,
}

/// First save layout, before the vertical fallback and room were stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshotV1 {
    pub position: Vec2,
    pub facing: Direction8,
    pub animation: Option<String>,
    pub animation_time: f32,
    pub loop_window: LoopWindow,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SavedCharacter {
    V1(CharacterSnapshotV1),
    V2(CharacterSnapshot),
}

impl SavedCharacter {
    /// Migrate to the current layout.
    ///
    /// V1 saves derive the vertical fallback from the saved facing and leave
    /// the room empty, which keeps the character's configured room.
    pub fn into_current(self) -> CharacterSnapshot {
        match self {
            SavedCharacter::V1(old) => {
                let facing_vertical_fallback = if old.facing.is_vertical() {
                    Direction8::Right
                } else {
                    old.facing.to_cardinal()
                };
                CharacterSnapshot {
                    position: old.position,
                    facing: old.facing,
                    facing_vertical_fallback,
                    animation: old.animation,
                    animation_time: old.animation_time,
                    loop_window: old.loop_window,
                    room: String::new(),
                    visible: old.visible,
                }
            }
            SavedCharacter::V2(snapshot) => snapshot,
        }
    }
}

/// All characters, keyed by script name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub room: String,
    pub characters: Vec<(String, SavedCharacter)>,
}

impl SaveGame {
    pub fn capture(room: &str, characters: &CharacterManager) -> Self {
        Self {
            room: room.to_string(),
            characters: characters
                .all()
                .iter()
                .map(|c| (c.name().to_string(), SavedCharacter::V2(c.snapshot())))
                .collect(),
        }
    }

    /// Restore every saved character that still exists
    pub fn apply(&self, characters: &mut CharacterManager) {
        for (name, saved) in &self.characters {
            let Some(id) = characters.id_of(name) else {
                warn!("Save references unknown character '{}'", name);
                continue;
            };
            if let Some(character) = characters.get_mut(id) {
                character.restore(&saved.clone().into_current());
            }
        }
        info!("Restored {} characters", self.characters.len());
    }

    pub fn to_ron(&self) -> Result<String, SaveError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn from_ron(source: &str) -> Result<Self, SaveError> {
        Ok(ron::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::animation::{AnimationCatalog, AnimationClip, ClipPlayer};
    use crate::engine::dialog::PhonemeLibrary;
    use crate::game::characters::{AnimRules, CharacterSettings, LipSyncSettings};
    use crate::game::context::TickContext;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> AnimationCatalog {
        AnimationCatalog::new(vec![
            AnimationClip::looping("Idle", 1, 10.0),
            AnimationClip::looping("IdleR", 1, 10.0),
            AnimationClip::looping("WalkR", 4, 10.0),
            AnimationClip::one_shot("Wave", 10, 10.0),
        ])
    }

    fn manager() -> CharacterManager {
        let mut manager = CharacterManager::new();
        let mut settings = CharacterSettings::named("Dave");
        settings.room = "Hall".to_string();
        manager.spawn(settings, catalog(), AnimRules::default(), Box::new(ClipPlayer::new()));
        manager
    }

    #[test]
    fn test_v1_migration() {
        let old = SavedCharacter::V1(CharacterSnapshotV1 {
            position: Vec2::new(10.0, 20.0),
            facing: Direction8::UpLeft,
            animation: None,
            animation_time: -1.0,
            loop_window: LoopWindow::NONE,
            visible: true,
        });
        let current = old.into_current();
        assert_eq!(current.facing, Direction8::UpLeft);
        assert_eq!(current.facing_vertical_fallback, Direction8::Left);
        assert!(current.room.is_empty());

        let vertical = SavedCharacter::V1(CharacterSnapshotV1 {
            position: Vec2::ZERO,
            facing: Direction8::Up,
            animation: None,
            animation_time: -1.0,
            loop_window: LoopWindow::NONE,
            visible: false,
        });
        let current = vertical.into_current();
        assert_eq!(current.facing_vertical_fallback, Direction8::Right);
        assert!(!current.visible);
    }

    #[test]
    fn test_v1_keeps_configured_room() {
        let mut characters = manager();
        let save = SaveGame {
            room: "Hall".to_string(),
            characters: vec![(
                "Dave".to_string(),
                SavedCharacter::V1(CharacterSnapshotV1 {
                    position: Vec2::new(5.0, 5.0),
                    facing: Direction8::Right,
                    animation: None,
                    animation_time: -1.0,
                    loop_window: LoopWindow::NONE,
                    visible: true,
                }),
            )],
        };
        save.apply(&mut characters);

        let dave = characters.by_name("Dave").unwrap();
        assert_eq!(dave.room(), "Hall");
        assert_eq!(dave.position(), Vec2::new(5.0, 5.0));
        assert_eq!(dave.facing(), Direction8::Right);
        assert_eq!(dave.clip_name(), Some("IdleR"));
    }

    #[test]
    fn test_save_round_trip_restores_animation() {
        let mut characters = manager();
        let library = PhonemeLibrary::new();
        let lip_sync = LipSyncSettings::default();
        let mut rng = StdRng::seed_from_u64(1);

        let id = characters.id_of("Dave").unwrap();
        characters.get_mut(id).unwrap().play_animation("Wave").unwrap();
        for _ in 0..3 {
            let mut ctx = TickContext::new(0.1, 0.0, &library, &lip_sync, &mut rng);
            characters.update(&mut ctx);
        }

        let save = SaveGame::capture("Hall", &characters);
        let text = save.to_ron().unwrap();
        let loaded = SaveGame::from_ron(&text).unwrap();
        assert_eq!(loaded, save);

        let mut restored = manager();
        loaded.apply(&mut restored);
        let mut ctx = TickContext::new(0.0, 0.0, &library, &lip_sync, &mut rng);
        restored.update(&mut ctx);

        let dave = restored.by_name("Dave").unwrap();
        assert!(dave.animating());
        assert_eq!(dave.clip_name(), Some("Wave"));
        let saved_time = match &save.characters[0].1 {
            SavedCharacter::V2(snapshot) => snapshot.animation_time,
            SavedCharacter::V1(_) => unreachable!(),
        };
        assert_abs_diff_eq!(dave.animator().normalized_time(), saved_time, epsilon = 1e-4);
    }

    #[test]
    fn test_apply_skips_unknown_character() {
        let mut characters = manager();
        let save = SaveGame {
            room: "Hall".to_string(),
            characters: vec![(
                "Nobody".to_string(),
                SavedCharacter::V2(characters.all()[0].snapshot()),
            )],
        };
        save.apply(&mut characters);
        assert_eq!(characters.count(), 1);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(SaveGame::from_ron("(room: "), Err(SaveError::Parse(_))));
    }
}
