// Game configuration loaded from RON

use std::collections::HashSet;
use std::path::Path;

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::animation::{AnimationCatalog, ClipPlayer};
use crate::engine::dialog::{PhonemeLibrary, PhonemeTrack};
use crate::engine::game_loop::FIXED_TIMESTEP;

use super::characters::{AnimRules, CharacterId, CharacterManager, CharacterSettings, LipSyncSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One character definition: settings, clips and rule tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub settings: CharacterSettings,
    pub animations: AnimationCatalog,
    pub rules: AnimRules,
}

/// A room and the convex polygon characters can walk on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub name: String,
    #[serde(default)]
    pub walkable_area: Vec<Vec2>,
}

/// Phoneme timing of one voiced line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogLineConfig {
    pub character: String,
    pub line_id: i32,
    /// (time, shape) boundaries
    pub phonemes: Vec<(f32, char)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation step in seconds
    pub fixed_timestep: f32,
    pub start_room: String,
    /// Seed for the lip-sync fallback RNG
    pub rng_seed: u64,
    pub lip_sync: LipSyncSettings,
    pub rooms: Vec<RoomConfig>,
    pub characters: Vec<CharacterConfig>,
    pub dialog: Vec<DialogLineConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: FIXED_TIMESTEP,
            start_room: String::new(),
            rng_seed: 0,
            lip_sync: LipSyncSettings::default(),
            rooms: Vec::new(),
            characters: Vec::new(),
            dialog: Vec::new(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&source)?;
        info!(
            "Loaded {} characters and {} rooms from {}",
            config.characters.len(),
            config.rooms.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_timestep <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }

        let mut names = HashSet::new();
        for character in &self.characters {
            let settings = &character.settings;
            if settings.name.is_empty() {
                return Err(ConfigError::Invalid("character without a name".to_string()));
            }
            if !names.insert(settings.name.to_ascii_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate character name '{}'",
                    settings.name
                )));
            }
            if settings.turn_speed_fps <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "'{}': turn speed must be positive, got {}",
                    settings.name, settings.turn_speed_fps
                )));
            }
            if settings.walk_speed.x < 0.0 || settings.walk_speed.y < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "'{}': walk speed can't be negative, got {}",
                    settings.name, settings.walk_speed
                )));
            }
            for clip in character.animations.iter() {
                if clip.frame_count == 0 || clip.frame_duration <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "'{}': clip '{}' needs at least one frame of positive length",
                        settings.name, clip.name
                    )));
                }
            }
        }

        if !self.start_room.is_empty() && self.room(&self.start_room).is_none() {
            return Err(ConfigError::Invalid(format!(
                "start room '{}' is not defined",
                self.start_room
            )));
        }

        Ok(())
    }

    pub fn room(&self, name: &str) -> Option<&RoomConfig> {
        self.rooms.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Spawn every configured character with in-crate animators
    pub fn spawn_characters(&self, manager: &mut CharacterManager) -> Vec<CharacterId> {
        self.characters
            .iter()
            .map(|config| {
                let id = manager.spawn(
                    config.settings.clone(),
                    config.animations.clone(),
                    config.rules.clone(),
                    Box::new(ClipPlayer::new()),
                );
                if !config.settings.anim_mouth.is_empty() {
                    if let Some(character) = manager.get_mut(id) {
                        character.attach_mouth(Box::new(ClipPlayer::new()));
                    }
                }
                id
            })
            .collect()
    }

    /// Phoneme tracks for every configured line
    pub fn phoneme_library(&self) -> PhonemeLibrary {
        let mut library = PhonemeLibrary::new();
        for line in &self.dialog {
            library.insert_track(
                &line.character,
                line.line_id,
                PhonemeTrack::new(line.phonemes.iter().copied()),
            );
        }
        library
    }
}
