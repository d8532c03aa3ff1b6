// Character operation errors

use glam::Vec2;
use thiserror::Error;

use super::character::CharacterId;

#[derive(Debug, Error)]
pub enum CharacterError {
    #[error("no clip matches animation '{0}'")]
    MissingClip(String),

    #[error("no path from {from} to {to}")]
    NoPath { from: Vec2, to: Vec2 },

    #[error("no walkable area to walk on")]
    NotWalkable,

    #[error("unknown character id {0}")]
    UnknownCharacter(CharacterId),
}
