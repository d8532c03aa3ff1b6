// Game layer: characters plus the rooms, sequences and saves around them

pub mod characters;
pub mod config;
pub mod context;
pub mod room;
pub mod save;
pub mod sequence;
