//! Point-and-click adventure character simulation.
//!
//! `engine` holds the collaborators characters are driven through (clip
//! playback, walkable areas, dialog audio, the fixed-step loop); `game`
//! holds the characters themselves and the rooms, sequences and saves that
//! orchestrate them.

pub mod core;
pub mod engine;
pub mod game;
