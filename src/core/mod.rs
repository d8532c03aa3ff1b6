// Shared helpers used by both the engine layer and the game layer

pub mod math;
