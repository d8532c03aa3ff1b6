// Per-tick context handed to every character update

use rand::rngs::StdRng;

use crate::engine::dialog::DialogAudio;

use super::characters::LipSyncSettings;

/// Shared inputs for one simulation tick.
///
/// Replaces global game-instance lookups: anything a character needs from
/// outside its own record arrives through here.
pub struct TickContext<'a> {
    /// Seconds since the previous tick
    pub dt: f32,
    /// Game clock at the end of this tick
    pub game_time: f32,
    /// True while the current cutscene is being fast-forwarded
    pub skipping_cutscene: bool,
    pub dialog: &'a dyn DialogAudio,
    pub lip_sync: &'a LipSyncSettings,
    pub rng: &'a mut StdRng,
}

impl<'a> TickContext<'a> {
    pub fn new(
        dt: f32,
        game_time: f32,
        dialog: &'a dyn DialogAudio,
        lip_sync: &'a LipSyncSettings,
        rng: &'a mut StdRng,
    ) -> Self {
        Self {
            dt,
            game_time,
            skipping_cutscene: false,
            dialog,
            lip_sync,
            rng,
        }
    }

    pub fn skipping(mut self, skipping_cutscene: bool) -> Self {
        self.skipping_cutscene = skipping_cutscene;
        self
    }
}
