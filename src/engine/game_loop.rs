/// Simulation tick scheduling
///
/// Implements a fixed timestep loop fed with the measured duration of each
/// rendered frame. Character simulation runs once per fixed step so motion
/// and turn timers behave the same at any frame rate.
use std::time::Duration;

/// Target simulation rate (60 updates per second)
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
const FIXED_TIMESTEP_DURATION: Duration = Duration::from_micros(16_667); // ~1/60 second

/// Maximum number of simulation steps per frame to prevent spiral of death
const MAX_STEPS_PER_FRAME: u32 = 5;

/// Game loop timing state
#[derive(Debug)]
pub struct GameLoop {
    /// Accumulated time for fixed timestep updates
    accumulator: Duration,

    /// Length of one simulation step
    timestep: Duration,

    /// Current frame number
    frame_count: u64,

    /// Total updates executed
    update_count: u64,

    /// Simulated time, advanced by one timestep per update
    game_time: f32,
}

impl GameLoop {
    /// Create a new game loop stepping at 60Hz
    pub fn new() -> Self {
        Self::with_timestep(FIXED_TIMESTEP_DURATION)
    }

    /// Create a game loop with a custom step length
    pub fn with_timestep(timestep: Duration) -> Self {
        Self {
            accumulator: Duration::ZERO,
            timestep,
            frame_count: 0,
            update_count: 0,
            game_time: 0.0,
        }
    }

    /// Begin a new frame that took `frame_time`, returns the number of fixed updates to run
    pub fn begin_frame(&mut self, frame_time: Duration) -> u32 {
        self.frame_count += 1;
        self.accumulator += frame_time;

        let mut updates = 0;
        while self.accumulator >= self.timestep && updates < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.timestep;
            updates += 1;
        }

        // Drop whatever could not be caught up on
        if updates == MAX_STEPS_PER_FRAME && self.accumulator >= self.timestep {
            log::debug!("Dropping {:?} of simulation time", self.accumulator);
            self.accumulator = Duration::ZERO;
        }

        self.update_count += updates as u64;
        self.game_time += updates as f32 * self.timestep.as_secs_f32();
        updates
    }

    /// Get the fixed timestep (in seconds)
    pub fn fixed_timestep(&self) -> f32 {
        self.timestep.as_secs_f32()
    }

    /// Simulated seconds since the loop started
    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    /// Get total number of frames
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get total number of updates executed
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
