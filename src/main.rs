use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rusted_quest::engine::game_loop::GameLoop;
use rusted_quest::game::characters::CharacterManager;
use rusted_quest::game::config::GameConfig;
use rusted_quest::game::context::TickContext;
use rusted_quest::game::room::{RoomDirector, RoomScript};
use rusted_quest::game::save::SaveGame;
use rusted_quest::game::sequence::{Sequence, SequenceStep, SequenceWorld};

const DEMO_CONFIG: &str = include_str!("../assets/demo.ron");
const DEMO_SEQUENCE: &str = include_str!("../assets/intro.ron");

/// Frame length the headless loop pretends each rendered frame took
const FRAME_TIME: Duration = Duration::from_millis(20);
/// Give up on the cutscene and skip it after this many frames
const MAX_FRAMES: u64 = 3000;

/// Logs who is present whenever a room is entered
struct RoomLogger;

impl RoomScript for RoomLogger {
    fn on_enter_room(&mut self, room: &str, characters: &mut CharacterManager) {
        let present: Vec<&str> = characters
            .all()
            .iter()
            .filter(|c| c.is_active())
            .map(|c| c.name())
            .collect();
        info!("In {}: {}", room, present.join(", "));
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Rusted Quest...");

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => GameConfig::from_ron_str(DEMO_CONFIG).context("parsing built-in demo config")?,
    };
    let steps: Vec<SequenceStep> = ron::from_str(DEMO_SEQUENCE).context("parsing demo sequence")?;

    let mut characters = CharacterManager::new();
    config.spawn_characters(&mut characters);
    let mut rooms = RoomDirector::from_config(&config);
    rooms.set_global_script(Box::new(RoomLogger));
    let mut dialog = config.phoneme_library();
    let mut rng = StdRng::seed_from_u64(config.rng_seed);

    if !config.start_room.is_empty() {
        rooms.enter_room(&config.start_room, &mut characters)?;
    }

    let mut game_loop = GameLoop::with_timestep(Duration::from_secs_f32(config.fixed_timestep));
    let dt = game_loop.fixed_timestep();
    let mut sequence = Sequence::new(steps);

    while !sequence.is_finished() && game_loop.frame_count() < MAX_FRAMES {
        let updates = game_loop.begin_frame(FRAME_TIME);
        let frame_start = game_loop.game_time() - updates as f32 * dt;

        for step in 0..updates {
            let mut world = SequenceWorld {
                characters: &mut characters,
                rooms: &mut rooms,
                dialog: &mut dialog,
            };
            if let Err(err) = sequence.update(dt, &mut world) {
                warn!("Sequence step failed: {}", err);
            }

            dialog.advance(dt);
            let game_time = frame_start + (step + 1) as f32 * dt;
            let mut ctx = TickContext::new(dt, game_time, &dialog, &config.lip_sync, &mut rng);
            characters.update(&mut ctx);
        }
    }

    if !sequence.is_finished() {
        warn!("Cutscene still running after {} frames, skipping", MAX_FRAMES);
        let mut world = SequenceWorld {
            characters: &mut characters,
            rooms: &mut rooms,
            dialog: &mut dialog,
        };
        sequence.skip(&mut world);
    }

    info!(
        "Cutscene done after {} updates ({:.2}s)",
        game_loop.update_count(),
        game_loop.game_time()
    );
    for character in characters.all() {
        info!(
            "'{}' in {} at {} facing {:?}, playing {:?}",
            character.name(),
            character.room(),
            character.position(),
            character.facing(),
            character.clip_name()
        );
    }

    let save = SaveGame::capture(rooms.current_room().unwrap_or_default(), &characters);
    println!("{}", save.to_ron()?);

    Ok(())
}
