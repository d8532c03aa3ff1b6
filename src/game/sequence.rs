// Scripted character sequences (cutscenes)
//
// A queue of steps run front to back. The front step is polled once per
// tick and popped when it completes.

use std::collections::VecDeque;

use glam::Vec2;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::dialog::PhonemeLibrary;

use super::characters::{CharacterError, CharacterId, CharacterManager, Direction8};
use super::room::{RoomDirector, RoomError};

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("sequence names unknown character '{0}'")]
    UnknownCharacter(String),

    #[error(transparent)]
    Character(#[from] CharacterError),

    #[error(transparent)]
    Room(#[from] RoomError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SequenceStep {
    Walk {
        character: String,
        to: Vec2,
        #[serde(default)]
        anywhere: bool,
    },
    /// Voice a line for `duration` seconds
    Say {
        character: String,
        line_id: i32,
        duration: f32,
    },
    Face {
        character: String,
        direction: Direction8,
        #[serde(default)]
        instant: bool,
    },
    Animate {
        character: String,
        anim: String,
    },
    Wait(f32),
    EnterRoom(String),
}

/// Collaborators a step can touch
pub struct SequenceWorld<'a> {
    pub characters: &'a mut CharacterManager,
    pub rooms: &'a mut RoomDirector,
    pub dialog: &'a mut PhonemeLibrary,
}

#[derive(Debug, Default)]
pub struct Sequence {
    steps: VecDeque<SequenceStep>,
    /// Seconds spent in the front step
    step_timer: f32,
    /// Front step has been started
    step_started: bool,
}

impl Sequence {
    pub fn new(steps: impl IntoIterator<Item = SequenceStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, step: SequenceStep) {
        self.steps.push_back(step);
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current(&self) -> Option<&SequenceStep> {
        self.steps.front()
    }

    /// Poll the front step once. A step that fails is dropped so the rest
    /// of the sequence can still run.
    pub fn update(&mut self, dt: f32, world: &mut SequenceWorld) -> Result<(), SequenceError> {
        let Some(step) = self.steps.front().cloned() else {
            return Ok(());
        };

        if !self.step_started {
            self.step_started = true;
            self.step_timer = 0.0;
            info!("Sequence step: {:?}", step);
            if let Err(err) = start_step(&step, world) {
                self.next_step();
                return Err(err);
            }
            if is_instant(&step) {
                self.next_step();
            }
            return Ok(());
        }

        self.step_timer += dt;
        if poll_step(&step, self.step_timer, world)? {
            self.next_step();
        }
        Ok(())
    }

    /// Fast-forward to the end: finish every remaining step in one call and
    /// snap in-flight walks to their destinations
    pub fn skip(&mut self, world: &mut SequenceWorld) {
        info!("Skipping sequence ({} steps left)", self.steps.len());
        while let Some(step) = self.steps.front().cloned() {
            if !self.step_started {
                if let Err(err) = start_step(&step, world) {
                    warn!("Skipped step failed: {}", err);
                }
            }
            if let Err(err) = finish_step(&step, world) {
                warn!("Skipped step failed: {}", err);
            }
            self.next_step();
        }
        for character in world.characters.all_mut() {
            character.on_skip_cutscene();
        }
    }

    fn next_step(&mut self) {
        self.steps.pop_front();
        self.step_started = false;
        self.step_timer = 0.0;
    }
}

fn is_instant(step: &SequenceStep) -> bool {
    matches!(step, SequenceStep::EnterRoom(_))
}

fn character_id(world: &SequenceWorld, name: &str) -> Result<CharacterId, SequenceError> {
    world
        .characters
        .id_of(name)
        .ok_or_else(|| SequenceError::UnknownCharacter(name.to_string()))
}

fn start_step(step: &SequenceStep, world: &mut SequenceWorld) -> Result<(), SequenceError> {
    match step {
        SequenceStep::Walk { character, to, anywhere } => {
            let id = character_id(world, character)?;
            world
                .characters
                .walk_to(id, *to, *anywhere, true, world.rooms.pathfinder_mut())?;
        }
        SequenceStep::Say { character, line_id, .. } => {
            let id = character_id(world, character)?;
            if let Some(c) = world.characters.get_mut(id) {
                c.start_say(*line_id);
                world.dialog.set_audio_time(c.name(), 0.0);
            }
        }
        SequenceStep::Face { character, direction, instant } => {
            let id = character_id(world, character)?;
            if let Some(c) = world.characters.get_mut(id) {
                c.face_direction(*direction, *instant);
            }
        }
        SequenceStep::Animate { character, anim } => {
            let id = character_id(world, character)?;
            if let Some(c) = world.characters.get_mut(id) {
                c.play_animation(anim)?;
            }
        }
        SequenceStep::Wait(_) => {}
        SequenceStep::EnterRoom(room) => {
            world.rooms.enter_room(room, world.characters)?;
        }
    }
    Ok(())
}

/// True once a started step has completed
fn poll_step(step: &SequenceStep, elapsed: f32, world: &mut SequenceWorld) -> Result<bool, SequenceError> {
    let done = match step {
        SequenceStep::Walk { character, .. } => {
            let id = character_id(world, character)?;
            world.characters.get(id).map_or(true, |c| !c.walking())
        }
        SequenceStep::Say { duration, .. } => {
            if elapsed >= *duration {
                finish_step(step, world)?;
                true
            } else {
                false
            }
        }
        SequenceStep::Face { character, .. } => {
            let id = character_id(world, character)?;
            world
                .characters
                .get(id)
                .map_or(true, |c| !c.turning() && !c.playing_turn_animation())
        }
        SequenceStep::Animate { character, .. } => {
            let id = character_id(world, character)?;
            world
                .characters
                .get(id)
                .map_or(true, |c| !c.animating() || !c.animator().is_playing())
        }
        SequenceStep::Wait(secs) => elapsed >= *secs,
        SequenceStep::EnterRoom(_) => true,
    };
    Ok(done)
}

/// Jump a started step to its end state
fn finish_step(step: &SequenceStep, world: &mut SequenceWorld) -> Result<(), SequenceError> {
    match step {
        SequenceStep::Walk { character, .. } => {
            let id = character_id(world, character)?;
            if let Some(c) = world.characters.get_mut(id) {
                c.skip_walk();
            }
        }
        SequenceStep::Say { character, .. } => {
            let id = character_id(world, character)?;
            if let Some(c) = world.characters.get_mut(id) {
                c.end_say();
                world.dialog.stop_audio(c.name());
            }
        }
        SequenceStep::Face { character, direction, .. } => {
            let id = character_id(world, character)?;
            if let Some(c) = world.characters.get_mut(id) {
                c.face_direction(*direction, true);
            }
        }
        SequenceStep::Animate { character, .. } => {
            let id = character_id(world, character)?;
            if let Some(c) = world.characters.get_mut(id) {
                c.stop_animation();
            }
        }
        SequenceStep::Wait(_) | SequenceStep::EnterRoom(_) => {}
    }
    Ok(())
}
