// Rooms: walkable areas, enter/exit hooks and character activation

use log::{debug, info};
use thiserror::Error;

use crate::engine::navigation::{Pathfinder, WalkableArea};

use super::characters::CharacterManager;
use super::config::GameConfig;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("unknown room '{0}'")]
    UnknownRoom(String),
}

/// Script hooks run on room changes. Both default to doing nothing.
pub trait RoomScript {
    fn on_enter_room(&mut self, _room: &str, _characters: &mut CharacterManager) {}
    fn on_exit_room(&mut self, _room: &str, _characters: &mut CharacterManager) {}
}

struct Room {
    name: String,
    area: WalkableArea,
    script: Option<Box<dyn RoomScript>>,
}

/// Owns every room and switches the current one
#[derive(Default)]
pub struct RoomDirector {
    rooms: Vec<Room>,
    current: Option<usize>,
    global_script: Option<Box<dyn RoomScript>>,
    /// Pathfinder used while no room is current
    no_area: WalkableArea,
}

impl RoomDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One room per config entry; rooms without points get no walkable area
    pub fn from_config(config: &GameConfig) -> Self {
        let mut director = Self::new();
        for room in &config.rooms {
            let area = if room.walkable_area.is_empty() {
                WalkableArea::new()
            } else {
                WalkableArea::from_points(&room.walkable_area)
            };
            director.add_room(&room.name, area);
        }
        director
    }

    pub fn add_room(&mut self, name: &str, area: WalkableArea) {
        self.rooms.push(Room {
            name: name.to_string(),
            area,
            script: None,
        });
    }

    /// Hooks run for every room, before the room's own hooks on enter
    pub fn set_global_script(&mut self, script: Box<dyn RoomScript>) {
        self.global_script = Some(script);
    }

    pub fn set_room_script(&mut self, room: &str, script: Box<dyn RoomScript>) -> Result<(), RoomError> {
        let index = self.index_of(room)?;
        self.rooms[index].script = Some(script);
        Ok(())
    }

    pub fn current_room(&self) -> Option<&str> {
        self.current.map(|index| self.rooms[index].name.as_str())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Walkable area of the current room
    pub fn pathfinder(&self) -> &dyn Pathfinder {
        match self.current {
            Some(index) => &self.rooms[index].area,
            None => &self.no_area,
        }
    }

    pub fn pathfinder_mut(&mut self) -> &mut dyn Pathfinder {
        match self.current {
            Some(index) => &mut self.rooms[index].area,
            None => &mut self.no_area,
        }
    }

    /// Leave the current room and enter `name`.
    ///
    /// Characters in the new room become active and are moved onto its
    /// walkable area; everyone else is deactivated and stops walking.
    pub fn enter_room(&mut self, name: &str, characters: &mut CharacterManager) -> Result<(), RoomError> {
        let index = self.index_of(name)?;

        if let Some(old) = self.current.take() {
            let old_name = self.rooms[old].name.clone();
            if let Some(script) = self.rooms[old].script.as_mut() {
                script.on_exit_room(&old_name, characters);
            }
            if let Some(script) = self.global_script.as_mut() {
                script.on_exit_room(&old_name, characters);
            }
        }

        self.current = Some(index);
        let room = &mut self.rooms[index];
        for character in characters.all_mut() {
            let here = character.room().eq_ignore_ascii_case(&room.name);
            character.set_active(here);
            if !here {
                character.cancel_walk();
                room.area.remove_obstacle(character.id());
                continue;
            }

            if let Err(err) = character.move_to_walkable_area(&room.area) {
                debug!("'{}' left where it stands: {}", character.name(), err);
            }
            if character.solid() {
                let size = character.settings().solid_size;
                room.area.add_obstacle(character.id(), character.position(), size);
            }
        }

        let room_name = room.name.clone();
        info!(
            "Entered room '{}' with {} characters",
            room_name,
            characters.active_count()
        );

        if let Some(script) = self.global_script.as_mut() {
            script.on_enter_room(&room_name, characters);
        }
        if let Some(script) = self.rooms[index].script.as_mut() {
            script.on_enter_room(&room_name, characters);
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize, RoomError> {
        self.rooms
            .iter()
            .position(|room| room.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RoomError::UnknownRoom(name.to_string()))
    }
}
