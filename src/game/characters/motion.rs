// Motion integrator
//
// Walks a character along its path and queued waypoints, spending each
// tick's time budget across as many segments as it covers.

use glam::Vec2;
use log::{debug, warn};

use crate::core::math::normalize_mag;
use crate::engine::navigation::Pathfinder;

use super::character::Character;
use super::direction::Direction8;
use super::error::CharacterError;
use super::state::{AnimState, WalkState};

/// Walk speed set by animation frame tags, per axis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WalkSpeedOverride {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl WalkSpeedOverride {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `base` with any overridden axis replaced
    pub fn apply(&self, base: Vec2) -> Vec2 {
        Vec2::new(self.x.unwrap_or(base.x), self.y.unwrap_or(base.y))
    }
}

/// Outcome of one `advance_walk` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkProgress {
    pub still_walking: bool,
    /// Part of the tick budget spent moving, never more than the budget
    pub time_used: f32,
}

impl Character {
    /// Walk to `pos`.
    ///
    /// Unless `anywhere` is set the target is clamped to the walkable area
    /// and a path is found around obstacles. An unreachable target is
    /// dropped with a warning.
    pub fn walk_to(
        &mut self,
        pos: Vec2,
        anywhere: bool,
        play_walk_anim: bool,
        pathfinder: &dyn Pathfinder,
    ) -> Result<(), CharacterError> {
        if self.state.anim_state == AnimState::Walk
            && self.target_end_pos == pos
            && self.play_walk_anim == play_walk_anim
        {
            // Already walking there
            return Ok(());
        }
        self.play_walk_anim = play_walk_anim;

        if anywhere || !pathfinder.is_valid() {
            self.walk_to_internal(pos);
            self.target_end_pos = pos;
            return Ok(());
        }

        let pos = if pathfinder.is_point_in_area(pos) {
            pos
        } else {
            pathfinder.closest_point_to_area(pos)
        };
        self.target_pos = pos;
        self.target_end_pos = pos;

        let from = self.state.position;
        match pathfinder.find_path(from, pos) {
            Some(path) if path.len() > 1 => {
                let next = path[1];
                self.state.path = Some(path);
                self.state.path_index = 1;
                self.walk_to_internal(next);
                Ok(())
            }
            Some(path) if !path.is_empty() => Ok(()),
            _ => {
                warn!(
                    "Couldn't find path for '{}' from {} to {}",
                    self.settings.name, from, pos
                );
                Err(CharacterError::NoPath { from, to: pos })
            }
        }
    }

    /// Queue a point to walk to after the current path
    pub fn add_waypoint(&mut self, pos: Vec2) {
        self.state.waypoints.push(pos);
        self.target_end_pos = pos;
        if self.state.is_walking() {
            return;
        }

        // Points already stood on would never start a walk
        let position = self.state.position;
        while self
            .state
            .waypoints
            .first()
            .is_some_and(|point| point.distance_squared(position) < f32::EPSILON)
        {
            self.state.waypoints.remove(0);
        }
        if let Some(&next) = self.state.waypoints.first() {
            self.walk_to_internal(next);
        }
    }

    /// Direction to turn to once the current walk ends. Used once.
    pub fn set_face_after_walk(&mut self, direction: Option<Direction8>) {
        self.face_after_walk = direction;
    }

    /// Stop walking where the character stands
    pub fn stop_walk(&mut self) {
        self.cancel_walk();
    }

    /// Clear the route and every walking flag. Safe to call at any time.
    pub fn cancel_walk(&mut self) {
        self.state.clear_route();
        self.target_pos = self.state.position;
        self.target_end_pos = self.state.position;
        self.play_walk_anim = true;
        self.state.walk_state = WalkState::Idle;
        self.on_anim_state_change();
    }

    /// Finish the current walk instantly
    pub fn skip_walk(&mut self) {
        if !self.state.is_walking() {
            return;
        }

        let path_end = self.state.path.as_ref().and_then(|path| {
            let end = *path.last()?;
            let before = path.len().checked_sub(2).map(|i| path[i]);
            Some((end, before))
        });

        if let Some(&last) = self.state.waypoints.last() {
            self.state.position = last;
        } else if let Some((end, before)) = path_end {
            self.state.position = end;
            // Face along the last segment
            if let Some(direction) = before.and_then(|before| Direction8::from_vector(end - before)) {
                self.set_target_facing(direction, true);
            }
        } else {
            self.state.position = self.target_pos;
        }

        self.state.clear_route();
        self.target_pos = self.state.position;
        self.target_end_pos = self.state.position;
        self.state.walk_state = WalkState::Idle;
        self.on_anim_state_change();
    }

    /// Snap an in-flight walk to its destination when a cutscene is skipped
    pub fn on_skip_cutscene(&mut self) {
        if self.state.anim_state == AnimState::Walk && self.target_end_pos != self.state.position {
            self.state.position = self.target_end_pos;
            self.cancel_walk();
        }
    }

    /// Move onto the closest walkable point if standing outside the area
    pub fn move_to_walkable_area(&mut self, pathfinder: &dyn Pathfinder) -> Result<(), CharacterError> {
        if !pathfinder.is_valid() {
            return Err(CharacterError::NotWalkable);
        }
        if !pathfinder.is_point_in_area(self.state.position) {
            self.state.position = pathfinder.closest_point_to_area(self.state.position);
        }
        Ok(())
    }

    /// Start walking in a straight line to `pos`, turning first if the
    /// walk clip for the new direction differs from what is showing
    fn walk_to_internal(&mut self, pos: Vec2) {
        let to_pos = pos - self.state.position;
        if to_pos.length_squared() < f32::EPSILON {
            return;
        }
        self.target_pos = pos;

        if self.state.walk_state == WalkState::Idle {
            self.state.walk_state = WalkState::Walking;
        }
        self.on_anim_state_change();

        if self.state.animating || !self.play_walk_anim {
            return;
        }
        let Some(direction) = Direction8::from_vector(to_pos) else {
            return;
        };
        self.set_target_facing(direction, false);
        if self.will_change_anim(direction) {
            self.state.walk_state = WalkState::TurningToWalk;
            let idle = self.settings.anim_idle.clone();
            self.play_anim_internal(&idle, true);
        } else {
            // Nothing to turn through visually
            self.apply_facing(direction);
        }
    }

    /// Spend up to `dt` seconds walking. Position is written once, at the end.
    pub(super) fn advance_walk(&mut self, dt: f32) -> WalkProgress {
        match self.state.walk_state {
            WalkState::Idle => {
                return WalkProgress {
                    still_walking: false,
                    time_used: 0.0,
                }
            }
            WalkState::TurningToWalk => {
                if self.state.facing != self.state.target_facing {
                    return WalkProgress {
                        still_walking: true,
                        time_used: 0.0,
                    };
                }
                self.state.walk_state = WalkState::Walking;
                let walk = self.settings.anim_walk.clone();
                self.play_anim_internal(&walk, false);
            }
            WalkState::Walking => {}
        }

        let walk_speed = self.walk_speed_override.apply(self.settings.walk_speed);
        let mut position = self.state.position;
        let mut remaining = dt;
        let mut reached = false;

        while !reached && remaining > 0.0 {
            if let Some(point) = self
                .state
                .path
                .as_ref()
                .and_then(|path| path.get(self.state.path_index))
            {
                self.target_pos = *point;
            } else if let Some(&waypoint) = self.state.waypoints.first() {
                self.target_pos = waypoint;
            }

            let mut direction = self.target_pos - position;
            let dist = normalize_mag(&mut direction);
            if dist == 0.0 {
                debug!("'{}' walk step has zero length, treating as arrived", self.settings.name);
                reached = true;
                break;
            }

            let mut speed = direction.x.abs() * walk_speed.x + direction.y.abs() * walk_speed.y;
            if self.settings.adjust_speed_with_scaling {
                speed *= self.scale;
            }
            if speed <= 0.0 {
                debug!("'{}' has no walk speed", self.settings.name);
                break;
            }

            if let Some(facing) = Direction8::from_vector(direction) {
                self.set_target_facing(facing, true);
            }

            if dist <= speed * remaining {
                // Reaches this point within the tick
                remaining -= dist / speed;
                position = self.target_pos;

                if let Some(path) = &self.state.path {
                    let path_len = path.len();
                    self.state.path_index += 1;
                    if self.state.path_index >= path_len {
                        // End of the path, waypoints may follow
                        reached = self.state.waypoints.is_empty();
                        self.state.path = None;
                        self.state.path_index = 0;
                    }
                } else if !self.state.waypoints.is_empty() {
                    self.state.waypoints.remove(0);
                    reached = self.state.waypoints.is_empty();
                } else {
                    reached = true;
                }
            } else {
                position += direction * speed * remaining;
                remaining = 0.0;
            }
        }

        self.state.position = position;

        if reached {
            self.state.walk_state = WalkState::Idle;
            self.state.clear_route();
            self.on_anim_state_change();
            if let Some(direction) = self.face_after_walk.take() {
                self.face_direction(direction, false);
            }
        }

        WalkProgress {
            still_walking: !reached,
            time_used: dt - remaining,
        }
    }
}
