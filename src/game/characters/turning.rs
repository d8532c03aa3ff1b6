// Turn state machine
//
// Rotates the facing one compass step at a time around TURN_ORDER, on a
// timer, skipping steps that don't change what is on screen.

use log::debug;

use super::character::{Character, TurnAnimation};
use super::direction::{Direction8, TURN_ORDER};

/// Ring direction (+1 or -1 through `TURN_ORDER`) to rotate from `current`
/// towards `target`.
///
/// Takes the shorter arc. A half-turn from Up or Down goes round the side
/// given by `vertical_fallback`; any other half-turn goes round the front.
pub fn turn_step(current: Direction8, target: Direction8, vertical_fallback: Direction8) -> i32 {
    let len = TURN_ORDER.len() as i32;
    let current_index = current.turn_index() as i32;
    let target_index = target.turn_index() as i32;

    let dist = target_index - current_index;
    let dir = dist.signum();
    if dist == 0 || dist.abs() == len / 2 {
        if current.is_vertical() {
            if (vertical_fallback == Direction8::Right) == (current == Direction8::Up) {
                -1
            } else {
                1
            }
        } else if current_index < 3 {
            1
        } else {
            -1
        }
    } else if dist.abs() < ((target_index - len * dir) - current_index).abs() {
        dir
    } else {
        -dir
    }
}

/// Facing one step from `current` towards `target`
pub fn next_facing(current: Direction8, target: Direction8, vertical_fallback: Direction8) -> Direction8 {
    let step = turn_step(current, target, vertical_fallback);
    let index = (current.turn_index() as i32 + step).rem_euclid(TURN_ORDER.len() as i32);
    TURN_ORDER[index as usize]
}

impl Character {
    /// Turn to face `direction`, either immediately or a step at a time
    pub fn face_direction(&mut self, direction: Direction8, instant: bool) {
        self.state.target_facing = direction;
        if instant {
            self.apply_facing(direction);
        } else {
            self.start_turn_animation();
        }
    }

    /// Still rotating towards the requested facing
    pub fn turning(&self) -> bool {
        self.state.facing != self.state.target_facing
    }

    /// Set the target facing without turn animations
    pub(super) fn set_target_facing(&mut self, direction: Direction8, instant: bool) {
        self.state.target_facing = direction;
        if instant {
            self.apply_facing(direction);
        }
    }

    /// Set the facing and refresh the clips that depend on it
    pub(super) fn apply_facing(&mut self, direction: Direction8) {
        if direction == self.state.facing {
            return;
        }
        self.state.set_facing(direction);
        let base = self.state.current_anim_base_name.clone();
        if !base.is_empty() {
            self.play_anim_internal(&base, false);
        }
        self.refresh_mouth_clip();
    }

    /// Play a matching turn clip, snapping the facing to the target.
    /// Returns false if no rule matches.
    fn start_turn_animation(&mut self) -> bool {
        let Some(anim) = self
            .rules
            .turn_anim(
                self.state.facing,
                self.state.target_facing,
                &self.state.current_anim_base_name,
            )
            .map(str::to_string)
        else {
            return false;
        };
        let resume = self.state.current_anim_base_name.clone();
        let target = self.state.target_facing;
        debug!("'{}' turning with '{}'", self.settings.name, anim);

        self.state.set_facing(target);
        self.play_anim_internal(&anim, true);
        self.turn_anim = Some(TurnAnimation { anim, resume });
        true
    }

    /// Whether a turn clip is playing
    pub fn playing_turn_animation(&self) -> bool {
        self.turn_anim.is_some()
    }

    /// Step the facing towards the target facing
    pub(super) fn advance_turn(&mut self, dt: f32) {
        let target = self.state.target_facing;

        let mut facing_target = target == self.state.facing;
        if !facing_target && !self.will_change_anim(target) {
            // Already showing the target's frame, the catalog is sparser than 8 directions
            self.apply_facing(target);
            facing_target = true;
        }

        if facing_target {
            self.state.turn_timer = -1.0;
            return;
        }

        self.state.turn_timer -= dt;
        if self.state.turn_timer > 0.0 {
            return;
        }
        self.state.turn_timer = 1.0 / self.settings.turn_speed_fps.max(f32::EPSILON);

        // Keep stepping until something visibly changes
        for _ in 0..TURN_ORDER.len() {
            if self.state.facing == target {
                break;
            }
            let old_flipped = self.state.flipped;
            let old_clip = self.animator.clip_name().map(str::to_string);

            let next = next_facing(
                self.state.facing,
                target,
                self.state.facing_vertical_fallback,
            );
            self.apply_facing(next);

            if old_flipped != self.state.flipped || old_clip.as_deref() != self.animator.clip_name() {
                break;
            }
        }

        if self.state.facing != target && !self.will_change_anim(target) {
            self.apply_facing(target);
        }
    }
}
