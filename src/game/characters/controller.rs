// Animation state controller
//
// Owns the Idle/Walk/Talk/Animate state machine and every clip request.
// Clip requests go through the resolver, then through the transition and
// loop-window rules before reaching the animator.

use log::{debug, error, warn};

use crate::core::math::clamp01;
use crate::engine::animation::AnimEvent;

use super::character::Character;
use super::direction::Direction8;
use super::error::CharacterError;
use super::resolver::{resolve, Resolved};
use super::state::{AnimState, LoopWindow, Transition};

/// Clip changes closer together than this don't restart an authored loop.
/// Load-bearing for rapid talk start/stop; keep the value.
const TRANSITION_DEBOUNCE: f32 = 0.05;

/// Ticks to hold the previous clip before idle plays
const IDLE_DELAY_TICKS: u32 = 2;

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.len() >= prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
}

impl Character {
    /// Resolve `base` against this character's catalog
    pub(super) fn resolve_anim(&self, base: &str, facing: Direction8) -> Resolved {
        resolve(
            base,
            facing,
            self.state.facing_vertical_fallback,
            &self.catalog,
        )
    }

    /// Play an animation; the character stays in Animate until it ends or
    /// `stop_animation` is called
    pub fn play_animation(&mut self, anim: &str) -> Result<(), CharacterError> {
        if self.resolve_anim(anim, self.state.facing).clip.is_none() {
            warn!("'{}' has no animation '{}'", self.settings.name, anim);
            return Err(CharacterError::MissingClip(anim.to_string()));
        }
        self.play_anim_internal(anim, true);
        self.state.animating = true;
        self.on_anim_state_change();
        Ok(())
    }

    /// Leave Animate, finishing any transition first
    pub fn stop_animation(&mut self) {
        if self.state.transition.is_some() {
            self.on_transition_anim_complete();
        }
        self.state.animating = false;
        self.on_anim_state_change();
    }

    pub fn pause_animation(&mut self) {
        if self.state.anim_state == AnimState::Animate {
            self.animator.pause();
        }
    }

    pub fn resume_animation(&mut self) {
        if self.state.anim_state == AnimState::Animate {
            self.animator.resume();
        }
    }

    /// Start voicing a dialog line
    pub fn start_say(&mut self, line_id: i32) {
        self.state.current_line_id = line_id;
        self.state.talking = true;
        self.on_anim_state_change();
    }

    pub fn end_say(&mut self) {
        self.state.current_line_id = -1;
        self.state.talking = false;
        self.on_anim_state_change();
    }

    pub fn set_anim_idle(&mut self, anim: &str) {
        self.settings.anim_idle = anim.to_string();
        self.on_animation_changed(AnimState::Idle);
    }

    pub fn set_anim_walk(&mut self, anim: &str) {
        self.settings.anim_walk = anim.to_string();
        self.on_animation_changed(AnimState::Walk);
    }

    pub fn set_anim_talk(&mut self, anim: &str) {
        self.settings.anim_talk = anim.to_string();
        self.on_animation_changed(AnimState::Talk);
    }

    pub fn set_anim_mouth(&mut self, anim: &str) {
        self.settings.anim_mouth = anim.to_string();
        self.on_animation_changed(AnimState::Talk);
    }

    /// Replay the clip of `changed` if the character is currently in it
    fn on_animation_changed(&mut self, changed: AnimState) {
        if changed != self.state.anim_state {
            return;
        }
        match changed {
            AnimState::Idle => {
                let idle = self.settings.anim_idle.clone();
                self.play_anim_internal(&idle, true);
            }
            AnimState::Walk => {
                if self.play_walk_anim {
                    let walk = self.settings.anim_walk.clone();
                    self.play_anim_internal(&walk, false);
                }
            }
            AnimState::Talk => {
                let talk = self.settings.anim_talk.clone();
                self.play_anim_internal(&talk, true);
                self.refresh_mouth_clip();
            }
            AnimState::Animate => {}
        }
    }

    /// Re-evaluate the state from the activity flags
    pub(super) fn on_anim_state_change(&mut self) {
        let desired = self.state.desired_anim_state();
        if desired != self.state.anim_state {
            self.set_state(desired);
        }
    }

    fn set_state(&mut self, new_state: AnimState) {
        let old_state = self.state.anim_state;
        self.on_exit_state(old_state);
        self.state.anim_state = new_state;
        debug!(
            "'{}' state {:?} -> {:?}",
            self.settings.name, old_state, new_state
        );
        self.on_enter_state(new_state);
    }

    fn on_exit_state(&mut self, old_state: AnimState) {
        if old_state == AnimState::Talk {
            self.mouth_visible = false;
        }
    }

    fn on_enter_state(&mut self, new_state: AnimState) {
        match new_state {
            AnimState::Idle => {
                if self.idle_delay == 0 {
                    let idle = self.settings.anim_idle.clone();
                    self.play_anim_internal(&idle, true);
                }
            }
            AnimState::Walk => {
                if self.play_walk_anim {
                    let walk = self.settings.anim_walk.clone();
                    self.play_anim_internal(&walk, true);
                    // Re-clicking a walk target stops and restarts the walk
                    self.idle_delay = IDLE_DELAY_TICKS;
                }
            }
            AnimState::Talk => {
                if !self.settings.anim_talk.is_empty() {
                    let talk = self.settings.anim_talk.clone();
                    self.play_anim_internal(&talk, true);
                }
                if self.mouth.is_some() {
                    self.refresh_mouth_clip();
                } else if self.settings.lip_sync_enabled {
                    self.animator.pause();
                }
            }
            AnimState::Animate => {
                self.idle_delay = IDLE_DELAY_TICKS;
            }
        }
    }

    /// Restart the directional mouth clip at frame 0, paused
    pub(super) fn refresh_mouth_clip(&mut self) {
        if self.settings.anim_mouth.is_empty() || self.mouth.is_none() {
            return;
        }
        let resolved = self.resolve_anim(&self.settings.anim_mouth, self.state.facing);
        let Some(mouth) = self.mouth.as_mut() else {
            return;
        };
        match resolved.clip.as_deref().and_then(|name| self.catalog.find(name)) {
            Some(clip) => {
                mouth.play(clip);
                mouth.pause();
                mouth.set_flip_horizontal(resolved.flip);
            }
            None => warn!(
                "'{}' has no mouth animation '{}'",
                self.settings.name, self.settings.anim_mouth
            ),
        }
    }

    /// True if facing `target` would show a different clip or mirror state
    pub(super) fn will_change_anim(&self, target: Direction8) -> bool {
        let resolved = self.resolve_anim(&self.state.current_anim_base_name, target);
        resolved.flip != self.state.flipped || resolved.clip.as_deref() != self.animator.clip_name()
    }

    /// Play the directional clip for `anim_name`, honouring transition rules
    /// and loop windows, and apply the mirror state.
    pub(super) fn play_anim_internal(&mut self, anim_name: &str, from_start: bool) {
        if let Some(transition) = &self.state.transition {
            if starts_with_ignore_case(&transition.clip, anim_name) {
                // Already transitioning into this animation
                return;
            }
        }

        if self
            .turn_anim
            .as_ref()
            .is_some_and(|turn| turn.anim != anim_name)
        {
            self.turn_anim = None;
        }

        let facing = self.state.facing;
        let resolved = self.resolve_anim(anim_name, facing);
        let mut anim_name = anim_name.to_string();
        let mut clip_name = resolved.clip;
        let mut flip = resolved.flip;
        let mut old_clip = self.animator.clip_name().map(str::to_string);
        let mut ignore_loop_time = false;

        let mut cancel_transition = false;
        if let Some(transition) = &self.state.transition {
            if old_clip != clip_name {
                if self.anim_change_time < TRANSITION_DEBOUNCE {
                    // Several changes in a row: keep the loop where it is
                    ignore_loop_time = true;
                    old_clip = Some(transition.from_clip.clone());
                } else {
                    cancel_transition = true;
                }
            }
        }
        if cancel_transition {
            self.state.transition = None;
        }

        if let (Some(clip), Some(from)) = (clip_name.clone(), old_clip.clone()) {
            if from != clip {
                let transition_anim = self
                    .rules
                    .transition_anim(&from, self.flipped_last_update, &clip, flip)
                    .map(str::to_string);
                let transition_resolved = transition_anim
                    .as_deref()
                    .map(|anim| self.resolve_anim(anim, facing));

                if let (Some(transition_anim), Some(Resolved {
                    clip: Some(transition_clip),
                    flip: transition_flip,
                })) = (transition_anim, transition_resolved)
                {
                    self.state.transition = Some(Transition {
                        from_clip: from,
                        clip: transition_clip.clone(),
                        pending: anim_name,
                    });
                    anim_name = transition_anim;
                    clip_name = Some(transition_clip);
                    flip = transition_flip;
                } else if self.state.loop_window.is_open() {
                    // Let the authored loop play out before switching
                    let window = self.state.loop_window;
                    if !ignore_loop_time && window.end > window.start {
                        self.animator.set_normalized_time(window.end);
                    }
                    self.state.transition = Some(Transition {
                        from_clip: from.clone(),
                        clip: from,
                        pending: anim_name,
                    });
                    self.anim_change_time = 0.0;
                    return;
                }
            }
        }

        match clip_name.as_deref() {
            Some(name) => {
                self.state.current_anim_base_name = anim_name;
                if old_clip.as_deref() != Some(name) {
                    self.state.loop_window = LoopWindow::NONE;
                    self.anim_change_time = 0.0;
                    if let Some(clip) = self.catalog.find(name) {
                        if from_start || self.animator.clip_name().is_none() {
                            self.animator.play(clip);
                        } else {
                            // Continue from the same point in the new clip
                            let time = clamp01(self.animator.normalized_time() + self.last_dt);
                            self.animator.play(clip);
                            self.animator.set_normalized_time(time);
                        }
                    }
                }
            }
            None => self.report_missing_clip(&anim_name),
        }

        if flip != self.state.flipped {
            self.state.flipped = flip;
            self.animator.set_flip_horizontal(flip);
        }
    }

    fn report_missing_clip(&self, anim_name: &str) {
        if anim_name.is_empty() {
            return;
        }
        if self.settings.is_builtin_anim(anim_name) {
            if !self.catalog.is_empty() {
                error!(
                    "'{}' has animations but none for built-in '{}'",
                    self.settings.name, anim_name
                );
            }
        } else {
            warn!(
                "Failed to find animation '{}' for '{}'",
                anim_name, self.settings.name
            );
        }
    }

    /// Clear the finished transition and start the queued animation
    pub(super) fn on_transition_anim_complete(&mut self) {
        let Some(transition) = self.state.transition.take() else {
            return;
        };
        self.state.loop_window = LoopWindow::NONE;
        self.play_anim_internal(&transition.pending, true);
    }

    /// Return to the state clip once a played animation finishes
    pub(super) fn update_animating(&mut self, skipping_cutscene: bool) {
        if !self.state.animating {
            return;
        }
        if !self.animator.is_playing() && !self.settings.pause_anim_at_end {
            self.stop_animation();
        } else if skipping_cutscene
            && !self.current_clip_loops()
            && !self.settings.pause_anim_at_end
            && !self.state.loop_window.is_open()
        {
            self.stop_animation();
        }
    }

    fn current_clip_loops(&self) -> bool {
        self.animator
            .clip_name()
            .and_then(|name| self.catalog.find(name))
            .is_some_and(|clip| clip.looping)
    }

    fn on_transition_clip(&self) -> bool {
        match (&self.state.transition, self.animator.clip_name()) {
            (Some(transition), Some(clip)) => transition.clip == clip,
            _ => false,
        }
    }

    /// Apply frame tags raised by the animators since the last tick
    pub(super) fn process_anim_events(&mut self) {
        for event in self.animator.drain_events() {
            match event {
                AnimEvent::Reset => self.walk_speed_override.reset(),
                AnimEvent::LoopStart => {
                    if !self.on_transition_clip() {
                        self.state.loop_window.start = self.animator.normalized_time();
                    }
                }
                AnimEvent::LoopEnd => {
                    if !self.on_transition_clip() {
                        self.state.loop_window.end = self.animator.normalized_time();
                        self.animator
                            .set_normalized_time(self.state.loop_window.start);
                    }
                }
                AnimEvent::WalkSpeed(speed) => {
                    self.walk_speed_override.x = Some(speed);
                    self.walk_speed_override.y = Some(speed);
                }
                AnimEvent::WalkSpeedX(speed) => self.walk_speed_override.x = Some(speed),
                AnimEvent::WalkSpeedY(speed) => self.walk_speed_override.y = Some(speed),
                AnimEvent::WalkSpeedReset => self.walk_speed_override.reset(),
                AnimEvent::Mouth(anim) => self.set_anim_mouth(&anim),
            }
        }
        if let Some(mouth) = self.mouth.as_mut() {
            mouth.drain_events();
        }
    }
}
