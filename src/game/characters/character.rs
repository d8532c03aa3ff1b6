// Character entity and management

use glam::Vec2;
use log::{info, warn};

use crate::engine::animation::{AnimationCatalog, SpriteAnimator};
use crate::engine::navigation::Pathfinder;
use crate::game::context::TickContext;
use crate::game::save::CharacterSnapshot;

use super::direction::Direction8;
use super::error::CharacterError;
use super::motion::WalkSpeedOverride;
use super::rules::AnimRules;
use super::settings::CharacterSettings;
use super::state::{AnimState, CharacterState, LoopWindow};

/// Unique identifier for a character
pub type CharacterId = u32;

/// Turn clip in progress and the base animation to resume afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TurnAnimation {
    pub(super) anim: String,
    pub(super) resume: String,
}

/// An adventure-game character: animation, turning, walking and lip-sync
#[derive(Debug)]
pub struct Character {
    pub(super) id: CharacterId,
    pub(super) settings: CharacterSettings,
    pub(super) state: CharacterState,

    pub(super) catalog: AnimationCatalog,
    pub(super) rules: AnimRules,
    /// Body sprite animator
    pub(super) animator: Box<dyn SpriteAnimator>,
    /// Optional mouth overlay animator
    pub(super) mouth: Option<Box<dyn SpriteAnimator>>,
    pub(super) mouth_visible: bool,

    /// In the current room and updated every tick
    pub(super) active: bool,
    /// Vertical sprite scale (room depth scaling)
    pub(super) scale: f32,

    /// Seconds since the last clip change
    pub(super) anim_change_time: f32,
    /// Ticks to wait before playing idle after an animation ends
    pub(super) idle_delay: u32,
    pub(super) walk_speed_override: WalkSpeedOverride,
    pub(super) play_walk_anim: bool,
    /// Point currently walked towards
    pub(super) target_pos: Vec2,
    /// Final destination of the current walk
    pub(super) target_end_pos: Vec2,
    pub(super) face_after_walk: Option<Direction8>,
    pub(super) turn_anim: Option<TurnAnimation>,
    pub(super) flipped_last_update: bool,
    pub(super) first_update: bool,
    /// Normalized time of a played animation, -1 otherwise
    pub(super) animation_time: f32,
    /// Animation time to apply on the first tick after a restore
    pub(super) restored_anim_time: Option<f32>,
    /// Time step of the previous tick, used to continue clips seamlessly
    pub(super) last_dt: f32,
}

impl Character {
    /// Create a character and start its idle animation
    pub fn new(
        id: CharacterId,
        settings: CharacterSettings,
        catalog: AnimationCatalog,
        rules: AnimRules,
        animator: Box<dyn SpriteAnimator>,
    ) -> Self {
        let state = CharacterState::new(settings.position, settings.facing);
        let position = state.position;
        let mut character = Self {
            id,
            settings,
            state,
            catalog,
            rules,
            animator,
            mouth: None,
            mouth_visible: false,
            active: true,
            scale: 1.0,
            anim_change_time: 0.0,
            idle_delay: 0,
            walk_speed_override: WalkSpeedOverride::default(),
            play_walk_anim: true,
            target_pos: position,
            target_end_pos: position,
            face_after_walk: None,
            turn_anim: None,
            flipped_last_update: false,
            first_update: true,
            animation_time: -1.0,
            restored_anim_time: None,
            last_dt: 0.0,
        };
        let idle = character.settings.anim_idle.clone();
        character.play_anim_internal(&idle, true);
        character
    }

    /// Attach a mouth overlay animator, driven by the lip-sync
    pub fn with_mouth(mut self, mouth: Box<dyn SpriteAnimator>) -> Self {
        self.attach_mouth(mouth);
        self
    }

    pub fn attach_mouth(&mut self, mouth: Box<dyn SpriteAnimator>) {
        self.mouth = Some(mouth);
        self.refresh_mouth_clip();
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &CharacterSettings {
        &self.settings
    }

    /// Read-only view of the simulation record
    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    /// Teleport the character
    pub fn set_position(&mut self, position: Vec2) {
        self.state.position = position;
    }

    pub fn facing(&self) -> Direction8 {
        self.state.facing
    }

    pub fn anim_state(&self) -> AnimState {
        self.state.anim_state
    }

    pub fn walking(&self) -> bool {
        self.state.is_walking()
    }

    pub fn talking(&self) -> bool {
        self.state.talking
    }

    pub fn animating(&self) -> bool {
        self.state.animating
    }

    pub fn flipped(&self) -> bool {
        self.state.flipped
    }

    /// Name of the clip the body animator is playing
    pub fn clip_name(&self) -> Option<&str> {
        self.animator.clip_name()
    }

    pub fn animator(&self) -> &dyn SpriteAnimator {
        self.animator.as_ref()
    }

    pub fn mouth(&self) -> Option<&dyn SpriteAnimator> {
        self.mouth.as_deref()
    }

    /// Whether the mouth overlay is shown this tick
    pub fn mouth_visible(&self) -> bool {
        self.mouth.is_some() && self.mouth_visible
    }

    /// World position of the mouth overlay
    pub fn mouth_position(&self) -> Vec2 {
        self.state.position + self.animator.mouth_anchor()
    }

    /// Normalized time of the played animation, -1 when not animating
    pub fn animation_time(&self) -> f32 {
        self.animation_time
    }

    pub fn room(&self) -> &str {
        &self.settings.room
    }

    pub fn set_room(&mut self, room: &str) {
        self.settings.room = room.to_string();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn visible(&self) -> bool {
        self.settings.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.settings.visible = visible;
    }

    pub fn solid(&self) -> bool {
        self.settings.solid
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Last horizontal side faced
    pub fn facing_vertical_fallback(&self) -> Direction8 {
        self.state.facing_vertical_fallback
    }

    /// Run one simulation tick
    pub fn update(&mut self, ctx: &mut TickContext) {
        let dt = ctx.dt;

        self.process_anim_events();

        if self.first_update {
            self.first_update = false;
            self.on_anim_state_change();
            if self.state.animating {
                if let Some(time) = self.restored_anim_time.take() {
                    self.animator.set_normalized_time(time);
                }
            }
        }
        self.anim_change_time += dt;

        self.animation_time = if self.state.animating {
            self.animator.normalized_time()
        } else {
            -1.0
        };

        if self.state.transition.is_some() && !self.animator.is_playing() {
            self.on_transition_anim_complete();
        }

        if self.turn_anim.is_some() && !self.animator.is_playing() {
            if let Some(turn) = self.turn_anim.take() {
                self.play_anim_internal(&turn.resume, true);
            }
        }

        self.advance_turn(dt);
        self.update_animating(ctx.skipping_cutscene);
        self.advance_walk(dt);

        if self.state.anim_state == AnimState::Idle && self.idle_delay > 0 {
            self.idle_delay -= 1;
            if self.idle_delay == 0 {
                let idle = self.settings.anim_idle.clone();
                self.play_anim_internal(&idle, true);
            }
        }

        if self.settings.visible {
            self.update_lip_sync(ctx);
        }

        self.flipped_last_update = self.state.flipped;
        self.last_dt = dt;

        self.animator.update(dt);
        if let Some(mouth) = self.mouth.as_mut() {
            mouth.update(dt);
        }
    }

    /// Capture everything needed to restore this character later
    pub fn snapshot(&self) -> CharacterSnapshot {
        let animation = if self.state.animating {
            Some(self.state.current_anim_base_name.clone())
        } else {
            None
        };
        CharacterSnapshot {
            position: self.state.position,
            facing: self.state.facing,
            facing_vertical_fallback: self.state.facing_vertical_fallback,
            animation,
            animation_time: self.animator.normalized_time(),
            loop_window: self.state.loop_window,
            room: self.settings.room.clone(),
            visible: self.settings.visible,
        }
    }

    /// Restore a saved snapshot.
    ///
    /// A saved animation is replayed with its loop window cleared, so no
    /// transition out of the loop is attempted, and the saved time is
    /// applied on the next tick.
    pub fn restore(&mut self, snapshot: &CharacterSnapshot) {
        self.cancel_walk();
        self.state.position = snapshot.position;
        self.state.set_facing(snapshot.facing);
        self.state.facing_vertical_fallback = snapshot.facing_vertical_fallback;
        self.state.target_facing = snapshot.facing;
        if !snapshot.room.is_empty() {
            self.settings.room = snapshot.room.clone();
        }
        self.settings.visible = snapshot.visible;
        self.state.transition = None;

        match &snapshot.animation {
            Some(anim) => {
                self.state.loop_window = LoopWindow::NONE;
                if let Err(err) = self.play_animation(anim) {
                    warn!("Restoring '{}': {}", self.settings.name, err);
                }
                self.state.loop_window = snapshot.loop_window;
                self.restored_anim_time = Some(snapshot.animation_time);
                self.first_update = true;
            }
            None => {
                self.state.animating = false;
                self.state.loop_window = LoopWindow::NONE;
                self.on_anim_state_change();
                let base = self.state.current_anim_base_name.clone();
                if !base.is_empty() {
                    self.play_anim_internal(&base, false);
                }
            }
        }
        info!("Restored '{}' at {}", self.settings.name, snapshot.position);
    }
}

/// Manages all characters in the game
#[derive(Debug, Default)]
pub struct CharacterManager {
    characters: Vec<Character>,
    next_id: CharacterId,
}

impl CharacterManager {
    pub fn new() -> Self {
        Self {
            characters: Vec::new(),
            next_id: 0,
        }
    }

    /// Spawn a new character
    pub fn spawn(
        &mut self,
        settings: CharacterSettings,
        catalog: AnimationCatalog,
        rules: AnimRules,
        animator: Box<dyn SpriteAnimator>,
    ) -> CharacterId {
        let id = self.next_id;
        self.next_id += 1;

        info!("Spawning character '{}' as #{}", settings.name, id);
        let character = Character::new(id, settings, catalog, rules, animator);
        self.characters.push(character);

        id
    }

    /// Add an already built character, assigning it a fresh id
    pub fn insert(&mut self, mut character: Character) -> CharacterId {
        let id = self.next_id;
        self.next_id += 1;
        character.id = id;
        self.characters.push(character);
        id
    }

    /// Get a character by ID
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Get a mutable character by ID
    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    /// Find a character by script name (case-insensitive)
    pub fn by_name(&self, name: &str) -> Option<&Character> {
        self.characters
            .iter()
            .find(|c| c.settings.name.eq_ignore_ascii_case(name))
    }

    /// Id of the character with script name `name`
    pub fn id_of(&self, name: &str) -> Option<CharacterId> {
        self.by_name(name).map(Character::id)
    }

    /// Get all characters
    pub fn all(&self) -> &[Character] {
        &self.characters
    }

    /// Get all characters mutably
    pub fn all_mut(&mut self) -> &mut [Character] {
        &mut self.characters
    }

    /// Update all active characters, in spawn order
    pub fn update(&mut self, ctx: &mut TickContext) {
        for character in self.characters.iter_mut().filter(|c| c.active) {
            character.update(ctx);
        }
    }

    /// Walk a character, routing around the other solid characters in its room
    pub fn walk_to(
        &mut self,
        id: CharacterId,
        pos: Vec2,
        anywhere: bool,
        play_walk_anim: bool,
        pathfinder: &mut dyn Pathfinder,
    ) -> Result<(), CharacterError> {
        let walker = self.get(id).ok_or(CharacterError::UnknownCharacter(id))?;
        let walker_solid = walker.settings.solid;
        let room = walker.settings.room.clone();

        if !anywhere && pathfinder.is_valid() {
            for other in &self.characters {
                if !other.settings.solid {
                    continue;
                }
                pathfinder.add_obstacle(other.id, other.state.position, other.settings.solid_size);
                if walker_solid && other.id != id && other.active && other.settings.room == room {
                    pathfinder.enable_obstacle(other.id);
                } else {
                    pathfinder.disable_obstacle(other.id);
                }
            }
        }

        let walker = self
            .get_mut(id)
            .ok_or(CharacterError::UnknownCharacter(id))?;
        walker.walk_to(pos, anywhere, play_walk_anim, pathfinder)
    }

    /// Remove a character by ID
    pub fn remove(&mut self, id: CharacterId) -> Option<Character> {
        if let Some(pos) = self.characters.iter().position(|c| c.id == id) {
            Some(self.characters.remove(pos))
        } else {
            warn!("Tried to remove unknown character #{}", id);
            None
        }
    }

    /// Get the number of characters
    pub fn count(&self) -> usize {
        self.characters.len()
    }

    /// Get the number of characters in the current room
    pub fn active_count(&self) -> usize {
        self.characters.iter().filter(|c| c.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::animation::{AnimEvent, AnimationClip, ClipPlayer};
    use crate::engine::dialog::{PhonemeLibrary, PhonemeTrack};
    use crate::engine::navigation::WalkableArea;
    use crate::game::characters::lipsync::LipSyncSettings;
    use crate::game::characters::rules::TransitionAnimRule;
    use crate::game::characters::settings::DEFAULT_TURN_SPEED_FPS;
    use crate::game::characters::state::WalkState;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct World {
        library: PhonemeLibrary,
        lip_sync: LipSyncSettings,
        rng: StdRng,
        time: f32,
    }

    impl World {
        fn new() -> Self {
            Self {
                library: PhonemeLibrary::new(),
                lip_sync: LipSyncSettings::default(),
                rng: StdRng::seed_from_u64(7),
                time: 0.0,
            }
        }

        fn tick(&mut self, character: &mut Character, dt: f32) {
            self.tick_with(character, dt, false);
        }

        fn tick_with(&mut self, character: &mut Character, dt: f32, skipping: bool) {
            self.time += dt;
            let mut ctx = TickContext::new(dt, self.time, &self.library, &self.lip_sync, &mut self.rng)
                .skipping(skipping);
            character.update(&mut ctx);
        }
    }

    fn clips(names: &[&str]) -> Vec<AnimationClip> {
        names
            .iter()
            .map(|name| AnimationClip::looping(name, 4, 10.0))
            .collect()
    }

    fn character(clips: Vec<AnimationClip>, settings: CharacterSettings) -> Character {
        Character::new(
            0,
            settings,
            AnimationCatalog::new(clips),
            AnimRules::default(),
            Box::new(ClipPlayer::new()),
        )
    }

    fn eight_way(base: &str) -> Vec<String> {
        Direction8::ALL
            .iter()
            .map(|dir| format!("{base}{}", dir.postfix()))
            .collect()
    }

    #[test]
    fn test_walk_right_end_to_end() {
        let settings = CharacterSettings {
            walk_speed: Vec2::new(5.0, 5.0),
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(clips(&["IdleR", "WalkR"]), settings);
        let area = WalkableArea::rectangle(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0));
        let mut world = World::new();

        assert_eq!(dave.facing(), Direction8::Down);
        dave.walk_to(Vec2::new(10.0, 0.0), false, true, &area)
            .expect("path");

        for _ in 0..10 {
            world.tick(&mut dave, 0.1);
        }
        assert_abs_diff_eq!(dave.position().x, 5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(dave.position().y, 0.0, epsilon = 1e-4);
        assert_eq!(dave.facing(), Direction8::Right);
        assert_eq!(dave.clip_name(), Some("WalkR"));
        assert!(!dave.flipped());
        assert!(dave.walking());

        for _ in 0..9 {
            world.tick(&mut dave, 0.1);
        }
        assert!(dave.walking());
        assert_eq!(dave.anim_state(), AnimState::Walk);

        // The last half unit fits the 20th tick exactly
        world.tick(&mut dave, 0.1);
        assert!(!dave.walking());
        assert_eq!(dave.anim_state(), AnimState::Idle);
        assert_abs_diff_eq!(dave.position().x, 10.0, epsilon = 1e-4);
        assert_eq!(dave.clip_name(), Some("WalkR"));

        // Idle plays once the post-walk delay runs out
        for _ in 0..2 {
            world.tick(&mut dave, 0.1);
        }
        assert_eq!(dave.clip_name(), Some("IdleR"));
    }

    #[test]
    fn test_vertical_facing_uses_fallback_side() {
        let settings = CharacterSettings {
            facing: Direction8::Left,
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(clips(&["IdleL", "IdleDL", "Idle"]), settings);
        assert_eq!(dave.clip_name(), Some("IdleL"));

        dave.face_direction(Direction8::Up, true);
        assert_eq!(dave.facing_vertical_fallback(), Direction8::Left);
        assert_eq!(dave.clip_name(), Some("IdleL"));
        assert!(!dave.flipped());

        dave.face_direction(Direction8::Down, true);
        assert_eq!(dave.clip_name(), Some("IdleDL"));
        assert!(!dave.flipped());
    }

    #[test]
    fn test_turn_left_to_right_round_the_front() {
        let names = eight_way("Idle");
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let run = || {
            let settings = CharacterSettings {
                facing: Direction8::Left,
                ..CharacterSettings::named("Dave")
            };
            let mut dave = character(clips(&names), settings);
            let mut world = World::new();
            dave.face_direction(Direction8::Right, false);

            let mut steps = Vec::new();
            for _ in 0..8 {
                world.tick(&mut dave, 1.0 / DEFAULT_TURN_SPEED_FPS);
                steps.push(dave.facing());
                if dave.facing() == Direction8::Right {
                    break;
                }
            }
            steps
        };

        let steps = run();
        assert_eq!(
            steps,
            vec![
                Direction8::DownLeft,
                Direction8::Down,
                Direction8::DownRight,
                Direction8::Right
            ]
        );
        assert_eq!(run(), steps);
    }

    #[test]
    fn test_turn_skips_steps_without_new_frames() {
        let settings = CharacterSettings {
            facing: Direction8::Right,
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(clips(&["IdleR"]), settings);
        let mut world = World::new();

        dave.face_direction(Direction8::Left, false);
        world.tick(&mut dave, 0.01);
        assert_eq!(dave.facing(), Direction8::Left);
        assert!(dave.flipped());
        assert_eq!(dave.clip_name(), Some("IdleR"));
    }

    #[test]
    fn test_turns_before_walking() {
        let mut names = eight_way("Idle");
        names.extend(eight_way("Walk"));
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let settings = CharacterSettings {
            facing: Direction8::Left,
            walk_speed: Vec2::new(5.0, 5.0),
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(clips(&names), settings);
        let area = WalkableArea::new();
        let mut world = World::new();

        dave.walk_to(Vec2::new(10.0, 0.0), false, true, &area)
            .expect("walks straight without an area");
        assert_eq!(dave.state().walk_state, WalkState::TurningToWalk);
        assert_eq!(dave.clip_name(), Some("IdleL"));

        let dt = 1.0 / DEFAULT_TURN_SPEED_FPS;
        for _ in 0..3 {
            world.tick(&mut dave, dt);
            assert_eq!(dave.position(), Vec2::ZERO);
            assert_eq!(dave.state().walk_state, WalkState::TurningToWalk);
        }

        // The last turn step and the first walk step share a tick
        world.tick(&mut dave, dt);
        assert_eq!(dave.facing(), Direction8::Right);
        assert_eq!(dave.state().walk_state, WalkState::Walking);
        assert_eq!(dave.clip_name(), Some("WalkR"));
        assert!(dave.position().x > 0.0);
    }

    #[test]
    fn test_face_after_walk() {
        let settings = CharacterSettings {
            facing: Direction8::Right,
            walk_speed: Vec2::new(5.0, 5.0),
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(clips(&["IdleR", "WalkR"]), settings);
        let mut world = World::new();

        dave.set_face_after_walk(Some(Direction8::Left));
        dave.walk_to(Vec2::new(1.0, 0.0), true, true, &WalkableArea::new())
            .expect("walk");
        for _ in 0..5 {
            world.tick(&mut dave, 0.1);
        }
        assert!(!dave.walking());
        assert_eq!(dave.facing(), Direction8::Left);
        assert!(dave.flipped());
    }

    #[test]
    fn test_walk_speed_tag_overrides_speed() {
        let walk = AnimationClip::looping("WalkR", 4, 10.0).with_tag(0, AnimEvent::WalkSpeed(10.0));
        let idle = AnimationClip::looping("IdleR", 4, 10.0);
        let settings = CharacterSettings {
            facing: Direction8::Right,
            walk_speed: Vec2::new(5.0, 5.0),
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(vec![idle, walk], settings);
        let mut world = World::new();

        dave.walk_to(Vec2::new(50.0, 0.0), true, true, &WalkableArea::new())
            .expect("walk");
        world.tick(&mut dave, 0.1);
        assert_abs_diff_eq!(dave.position().x, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_lip_sync_picks_phoneme_frame() {
        let talk = AnimationClip::looping("Talk", 6, 10.0).with_mouth_anchor(Vec2::new(0.0, 20.0));
        let mouth = AnimationClip::looping("Mouth", 6, 10.0);
        let settings = CharacterSettings {
            anim_mouth: "Mouth".to_string(),
            lip_sync_enabled: true,
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(vec![AnimationClip::looping("Idle", 4, 10.0), talk, mouth], settings)
            .with_mouth(Box::new(ClipPlayer::new()));
        let mut world = World::new();
        world
            .library
            .insert_track("Dave", 3, PhonemeTrack::new([(0.0, 'A'), (0.3, 'C'), (0.6, 'A')]));
        world.library.set_audio_time("Dave", 0.45);

        dave.start_say(3);
        assert_eq!(dave.anim_state(), AnimState::Talk);
        world.tick(&mut dave, 0.0);

        assert_eq!(dave.state().lip_sync_frame, 2);
        assert!(dave.mouth_visible());
        let mouth = dave.mouth().expect("mouth attached");
        assert_eq!(mouth.clip_name(), Some("Mouth"));
        assert!(mouth.is_paused());
        assert_abs_diff_eq!(mouth.normalized_time(), 2.5 / 6.0, epsilon = 1e-4);

        dave.end_say();
        assert!(!dave.mouth_visible());
        assert_eq!(dave.state().current_line_id, -1);
    }

    #[test]
    fn test_lip_sync_without_mouth_drives_talk_clip() {
        let settings = CharacterSettings {
            lip_sync_enabled: true,
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(
            vec![
                AnimationClip::looping("Idle", 4, 10.0),
                AnimationClip::looping("Talk", 6, 10.0),
            ],
            settings,
        );
        let mut world = World::new();
        world
            .library
            .insert_track("Dave", 1, PhonemeTrack::new([(0.0, 'B'), (0.5, 'E')]));
        world.library.set_audio_time("Dave", 0.2);

        dave.start_say(1);
        world.tick(&mut dave, 0.0);
        assert_eq!(dave.state().lip_sync_frame, 1);
        assert!(dave.animator().is_paused());
        assert_abs_diff_eq!(dave.animator().normalized_time(), 1.5 / 6.0, epsilon = 1e-4);
    }

    #[test]
    fn test_mouth_hidden_when_anchor_at_origin() {
        let settings = CharacterSettings {
            anim_mouth: "Mouth".to_string(),
            lip_sync_enabled: true,
            ..CharacterSettings::named("Dave")
        };
        let mut dave = character(clips(&["Idle", "Talk", "Mouth"]), settings)
            .with_mouth(Box::new(ClipPlayer::new()));
        let mut world = World::new();

        dave.start_say(0);
        world.tick(&mut dave, 0.1);
        assert!(!dave.mouth_visible());
    }

    #[test]
    fn test_transition_clip_plays_first() {
        let mut rules = AnimRules::default();
        rules.transitions.push(TransitionAnimRule {
            anim: "IdleToTalk".to_string(),
            from: "Idle".to_string(),
            to: "Talk".to_string(),
            on_flip: false,
        });
        let catalog = AnimationCatalog::new(vec![
            AnimationClip::looping("Idle", 4, 10.0),
            AnimationClip::looping("Talk", 4, 10.0),
            AnimationClip::one_shot("IdleToTalk", 2, 10.0),
        ]);
        let mut dave = Character::new(
            0,
            CharacterSettings::named("Dave"),
            catalog,
            rules,
            Box::new(ClipPlayer::new()),
        );
        let mut world = World::new();

        dave.start_say(0);
        assert_eq!(dave.clip_name(), Some("IdleToTalk"));
        let transition = dave.state().transition.clone().expect("transition in flight");
        assert_eq!(transition.from_clip, "Idle");
        assert_eq!(transition.pending, "Talk");

        for _ in 0..4 {
            world.tick(&mut dave, 0.1);
        }
        assert_eq!(dave.clip_name(), Some("Talk"));
        assert!(dave.state().transition.is_none());
    }

    /// Idle with an authored loop region, ticked until the loop window is open
    fn looping_idle() -> (Character, World) {
        let idle = AnimationClip::one_shot("Idle", 6, 10.0)
            .with_tag(2, AnimEvent::LoopStart)
            .with_tag(4, AnimEvent::LoopEnd);
        let mut dave = character(
            vec![
                idle,
                AnimationClip::looping("Talk", 4, 10.0),
                AnimationClip::one_shot("Wave", 4, 10.0),
            ],
            CharacterSettings::named("Dave"),
        );
        let mut world = World::new();
        for _ in 0..5 {
            world.tick(&mut dave, 0.1);
        }
        let window = dave.state().loop_window;
        assert_abs_diff_eq!(window.start, 2.0 / 6.0, epsilon = 1e-5);
        assert_abs_diff_eq!(window.end, 4.0 / 6.0, epsilon = 1e-5);
        assert_abs_diff_eq!(dave.animator().normalized_time(), 0.5, epsilon = 1e-5);

        // Leaving idle jumps to the loop end and plays the rest out first
        dave.start_say(0);
        assert_eq!(dave.clip_name(), Some("Idle"));
        assert_abs_diff_eq!(dave.animator().normalized_time(), 4.0 / 6.0, epsilon = 1e-5);
        let transition = dave.state().transition.clone().expect("playing out the loop");
        assert_eq!(transition.pending, "Talk");
        (dave, world)
    }

    #[test]
    fn test_rapid_clip_changes_keep_loop_time() {
        let (mut dave, mut world) = looping_idle();

        world.tick(&mut dave, 0.02);
        assert_abs_diff_eq!(dave.animator().normalized_time(), 4.2 / 6.0, epsilon = 1e-5);

        // Second change inside the debounce window: no jump back to the loop end
        dave.play_animation("Wave").expect("clip exists");
        assert_eq!(dave.clip_name(), Some("Idle"));
        assert_abs_diff_eq!(dave.animator().normalized_time(), 4.2 / 6.0, epsilon = 1e-5);
        let transition = dave.state().transition.clone().expect("still playing out");
        assert_eq!(transition.from_clip, "Idle");
        assert_eq!(transition.pending, "Wave");
    }

    #[test]
    fn test_late_clip_change_restarts_transition() {
        let (mut dave, mut world) = looping_idle();

        world.tick(&mut dave, 0.1);
        assert_abs_diff_eq!(dave.animator().normalized_time(), 5.0 / 6.0, epsilon = 1e-5);

        // Outside the debounce window the old transition is dropped and the
        // loop end is applied again for the new target
        dave.play_animation("Wave").expect("clip exists");
        assert_abs_diff_eq!(dave.animator().normalized_time(), 4.0 / 6.0, epsilon = 1e-5);
        let transition = dave.state().transition.clone().expect("new transition");
        assert_eq!(transition.pending, "Wave");

        for _ in 0..4 {
            world.tick(&mut dave, 0.1);
        }
        assert_eq!(dave.clip_name(), Some("Wave"));
        assert!(dave.state().transition.is_none());
        assert_eq!(dave.state().loop_window, LoopWindow::NONE);
    }

    #[test]
    fn test_flip_transition_only_when_mirroring() {
        let mut rules = AnimRules::default();
        rules.transitions.push(TransitionAnimRule {
            anim: "TurnFlip".to_string(),
            from: "Idle*".to_string(),
            to: "Idle*".to_string(),
            on_flip: true,
        });
        let spawn = || {
            Character::new(
                0,
                CharacterSettings {
                    facing: Direction8::Right,
                    ..CharacterSettings::named("Dave")
                },
                AnimationCatalog::new(vec![
                    AnimationClip::looping("IdleR", 4, 10.0),
                    AnimationClip::looping("IdleDR", 4, 10.0),
                    AnimationClip::one_shot("TurnFlip", 2, 10.0),
                ]),
                rules.clone(),
                Box::new(ClipPlayer::new()),
            )
        };

        // Same side: new clip, no mirror change, no transition
        let mut dave = spawn();
        dave.face_direction(Direction8::DownRight, true);
        assert_eq!(dave.clip_name(), Some("IdleDR"));
        assert!(dave.state().transition.is_none());

        // Other side: IdleDR mirrored, so the flip transition plays first
        let mut dave = spawn();
        let mut world = World::new();
        dave.face_direction(Direction8::DownLeft, true);
        assert_eq!(dave.clip_name(), Some("TurnFlip"));
        let transition = dave.state().transition.clone().expect("flip transition");
        assert_eq!(transition.from_clip, "IdleR");
        assert_eq!(transition.pending, "Idle");

        for _ in 0..4 {
            world.tick(&mut dave, 0.1);
        }
        assert_eq!(dave.clip_name(), Some("IdleDR"));
        assert!(dave.flipped());
        assert!(dave.state().transition.is_none());
    }

    #[test]
    fn test_loop_window_plays_out_before_idle() {
        let wave = AnimationClip::one_shot("Wave", 6, 10.0)
            .with_tag(2, AnimEvent::LoopStart)
            .with_tag(4, AnimEvent::LoopEnd);
        let mut dave = character(
            vec![AnimationClip::looping("Idle", 4, 10.0), wave],
            CharacterSettings::named("Dave"),
        );
        let mut world = World::new();

        dave.play_animation("Wave").expect("clip exists");
        assert_eq!(dave.anim_state(), AnimState::Animate);
        for _ in 0..12 {
            world.tick(&mut dave, 0.1);
        }
        // Still looping between the tags
        assert!(dave.animating());
        assert!(dave.state().loop_window.is_open());
        assert_eq!(dave.clip_name(), Some("Wave"));

        dave.stop_animation();
        assert_eq!(dave.anim_state(), AnimState::Idle);
        for _ in 0..12 {
            world.tick(&mut dave, 0.1);
        }
        assert_eq!(dave.clip_name(), Some("Idle"));
        assert!(dave.state().transition.is_none());
        assert_eq!(dave.state().loop_window, LoopWindow::NONE);
    }

    #[test]
    fn test_animation_returns_to_idle_when_done() {
        let mut dave = character(
            vec![
                AnimationClip::looping("Idle", 4, 10.0),
                AnimationClip::one_shot("Wave", 3, 10.0),
            ],
            CharacterSettings::named("Dave"),
        );
        let mut world = World::new();

        dave.play_animation("Wave").expect("clip exists");
        world.tick(&mut dave, 0.1);
        assert!(dave.animation_time() >= 0.0);

        for _ in 0..8 {
            world.tick(&mut dave, 0.1);
        }
        assert!(!dave.animating());
        assert_eq!(dave.animation_time(), -1.0);
        assert_eq!(dave.clip_name(), Some("Idle"));
    }

    #[test]
    fn test_skipping_cutscene_ends_one_shot() {
        let mut dave = character(
            vec![
                AnimationClip::looping("Idle", 4, 10.0),
                AnimationClip::one_shot("Wave", 30, 10.0),
            ],
            CharacterSettings::named("Dave"),
        );
        let mut world = World::new();

        dave.play_animation("Wave").expect("clip exists");
        world.tick_with(&mut dave, 0.1, true);
        assert!(!dave.animating());
    }

    #[test]
    fn test_missing_animation_is_not_fatal() {
        let mut dave = character(clips(&["Idle"]), CharacterSettings::named("Dave"));
        let result = dave.play_animation("Dance");
        assert!(matches!(result, Err(CharacterError::MissingClip(ref name)) if name == "Dance"));
        assert!(!dave.animating());
        assert_eq!(dave.clip_name(), Some("Idle"));
    }

    #[test]
    fn test_changing_idle_anim_replays() {
        let mut dave = character(clips(&["Idle", "Bored"]), CharacterSettings::named("Dave"));
        dave.set_anim_idle("Bored");
        assert_eq!(dave.clip_name(), Some("Bored"));
    }

    #[test]
    fn test_manager_routes_around_solid_characters() {
        let mut manager = CharacterManager::new();
        let solid = |name: &str, x: f32| CharacterSettings {
            solid: true,
            room: "Street".to_string(),
            position: Vec2::new(x, 0.0),
            ..CharacterSettings::named(name)
        };
        let dave = manager.spawn(
            solid("Dave", 0.0),
            AnimationCatalog::new(clips(&["Idle", "Walk"])),
            AnimRules::default(),
            Box::new(ClipPlayer::new()),
        );
        let barney = manager.spawn(
            solid("Barney", 20.0),
            AnimationCatalog::new(clips(&["Idle"])),
            AnimRules::default(),
            Box::new(ClipPlayer::new()),
        );
        assert_eq!(manager.count(), 2);
        assert_eq!(manager.id_of("barney"), Some(barney));

        let mut area = WalkableArea::rectangle(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0));
        let result = manager.walk_to(dave, Vec2::new(40.0, 0.0), false, true, &mut area);
        assert!(matches!(result, Err(CharacterError::NoPath { .. })));
        assert!(area.is_obstacle_enabled(barney));
        assert!(!area.is_obstacle_enabled(dave));

        // Barney leaves the room, the way is clear
        if let Some(character) = manager.get_mut(barney) {
            character.set_room("Bar");
        }
        manager
            .walk_to(dave, Vec2::new(40.0, 0.0), false, true, &mut area)
            .expect("path is clear");
        assert!(manager.get(dave).is_some_and(Character::walking));

        assert!(matches!(
            manager.walk_to(99, Vec2::ZERO, false, true, &mut area),
            Err(CharacterError::UnknownCharacter(99))
        ));
    }
}
