// Interstitial clip tables: transition anims and turn anims

use serde::{Deserialize, Serialize};

use super::direction::Direction8;

/// Plays `anim` in between two clips whose names match `from` and `to`.
///
/// `from`/`to` are comma-delimited alternatives, compared ignoring ASCII
/// case. An alternative ending in `*` matches by prefix and a bare `*`
/// matches any clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionAnimRule {
    pub anim: String,
    pub from: String,
    pub to: String,
    /// Only applies when the mirror state changes between the two clips
    #[serde(default)]
    pub on_flip: bool,
}

/// Plays `anim` when turning from one of `from_directions` to one of
/// `to_directions` while the base animation is `from_anim`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnAnimRule {
    pub from_anim: String,
    pub from_directions: Vec<Direction8>,
    pub to_directions: Vec<Direction8>,
    pub anim: String,
}

/// True if `name` matches any alternative of `pattern`
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    pattern
        .split(',')
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .any(|alt| match alt.strip_suffix('*') {
            Some(prefix) => {
                name.len() >= prefix.len()
                    && name.is_char_boundary(prefix.len())
                    && name[..prefix.len()].eq_ignore_ascii_case(prefix)
            }
            None => alt.eq_ignore_ascii_case(name),
        })
}

/// First-match rule tables for one character
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimRules {
    #[serde(default)]
    pub transitions: Vec<TransitionAnimRule>,
    #[serde(default)]
    pub turns: Vec<TurnAnimRule>,
}

impl AnimRules {
    /// Transition clip to play when changing from clip `from` to clip `to`
    pub fn transition_anim(&self, from: &str, was_flipped: bool, to: &str, flip: bool) -> Option<&str> {
        let flipping = flip != was_flipped;
        self.transitions
            .iter()
            .find(|rule| {
                pattern_matches(&rule.to, to)
                    && pattern_matches(&rule.from, from)
                    && (!rule.on_flip || flipping)
            })
            .map(|rule| rule.anim.as_str())
    }

    /// Turn clip for rotating from `facing` to `target` while playing `base_anim`
    pub fn turn_anim(&self, facing: Direction8, target: Direction8, base_anim: &str) -> Option<&str> {
        self.turns
            .iter()
            .find(|rule| {
                rule.from_directions.contains(&facing)
                    && rule.to_directions.contains(&target)
                    && rule.from_anim.eq_ignore_ascii_case(base_anim)
            })
            .map(|rule| rule.anim.as_str())
    }
}
