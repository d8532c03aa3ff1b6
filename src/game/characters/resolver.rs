// Directional animation resolver
//
// Picks the concrete clip for a base animation name and a facing, e.g.
// "Idle" facing Left -> "IdleL", or "IdleR" mirrored when only the right
// facing clip was drawn. Pure: the result depends only on the inputs.
//
// Priority when facing Left:
//   IdleL, IdleR (flip), IdleDL, IdleDR (flip), IdleUL, IdleUR (flip),
//   IdleD, IdleU, Idle
// Priority when facing Down after last facing Left:
//   IdleD, IdleDL, IdleDR (flip), IdleL, IdleR (flip), IdleUL, IdleUR (flip),
//   IdleU, Idle

use crate::engine::animation::AnimationCatalog;

use super::direction::Direction8;

/// Slot of the direction-agnostic clip (no postfix)
const DEFAULT_SLOT: usize = 8;

/// Result of resolving a base name against a catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolved {
    /// Catalog clip name to play, if any matched
    pub clip: Option<String>,
    /// Whether the clip must be mirrored horizontally
    pub flip: bool,
}

impl Resolved {
    fn found(name: &str, flip: bool) -> Self {
        Self {
            clip: Some(name.to_string()),
            flip,
        }
    }
}

/// Which of the nine slots the catalog provides for `base`, first match per slot
fn collect_slots<'a>(base: &str, catalog: &'a AnimationCatalog) -> [Option<&'a str>; 9] {
    let mut slots = [None; 9];
    for clip in catalog.iter() {
        let name = clip.name.as_str();
        if name.len() < base.len()
            || !name.is_char_boundary(base.len())
            || !name[..base.len()].eq_ignore_ascii_case(base)
        {
            continue;
        }
        let postfix = &name[base.len()..];
        let slot = match postfix.len() {
            0 => DEFAULT_SLOT,
            1 | 2 => match Direction8::from_postfix(postfix) {
                Some(dir) => dir.index(),
                None => continue,
            },
            _ => continue,
        };
        if slots[slot].is_none() {
            slots[slot] = Some(name);
        }
    }
    slots
}

/// Ordered directions to try after the exact facing
fn fallback_chain(facing: Direction8, vertical_fallback: Direction8) -> Vec<Direction8> {
    let mut chain = vec![facing];
    match facing {
        Direction8::Left | Direction8::Right => {
            chain.push(facing.to_diag_down());
            chain.push(facing.to_diag_up());
        }
        Direction8::Up => {
            chain.push(vertical_fallback.to_diag_up());
            chain.push(vertical_fallback.to_cardinal());
            chain.push(vertical_fallback.to_diag_down());
        }
        Direction8::Down => {
            chain.push(vertical_fallback.to_diag_down());
            chain.push(vertical_fallback.to_cardinal());
            chain.push(vertical_fallback.to_diag_up());
        }
        _ => {
            chain.push(facing.to_cardinal());
            chain.push(facing.flip_v());
        }
    }
    chain.push(Direction8::Down);
    chain.push(Direction8::Up);
    chain
}

/// Resolve `base` for `facing` against `catalog`.
///
/// `vertical_fallback` is the last horizontal direction faced; it picks the
/// side used when facing Up or Down without a dedicated clip.
pub fn resolve(
    base: &str,
    facing: Direction8,
    vertical_fallback: Direction8,
    catalog: &AnimationCatalog,
) -> Resolved {
    let slots = collect_slots(base, catalog);

    if slots.iter().all(Option::is_none) {
        // Nothing authored, but a left-facing character should still be mirrored
        let side = if facing.is_vertical() {
            vertical_fallback
        } else {
            facing.to_cardinal()
        };
        return Resolved {
            clip: None,
            flip: side == Direction8::Left,
        };
    }

    let directional = slots[..DEFAULT_SLOT].iter().any(Option::is_some);
    if directional {
        for dir in fallback_chain(facing, vertical_fallback) {
            if let Some(name) = slots[dir.index()] {
                return Resolved::found(name, false);
            }
            let mirrored = dir.flip_h();
            if mirrored != dir {
                if let Some(name) = slots[mirrored.index()] {
                    return Resolved::found(name, true);
                }
            }
        }
    }

    match slots[DEFAULT_SLOT] {
        Some(name) => Resolved::found(name, false),
        None => Resolved::default(),
    }
}
