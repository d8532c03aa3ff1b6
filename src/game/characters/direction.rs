// Eight-way compass facing used by characters and directional clips

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One of the eight compass directions a character can face.
///
/// The discriminant order matches the clip postfix table, so
/// `Direction8::Left as usize` indexes `"L"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction8 {
    Left,
    Right,
    #[default]
    Down,
    Up,
    DownLeft,
    DownRight,
    UpLeft,
    UpRight,
}

/// Ring used when rotating one step at a time
pub const TURN_ORDER: [Direction8; 8] = [
    Direction8::UpLeft,
    Direction8::Left,
    Direction8::DownLeft,
    Direction8::Down,
    Direction8::DownRight,
    Direction8::Right,
    Direction8::UpRight,
    Direction8::Up,
];

impl Direction8 {
    pub const ALL: [Direction8; 8] = [
        Direction8::Left,
        Direction8::Right,
        Direction8::Down,
        Direction8::Up,
        Direction8::DownLeft,
        Direction8::DownRight,
        Direction8::UpLeft,
        Direction8::UpRight,
    ];

    /// Slot index, 0..8
    pub fn index(self) -> usize {
        self as usize
    }

    /// Suffix appended to a base animation name for this direction
    pub fn postfix(self) -> &'static str {
        match self {
            Self::Left => "L",
            Self::Right => "R",
            Self::Down => "D",
            Self::Up => "U",
            Self::DownLeft => "DL",
            Self::DownRight => "DR",
            Self::UpLeft => "UL",
            Self::UpRight => "UR",
        }
    }

    /// Parse a clip postfix (case-insensitive)
    pub fn from_postfix(postfix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|dir| dir.postfix().eq_ignore_ascii_case(postfix))
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Horizontal mirror. Up and Down mirror onto themselves.
    pub fn flip_h(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::UpLeft => Self::UpRight,
            Self::UpRight => Self::UpLeft,
            Self::DownLeft => Self::DownRight,
            Self::DownRight => Self::DownLeft,
            other => other,
        }
    }

    /// Vertical mirror. Left and Right mirror onto themselves.
    pub fn flip_v(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::UpLeft => Self::DownLeft,
            Self::UpRight => Self::DownRight,
            Self::DownLeft => Self::UpLeft,
            Self::DownRight => Self::UpRight,
            other => other,
        }
    }

    /// Down-diagonal on the same horizontal side
    pub fn to_diag_down(self) -> Self {
        match self {
            Self::Left | Self::UpLeft => Self::DownLeft,
            Self::Right | Self::UpRight => Self::DownRight,
            other => other,
        }
    }

    /// Up-diagonal on the same horizontal side
    pub fn to_diag_up(self) -> Self {
        match self {
            Self::Left | Self::DownLeft => Self::UpLeft,
            Self::Right | Self::DownRight => Self::UpRight,
            other => other,
        }
    }

    /// Horizontal cardinal for a diagonal; cardinals map to themselves
    pub fn to_cardinal(self) -> Self {
        match self {
            Self::UpLeft | Self::DownLeft => Self::Left,
            Self::UpRight | Self::DownRight => Self::Right,
            other => other,
        }
    }

    /// Position of this direction in [`TURN_ORDER`]
    pub fn turn_index(self) -> usize {
        TURN_ORDER
            .iter()
            .position(|dir| *dir == self)
            .unwrap_or_default()
    }

    /// Nearest of the eight directions for a vector (y axis points up).
    /// Returns `None` for a zero-length vector.
    pub fn from_vector(v: Vec2) -> Option<Self> {
        if v.length_squared() <= f32::EPSILON {
            return None;
        }
        let octant = (v.y.atan2(v.x) / std::f32::consts::FRAC_PI_4).round() as i32;
        Some(match octant.rem_euclid(8) {
            0 => Self::Right,
            1 => Self::UpRight,
            2 => Self::Up,
            3 => Self::UpLeft,
            4 => Self::Left,
            5 => Self::DownLeft,
            6 => Self::Down,
            _ => Self::DownRight,
        })
    }
}
