/// Tower rules, truth-table driven.
///
/// Pure functions, no side effects. They decide what the next piece is,
/// which half of the screen a tap landed on, and whether a punch kills.
///
/// ### Next piece
/// ┌───────────────────────────┬─────────────────────────┐
/// │ Condition (in order)      │ Next side               │
/// ├───────────────────────────┼─────────────────────────┤
/// │ tail side is Left/Right   │ None (forced, no roll)  │
/// │ roll < left               │ Left                    │
/// │ roll < left + right       │ Right                   │
/// │ otherwise                 │ None                    │
/// └───────────────────────────┴─────────────────────────┘
///
/// Only the tail is inspected. Longer unsolvable patterns are not
/// prevented, since a None piece may follow anything.
///
/// ### Punch
/// ┌───────────────────────────┬──────────────┐
/// │ Condition                 │ Outcome      │
/// ├───────────────────────────┼──────────────┤
/// │ front side == player side │ Lethal       │
/// │ front side is None        │ Survive      │
/// │ front side is opposite    │ Survive      │
/// └───────────────────────────┴──────────────┘

use super::side::Side;

/// Probability split for a freely drawn piece. The None share is
/// whatever is left over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideWeights {
    pub left: f64,
    pub right: f64,
}

impl SideWeights {
    /// 45% left, 45% right, 10% empty.
    pub const CLASSIC: SideWeights = SideWeights { left: 0.45, right: 0.45 };

    /// Are both shares non-negative and do they leave room for None?
    pub fn is_valid(&self) -> bool {
        self.left >= 0.0 && self.right >= 0.0 && self.left + self.right <= 1.0
    }

    pub fn none_share(&self) -> f64 {
        (1.0 - self.left - self.right).max(0.0)
    }
}

impl Default for SideWeights {
    fn default() -> Self {
        SideWeights::CLASSIC
    }
}

/// If the tail forces the next side, return it without rolling.
pub fn forced_side(tail: Side) -> Option<Side> {
    if tail.is_armed() { Some(Side::None) } else { None }
}

/// Classify a uniform roll in `[0, 1)`.
pub fn side_for_roll(roll: f64, weights: &SideWeights) -> Side {
    if roll < weights.left {
        Side::Left
    } else if roll < weights.left + weights.right {
        Side::Right
    } else {
        Side::None
    }
}

/// Which half of the playable area a tap at `x` hit.
/// The exact midpoint counts as left.
pub fn side_for_tap(x: f32, width: f32) -> Side {
    if x > width / 2.0 { Side::Right } else { Side::Left }
}

/// Does punching from `player` while `front` is next crush the character?
pub fn is_lethal(front: Side, player: Side) -> bool {
    player.is_armed() && front == player
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
