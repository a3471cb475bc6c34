/// The sushi tower: an ordered queue of pieces, bottom first.
///
/// The front is always the piece the player punches next. New pieces
/// are generated at the tail by the rules in `rules.rs`, so the tower
/// never holds two armed pieces back to back.
///
/// Visual slots (`level`, `z`) are maintained here too, but the gameplay
/// operations never read them.

use std::collections::VecDeque;

use rand::Rng;

use super::piece::{Piece, PieceId, BASE_LEVEL, BASE_Z};
use super::rules::{self, SideWeights};
use super::side::Side;

/// The two hand-placed pieces every tower starts with.
pub const SEED_SIDES: [Side; 2] = [Side::None, Side::Right];

/// Outcome of punching the front piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consume {
    /// The front piece had chopsticks on the player's side.
    /// Nothing was removed.
    Lethal,
    /// The front piece was knocked out and is handed back for animation.
    Survived(Piece),
}

#[derive(Clone, Debug)]
pub struct Tower {
    pieces: VecDeque<Piece>,
    weights: SideWeights,
    next_id: u64,
}

impl Tower {
    pub fn new(weights: SideWeights) -> Self {
        Tower {
            pieces: VecDeque::with_capacity(16),
            weights,
            next_id: 0,
        }
    }

    /// Build a playable tower: `[None, Right]` by hand, then `extra`
    /// generated pieces on top.
    pub fn seeded<R: Rng + ?Sized>(weights: SideWeights, extra: usize, rng: &mut R) -> Self {
        let mut tower = Tower::new(weights);
        for side in SEED_SIDES {
            tower.append_piece(side);
        }
        tower.append_random_pieces(extra, rng);
        tower
    }

    // ── Queries ──

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn front(&self) -> Option<&Piece> {
        self.pieces.front()
    }

    pub fn tail(&self) -> Option<&Piece> {
        self.pieces.back()
    }

    /// Pieces bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }

    pub fn sides(&self) -> Vec<Side> {
        self.pieces.iter().map(|p| p.side).collect()
    }

    // ── Generation ──

    /// Put a piece with `side` on top of the tail (or on top of the base
    /// piece when the tower is empty).
    pub fn append_piece(&mut self, side: Side) {
        let (level, z) = match self.pieces.back() {
            Some(last) => (last.level, last.z),
            None => (BASE_LEVEL, BASE_Z),
        };
        let id = PieceId(self.next_id);
        self.next_id += 1;
        self.pieces.push_back(Piece::new(id, side, level + 1, z + 1));
    }

    /// Grow the tower by `count` generated pieces.
    ///
    /// Panics if the tower is empty: the tail decides what may come next,
    /// so there must be one.
    pub fn append_random_pieces<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        for _ in 0..count {
            let tail = match self.tail() {
                Some(p) => p.side,
                None => panic!("append_random_pieces on an empty tower"),
            };
            let side = match rules::forced_side(tail) {
                Some(forced) => forced,
                None => rules::side_for_roll(rng.random::<f64>(), &self.weights),
            };
            self.append_piece(side);
        }
    }

    // ── Consumption ──

    /// Punch the front piece from `player_side`.
    ///
    /// Panics on an empty tower; callers gate on the session phase, and
    /// an active tower is never empty.
    pub fn consume_front(&mut self, player_side: Side) -> Consume {
        let front = match self.pieces.pop_front() {
            Some(p) => p,
            None => panic!("consume_front on an empty tower"),
        };
        if rules::is_lethal(front.side, player_side) {
            self.pieces.push_front(front);
            return Consume::Lethal;
        }
        Consume::Survived(front)
    }

    /// Drop every piece one slot after a successful punch.
    pub fn shift_down(&mut self) {
        for piece in self.pieces.iter_mut() {
            piece.shift_down();
        }
    }

    /// Let the tower land on the character after a lethal punch.
    /// Only the level moves; draw order is left alone.
    pub fn settle(&mut self) {
        for piece in self.pieces.iter_mut() {
            piece.level -= 1;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
