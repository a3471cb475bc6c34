/// Sushi pieces: the stackable unit of the tower.
///
/// A piece carries its gameplay side plus two presentation values:
///   - `level`: stacking slot above the base piece (base = 0)
///   - `z`: draw order, one above the piece below it
///
/// Neither value is consulted by the rules; they only move so the
/// renderer can draw the tower where it is.

use super::side::Side;

/// Level of the fixed base piece the tower stands on.
pub const BASE_LEVEL: i32 = 0;
/// Draw order of the fixed base piece.
pub const BASE_Z: i32 = 0;

/// Per-session identity. Two pieces with the same side are still distinct.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct PieceId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub side: Side,
    pub level: i32,
    pub z: i32,
}

impl Piece {
    pub fn new(id: PieceId, side: Side, level: i32, z: i32) -> Self {
        Piece { id, side, level, z }
    }

    /// Drop one slot after the piece below was punched out.
    pub fn shift_down(&mut self) {
        self.level -= 1;
        // keep z from climbing over the HUD
        self.z -= 1;
    }
}
