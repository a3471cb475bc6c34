/// Events emitted by the session while it reacts to taps and ticks.
/// The presentation layer consumes these for animation and sound.

use crate::domain::piece::Piece;
use crate::domain::side::Side;

/// Why a run ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    /// Punched into chopsticks on the character's own side.
    Crushed,
    /// Health ran out.
    Starved,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Play button pressed; waiting for the first tap.
    Ready,
    /// First tap landed; the clock is running.
    Started,
    /// A piece was punched out from `from`.
    Chopped { piece: Piece, from: Side, score: u32 },
    GameOver { cause: DeathCause, score: u32 },
}
