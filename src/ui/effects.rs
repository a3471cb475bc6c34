/// Short-lived presentation state driven by session events.
///
/// The session never waits on any of this: a chop is final the moment
/// `step::tap` returns. Effects only remember enough to draw the knocked
/// out piece flying away and the screen reacting to a death.

use crate::domain::piece::Piece;
use crate::domain::side::Side;
use crate::sim::event::{DeathCause, GameEvent};

/// Frames a knocked-out piece stays on screen.
pub const FLY_FRAMES: u32 = 18;
/// Columns a flying piece travels per frame.
pub const FLY_SPEED: i32 = 3;
/// Frames the cat holds the punch pose.
const PUNCH_FRAMES: u32 = 6;
/// Frames of red flash after a death.
const FLASH_FRAMES: u32 = 12;

#[derive(Clone, Debug)]
pub struct FlyingPiece {
    pub piece: Piece,
    /// Direction of travel: away from the side it was punched from.
    pub toward: Side,
    pub age: u32,
}

impl FlyingPiece {
    /// Horizontal offset in columns from the tower axis.
    pub fn offset(&self) -> i32 {
        let dist = self.age as i32 * FLY_SPEED;
        match self.toward {
            Side::Left => -dist,
            Side::Right => dist,
            Side::None => 0,
        }
    }

    /// Rows risen since the punch. Arcs up for the first half, then falls.
    pub fn lift(&self) -> i32 {
        let half = FLY_FRAMES as i32 / 2;
        let a = self.age as i32;
        if a <= half { a / 3 } else { (FLY_FRAMES as i32 - a) / 3 }
    }

    /// Remaining opacity, 1.0 when fresh down to 0.0 when expired.
    pub fn alpha(&self) -> f32 {
        1.0 - (self.age as f32 / FLY_FRAMES as f32).min(1.0)
    }
}

#[derive(Debug, Default)]
pub struct Effects {
    pub flying: Vec<FlyingPiece>,
    /// Frames left in the punch pose.
    pub punch: u32,
    /// Frames left in the red death flash.
    pub flash: u32,
    pub death: Option<DeathCause>,
    /// Free-running frame counter for blinking prompts.
    pub anim_tick: u64,
}

impl Effects {
    pub fn new() -> Self {
        Effects::default()
    }

    /// Feed one frame's worth of session events.
    pub fn apply(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Ready | GameEvent::Started => {
                    self.death = None;
                    self.flash = 0;
                }
                GameEvent::Chopped { piece, from, .. } => {
                    self.flying.push(FlyingPiece {
                        piece: piece.clone(),
                        toward: from.opposite(),
                        age: 0,
                    });
                    self.punch = PUNCH_FRAMES;
                }
                GameEvent::GameOver { cause, .. } => {
                    self.death = Some(*cause);
                    self.flash = FLASH_FRAMES;
                    self.punch = 0;
                }
            }
        }
    }

    /// Age everything by one frame and drop what has expired.
    pub fn advance(&mut self) {
        self.anim_tick = self.anim_tick.wrapping_add(1);
        self.punch = self.punch.saturating_sub(1);
        self.flash = self.flash.saturating_sub(1);
        for f in &mut self.flying {
            f.age += 1;
        }
        self.flying.retain(|f| f.age < FLY_FRAMES);
    }

    /// Forget everything tied to the previous session.
    pub fn reset(&mut self) {
        let tick = self.anim_tick;
        *self = Effects::default();
        self.anim_tick = tick;
    }

    pub fn blink(&self, period: u64) -> bool {
        (self.anim_tick / period.max(1)) % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::piece::PieceId;

    fn chopped(from: Side) -> GameEvent {
        GameEvent::Chopped {
            piece: Piece::new(PieceId(7), Side::Left, 1, 1),
            from,
            score: 1,
        }
    }

    #[test]
    fn chopped_piece_flies_away_from_the_punch() {
        let mut fx = Effects::new();
        fx.apply(&[chopped(Side::Right)]);
        assert_eq!(fx.flying.len(), 1);
        assert_eq!(fx.flying[0].toward, Side::Left);
        fx.advance();
        fx.advance();
        assert_eq!(fx.flying[0].offset(), -2 * FLY_SPEED);
        assert!(fx.punch > 0);
    }

    #[test]
    fn flying_pieces_expire() {
        let mut fx = Effects::new();
        fx.apply(&[chopped(Side::Left), chopped(Side::Right)]);
        for _ in 0..FLY_FRAMES - 1 {
            fx.advance();
        }
        assert_eq!(fx.flying.len(), 2);
        assert!(fx.flying[0].alpha() > 0.0);
        fx.advance();
        assert!(fx.flying.is_empty());
    }

    #[test]
    fn arc_returns_to_the_start_row() {
        let mut f = FlyingPiece {
            piece: Piece::new(PieceId(0), Side::None, 1, 1),
            toward: Side::Right,
            age: 0,
        };
        assert_eq!(f.lift(), 0);
        f.age = FLY_FRAMES / 2;
        assert!(f.lift() > 0);
        f.age = FLY_FRAMES;
        assert_eq!(f.lift(), 0);
    }

    #[test]
    fn game_over_flashes_then_restart_clears() {
        let mut fx = Effects::new();
        fx.apply(&[GameEvent::GameOver { cause: DeathCause::Crushed, score: 3 }]);
        assert_eq!(fx.death, Some(DeathCause::Crushed));
        assert!(fx.flash > 0);
        for _ in 0..FLASH_FRAMES {
            fx.advance();
        }
        assert_eq!(fx.flash, 0);
        fx.apply(&[GameEvent::Started]);
        assert_eq!(fx.death, None);
    }

    #[test]
    fn reset_keeps_the_blink_clock() {
        let mut fx = Effects::new();
        fx.apply(&[chopped(Side::Left)]);
        fx.advance();
        fx.reset();
        assert!(fx.flying.is_empty());
        assert_eq!(fx.anim_tick, 1);
    }
}
