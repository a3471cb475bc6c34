/// Session: the complete state of one playthrough.
///
/// ## Lifecycle
///
///   Title ──play──▶ Ready ──first tap──▶ Playing ──death──▶ GameOver
///
/// A finished session is never reset in place. `restart()` builds a
/// brand new one with the same seeding procedure, and the caller
/// replaces the old value with it.
///
/// ## Health
///
/// Health is fixed point in thousandths of a full bar so that repeated
/// per-frame drains land exactly on zero. It is capped at full on the
/// way up and allowed to go negative on the way down; negative means
/// the run is over.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::GameplayConfig;
use crate::domain::side::Side;
use crate::domain::tower::Tower;
use super::event::{DeathCause, GameEvent};

/// Units in a full health bar.
pub const HEALTH_SCALE: i32 = 1000;
pub const HEALTH_FULL: i32 = HEALTH_SCALE;

/// Convert a bar fraction (0.1 = a tenth of the bar) to health units.
pub fn health_units(fraction: f64) -> i32 {
    (fraction * HEALTH_SCALE as f64).round() as i32
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Ready,
    Playing,
    GameOver,
}

pub struct Session {
    // ── Meta ──
    pub(super) phase: Phase,
    seed: u64,
    /// Frame ticks spent in Playing.
    pub(super) frames: u64,

    // ── Bookkeeping (mutated only through setters) ──
    health: i32,
    score: u32,
    death: Option<DeathCause>,

    // ── Board ──
    /// Side the character is standing on.
    pub(super) character: Side,
    pub(super) tower: Tower,
    pub(super) rng: Pcg32,

    pub(super) rules: GameplayConfig,
}

// ── Construction ──

impl Session {
    /// Fresh session on the title screen.
    pub fn new(seed: u64, rules: GameplayConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let tower = Tower::seeded(rules.weights, rules.initial_pieces, &mut rng);
        log::debug!("session seeded with {seed}: {} pieces", tower.len());
        Session {
            phase: Phase::Title,
            seed,
            frames: 0,
            health: HEALTH_FULL,
            score: 0,
            death: None,
            character: Side::Left,
            tower,
            rng,
            rules,
        }
    }

    /// Replacement session for the play button on the game-over screen.
    /// The play button doubles as the start action, so it opens in Ready.
    pub fn restart(&self, seed: u64) -> Session {
        let mut next = Session::new(seed, self.rules.clone());
        next.phase = Phase::Ready;
        log::info!("restart: seed {seed} (previous score {})", self.score);
        next
    }
}

// ── Accessors / setters ──

impl Session {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn character(&self) -> Side {
        self.character
    }

    pub fn tower(&self) -> &Tower {
        &self.tower
    }

    /// Raw health in units; negative once the bar has run dry.
    pub fn health_units(&self) -> i32 {
        self.health
    }

    /// Health as a bar fraction in `[0, 1]` for display.
    pub fn health(&self) -> f32 {
        self.health.clamp(0, HEALTH_FULL) as f32 / HEALTH_SCALE as f32
    }

    /// Set health, capping at a full bar.
    pub(super) fn set_health(&mut self, units: i32) {
        self.health = units.min(HEALTH_FULL);
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub(super) fn add_point(&mut self) {
        self.score += 1;
    }

    pub fn death(&self) -> Option<DeathCause> {
        self.death
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

// ── Transitions ──

impl Session {
    /// Title screen play button. Ignored in any other phase.
    pub fn press_play(&mut self) -> Option<GameEvent> {
        if self.phase != Phase::Title {
            return None;
        }
        self.phase = Phase::Ready;
        Some(GameEvent::Ready)
    }

    /// Enter GameOver. Only the first call has any effect.
    pub(super) fn end(&mut self, cause: DeathCause) -> Option<GameEvent> {
        if self.phase == Phase::GameOver {
            return None;
        }
        self.phase = Phase::GameOver;
        self.death = Some(cause);
        log::info!(
            "game over ({cause:?}): score {} after {} frames, seed {}",
            self.score, self.frames, self.seed,
        );
        Some(GameEvent::GameOver { cause, score: self.score })
    }
}
