/// Input and clock entry points: the only code that advances a session.
///
/// Tap processing order (Playing):
///   1. Tap x → player side (left/right half)
///   2. Character moves to that side
///   3. Punch the front piece
///   4a. Lethal → tower settles on the character, GameOver
///   4b. Survived → health + reward, score + 1, one new piece, tower drops
///
/// Tick processing (Playing): drain health, GameOver once it goes negative.
///
/// Both are no-ops outside the phases they apply to, which is the only
/// guard the tower relies on.

use crate::domain::rules;
use crate::domain::tower::Consume;
use super::event::{DeathCause, GameEvent};
use super::session::{Phase, Session};

// ══════════════════════════════════════════════════════════════
// Tap
// ══════════════════════════════════════════════════════════════

/// A tap at `x` in a playable area `width` wide.
pub fn tap(session: &mut Session, x: f32, width: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    match session.phase {
        Phase::Title | Phase::GameOver => return events,
        Phase::Ready => {
            // the first tap starts the clock and is played as well
            session.phase = Phase::Playing;
            events.push(GameEvent::Started);
            log::info!("run started (seed {})", session.seed());
        }
        Phase::Playing => {}
    }

    let side = rules::side_for_tap(x, width);
    session.character = side;

    match session.tower.consume_front(side) {
        Consume::Lethal => {
            session.tower.settle();
            events.extend(session.end(DeathCause::Crushed));
        }
        Consume::Survived(piece) => {
            session.set_health(session.health_units() + session.rules.chop_reward);
            session.add_point();
            session.tower.append_random_pieces(1, &mut session.rng);
            session.tower.shift_down();
            log::debug!("chop {:?} from {:?}: score {}", piece.side, side, session.score());
            events.push(GameEvent::Chopped { piece, from: side, score: session.score() });
        }
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Frame tick
// ══════════════════════════════════════════════════════════════

pub fn tick(session: &mut Session) -> Vec<GameEvent> {
    if session.phase != Phase::Playing { return vec![]; }

    session.frames += 1;
    session.set_health(session.health_units() - session.rules.health_drain);

    if session.health_units() < 0 {
        return session.end(DeathCause::Starved).into_iter().collect();
    }
    vec![]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameplayConfig;
    use crate::domain::rules::SideWeights;
    use crate::domain::side::Side;
    use crate::domain::tower::Tower;
    use crate::sim::session::{HEALTH_FULL, health_units};
    use proptest::prelude::*;

    const W: f32 = 80.0;
    const LEFT_X: f32 = 10.0;
    const RIGHT_X: f32 = 70.0;

    fn playing(seed: u64) -> Session {
        let mut s = Session::new(seed, GameplayConfig::default());
        s.phase = Phase::Playing;
        s
    }

    /// Replace the tower with a hand-built one.
    fn with_tower(s: &mut Session, sides: &[Side]) {
        let mut t = Tower::new(SideWeights::CLASSIC);
        for &side in sides {
            t.append_piece(side);
        }
        s.tower = t;
    }

    // ── State gating ──

    #[test]
    fn taps_ignored_on_title() {
        let mut s = Session::new(1, GameplayConfig::default());
        let before = s.tower.sides();
        assert!(tap(&mut s, RIGHT_X, W).is_empty());
        assert_eq!(s.phase, Phase::Title);
        assert_eq!(s.tower.sides(), before);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn taps_ignored_after_game_over() {
        let mut s = playing(1);
        s.phase = Phase::GameOver;
        let before = s.tower.sides();
        assert!(tap(&mut s, LEFT_X, W).is_empty());
        assert_eq!(s.tower.sides(), before);
    }

    #[test]
    fn first_tap_from_ready_starts_and_plays() {
        let mut s = Session::new(1, GameplayConfig::default());
        s.press_play();
        // seeded tower: front is None, so any tap survives
        let events = tap(&mut s, LEFT_X, W);
        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(events[0], GameEvent::Started);
        assert!(matches!(events[1], GameEvent::Chopped { .. }));
        assert_eq!(s.score(), 1);
    }

    #[test]
    fn tick_ignored_outside_playing() {
        let mut s = Session::new(1, GameplayConfig::default());
        assert!(tick(&mut s).is_empty());
        s.press_play();
        assert!(tick(&mut s).is_empty());
        assert_eq!(s.health_units(), HEALTH_FULL);
    }

    // ── Tap outcomes ──

    #[test]
    fn tap_sets_character_side() {
        let mut s = playing(1);
        with_tower(&mut s, &[Side::None, Side::None, Side::None]);
        tap(&mut s, RIGHT_X, W);
        assert_eq!(s.character, Side::Right);
        tap(&mut s, LEFT_X, W);
        assert_eq!(s.character, Side::Left);
    }

    #[test]
    fn right_front_and_right_tap_is_lethal() {
        let mut s = playing(1);
        with_tower(&mut s, &[Side::Right, Side::None, Side::Left]);
        s.set_health(500);
        let events = tap(&mut s, RIGHT_X, W);
        assert_eq!(s.phase, Phase::GameOver);
        assert_eq!(s.tower.sides(), vec![Side::Right, Side::None, Side::Left]);
        assert_eq!(s.score(), 0);
        assert_eq!(s.health_units(), 500);
        assert_eq!(
            events,
            vec![GameEvent::GameOver { cause: DeathCause::Crushed, score: 0 }]
        );
        // tower landed on the character
        assert_eq!(s.tower.front().unwrap().level, 0);
    }

    #[test]
    fn left_front_and_right_tap_survives() {
        let mut s = playing(1);
        with_tower(&mut s, &[Side::Left, Side::None, Side::None]);
        s.set_health(500);
        let front_id = s.tower.front().unwrap().id;
        let events = tap(&mut s, RIGHT_X, W);

        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(s.score(), 1);
        assert_eq!(s.health_units(), 600);
        // one removed, one appended
        assert_eq!(s.tower.len(), 3);
        assert!(s.tower.iter().all(|p| p.id != front_id));
        assert_eq!(s.tower.front().unwrap().level, 1);
        match &events[0] {
            GameEvent::Chopped { piece, from, score } => {
                assert_eq!(piece.id, front_id);
                assert_eq!(*from, Side::Right);
                assert_eq!(*score, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn reward_is_capped_at_full() {
        let mut s = playing(1);
        with_tower(&mut s, &[Side::None, Side::None]);
        s.set_health(HEALTH_FULL - 30);
        tap(&mut s, LEFT_X, W);
        assert_eq!(s.health_units(), HEALTH_FULL);
        tap(&mut s, LEFT_X, W);
        assert_eq!(s.health_units(), HEALTH_FULL);
    }

    #[test]
    fn midpoint_tap_is_left() {
        let mut s = playing(1);
        with_tower(&mut s, &[Side::Left, Side::None]);
        tap(&mut s, W / 2.0, W);
        assert_eq!(s.phase, Phase::GameOver);
    }

    // ── Clock ──

    #[test]
    fn hundred_ticks_drain_exactly_to_zero() {
        let mut s = playing(1);
        for _ in 0..100 {
            assert!(tick(&mut s).is_empty());
        }
        assert_eq!(s.health_units(), 0);
        assert_eq!(s.phase, Phase::Playing);

        let events = tick(&mut s);
        assert_eq!(s.phase, Phase::GameOver);
        assert_eq!(
            events,
            vec![GameEvent::GameOver { cause: DeathCause::Starved, score: 0 }]
        );
        assert_eq!(s.frames, 101);
    }

    #[test]
    fn no_drain_after_game_over() {
        let mut s = playing(1);
        for _ in 0..101 { tick(&mut s); }
        let h = s.health_units();
        assert!(tick(&mut s).is_empty());
        assert_eq!(s.health_units(), h);
    }

    #[test]
    fn chop_reward_buys_ten_ticks() {
        let mut s = playing(1);
        with_tower(&mut s, &[Side::None, Side::None]);
        for _ in 0..50 { tick(&mut s); }
        tap(&mut s, LEFT_X, W);
        assert_eq!(s.health_units(), HEALTH_FULL - 50 * health_units(0.01) + health_units(0.1));
    }

    // ── Restart ──

    #[test]
    fn restart_after_death_reseeds() {
        let mut s = playing(3);
        with_tower(&mut s, &[Side::Right]);
        tap(&mut s, RIGHT_X, W);
        assert!(s.is_over());

        let s = s.restart(4);
        assert_eq!(s.phase, Phase::Ready);
        assert_eq!(s.score(), 0);
        assert_eq!(s.health_units(), HEALTH_FULL);
        assert_eq!(&s.tower.sides()[..2], &[Side::None, Side::Right]);
        assert_eq!(s.tower.len(), 2 + GameplayConfig::default().initial_pieces);
    }

    // ── Properties over random play ──

    proptest! {
        #[test]
        fn score_and_health_stay_in_bounds(
            seed in any::<u64>(),
            script in proptest::collection::vec((any::<bool>(), 0u8..4), 0..300),
        ) {
            let mut s = playing(seed);
            let mut last_score = 0;
            for (right, ticks) in script {
                for _ in 0..ticks { tick(&mut s); }
                let before = (s.score(), s.health_units(), s.phase);
                let x = if right { RIGHT_X } else { LEFT_X };
                let events = tap(&mut s, x, W);

                prop_assert!(s.health_units() <= HEALTH_FULL);
                prop_assert!(s.score() >= last_score);
                last_score = s.score();

                if before.2 == Phase::Playing {
                    if let Some(GameEvent::Chopped { .. }) = events.first() {
                        prop_assert_eq!(s.score(), before.0 + 1);
                        prop_assert_eq!(
                            s.health_units(),
                            (before.1 + health_units(0.1)).min(HEALTH_FULL)
                        );
                    }
                }
                if s.is_over() { break; }
                prop_assert!(!s.tower.is_empty());
            }
        }
    }
}
