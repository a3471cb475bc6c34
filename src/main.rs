/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use crossterm::event::KeyCode;

use config::{ConfigLocation, GameConfig};
use sim::event::GameEvent;
use sim::session::{Phase, Session};
use sim::step;
use ui::effects::Effects;
use ui::gamepad::GamepadState;
use ui::input::{InputState, RawInput};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "sushineko.log";

/// Sushi Neko in the terminal: punch sushi off the tower, dodge the chopsticks.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Seed for the first session (overrides `[general] seed`)
    #[arg(long)]
    seed: Option<u64>,

    /// Path to config.toml (default: next to the executable, then the CWD)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let location = ConfigLocation::find(cli.config.as_deref());
    init_logging(&location);

    let config = GameConfig::load(&location);
    let pinned = cli.seed.or(config.seed);
    let seed = time_seed_or(pinned);
    log::info!("starting with seed {seed}");

    let mut session = Session::new(seed, config.gameplay.clone());
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config, pinned);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Sushi Neko!");
    println!("Final Score: {}  (seed {})", session.score(), session.seed());
}

/// Log to a file next to the config. The terminal is in raw mode on the
/// alternate screen, so stderr output would tear the frame.
fn init_logging(location: &ConfigLocation) {
    let path = location.dir.join(LOG_FILE);
    let file = match File::create(&path) {
        Ok(f) => f,
        Err(_) => return,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

/// Fresh seed when neither the CLI nor the config pins one.
fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    pinned_seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut fx = Effects::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            break;
        }

        let width = renderer.width() as f32;
        let mut taps: Vec<f32> = kb.inputs.iter()
            .filter_map(|input| tap_position(*input, width))
            .collect();
        if gp.chop_left_pressed() {
            taps.push(0.0);
        }
        if gp.chop_right_pressed() {
            taps.push(width);
        }
        let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();

        let mut events = apply_frame_input(session, &mut fx, &taps, width, confirm, pinned_seed);

        if last_tick.elapsed() >= tick_rate {
            events.extend(step::tick(session));
            fx.advance();
            last_tick = Instant::now();
        }

        ui::sound::play_events(sound, &events);
        fx.apply(&events);

        renderer.render(session, &fx, gp.connected)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Apply one frame of input: taps in arrival order, then the confirm
/// action. Confirm only restarts a run that was already over when the
/// frame began, so a tap that kills cannot be skipped past in the same
/// frame.
fn apply_frame_input(
    session: &mut Session,
    fx: &mut Effects,
    taps: &[f32],
    width: f32,
    confirm: bool,
    pinned_seed: Option<u64>,
) -> Vec<GameEvent> {
    let was_over = session.is_over();
    let mut events = Vec::new();

    for &x in taps {
        events.extend(step::tap(session, x, width));
    }

    if confirm {
        match session.phase() {
            Phase::Title => events.extend(session.press_play()),
            Phase::GameOver if was_over => {
                *session = session.restart(time_seed_or(pinned_seed));
                fx.reset();
                events.push(GameEvent::Ready);
            }
            Phase::GameOver | Phase::Ready | Phase::Playing => {}
        }
    }

    events
}

/// A pinned seed (CLI or config) replays the same tower every restart.
fn time_seed_or(pinned: Option<u64>) -> u64 {
    pinned.unwrap_or_else(time_seed)
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[
    KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A'), KeyCode::Char('z'), KeyCode::Char('Z'),
];
const KEYS_RIGHT: &[KeyCode] = &[
    KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D'), KeyCode::Char('x'), KeyCode::Char('X'),
];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Tap position for one input, if it is a tap at all. Clicks land on the
/// centre of their column; keys stand in for the far edge of each half.
fn tap_position(input: RawInput, width: f32) -> Option<f32> {
    match input {
        RawInput::Click { column } => Some(column as f32 + 0.5),
        RawInput::Key(code) if KEYS_LEFT.contains(&code) => Some(0.0),
        RawInput::Key(code) if KEYS_RIGHT.contains(&code) => Some(width),
        RawInput::Key(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameplayConfig;
    use crate::domain::rules::side_for_tap;
    use crate::domain::side::Side;
    use crate::sim::event::DeathCause;

    #[test]
    fn clicks_split_at_the_middle_column() {
        let w = 80.0;
        let left = tap_position(RawInput::Click { column: 39 }, w).unwrap();
        let right = tap_position(RawInput::Click { column: 40 }, w).unwrap();
        assert_eq!(side_for_tap(left, w), Side::Left);
        assert_eq!(side_for_tap(right, w), Side::Right);
    }

    #[test]
    fn keys_map_to_halves() {
        let w = 81.0;
        let l = tap_position(RawInput::Key(KeyCode::Char('z')), w).unwrap();
        let r = tap_position(RawInput::Key(KeyCode::Right), w).unwrap();
        assert_eq!(side_for_tap(l, w), Side::Left);
        assert_eq!(side_for_tap(r, w), Side::Right);
        assert_eq!(tap_position(RawInput::Key(KeyCode::Enter), w), None);
    }

    #[test]
    fn cli_accepts_seed_and_config() {
        let cli = Cli::try_parse_from(["sushineko", "--seed", "42", "--config", "my.toml"]).unwrap();
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn pinned_seed_wins_on_restart() {
        assert_eq!(time_seed_or(Some(9)), 9);
    }

    // ── Frame input ──

    const W: f32 = 80.0;

    fn session() -> Session {
        Session::new(5, GameplayConfig::default())
    }

    /// Tap from whichever side is lethal for the current front piece.
    fn lethal_tap(s: &Session) -> f32 {
        match s.tower().front().map(|p| p.side) {
            Some(Side::Left) => 0.0,
            _ => W,
        }
    }

    fn run_until_dead(s: &mut Session, fx: &mut Effects) {
        apply_frame_input(s, fx, &[], W, true, None);
        // survive through empty fronts until an armed piece comes up
        while s.tower().front().map(|p| p.side) == Some(Side::None) {
            apply_frame_input(s, fx, &[0.0], W, false, None);
        }
        let x = lethal_tap(s);
        apply_frame_input(s, fx, &[x], W, false, None);
        assert!(s.is_over());
    }

    #[test]
    fn confirm_on_title_goes_to_ready_and_ignores_taps() {
        let mut s = session();
        let mut fx = Effects::new();
        let events = apply_frame_input(&mut s, &mut fx, &[0.0, W], W, true, None);
        assert_eq!(events, vec![GameEvent::Ready]);
        assert_eq!(s.phase(), Phase::Ready);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn taps_run_before_confirm_in_one_frame() {
        let mut s = session();
        let mut fx = Effects::new();
        apply_frame_input(&mut s, &mut fx, &[], W, true, None);
        // front of a fresh tower is always empty, so this tap survives
        let events = apply_frame_input(&mut s, &mut fx, &[0.0], W, true, None);
        assert_eq!(events[0], GameEvent::Started);
        assert!(matches!(events[1], GameEvent::Chopped { .. }));
        assert_eq!(events.len(), 2);
        assert_eq!(s.phase(), Phase::Playing);
    }

    #[test]
    fn confirm_after_game_over_restarts_and_clears_effects() {
        let mut s = session();
        let mut fx = Effects::new();
        run_until_dead(&mut s, &mut fx);
        fx.apply(&[GameEvent::GameOver { cause: DeathCause::Crushed, score: s.score() }]);
        assert!(fx.death.is_some());

        let events = apply_frame_input(&mut s, &mut fx, &[], W, true, Some(77));
        assert_eq!(events, vec![GameEvent::Ready]);
        assert_eq!(s.phase(), Phase::Ready);
        assert_eq!(s.seed(), 77);
        assert_eq!(s.score(), 0);
        assert!(fx.death.is_none());
        assert!(fx.flying.is_empty());
    }

    #[test]
    fn death_and_confirm_in_one_frame_stays_on_game_over() {
        let mut s = session();
        let mut fx = Effects::new();
        apply_frame_input(&mut s, &mut fx, &[], W, true, None);
        while s.tower().front().map(|p| p.side) == Some(Side::None) {
            apply_frame_input(&mut s, &mut fx, &[0.0], W, false, None);
        }
        let x = lethal_tap(&s);
        apply_frame_input(&mut s, &mut fx, &[x], W, true, None);
        assert_eq!(s.phase(), Phase::GameOver);
    }
}
