/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick ←→  Chop Left / Chop Right
///   B / Y / L1            Chop Left
///   A / X / R1            Chop Right
///   Start                 Play / Restart
///   Select                Quit
///
/// Every action is edge-triggered: holding a button chops once.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Digital buttons an action can be bound to. The analog triggers and
/// sticks are left out; the horizontal stick is read separately as a
/// chop flick.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    South,
    East,
    West,
    North,
    LeftBumper,
    RightBumper,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

/// Names accepted in config.toml, matched case-insensitively. The first
/// name of each entry is the one the sample config uses.
const BTN_NAMES: [(Btn, &[&str]); BTN_COUNT] = [
    (Btn::South,       &["A", "SOUTH", "CROSS"]),
    (Btn::East,        &["B", "EAST", "CIRCLE"]),
    (Btn::West,        &["X", "WEST", "SQUARE"]),
    (Btn::North,       &["Y", "NORTH", "TRIANGLE"]),
    (Btn::LeftBumper,  &["L1", "LB"]),
    (Btn::RightBumper, &["R1", "RB"]),
    (Btn::Start,       &["START", "MENU", "OPTIONS"]),
    (Btn::Select,      &["SELECT", "BACK", "VIEW"]),
];

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        let wanted = s.trim().to_uppercase();
        BTN_NAMES
            .iter()
            .find(|(_, names)| names.contains(&wanted.as_str()))
            .map(|(btn, _)| *btn)
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        Some(match btn {
            Button::South => Btn::South,
            Button::East => Btn::East,
            Button::West => Btn::West,
            Button::North => Btn::North,
            Button::LeftTrigger => Btn::LeftBumper,
            Button::RightTrigger => Btn::RightBumper,
            Button::Start => Btn::Start,
            Button::Select => Btn::Select,
            _ => return None,
        })
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    /// Update from a new held value, flagging the rising edge.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set_held(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    chop_left: Vec<Btn>,
    chop_right: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            chop_left:  vec![Btn::East, Btn::North, Btn::LeftBumper],
            chop_right: vec![Btn::South, Btn::West, Btn::RightBumper],
            confirm:    vec![Btn::Start],
            cancel:     vec![Btn::Select],
        }
    }
}

impl ActionMap {
    /// Overlay config names on the defaults. An action whose list has no
    /// recognizable button keeps its default.
    fn apply(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        fn overlay(slot: &mut Vec<Btn>, names: &[String], action: &str) {
            let parsed = parse_list(names);
            if parsed.is_empty() {
                log::warn!("gamepad: no usable buttons for {action} in {names:?}, keeping default");
            } else {
                *slot = parsed;
            }
        }
        overlay(&mut self.chop_left, &cfg.chop_left, "chop_left");
        overlay(&mut self.chop_right, &cfg.chop_right, "chop_right");
        overlay(&mut self.confirm, &cfg.confirm, "confirm");
        overlay(&mut self.cancel, &cfg.cancel, "cancel");
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; BTN_COUNT],

    // D-pad and stick, horizontal only
    dpad_left: BtnState,
    dpad_right: BtnState,
    stick_left: BtnState,
    stick_right: BtnState,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad: gilrs init failed: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            stick_left: BtnState::default(),
            stick_right: BtnState::default(),
            stick_x: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map.apply(cfg);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                    self.connected = true;
                    self.stick_x = value;
                }
                EventType::Connected => {
                    log::info!("gamepad: connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad: disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Stick flicks act like d-pad presses
        let x = self.stick_x;
        self.stick_left.set_held(x < -STICK_DEADZONE);
        self.stick_right.set_held(x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadLeft  => { self.dpad_left.set_held(held); return; }
            Button::DPadRight => { self.dpad_right.set_held(held); return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn_index(btn)].set_held(held);
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn chop_left_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.chop_left)
            || self.dpad_left.just_pressed
            || self.stick_left.just_pressed
    }
    pub fn chop_right_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.chop_right)
            || self.dpad_right.just_pressed
            || self.stick_right.just_pressed
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        self.dpad_left.just_pressed = false;
        self.dpad_right.just_pressed = false;
        self.stick_left.just_pressed = false;
        self.stick_right.just_pressed = false;
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.stick_left = BtnState::default();
        self.stick_right = BtnState::default();
        self.stick_x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("Lb"), Some(Btn::LeftBumper));
        assert_eq!(Btn::from_name(" a "), Some(Btn::South));
        assert_eq!(Btn::from_name("triangle"), Some(Btn::North));
        assert_eq!(Btn::from_name("turbo"), None);
        // analog triggers are not bindable
        assert_eq!(Btn::from_name("L2"), None);
    }

    #[test]
    fn config_overrides_known_buttons_only() {
        let mut map = ActionMap::default();
        map.apply(&GamepadConfig {
            chop_left: names(&["Cross"]),
            chop_right: names(&["R2", "RB"]),
            confirm: names(&["nope"]),
            cancel: names(&[]),
        });
        assert_eq!(map.chop_left, vec![Btn::South]);
        assert_eq!(map.chop_right, vec![Btn::RightBumper]);
        assert_eq!(map.confirm, vec![Btn::Start]);
        assert_eq!(map.cancel, vec![Btn::Select]);
    }

    #[test]
    fn every_button_has_a_unique_slot() {
        let mut seen = [false; BTN_COUNT];
        for (btn, names) in BTN_NAMES {
            assert!(!names.is_empty());
            assert!(!seen[btn_index(btn)]);
            seen[btn_index(btn)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn rising_edge_only() {
        let mut b = BtnState::default();
        b.set_held(true);
        assert!(b.just_pressed);
        b.just_pressed = false;
        b.set_held(true);
        assert!(!b.just_pressed);
        b.set_held(false);
        b.set_held(true);
        assert!(b.just_pressed);
    }
}
