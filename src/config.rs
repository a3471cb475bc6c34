/// External configuration loader.
///
/// Reads `config.toml` from an explicit path (`--config`), or else from
/// the executable's directory, or else from the CWD.
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::rules::SideWeights;
use crate::sim::session::health_units;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub gameplay: GameplayConfig,
    pub gamepad: GamepadConfig,
    /// Fixed session seed. `None` = fresh time-based seed per session.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

/// Tunables the session reads. Health amounts are in health units.
#[derive(Clone, Debug, PartialEq)]
pub struct GameplayConfig {
    pub initial_pieces: usize,
    pub health_drain: i32,    // per frame tick
    pub chop_reward: i32,     // per survived tap
    pub weights: SideWeights,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        GameplayConfig {
            initial_pieces: default_initial_pieces(),
            health_drain: health_units(default_health_drain()),
            chop_reward: health_units(default_chop_reward()),
            weights: SideWeights::CLASSIC,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub chop_left: Vec<String>,
    pub chop_right: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gameplay: TomlGameplay,
    #[serde(default)]
    tower: TomlTower,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGameplay {
    #[serde(default = "default_initial_pieces")]
    initial_pieces: usize,
    #[serde(default = "default_health_drain")]
    health_drain: f64,
    #[serde(default = "default_chop_reward")]
    chop_reward: f64,
}

#[derive(Deserialize, Debug)]
struct TomlTower {
    #[serde(default = "default_left_weight")]
    left_weight: f64,
    #[serde(default = "default_right_weight")]
    right_weight: f64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_chop_left")]
    chop_left: Vec<String>,
    #[serde(default = "default_chop_right")]
    chop_right: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: u64,  // 0 = time-based
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }       // ~60 frames per second
fn default_initial_pieces() -> usize { 10 } // just past the top of the screen
fn default_health_drain() -> f64 { 0.01 }  // full bar lasts 100 frames
fn default_chop_reward() -> f64 { 0.1 }
fn default_left_weight() -> f64 { SideWeights::CLASSIC.left }
fn default_right_weight() -> f64 { SideWeights::CLASSIC.right }

fn default_chop_left() -> Vec<String> { vec!["B".into(), "Y".into(), "L1".into()] }
fn default_chop_right() -> Vec<String> { vec!["A".into(), "X".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGameplay {
    fn default() -> Self {
        TomlGameplay {
            initial_pieces: default_initial_pieces(),
            health_drain: default_health_drain(),
            chop_reward: default_chop_reward(),
        }
    }
}

impl Default for TomlTower {
    fn default() -> Self {
        TomlTower {
            left_weight: default_left_weight(),
            right_weight: default_right_weight(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            chop_left: default_chop_left(),
            chop_right: default_chop_right(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

// ── Loading ──

/// Where the config lives (if anywhere) and which directory owns it.
/// The log file is written to `dir`.
#[derive(Clone, Debug)]
pub struct ConfigLocation {
    pub file: Option<PathBuf>,
    pub dir: PathBuf,
}

impl ConfigLocation {
    /// Use `explicit` if given, otherwise search for `config.toml`:
    /// (1) exe directory, (2) current working directory.
    pub fn find(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            let dir = path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return ConfigLocation { file: Some(path.to_path_buf()), dir };
        }
        let search_dirs = candidate_dirs();
        for dir in &search_dirs {
            let path = dir.join("config.toml");
            if path.exists() {
                return ConfigLocation { file: Some(path), dir: dir.clone() };
            }
        }
        // Nothing found: data goes to the CWD (last candidate)
        let dir = search_dirs.last().cloned().unwrap_or_else(|| PathBuf::from("."));
        ConfigLocation { file: None, dir }
    }
}

impl GameConfig {
    /// Load config from the located file.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(location: &ConfigLocation) -> Self {
        let toml_cfg = match &location.file {
            Some(path) => load_file(path).unwrap_or_default(),
            None => {
                log::info!("config: no config.toml found, using defaults");
                TomlConfig::default()
            }
        };
        GameConfig::from_toml(toml_cfg)
    }

    /// Parse config text directly (defaults for anything missing).
    #[cfg(test)]
    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: cfg.speed.tick_rate_ms.max(1),
            },
            gameplay: GameplayConfig {
                initial_pieces: cfg.gameplay.initial_pieces,
                health_drain: checked_amount("health_drain", cfg.gameplay.health_drain, default_health_drain()),
                chop_reward: checked_amount("chop_reward", cfg.gameplay.chop_reward, default_chop_reward()),
                weights: checked_weights(&cfg.tower),
            },
            gamepad: GamepadConfig {
                chop_left: cfg.gamepad.chop_left,
                chop_right: cfg.gamepad.chop_right,
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
            seed: if cfg.general.seed == 0 { None } else { Some(cfg.general.seed) },
        }
    }
}

/// Health amounts must be a non-negative fraction of the bar.
fn checked_amount(name: &str, value: f64, fallback: f64) -> i32 {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        health_units(value)
    } else {
        log::warn!("config: gameplay.{name} = {value} is outside [0, 1], using {fallback}");
        health_units(fallback)
    }
}

/// Each weight must be a fraction in [0, 1]; a bad one falls back to its
/// classic value on its own. The pair must then leave a non-negative None
/// share, otherwise the classic split is used.
fn checked_weights(tower: &TomlTower) -> SideWeights {
    let w = SideWeights {
        left: checked_weight("left_weight", tower.left_weight, SideWeights::CLASSIC.left),
        right: checked_weight("right_weight", tower.right_weight, SideWeights::CLASSIC.right),
    };
    if w.is_valid() {
        log::debug!(
            "tower weights: left {:.2}, right {:.2}, empty {:.2}",
            w.left, w.right, w.none_share(),
        );
        w
    } else {
        log::warn!(
            "config: tower weights {} + {} exceed 1, using {} / {}",
            w.left, w.right, SideWeights::CLASSIC.left, SideWeights::CLASSIC.right,
        );
        SideWeights::CLASSIC
    }
}

fn checked_weight(name: &str, value: f64, fallback: f64) -> f64 {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        value
    } else {
        log::warn!("config: tower.{name} = {value} is outside [0, 1], using {fallback}");
        fallback
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn load_file(path: &Path) -> Option<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => {
                log::info!("config: loaded {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                log::warn!("config: {} parse error: {e}; using default settings", path.display());
                None
            }
        },
        Err(e) => {
            log::warn!("config: could not read {}: {e}", path.display());
            None
        }
    }
}
