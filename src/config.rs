/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.
///
/// ```toml
/// [speed]
/// tick_rate_ms = 50
///
/// [game]
/// start_level = 0
/// lives = 3
/// seed = 1234        # optional; clock-seeded when absent
///
/// [general]
/// sound = true
/// ```

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub game: GameRules,
    pub sound: bool,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GameRules {
    pub start_level: u32,
    pub lives: u32,
    pub seed: Option<u64>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default)]
    start_level: u32,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_sound")]
    sound: bool,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 50 }
fn default_lives() -> u32 { 3 }
fn default_sound() -> bool { true }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame { start_level: 0, lives: default_lives(), seed: None }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { sound: default_sound() }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            speed: SpeedConfig { tick_rate_ms: t.speed.tick_rate_ms.max(1) },
            game: GameRules {
                start_level: t.game.start_level,
                lives: t.game.lives.max(1),
                seed: t.game.seed,
            },
            sound: t.general.sound,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/tunnelman`.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        load_toml(&candidate_dirs())
    }

    /// Parse a config document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Into::into)
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/tunnelman");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => match GameConfig::from_toml_str(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(path = %path.display(), "config.toml parse error, using defaults: {e}");
                    return GameConfig::default();
                }
            },
            Err(e) => warn!(path = %path.display(), "could not read config: {e}"),
        }
    }
    GameConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").expect("parses");
        assert_eq!(cfg.speed.tick_rate_ms, 50);
        assert_eq!(cfg.game.start_level, 0);
        assert_eq!(cfg.game.lives, 3);
        assert_eq!(cfg.game.seed, None);
        assert!(cfg.sound);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str("[game]\nseed = 42\nstart_level = 3\n\n[general]\nsound = false\n")
            .expect("parses");
        assert_eq!(cfg.game.seed, Some(42));
        assert_eq!(cfg.game.start_level, 3);
        assert_eq!(cfg.game.lives, 3);
        assert_eq!(cfg.speed.tick_rate_ms, 50);
        assert!(!cfg.sound);
    }

    #[test]
    fn zero_values_are_clamped() {
        let cfg = GameConfig::from_toml_str("[speed]\ntick_rate_ms = 0\n[game]\nlives = 0\n").expect("parses");
        assert_eq!(cfg.speed.tick_rate_ms, 1);
        assert_eq!(cfg.game.lives, 1);
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(GameConfig::from_toml_str("[speed]\ntick_rate_ms = \"fast\"\n").is_err());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tunnelman-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn first_config_file_found_wins() {
        let empty = scratch_dir("empty");
        let full = scratch_dir("full");
        std::fs::write(full.join("config.toml"), "[game]\nlives = 7\n").expect("write");
        let cfg = load_toml(&[empty.clone(), full.clone()]);
        assert_eq!(cfg.game.lives, 7);
        let _ = std::fs::remove_dir_all(empty);
        let _ = std::fs::remove_dir_all(full);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = scratch_dir("malformed");
        std::fs::write(dir.join("config.toml"), "[game\nlives = 7\n").expect("write");
        let cfg = load_toml(&[dir.clone()]);
        assert_eq!(cfg.game.lives, 3);
        let _ = std::fs::remove_dir_all(dir);
    }
}
