//! Match configuration
//!
//! Everything a match needs before the first stone: board size, rule,
//! who plays, how strong the AI is and where the external engine lives.
//! Loaded from JSON; missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::board::{Player, DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::error::ConfigError;
use crate::eval::AiTier;
use crate::rules::GameRule;

/// Who sits at the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Human plays `human`, the AI plays the other side
    PvE { human: Player },
    /// Two humans share the input (hotseat)
    PvP,
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::PvE { human: Player::X }
    }
}

/// External engine launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub executable: PathBuf,
    /// Engine data file for the active rule; the engine runs in its directory
    pub rule_config: Option<PathBuf>,
    /// Forwarded as `INFO timeout_turn`
    pub turn_timeout_ms: u64,
    /// Forwarded as `INFO timeout_match`
    pub match_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::new(),
            rule_config: None,
            turn_timeout_ms: 5_000,
            match_timeout_ms: 180_000,
        }
    }
}

/// Freestyle board growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// A stone closer than this many lines to an edge grows that edge
    pub threshold: usize,
    pub max_rows: usize,
    pub max_cols: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            threshold: 2,
            max_rows: MAX_BOARD_SIZE,
            max_cols: MAX_BOARD_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub rows: usize,
    pub cols: usize,
    pub starting_player: Player,
    pub rule: GameRule,
    pub mode: GameMode,
    pub ai_tier: AiTier,
    pub engine: EngineConfig,
    pub expansion: ExpansionConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_BOARD_SIZE,
            cols: DEFAULT_BOARD_SIZE,
            starting_player: Player::X,
            rule: GameRule::default(),
            mode: GameMode::default(),
            ai_tier: AiTier::default(),
            engine: EngineConfig::default(),
            expansion: ExpansionConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MatchConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ExpansionConfig {
            threshold,
            max_rows,
            max_cols,
        } = self.expansion;

        for (name, size, max) in [("rows", self.rows, max_rows), ("cols", self.cols, max_cols)] {
            if size < MIN_BOARD_SIZE {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at least {MIN_BOARD_SIZE}, got {size}"
                )));
            }
            if size > max {
                return Err(ConfigError::Invalid(format!(
                    "{name} is {size} but the growth limit is {max}"
                )));
            }
        }
        if max_rows > MAX_BOARD_SIZE || max_cols > MAX_BOARD_SIZE {
            return Err(ConfigError::Invalid(format!(
                "growth limit may not exceed {MAX_BOARD_SIZE}"
            )));
        }
        if threshold == 0 {
            return Err(ConfigError::Invalid("expansion threshold must be at least 1".into()));
        }
        if self.engine.turn_timeout_ms == 0 || self.engine.match_timeout_ms == 0 {
            return Err(ConfigError::Invalid("engine timeouts must be positive".into()));
        }
        Ok(())
    }

    /// The AI's side, if there is one
    pub fn ai_player(&self) -> Option<Player> {
        match self.mode {
            GameMode::PvE { human } => Some(human.opponent()),
            GameMode::PvP => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.rows, config.cols), (15, 15));
        assert_eq!(config.rule, GameRule::Freestyle);
        assert_eq!(config.ai_tier, AiTier::Hard);
        assert_eq!(config.ai_player(), Some(Player::O));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MatchConfig =
            serde_json::from_str(r#"{ "rows": 19, "cols": 19, "rule": "Renju", "mode": "PvP" }"#).unwrap();
        assert_eq!(config.rows, 19);
        assert_eq!(config.rule, GameRule::Renju);
        assert_eq!(config.mode, GameMode::PvP);
        assert_eq!(config.ai_player(), None);
        assert_eq!(config.engine.turn_timeout_ms, 5_000);
        assert_eq!(config.expansion.threshold, 2);
    }

    #[test]
    fn test_pve_mode_json() {
        let config: MatchConfig =
            serde_json::from_str(r#"{ "mode": { "PvE": { "human": "O" } }, "ai_tier": "Easy" }"#).unwrap();
        assert_eq!(config.mode, GameMode::PvE { human: Player::O });
        assert_eq!(config.ai_player(), Some(Player::X));
        assert_eq!(config.ai_tier, AiTier::Easy);
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let mut config = MatchConfig { rows: 4, ..MatchConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.rows = 15;
        config.cols = 30;
        config.expansion.max_cols = 20;
        assert!(config.validate().is_err());

        config.expansion.max_cols = 41;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = MatchConfig::default();
        config.expansion.threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rows": 20, "cols": 15, "starting_player": "O" }}"#).unwrap();
        let config = MatchConfig::load(file.path()).unwrap();
        assert_eq!((config.rows, config.cols), (20, 15));
        assert_eq!(config.starting_player, Player::O);
    }

    #[test]
    fn test_load_reports_parse_and_read_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(MatchConfig::load(file.path()), Err(ConfigError::Parse { .. })));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(MatchConfig::load(&missing), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rows": 3 }}"#).unwrap();
        assert!(matches!(MatchConfig::load(file.path()), Err(ConfigError::Invalid(_))));
    }
}
