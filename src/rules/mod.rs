//! Game rules for Caro
//!
//! This module implements the three supported rule sets:
//! - Freestyle: five or more in a row wins
//! - Standard: exactly five wins, overlines do not count
//! - Renju: X (first player) needs exactly five and may not play
//!   overlines, double-fours or double-threes; O plays freestyle

pub mod forbidden;
pub mod win;

use serde::{Deserialize, Serialize};

use crate::board::Player;

// Re-exports for convenient access
pub use forbidden::{count_fours, count_open_threes, forbidden_move, is_valid_move, Forbidden};
pub use win::{find_winning_line, is_win, run_through, winning_line, wins_with};

/// Rule variant of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameRule {
    #[default]
    Freestyle,
    Standard,
    Renju,
}

impl GameRule {
    /// Whether the board may grow when stones approach its edge
    #[inline]
    pub fn allows_expansion(self) -> bool {
        matches!(self, GameRule::Freestyle)
    }

    /// Whether `player` is subject to forbidden-move checks
    #[inline]
    pub fn restricts(self, player: Player) -> bool {
        self == GameRule::Renju && player == Player::X
    }

    /// Rule number used by `INFO rule` in the engine protocol
    pub fn protocol_code(self) -> u32 {
        match self {
            GameRule::Freestyle => 0,
            GameRule::Standard => 1,
            GameRule::Renju => 4,
        }
    }
}

impl std::fmt::Display for GameRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameRule::Freestyle => "freestyle",
            GameRule::Standard => "standard",
            GameRule::Renju => "renju",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for GameRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freestyle" => Ok(GameRule::Freestyle),
            "standard" => Ok(GameRule::Standard),
            "renju" => Ok(GameRule::Renju),
            other => Err(format!("unknown rule '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_renju_x_is_restricted() {
        assert!(GameRule::Renju.restricts(Player::X));
        assert!(!GameRule::Renju.restricts(Player::O));
        assert!(!GameRule::Freestyle.restricts(Player::X));
        assert!(!GameRule::Standard.restricts(Player::X));
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!("Renju".parse::<GameRule>(), Ok(GameRule::Renju));
        assert_eq!(" standard ".parse::<GameRule>(), Ok(GameRule::Standard));
        assert!("gomoku".parse::<GameRule>().is_err());
    }

    #[test]
    fn test_only_freestyle_grows() {
        assert!(GameRule::Freestyle.allows_expansion());
        assert!(!GameRule::Standard.allows_expansion());
        assert!(!GameRule::Renju.allows_expansion());
    }
}
