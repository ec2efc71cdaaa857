//! Heuristic move selection for the local AI
//!
//! Two tiers:
//! - Easy: a random free cell next to the opponent's last stone
//! - Hard: the best-scoring candidate by line potential and contact
//!
//! Neither tier searches ahead; each call looks at one ply only.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::patterns::{line_score, ADJACENCY_WEIGHT, OPPONENT_WEIGHT, OWN_WEIGHT};
use crate::board::{Board, Player, Pos, DIRECTIONS};
use crate::rules::{is_valid_move, run_through, GameRule};

/// Strength of the non-human player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiTier {
    Easy,
    #[default]
    Hard,
    /// External engine over the line protocol; plays like Hard locally
    Professional,
}

impl std::fmt::Display for AiTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AiTier::Easy => "easy",
            AiTier::Hard => "hard",
            AiTier::Professional => "professional",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for AiTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(AiTier::Easy),
            "hard" => Ok(AiTier::Hard),
            "professional" | "pro" => Ok(AiTier::Professional),
            other => Err(format!("unknown AI tier '{other}'")),
        }
    }
}

/// Pick a move for `player` with the given tier.
///
/// `last_opponent` is the opponent's most recent stone, used by Easy.
pub fn select_move<R: Rng + ?Sized>(
    tier: AiTier,
    board: &Board,
    player: Player,
    last_opponent: Option<Pos>,
    rule: GameRule,
    rng: &mut R,
) -> Option<Pos> {
    match tier {
        AiTier::Easy => easy_move(board, player, last_opponent, rule, rng),
        AiTier::Hard | AiTier::Professional => hard_move(board, player, rule),
    }
}

/// Random free cell touching `last_opponent`, or any free cell if none.
///
/// Cells forbidden to `player` are never chosen.
pub fn easy_move<R: Rng + ?Sized>(
    board: &Board,
    player: Player,
    last_opponent: Option<Pos>,
    rule: GameRule,
    rng: &mut R,
) -> Option<Pos> {
    let legal = |pos: &Pos| is_valid_move(board, *pos, player, rule);

    let near: Vec<Pos> = last_opponent
        .map(|last| board.neighbors(last, 1).filter(legal).collect())
        .unwrap_or_default();
    if let Some(&pos) = near.choose(rng) {
        return Some(pos);
    }

    let anywhere: Vec<Pos> = board.empty_cells().into_iter().filter(legal).collect();
    anywhere.choose(rng).copied()
}

/// Highest-scoring candidate for `player`; ties go to the first one found.
///
/// Candidates are the maintained index, or every free cell when the index
/// is empty. Forbidden cells are skipped unless nothing else is left.
pub fn hard_move(board: &Board, player: Player, rule: GameRule) -> Option<Pos> {
    // Opening move: take the center
    if board.is_board_empty() {
        let center = Pos::new(board.rows() / 2, board.cols() / 2);
        if is_valid_move(board, center, player, rule) {
            return Some(center);
        }
    }

    let candidates: Vec<Pos> = if board.candidates().is_empty() {
        board.empty_cells()
    } else {
        board.candidates().iter().collect()
    };
    let legal: Vec<Pos> = candidates
        .iter()
        .copied()
        .filter(|&pos| is_valid_move(board, pos, player, rule))
        .collect();
    let pool = if legal.is_empty() { &candidates } else { &legal };

    let mut best: Option<(Pos, i32)> = None;
    for &pos in pool {
        let score = score_cell(board, pos, player);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((pos, score));
        }
    }
    best.map(|(pos, _)| pos)
}

/// Sum over the four lines of the run `player` would make at `pos`
pub fn line_potential(board: &Board, pos: Pos, player: Player) -> i32 {
    DIRECTIONS
        .iter()
        .map(|&(dr, dc)| line_score(run_through(board, pos, player, dr, dc).len()))
        .sum()
}

/// Heuristic value of playing `pos` for `player`.
///
/// Own potential counts double, the opponent's potential (what the move
/// blocks) counts once, and each touching opponent stone adds a bonus.
pub fn score_cell(board: &Board, pos: Pos, player: Player) -> i32 {
    let opponent = player.opponent();
    let contact = board
        .neighbors(pos, 1)
        .filter(|&n| board.get(n) == Some(opponent))
        .count() as i32;

    line_potential(board, pos, player) * OWN_WEIGHT
        + line_potential(board, pos, opponent) * OPPONENT_WEIGHT
        + contact * ADJACENCY_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board_with(stones: &[(usize, usize, Player)]) -> Board {
        let mut board = Board::new(15, 15);
        for &(r, c, player) in stones {
            board.place(Pos::new(r, c), player).unwrap();
        }
        board
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("easy".parse::<AiTier>(), Ok(AiTier::Easy));
        assert_eq!("PRO".parse::<AiTier>(), Ok(AiTier::Professional));
        assert!("nightmare".parse::<AiTier>().is_err());
    }

    #[test]
    fn test_score_cell_weights() {
        let board = board_with(&[(7, 7, Player::X), (7, 8, Player::O)]);
        // Own horizontal two only
        assert_eq!(score_cell(&board, Pos::new(7, 6), Player::X), 20);
        // Own diagonal two (20), blocks O's vertical two (10), touches O (5)
        assert_eq!(score_cell(&board, Pos::new(6, 8), Player::X), 35);
    }

    #[test]
    fn test_easy_plays_next_to_last_opponent_stone() {
        let board = board_with(&[(7, 7, Player::O), (2, 2, Player::X)]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let pos = easy_move(&board, Player::X, Some(Pos::new(7, 7)), GameRule::Freestyle, &mut rng)
                .unwrap();
            assert!(pos.chebyshev(Pos::new(7, 7)) <= 1);
            assert!(board.is_empty(pos));
        }
    }

    #[test]
    fn test_easy_falls_back_to_any_empty_cell() {
        let mut board = Board::new(5, 5);
        board.place(Pos::new(0, 0), Player::O).unwrap();
        board.place(Pos::new(0, 1), Player::X).unwrap();
        board.place(Pos::new(1, 0), Player::X).unwrap();
        board.place(Pos::new(1, 1), Player::X).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let pos = easy_move(&board, Player::X, Some(Pos::new(0, 0)), GameRule::Freestyle, &mut rng)
            .unwrap();
        assert!(board.is_empty(pos));
        assert!(pos.chebyshev(Pos::new(0, 0)) > 1);
    }

    #[test]
    fn test_easy_without_last_move() {
        let board = Board::new(5, 5);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(easy_move(&board, Player::X, None, GameRule::Freestyle, &mut rng).is_some());
    }

    #[test]
    fn test_no_move_on_full_board() {
        let mut board = Board::new(5, 5);
        for r in 0..5 {
            for c in 0..5 {
                let player = if (r * 5 + c) % 2 == 0 { Player::X } else { Player::O };
                board.place(Pos::new(r, c), player).unwrap();
            }
        }
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(easy_move(&board, Player::X, None, GameRule::Freestyle, &mut rng), None);
        assert_eq!(hard_move(&board, Player::X, GameRule::Freestyle), None);
    }

    #[test]
    fn test_hard_opens_in_center() {
        let board = Board::new(15, 15);
        assert_eq!(hard_move(&board, Player::X, GameRule::Renju), Some(Pos::new(7, 7)));
    }

    #[test]
    fn test_hard_completes_five() {
        let mut stones: Vec<_> = (3..7).map(|c| (7, c, Player::X)).collect();
        stones.push((9, 9, Player::O));
        stones.push((10, 10, Player::O));
        let board = board_with(&stones);
        let pos = hard_move(&board, Player::X, GameRule::Freestyle).unwrap();
        assert!(pos == Pos::new(7, 2) || pos == Pos::new(7, 7), "got {pos}");
    }

    #[test]
    fn test_hard_blocks_opponent_four() {
        let mut stones: Vec<_> = (3..7).map(|c| (7, c, Player::O)).collect();
        stones.push((12, 12, Player::X));
        let board = board_with(&stones);
        let pos = hard_move(&board, Player::X, GameRule::Freestyle).unwrap();
        assert!(pos == Pos::new(7, 2) || pos == Pos::new(7, 7), "got {pos}");
    }

    #[test]
    fn test_hard_ties_go_to_first_candidate() {
        // Lone stone: every candidate at distance 2 scores 0, contact cells
        // score equally, so the first contact cell in row-major order wins.
        let board = board_with(&[(7, 7, Player::O)]);
        assert_eq!(hard_move(&board, Player::X, GameRule::Freestyle), Some(Pos::new(6, 6)));
    }

    #[test]
    fn test_hard_skips_forbidden_cell_in_renju() {
        let stones: Vec<_> = [(7, 6), (7, 8), (6, 7), (8, 7)]
            .iter()
            .map(|&(r, c)| (r, c, Player::X))
            .collect();
        let board = board_with(&stones);
        assert_eq!(hard_move(&board, Player::X, GameRule::Freestyle), Some(Pos::new(7, 7)));
        let pos = hard_move(&board, Player::X, GameRule::Renju).unwrap();
        assert_ne!(pos, Pos::new(7, 7));
    }

    #[test]
    fn test_select_move_dispatch() {
        let board = Board::new(15, 15);
        let mut rng = StdRng::seed_from_u64(5);
        let pro = select_move(AiTier::Professional, &board, Player::X, None, GameRule::Standard, &mut rng);
        assert_eq!(pro, Some(Pos::new(7, 7)));
        let easy = select_move(AiTier::Easy, &board, Player::X, None, GameRule::Standard, &mut rng);
        assert!(easy.is_some());
    }
}
