use super::*;
use crate::error::BoardError;

/// Every free cell near a stone is a candidate, no occupied cell is.
fn assert_candidate_invariant(board: &Board) {
    for (pos, cell) in board.cells() {
        let near_stone = board
            .neighbors(pos, CANDIDATE_RADIUS)
            .any(|n| board.get(n).is_some());
        if cell.is_free() && near_stone {
            assert!(board.candidates().contains(pos), "{pos} missing from candidates");
        }
        if !cell.is_free() {
            assert!(!board.candidates().contains(pos), "occupied {pos} is a candidate");
        }
    }
}

fn rebuilt(board: &Board) -> CandidateSet {
    let mut copy = board.clone();
    copy.rebuild_candidates();
    copy.candidates().clone()
}

#[test]
fn test_player_opponent() {
    assert_eq!(Player::X.opponent(), Player::O);
    assert_eq!(Player::O.opponent(), Player::X);
    assert_eq!("x".parse::<Player>(), Ok(Player::X));
    assert!("z".parse::<Player>().is_err());
}

#[test]
fn test_pos_ordering() {
    let pos1 = Pos::new(0, 0);
    let pos2 = Pos::new(0, 1);
    let pos3 = Pos::new(1, 0);

    assert!(pos1 < pos2);
    assert!(pos2 < pos3);
    assert!(pos1 < pos3);
}

#[test]
fn test_pos_chebyshev() {
    assert_eq!(Pos::new(3, 3).chebyshev(Pos::new(5, 4)), 2);
    assert_eq!(Pos::new(3, 3).chebyshev(Pos::new(3, 3)), 0);
}

#[test]
fn test_contains_and_offset() {
    let board = Board::new(15, 10);
    assert!(board.contains(0, 0));
    assert!(board.contains(14, 9));
    assert!(!board.contains(-1, 0));
    assert!(!board.contains(15, 0));
    assert!(!board.contains(0, 10));

    assert_eq!(board.offset(Pos::new(2, 2), 1, -1, 2), Some(Pos::new(4, 0)));
    assert_eq!(board.offset(Pos::new(2, 2), 1, -1, 3), None);
}

#[test]
fn test_place_and_get() {
    let mut board = Board::new(15, 15);
    board.place(Pos::new(7, 7), Player::X).unwrap();
    assert_eq!(board.get(Pos::new(7, 7)), Some(Player::X));
    assert_eq!(board.stone_count(), 1);
    assert!(!board.is_empty(Pos::new(7, 7)));
}

#[test]
fn test_place_occupied_fails() {
    let mut board = Board::new(15, 15);
    board.place(Pos::new(7, 7), Player::X).unwrap();
    assert_eq!(
        board.place(Pos::new(7, 7), Player::O),
        Err(BoardError::Occupied(Pos::new(7, 7)))
    );
    assert_eq!(board.get(Pos::new(7, 7)), Some(Player::X));
    assert_eq!(board.stone_count(), 1);
}

#[test]
fn test_place_out_of_bounds_fails() {
    let mut board = Board::new(15, 15);
    assert_eq!(
        board.place(Pos::new(15, 0), Player::X),
        Err(BoardError::OutOfBounds(Pos::new(15, 0)))
    );
}

#[test]
fn test_blocked_cell_rejects_stone() {
    let mut board = Board::new(9, 9);
    board.set_blocked(Pos::new(4, 4)).unwrap();
    assert!(!board.is_empty(Pos::new(4, 4)));
    assert!(board.place(Pos::new(4, 4), Player::X).is_err());
    board.place(Pos::new(4, 5), Player::X).unwrap();
    assert!(!board.candidates().contains(Pos::new(4, 4)));
}

#[test]
fn test_neighbors_clipped_at_corner() {
    let board = Board::new(15, 15);
    let around: Vec<Pos> = board.neighbors(Pos::new(0, 0), 2).collect();
    // 3x3 block minus the origin
    assert_eq!(around.len(), 8);
    assert!(around.iter().all(|p| p.row <= 2 && p.col <= 2));
    assert!(!around.contains(&Pos::new(0, 0)));
}

#[test]
fn test_candidates_after_first_stone() {
    let mut board = Board::new(15, 15);
    board.place(Pos::new(7, 7), Player::X).unwrap();
    // 5x5 block minus the stone itself
    assert_eq!(board.candidates().len(), 24);
    assert!(!board.candidates().contains(Pos::new(7, 7)));
    assert!(board.candidates().contains(Pos::new(5, 9)));
    assert!(!board.candidates().contains(Pos::new(4, 7)));
}

#[test]
fn test_candidate_invariant_over_sequence() {
    let mut board = Board::new(15, 15);
    let moves = [
        (7, 7, Player::X),
        (7, 8, Player::O),
        (0, 0, Player::X),
        (14, 14, Player::O),
        (8, 8, Player::X),
        (6, 6, Player::O),
    ];
    for (r, c, player) in moves {
        board.place(Pos::new(r, c), player).unwrap();
        assert_candidate_invariant(&board);
    }
    assert_eq!(board.candidates(), &rebuilt(&board));
}

#[test]
fn test_remove_repairs_candidates() {
    let mut board = Board::new(15, 15);
    board.place(Pos::new(7, 7), Player::X).unwrap();
    board.place(Pos::new(7, 11), Player::O).unwrap();

    assert_eq!(board.remove(Pos::new(7, 11)), Some(Player::O));
    assert_eq!(board.stone_count(), 1);
    assert_candidate_invariant(&board);
    // Cells only reachable from the removed stone drop out
    assert!(!board.candidates().contains(Pos::new(7, 13)));
    assert_eq!(board.candidates(), &rebuilt(&board));

    assert_eq!(board.remove(Pos::new(7, 7)), Some(Player::X));
    assert!(board.candidates().is_empty());
    assert_eq!(board.remove(Pos::new(7, 7)), None);
}

#[test]
fn test_removed_cell_rejoins_candidates_when_near_stone() {
    let mut board = Board::new(15, 15);
    board.place(Pos::new(7, 7), Player::X).unwrap();
    board.place(Pos::new(7, 8), Player::O).unwrap();
    board.remove(Pos::new(7, 8));
    assert!(board.candidates().contains(Pos::new(7, 8)));
}

#[test]
fn test_full_board() {
    let mut board = Board::new(5, 5);
    assert!(!board.is_full());
    for r in 0..5 {
        for c in 0..5 {
            let player = if (r + c) % 2 == 0 { Player::X } else { Player::O };
            board.place(Pos::new(r, c), player).unwrap();
        }
    }
    assert!(board.is_full());
    assert!(board.candidates().is_empty());
    assert!(board.empty_cells().is_empty());
}

#[test]
fn test_edges_near() {
    let board = Board::new(15, 15);
    assert!(board.edges_near(Pos::new(7, 7), 2).is_empty());
    assert_eq!(board.edges_near(Pos::new(1, 7), 2), vec![Edge::Top]);
    assert_eq!(
        board.edges_near(Pos::new(14, 0), 1),
        vec![Edge::Bottom, Edge::Left]
    );
}

#[test]
fn test_expand_top_shifts_stones() {
    let mut board = Board::new(15, 15);
    board.place(Pos::new(0, 3), Player::X).unwrap();
    board.set_winning(Pos::new(0, 3), true);

    assert!(board.expand(Edge::Top));
    assert_eq!(board.rows(), 16);
    assert_eq!(board.cols(), 15);
    assert_eq!(board.get(Pos::new(0, 3)), None);
    assert_eq!(board.get(Pos::new(1, 3)), Some(Player::X));
    assert!(board.cell(Pos::new(1, 3)).unwrap().winning);
    assert_eq!(board.stone_count(), 1);
    assert_candidate_invariant(&board);
    assert!(board.candidates().contains(Pos::new(0, 3)));
}

#[test]
fn test_expand_left_and_right() {
    let mut board = Board::new(15, 15);
    board.place(Pos::new(7, 14), Player::O).unwrap();

    assert!(board.expand(Edge::Right));
    assert_eq!(board.get(Pos::new(7, 14)), Some(Player::O));
    assert!(board.expand(Edge::Left));
    assert_eq!(board.cols(), 17);
    assert_eq!(board.get(Pos::new(7, 15)), Some(Player::O));
    assert_candidate_invariant(&board);
}

#[test]
fn test_expand_respects_growth_limit() {
    let mut board = Board::new(15, 15).with_growth_limit(16, 15);
    assert!(board.expand(Edge::Bottom));
    assert!(!board.expand(Edge::Bottom));
    assert!(!board.expand(Edge::Left));
    assert_eq!(board.rows(), 16);
    assert_eq!(board.cols(), 15);
}

#[test]
fn test_clear_winning_reports_changed_cells() {
    let mut board = Board::new(9, 9);
    board.place(Pos::new(1, 1), Player::X).unwrap();
    board.set_winning(Pos::new(1, 1), true);
    assert_eq!(board.clear_winning(), vec![Pos::new(1, 1)]);
    assert!(board.clear_winning().is_empty());
}
