//! Move validation: turn ownership, bounds and adjacency.

use match3_shared::PlayerMove;
use std::fmt;

/// Why a move was dropped without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    NotActive,
    InvalidPlayer(i32),
    OutOfBounds,
    NotYourTurn { expected: i32, got: i32 },
    NotAdjacent,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRejection::NotActive => write!(f, "game not started or already over"),
            MoveRejection::InvalidPlayer(id) => write!(f, "invalid player id {}", id),
            MoveRejection::OutOfBounds => write!(f, "move coordinates out of bounds"),
            MoveRejection::NotYourTurn { expected, got } => {
                write!(f, "not player {}'s turn (expected {})", got, expected)
            }
            MoveRejection::NotAdjacent => write!(f, "tiles not adjacent"),
        }
    }
}

impl std::error::Error for MoveRejection {}

pub fn is_valid_player(player_id: i32) -> bool {
    player_id == 0 || player_id == 1
}

pub fn in_bounds(mv: &PlayerMove) -> bool {
    mv.from.in_bounds() && mv.to.in_bounds()
}

/// A swap is legal when the two cells are orthogonal neighbours. Whether it
/// scores is decided by applying it.
pub fn is_legal(mv: &PlayerMove) -> bool {
    mv.from.is_adjacent(&mv.to)
}
