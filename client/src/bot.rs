use match3_shared::{swap_creates_match, Board, Point, BOARD_SIZE};

/// First swap, scanning row-major and trying right then down, that leaves a
/// match on the board.
pub fn find_matching_swap(board: &Board) -> Option<(Point, Point)> {
    let n = BOARD_SIZE as i32;
    for y in 0..n {
        for x in 0..n {
            let from = Point::new(x, y);
            for to in [Point::new(x + 1, y), Point::new(x, y + 1)] {
                if swap_creates_match(board, from, to) {
                    return Some((from, to));
                }
            }
        }
    }
    None
}
