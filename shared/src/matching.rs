//! Run detection: finds every horizontal and vertical run of at least
//! [`MIN_MATCH`] identical tiles.

use crate::{Board, Point, Tile, BOARD_SIZE, MIN_MATCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// A qualifying run. Points are ordered left-to-right or top-to-bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub tile: Tile,
    pub direction: Direction,
    pub points: Vec<Point>,
}

impl Match {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Runs longer than the minimum leave a special tile behind.
    pub fn spawns_special(&self) -> bool {
        self.len() > MIN_MATCH
    }

    /// The point at index `len / 2`.
    pub fn center(&self) -> Option<Point> {
        self.points.get(self.len() / 2).copied()
    }
}

/// Scans rows left-to-right, then columns top-to-bottom.
///
/// Within one axis a cell belongs to at most one run, but a cell can sit in
/// both a horizontal and a vertical match. Empty cells never start or extend
/// a run.
pub fn find_matches(board: &Board) -> Vec<Match> {
    let mut matches = Vec::new();

    for y in 0..BOARD_SIZE {
        scan_line(board, Direction::Horizontal, |i| (i, y), &mut matches);
    }
    for x in 0..BOARD_SIZE {
        scan_line(board, Direction::Vertical, |i| (x, i), &mut matches);
    }

    matches
}

/// Whether swapping `a` and `b` would leave at least one match. Works on a
/// copy; off-board points never match.
pub fn swap_creates_match(board: &Board, a: Point, b: Point) -> bool {
    let mut trial = *board;
    trial.swap(a, b) && !find_matches(&trial).is_empty()
}

fn scan_line<F>(board: &Board, direction: Direction, coord: F, out: &mut Vec<Match>)
where
    F: Fn(usize) -> (usize, usize),
{
    let tile_at = |i: usize| {
        let (x, y) = coord(i);
        board.at(x, y)
    };

    let mut start = 0;
    while start < BOARD_SIZE {
        let tile = tile_at(start);
        if tile.is_empty() {
            start += 1;
            continue;
        }

        let mut end = start + 1;
        while end < BOARD_SIZE && tile_at(end) == tile {
            end += 1;
        }

        if end - start >= MIN_MATCH {
            let points = (start..end)
                .map(|i| {
                    let (x, y) = coord(i);
                    Point::new(x as i32, y as i32)
                })
                .collect();
            out.push(Match {
                tile,
                direction,
                points,
            });
        }
        start = end;
    }
}
