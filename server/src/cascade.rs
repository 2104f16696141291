//! Cascade resolution: clear matches, drop special tiles, apply gravity and
//! refill until the board settles.

use log::debug;
use match3_shared::{find_matches, Board, Match, Tile, POINTS_PER_TILE};
use rand::Rng;

/// Result of resolving one player move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub score: i32,
    pub matched: bool,
    /// Number of passes that found at least one match.
    pub passes: u32,
}

/// Runs remove, special spawn, gravity and refill passes until no match remains.
///
/// The loop is unbounded: every refill is a fresh random draw, so settling
/// is only guaranteed with probability one.
pub fn resolve<R: Rng + ?Sized>(board: &mut Board, rng: &mut R) -> Resolution {
    let mut resolution = Resolution::default();

    loop {
        let matches = find_matches(board);
        if matches.is_empty() {
            break;
        }
        resolution.matched = true;
        resolution.passes += 1;
        resolution.score += score_matches(&matches);

        clear_matches(board, &matches);
        let specials = spawn_specials(board, &matches);
        debug!(
            "Pass {}: cleared {} matches, spawned {} special tiles\n{}",
            resolution.passes,
            matches.len(),
            specials,
            board
        );

        board.apply_gravity();
        debug!("Tiles dropped:\n{}", board);

        board.refill(rng);
        debug!("Empty spaces filled:\n{}", board);
    }

    resolution
}

/// Ten points per tile of every match, counting shared cells once per match.
pub fn score_matches(matches: &[Match]) -> i32 {
    matches
        .iter()
        .map(|m| m.len() as i32 * POINTS_PER_TILE)
        .sum()
}

/// Empties every matched cell. Must run for the whole pass before any spawn.
pub fn clear_matches(board: &mut Board, matches: &[Match]) {
    for point in matches.iter().flat_map(|m| m.points.iter()) {
        board.set(*point, Tile::Empty);
    }
}

/// Places a special tile at the center of each match longer than the minimum.
pub fn spawn_specials(board: &mut Board, matches: &[Match]) -> usize {
    let mut spawned = 0;
    for center in matches
        .iter()
        .filter(|m| m.spawns_special())
        .filter_map(Match::center)
    {
        board.set(center, Tile::Special);
        debug!("Special tile spawned at {}", center);
        spawned += 1;
    }
    spawned
}
