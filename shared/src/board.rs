//! The 8x8 tile grid and its generation, swap, gravity and refill helpers.

use crate::{Point, Tile, BOARD_SIZE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Grid = [[Tile; BOARD_SIZE]; BOARD_SIZE];

/// Square grid of tiles stored row-major, `cells[y][x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: Grid,
}

impl Board {
    /// Fills every cell with a uniformly drawn color. Latent matches are allowed.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut board = Self::default();
        for row in board.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = random_color(rng);
            }
        }
        board
    }

    pub fn get(&self, p: Point) -> Option<Tile> {
        index(p).map(|(x, y)| self.cells[y][x])
    }

    /// Returns false without writing when `p` is off the board.
    pub fn set(&mut self, p: Point, tile: Tile) -> bool {
        match index(p) {
            Some((x, y)) => {
                self.cells[y][x] = tile;
                true
            }
            None => false,
        }
    }

    pub(crate) fn at(&self, x: usize, y: usize) -> Tile {
        self.cells[y][x]
    }

    /// Exchanges two cells. Applying the same swap twice restores the board.
    pub fn swap(&mut self, a: Point, b: Point) -> bool {
        match (index(a), index(b)) {
            (Some((ax, ay)), Some((bx, by))) => {
                let tile = self.cells[ay][ax];
                self.cells[ay][ax] = self.cells[by][bx];
                self.cells[by][bx] = tile;
                true
            }
            _ => false,
        }
    }

    /// Compacts each column's tiles toward the bottom, keeping their order.
    pub fn apply_gravity(&mut self) {
        for x in 0..BOARD_SIZE {
            let mut write = BOARD_SIZE;
            for y in (0..BOARD_SIZE).rev() {
                let tile = self.cells[y][x];
                if tile.is_empty() {
                    continue;
                }
                write -= 1;
                self.cells[write][x] = tile;
            }
            for y in 0..write {
                self.cells[y][x] = Tile::Empty;
            }
        }
    }

    /// Draws a fresh color into every empty cell. Returns how many were filled.
    pub fn refill<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let mut filled = 0;
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut().filter(|cell| cell.is_empty()) {
                *cell = random_color(rng);
                filled += 1;
            }
        }
        filled
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().flatten().filter(|&&cell| cell == tile).count()
    }

    pub fn has_empty(&self) -> bool {
        self.count(Tile::Empty) > 0
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.iter() {
            for tile in row.iter() {
                write!(f, "{} ", tile.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn index(p: Point) -> Option<(usize, usize)> {
    if p.in_bounds() {
        Some((p.x as usize, p.y as usize))
    } else {
        None
    }
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    Tile::COLORS[rng.gen_range(0..Tile::COLORS.len())]
}
